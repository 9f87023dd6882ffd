use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::device::Gpu;
use crate::gfx::{FrameStatus, Gfx};
use crate::time::FrameTime;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id:     WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in physical pixels.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }
}

/// Context passed to `core::App::on_init`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct InitCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu:    &'a Gpu<'w>,
    pub gfx:    &'a mut Gfx,
}

/// Per-frame context passed to `core::App::on_frame`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu:    &'a mut Gpu<'w>,
    pub gfx:    &'a mut Gfx,
    pub time:   FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Executes the draws recorded this frame and presents.
    ///
    /// Returns [`AppControl::Exit`] only when the device is gone for good; a
    /// skipped frame is not an error.
    pub fn frame(&mut self) -> AppControl {
        self.window.window.pre_present_notify();

        match self.gfx.frame(self.gpu) {
            FrameStatus::Presented(_) | FrameStatus::Skipped => AppControl::Continue,
            FrameStatus::Fatal => AppControl::Exit,
        }
    }
}
