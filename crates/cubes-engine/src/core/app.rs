use anyhow::Result;
use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::gfx::Gfx;

use super::ctx::{FrameCtx, InitCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
///
/// Call order is `on_init` once, `on_frame` once per redraw, then
/// `on_shutdown` exactly once after the last frame.
pub trait App {
    /// Called once the window, GPU and rendering context exist.
    fn on_init(&mut self, ctx: &mut InitCtx<'_, '_>) -> Result<()>;

    /// Called for window events before the runtime handles them.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Release rendering resources. The context is shut down right after.
    fn on_shutdown(&mut self, gfx: &mut Gfx) {
        let _ = gfx;
    }
}
