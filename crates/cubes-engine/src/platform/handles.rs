use std::ffi::c_void;
use std::ptr;

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle,
    RawWindowHandle, WindowHandle,
};

/// Native handles of one window, borrowed for `'a`.
///
/// This is what the device layer creates its surface from. It also answers the
/// "which OS object backs this window" question with plain pointers for
/// diagnostics and for code that talks to the platform directly.
#[derive(Debug, Clone, Copy)]
pub struct PlatformData<'a> {
    window: WindowHandle<'a>,
    display: DisplayHandle<'a>,
}

impl<'a> PlatformData<'a> {
    /// Queries the window system for the window and display handles.
    ///
    /// Returns `None` when either handle is unavailable (for example on
    /// Android before the native window exists).
    pub fn from_window<W>(window: &'a W) -> Option<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + ?Sized,
    {
        match Self::try_from_window(window) {
            Ok(data) => Some(data),
            Err(err) => {
                log::warn!("window system did not report native handles: {err}");
                None
            }
        }
    }

    fn try_from_window<W>(window: &'a W) -> Result<Self, HandleError>
    where
        W: HasWindowHandle + HasDisplayHandle + ?Sized,
    {
        Ok(Self {
            window: window.window_handle()?,
            display: window.display_handle()?,
        })
    }

    pub fn raw_window_handle(&self) -> RawWindowHandle {
        self.window.as_raw()
    }

    pub fn raw_display_handle(&self) -> RawDisplayHandle {
        self.display.as_raw()
    }

    /// Native window object (`Window`, `wl_surface*`, `HWND`, `NSView*`, ...).
    pub fn native_window_handle(&self) -> *mut c_void {
        native_window_handle(self.raw_window_handle())
    }

    /// Native display connection; null where the platform has none.
    pub fn native_display_handle(&self) -> *mut c_void {
        native_display_handle(self.raw_display_handle())
    }
}

impl HasWindowHandle for PlatformData<'_> {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Ok(self.window)
    }
}

impl HasDisplayHandle for PlatformData<'_> {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Ok(self.display)
    }
}

/// Maps a raw window handle to the pointer-sized native window object.
///
/// X11 window ids are integers, not pointers; they are returned as-is in a
/// pointer-sized slot.
pub fn native_window_handle(raw: RawWindowHandle) -> *mut c_void {
    match raw {
        RawWindowHandle::Xlib(h) => h.window as usize as *mut c_void,
        RawWindowHandle::Xcb(h) => h.window.get() as usize as *mut c_void,
        RawWindowHandle::Wayland(h) => h.surface.as_ptr(),
        RawWindowHandle::Win32(h) => h.hwnd.get() as *mut c_void,
        RawWindowHandle::AppKit(h) => h.ns_view.as_ptr(),
        RawWindowHandle::UiKit(h) => h.ui_view.as_ptr(),
        RawWindowHandle::AndroidNdk(h) => h.a_native_window.as_ptr(),
        other => {
            log::debug!("no native window mapping for {other:?}");
            ptr::null_mut()
        }
    }
}

/// Maps a raw display handle to the native display connection.
///
/// Only the Unix window systems have one; everything else yields null.
pub fn native_display_handle(raw: RawDisplayHandle) -> *mut c_void {
    match raw {
        RawDisplayHandle::Xlib(h) => h.display.map_or(ptr::null_mut(), |p| p.as_ptr()),
        RawDisplayHandle::Xcb(h) => h.connection.map_or(ptr::null_mut(), |p| p.as_ptr()),
        RawDisplayHandle::Wayland(h) => h.display.as_ptr(),
        _ => ptr::null_mut(),
    }
}
