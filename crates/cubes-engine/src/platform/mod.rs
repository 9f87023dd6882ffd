//! Native window/display handle resolution.
//!
//! Bridges the windowing library's window object to the raw handles the GPU
//! layer binds its surface to.

mod handles;

pub use handles::{native_display_handle, native_window_handle, PlatformData};
