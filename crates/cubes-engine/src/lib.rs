//! Cubes engine crate.
//!
//! Platform + GPU runtime for the cubes sample: native handle bridging, the
//! wgpu device/surface, a handle-based rendering layer and the event loop.

pub mod core;
pub mod device;
pub mod gfx;
pub mod platform;
pub mod time;
pub mod window;

pub mod logging;
