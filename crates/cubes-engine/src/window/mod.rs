//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, and wires them to the
//! GPU and rendering layers.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
