//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - binding a Surface to the window's native handles and keeping it configured
//! - keeping the depth and multisample attachments sized to the surface
//! - acquiring frames and presenting them

mod error;
mod frame;
mod gpu;
mod init;
mod surface;
mod targets;

pub use error::SurfaceErrorAction;
pub use frame::{FrameAttachments, GpuFrame};
pub use gpu::Gpu;
pub use init::GpuInit;
pub use targets::DEPTH_FORMAT;
