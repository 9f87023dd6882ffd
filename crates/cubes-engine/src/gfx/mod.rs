//! Handle-based rendering layer.
//!
//! This module is responsible for:
//! - allocating vertex/index buffers, shaders and programs behind `u16` handles
//! - recording views and draw submissions on the CPU ([`Encoder`])
//! - turning recorded draws into cached pipelines and render passes once per frame

mod context;
mod encoder;
mod handle;
mod layout;
mod pipeline;
mod shader;
mod state;
mod uniforms;

pub use context::{Caps, FrameStatus, Gfx};
pub use encoder::{DrawCall, Encoder, FrameCommands, View, ViewClear, ViewId, ViewRect};
pub use handle::{
    HandleAlloc, IndexBufferHandle, MAX_HANDLES, ProgramHandle, ShaderHandle, VertexBufferHandle,
};
pub use layout::{Attrib, AttribType, VertexLayout, VertexLayoutBuilder};
pub use state::{ClearFlags, RenderState};
