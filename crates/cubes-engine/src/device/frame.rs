/// One acquired backbuffer image plus the encoder recording into it.
///
/// Short-lived: holding the surface texture blocks acquisition of the next
/// frame. Dropping it after [`Gpu::submit`](super::Gpu::submit) presents.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// Attachments a render pass writes for the current frame.
pub struct FrameAttachments<'a> {
    /// View rendered into: the multisampled target, or the backbuffer itself.
    pub color: &'a wgpu::TextureView,
    /// Backbuffer the multisampled target resolves into, if any.
    pub resolve: Option<&'a wgpu::TextureView>,
    pub depth: &'a wgpu::TextureView,
}
