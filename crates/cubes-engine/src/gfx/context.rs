use std::collections::HashSet;

use wgpu::util::DeviceExt;

use crate::device::{Gpu, SurfaceErrorAction};

use super::encoder::{Encoder, FrameCommands, View, ViewClear};
use super::handle::{
    IndexBufferHandle, ProgramHandle, ResourceTable, ShaderHandle, VertexBufferHandle,
};
use super::layout::VertexLayout;
use super::pipeline::{PipelineCache, PipelineKey, PipelineSource};
use super::shader;
use super::state::ClearFlags;
use super::uniforms::{self, DrawUniform, UniformRing};

/// Backend capabilities that affect how callers build matrices.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Caps {
    pub renderer: wgpu::Backend,
    /// Clip-space depth is `[-1, 1]` rather than `[0, 1]`.
    pub homogeneous_depth: bool,
    /// Texture/framebuffer row 0 is the bottom row.
    pub origin_bottom_left: bool,
    /// Backbuffer sample count.
    pub samples: u32,
    pub max_vertex_buffers: u32,
}

/// Outcome of [`Gfx::frame`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// Frame presented; carries the new frame number.
    Presented(u32),
    /// No backbuffer was available; the recorded work was dropped.
    Skipped,
    /// The device is unusable; the caller should shut down.
    Fatal,
}

struct VertexBuffer {
    buffer: wgpu::Buffer,
    layout: VertexLayout,
    count: u32,
}

struct IndexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

struct Shader {
    name: String,
    module: wgpu::ShaderModule,
}

struct Program {
    name: String,
    vs: wgpu::ShaderModule,
    fs: Option<wgpu::ShaderModule>,
    /// Shaders destroyed together with the program.
    owned_shaders: Vec<ShaderHandle>,
}

/// A draw with every handle resolved to GPU objects.
struct ResolvedDraw {
    view: u16,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    index: Option<(wgpu::Buffer, u32)>,
    uniform_offset: u32,
}

/// Handle-based rendering context on top of a [`Gpu`].
///
/// Resources are created and destroyed through handles; draws are recorded
/// into the [`Encoder`] and executed by [`Gfx::frame`], one render pass per
/// touched view in ascending view order.
pub struct Gfx {
    device: wgpu::Device,
    queue: wgpu::Queue,
    backend: wgpu::Backend,
    samples: u32,
    max_vertex_buffers: u32,

    vertex_buffers: ResourceTable<VertexBuffer>,
    index_buffers: ResourceTable<IndexBuffer>,
    shaders: ResourceTable<Shader>,
    programs: ResourceTable<Program>,

    bind_group_layout: wgpu::BindGroupLayout,
    uniforms: UniformRing,
    pipelines: PipelineCache,

    encoder: Encoder,
    frame_number: u32,

    /// Diagnostics already logged, so per-frame problems are reported once.
    warned: HashSet<&'static str>,
}

fn warn_once(
    warned: &mut HashSet<&'static str>,
    key: &'static str,
    msg: std::fmt::Arguments<'_>,
) {
    if warned.insert(key) {
        log::warn!("{msg}");
    }
}

impl Gfx {
    pub fn new(gpu: &Gpu<'_>) -> Self {
        let device = gpu.device().clone();
        let queue = gpu.queue().clone();
        let limits = device.limits();

        let bind_group_layout = uniforms::bind_group_layout(&device);
        let pipelines =
            PipelineCache::new(&device, &bind_group_layout, gpu.surface_format(), gpu.samples());

        log::info!(
            "gfx ready: {} backend, {:?}, {}x MSAA",
            gpu.backend().to_str(),
            gpu.surface_format(),
            gpu.samples()
        );

        Self {
            backend: gpu.backend(),
            samples: gpu.samples(),
            max_vertex_buffers: limits.max_vertex_buffers,
            uniforms: UniformRing::new(limits.min_uniform_buffer_offset_alignment),
            vertex_buffers: ResourceTable::new(),
            index_buffers: ResourceTable::new(),
            shaders: ResourceTable::new(),
            programs: ResourceTable::new(),
            bind_group_layout,
            pipelines,
            encoder: Encoder::new(),
            frame_number: 0,
            warned: HashSet::new(),
            device,
            queue,
        }
    }

    pub fn caps(&self) -> Caps {
        Caps {
            renderer: self.backend,
            // wgpu normalizes clip space and texture origin across backends.
            homogeneous_depth: false,
            origin_bottom_left: false,
            samples: self.samples,
            max_vertex_buffers: self.max_vertex_buffers,
        }
    }

    /// Backend the context renders with.
    pub fn renderer_type(&self) -> wgpu::Backend {
        self.backend
    }

    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    pub fn encoder(&mut self) -> &mut Encoder {
        &mut self.encoder
    }

    // ── resources ─────────────────────────────────────────────────────────

    /// Creates a static vertex buffer from interleaved `data`.
    pub fn create_vertex_buffer(
        &mut self,
        data: &[u8],
        layout: &VertexLayout,
    ) -> VertexBufferHandle {
        let stride = layout.stride() as usize;
        if data.is_empty() || data.len() % stride != 0 {
            log::warn!(
                "vertex data of {} bytes is not a whole number of {stride}-byte vertices",
                data.len()
            );
            return VertexBufferHandle::INVALID;
        }

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cubes vbo"),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX,
            });

        let entry = VertexBuffer {
            buffer,
            layout: layout.clone(),
            count: (data.len() / stride) as u32,
        };
        match self.vertex_buffers.insert(entry) {
            Some(idx) => VertexBufferHandle::from_raw(idx),
            None => {
                log::warn!("vertex buffer handles exhausted");
                VertexBufferHandle::INVALID
            }
        }
    }

    /// Creates a static 16-bit index buffer.
    pub fn create_index_buffer(&mut self, indices: &[u16]) -> IndexBufferHandle {
        if indices.is_empty() {
            log::warn!("empty index buffer");
            return IndexBufferHandle::INVALID;
        }

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cubes ibo"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let entry = IndexBuffer {
            buffer,
            count: indices.len() as u32,
        };
        match self.index_buffers.insert(entry) {
            Some(idx) => IndexBufferHandle::from_raw(idx),
            None => {
                log::warn!("index buffer handles exhausted");
                IndexBufferHandle::INVALID
            }
        }
    }

    /// Compiles a shader blob (WGSL text or SPIR-V). Returns
    /// [`ShaderHandle::INVALID`] and logs the reason on failure.
    pub fn create_shader(&mut self, name: &str, bytes: &[u8]) -> ShaderHandle {
        let source = match shader::decode_blob(bytes) {
            Ok(source) => source,
            Err(err) => {
                log::error!("shader \"{name}\": {err:#}");
                return ShaderHandle::INVALID;
            }
        };

        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source,
            });
        if let Some(err) = pollster::block_on(scope.pop()) {
            log::error!("shader \"{name}\" failed to compile: {err}");
            return ShaderHandle::INVALID;
        }

        let entry = Shader {
            name: name.to_owned(),
            module,
        };
        match self.shaders.insert(entry) {
            Some(idx) => {
                log::debug!("shader \"{name}\" -> {idx}");
                ShaderHandle::from_raw(idx)
            }
            None => {
                log::warn!("shader handles exhausted");
                ShaderHandle::INVALID
            }
        }
    }

    /// Links a vertex and an optional fragment shader.
    ///
    /// With `destroy_shaders` the shaders are released when the program is
    /// destroyed. The modules stay alive inside the program either way.
    pub fn create_program(
        &mut self,
        vs: ShaderHandle,
        fs: Option<ShaderHandle>,
        destroy_shaders: bool,
    ) -> ProgramHandle {
        let Some(vs_entry) = self.shaders.get(vs.raw()) else {
            log::warn!("create_program: invalid vertex shader {vs:?}");
            return ProgramHandle::INVALID;
        };
        let fs_entry = match fs {
            Some(fs) => match self.shaders.get(fs.raw()) {
                Some(entry) => Some(entry),
                None => {
                    log::warn!("create_program: invalid fragment shader {fs:?}");
                    return ProgramHandle::INVALID;
                }
            },
            None => None,
        };

        let name = match fs_entry {
            Some(f) => format!("{}+{}", vs_entry.name, f.name),
            None => vs_entry.name.clone(),
        };
        let program = Program {
            name,
            vs: vs_entry.module.clone(),
            fs: fs_entry.map(|f| f.module.clone()),
            owned_shaders: if destroy_shaders {
                std::iter::once(vs).chain(fs).collect()
            } else {
                Vec::new()
            },
        };

        let name = program.name.clone();
        match self.programs.insert(program) {
            Some(idx) => {
                log::debug!("program \"{name}\" -> {idx}");
                ProgramHandle::from_raw(idx)
            }
            None => {
                log::warn!("program handles exhausted");
                ProgramHandle::INVALID
            }
        }
    }

    pub fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) {
        if self.vertex_buffers.remove(handle.raw()).is_some() {
            self.pipelines.evict_vertex_buffer(handle);
        }
    }

    pub fn destroy_index_buffer(&mut self, handle: IndexBufferHandle) {
        self.index_buffers.remove(handle.raw());
    }

    pub fn destroy_shader(&mut self, handle: ShaderHandle) {
        self.shaders.remove(handle.raw());
    }

    pub fn destroy_program(&mut self, handle: ProgramHandle) {
        let Some(program) = self.programs.remove(handle.raw()) else { return };
        self.pipelines.evict_program(handle);
        for shader in program.owned_shaders {
            self.shaders.remove(shader.raw());
        }
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Executes everything recorded since the last frame and presents.
    pub fn frame(&mut self, gpu: &mut Gpu<'_>) -> FrameStatus {
        let commands = self.encoder.take_frame();

        let mut frame = match gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface lost for good; giving up");
                        FrameStatus::Fatal
                    }
                    _ => FrameStatus::Skipped,
                };
            }
        };

        let resolved = self.resolve(&commands);
        let width = frame.surface_texture.texture.width();
        let height = frame.surface_texture.texture.height();

        {
            let attachments = gpu.attachments(&frame.view);
            for (id, view) in &commands.views {
                let (color_load, depth_load) = load_ops(&view.clear, &mut self.warned);

                let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("cubes view pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: attachments.color,
                        resolve_target: attachments.resolve,
                        ops: wgpu::Operations {
                            load: color_load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: attachments.depth,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });

                // A view clipped to nothing still clears, but draws nothing.
                let Some((x, y, w, h)) = viewport(view, width, height) else { continue };
                rpass.set_viewport(x, y, w, h, 0.0, 1.0);

                let Some(bind_group) = self.uniforms.bind_group() else { continue };
                for draw in resolved.iter().filter(|d| d.view == *id) {
                    rpass.set_pipeline(&draw.pipeline);
                    rpass.set_bind_group(0, bind_group, &[draw.uniform_offset]);
                    rpass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                    match &draw.index {
                        Some((buffer, count)) => {
                            rpass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint16);
                            rpass.draw_indexed(0..*count, 0, 0..1);
                        }
                        None => rpass.draw(0..draw.vertex_count, 0..1),
                    }
                }
            }
        }

        gpu.submit(frame);
        self.frame_number = self.frame_number.wrapping_add(1);
        FrameStatus::Presented(self.frame_number)
    }

    /// Resolves handles, builds missing pipelines and uploads one MVP per
    /// surviving draw. Draws referencing dead resources are dropped.
    fn resolve(&mut self, commands: &FrameCommands) -> Vec<ResolvedDraw> {
        let mut resolved = Vec::with_capacity(commands.draws.len());
        let mut mvps = Vec::with_capacity(commands.draws.len());

        for (id, view) in &commands.views {
            let view_proj = view.view_proj();

            for (_, draw) in commands.draws_for(*id) {
                let Some(program) = self.programs.get(draw.program.raw()) else {
                    warn_once(
                        &mut self.warned,
                        "program",
                        format_args!("draw with invalid program {:?} discarded", draw.program),
                    );
                    continue;
                };
                let Some(fs) = program.fs.as_ref() else {
                    warn_once(
                        &mut self.warned,
                        "fragment",
                        format_args!("program \"{}\" has no fragment shader", program.name),
                    );
                    continue;
                };
                let Some(vb) = self.vertex_buffers.get(draw.vertex_buffer.raw()) else {
                    warn_once(
                        &mut self.warned,
                        "vertex",
                        format_args!("draw without a valid vertex buffer discarded"),
                    );
                    continue;
                };
                let index = if draw.index_buffer.is_valid() {
                    match self.index_buffers.get(draw.index_buffer.raw()) {
                        Some(ib) => Some((ib.buffer.clone(), ib.count)),
                        None => {
                            warn_once(
                                &mut self.warned,
                                "index",
                                format_args!("draw with destroyed index buffer discarded"),
                            );
                            continue;
                        }
                    }
                } else {
                    None
                };

                let key = PipelineKey {
                    program: draw.program,
                    vertex_buffer: draw.vertex_buffer,
                    state: draw.state,
                };
                let source = PipelineSource {
                    vs: &program.vs,
                    fs,
                    layout: &vb.layout,
                    label: &program.name,
                };
                let Some(pipeline) = self.pipelines.get_or_build(&self.device, key, source) else {
                    continue;
                };

                resolved.push(ResolvedDraw {
                    view: *id,
                    pipeline: pipeline.clone(),
                    vertex_buffer: vb.buffer.clone(),
                    vertex_count: vb.count,
                    index,
                    uniform_offset: self.uniforms.offset(mvps.len()),
                });
                mvps.push(DrawUniform::new(view_proj * draw.transform));
            }
        }

        self.uniforms
            .upload(&self.device, &self.queue, &self.bind_group_layout, &mvps);
        resolved
    }

    /// Releases every resource. Anything still alive at this point was
    /// leaked by the caller and is reported.
    pub fn shutdown(mut self) {
        let leaks = [
            ("vertex buffers", self.vertex_buffers.len()),
            ("index buffers", self.index_buffers.len()),
            ("programs", self.programs.len()),
            ("shaders", self.shaders.len()),
        ];
        for (kind, count) in leaks {
            if count > 0 {
                log::warn!("{count} {kind} still alive at shutdown");
            }
        }

        self.pipelines.clear();
        self.programs.clear();
        self.shaders.clear();
        self.index_buffers.clear();
        self.vertex_buffers.clear();
        log::info!("gfx shut down after {} frames", self.frame_number);
    }
}

/// Viewport of `view` clamped to a `width` x `height` backbuffer, or `None`
/// when nothing of it is visible.
/// Load operations for a view pass. The depth target has no stencil aspect,
/// so a stencil clear is reported once and otherwise ignored.
fn load_ops(
    clear: &ViewClear,
    warned: &mut HashSet<&'static str>,
) -> (wgpu::LoadOp<wgpu::Color>, wgpu::LoadOp<f32>) {
    if clear.flags.contains(ClearFlags::STENCIL) {
        warn_once(
            warned,
            "stencil-clear",
            format_args!("stencil clear requested but the depth target has no stencil; ignored"),
        );
    }
    let color = if clear.flags.contains(ClearFlags::COLOR) {
        wgpu::LoadOp::Clear(clear.color())
    } else {
        wgpu::LoadOp::Load
    };
    let depth = if clear.flags.contains(ClearFlags::DEPTH) {
        wgpu::LoadOp::Clear(clear.depth)
    } else {
        wgpu::LoadOp::Load
    };
    (color, depth)
}

fn viewport(view: &View, width: u32, height: u32) -> Option<(f32, f32, f32, f32)> {
    let (x, y, w, h) = match view.rect {
        Some(r) => (
            u32::from(r.x),
            u32::from(r.y),
            u32::from(r.width),
            u32::from(r.height),
        ),
        None => (0, 0, width, height),
    };

    let x = x.min(width);
    let y = y.min(height);
    let w = w.min(width - x);
    let h = h.min(height - y);
    if w == 0 || h == 0 {
        return None;
    }
    Some((x as f32, y as f32, w as f32, h as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::encoder::ViewRect;

    fn with_rect(x: u16, y: u16, width: u16, height: u16) -> View {
        View {
            rect: Some(ViewRect {
                x,
                y,
                width,
                height,
            }),
            ..View::default()
        }
    }

    #[test]
    fn no_rect_covers_backbuffer() {
        assert_eq!(
            viewport(&View::default(), 1280, 720),
            Some((0.0, 0.0, 1280.0, 720.0))
        );
    }

    #[test]
    fn rect_is_clamped_to_backbuffer() {
        let view = with_rect(0, 0, 1280, 720);
        assert_eq!(viewport(&view, 640, 480), Some((0.0, 0.0, 640.0, 480.0)));

        let view = with_rect(600, 400, 100, 100);
        assert_eq!(viewport(&view, 640, 480), Some((600.0, 400.0, 40.0, 80.0)));
    }

    #[test]
    fn offscreen_rect_is_skipped() {
        assert_eq!(viewport(&with_rect(700, 0, 10, 10), 640, 480), None);
        assert_eq!(viewport(&with_rect(0, 0, 0, 10), 640, 480), None);
    }

    // ── clear ops ─────────────────────────────────────────────────────────

    #[test]
    fn color_and_depth_clear_become_clear_ops() {
        let clear = ViewClear {
            flags: ClearFlags::COLOR | ClearFlags::DEPTH,
            rgba: 0x3030_30ff,
            depth: 1.0,
            stencil: 0,
        };
        let mut warned = HashSet::new();
        let (color, depth) = load_ops(&clear, &mut warned);
        assert!(matches!(color, wgpu::LoadOp::Clear(c) if c == clear.color()));
        assert!(matches!(depth, wgpu::LoadOp::Clear(d) if d == 1.0));
        assert!(warned.is_empty());
    }

    #[test]
    fn no_flags_load_previous_contents() {
        let mut warned = HashSet::new();
        let (color, depth) = load_ops(&ViewClear::default(), &mut warned);
        assert!(matches!(color, wgpu::LoadOp::Load));
        assert!(matches!(depth, wgpu::LoadOp::Load));
    }

    #[test]
    fn stencil_clear_is_reported_once() {
        let clear = ViewClear {
            flags: ClearFlags::DEPTH | ClearFlags::STENCIL,
            stencil: 7,
            ..ViewClear::default()
        };
        let mut warned = HashSet::new();
        let (_, depth) = load_ops(&clear, &mut warned);
        assert!(matches!(depth, wgpu::LoadOp::Clear(_)));
        assert!(warned.contains("stencil-clear"));

        load_ops(&clear, &mut warned);
        assert_eq!(warned.len(), 1);
    }
}
