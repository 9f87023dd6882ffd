use std::collections::HashMap;

use super::handle::{ProgramHandle, VertexBufferHandle};
use super::layout::VertexLayout;
use super::state::RenderState;

/// A render pipeline is fully determined by the program, the vertex layout
/// of the bound buffer and the draw state; target format and sample count
/// are fixed per context.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub program: ProgramHandle,
    pub vertex_buffer: VertexBufferHandle,
    pub state: RenderState,
}

pub(crate) struct PipelineSource<'a> {
    pub vs: &'a wgpu::ShaderModule,
    pub fs: &'a wgpu::ShaderModule,
    pub layout: &'a VertexLayout,
    pub label: &'a str,
}

/// Lazily built pipelines. A failed build is remembered so the error is
/// reported once rather than every frame.
pub(crate) struct PipelineCache {
    layout: wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    samples: u32,
    entries: HashMap<PipelineKey, Option<wgpu::RenderPipeline>>,
}

impl PipelineCache {
    pub(crate) fn new(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        samples: u32,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cubes pipeline layout"),
            bind_group_layouts: &[bind_group_layout],
            immediate_size: 0,
        });

        Self {
            layout,
            format,
            samples,
            entries: HashMap::new(),
        }
    }

    pub(crate) fn get_or_build(
        &mut self,
        device: &wgpu::Device,
        key: PipelineKey,
        source: PipelineSource<'_>,
    ) -> Option<&wgpu::RenderPipeline> {
        if !self.entries.contains_key(&key) {
            let built = self.build(device, key.state, &source);
            self.entries.insert(key, built);
        }
        self.entries.get(&key)?.as_ref()
    }

    fn build(
        &self,
        device: &wgpu::Device,
        state: RenderState,
        source: &PipelineSource<'_>,
    ) -> Option<wgpu::RenderPipeline> {
        let targets = [Some(wgpu::ColorTargetState {
            format: self.format,
            blend: None,
            write_mask: state.color_writes(),
        })];

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(source.label),
            layout: Some(&self.layout),

            vertex: wgpu::VertexState {
                module: source.vs,
                entry_point: None,
                compilation_options: Default::default(),
                buffers: &[source.layout.buffer_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: source.fs,
                entry_point: None,
                compilation_options: Default::default(),
                targets: &targets,
            }),

            primitive: state.primitive(),
            depth_stencil: Some(state.depth_stencil()),
            multisample: state.multisample(self.samples),

            multiview_mask: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            log::error!("pipeline \"{}\" ({state:?}) failed: {err}", source.label);
            return None;
        }

        log::debug!("built pipeline \"{}\" for {state:?}", source.label);
        Some(pipeline)
    }

    /// Drops pipelines built from `program`.
    pub(crate) fn evict_program(&mut self, program: ProgramHandle) {
        self.entries.retain(|k, _| k.program != program);
    }

    /// Drops pipelines built for `vertex_buffer`'s layout.
    pub(crate) fn evict_vertex_buffer(&mut self, vertex_buffer: VertexBufferHandle) {
        self.entries.retain(|k, _| k.vertex_buffer != vertex_buffer);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
