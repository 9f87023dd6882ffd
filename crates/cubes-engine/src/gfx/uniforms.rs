use bytemuck::{Pod, Zeroable};
use glam::Mat4;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct DrawUniform {
    pub model_view_proj: [[f32; 4]; 4],
}

impl DrawUniform {
    pub(crate) fn new(mvp: Mat4) -> Self {
        Self {
            model_view_proj: mvp.to_cols_array_2d(),
        }
    }
}

const DRAW_UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;

/// Rounds `size` up to a multiple of `align` (`align` > 0).
pub(crate) fn align_to(size: u64, align: u64) -> u64 {
    size.div_ceil(align) * align
}

pub(crate) fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("cubes draw bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(DRAW_UNIFORM_SIZE),
            },
            count: None,
        }],
    })
}

/// One uniform slot per draw, addressed with a dynamic offset.
pub(crate) struct UniformRing {
    stride: u64,
    capacity: usize,
    buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    staging: Vec<u8>,
}

impl UniformRing {
    pub(crate) fn new(min_offset_alignment: u32) -> Self {
        Self {
            stride: align_to(DRAW_UNIFORM_SIZE, u64::from(min_offset_alignment.max(1))),
            capacity: 0,
            buffer: None,
            bind_group: None,
            staging: Vec::new(),
        }
    }

    /// Dynamic offset of slot `index`.
    pub(crate) fn offset(&self, index: usize) -> u32 {
        (index as u64 * self.stride) as u32
    }

    pub(crate) fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    /// Writes `uniforms` into consecutive slots, growing the buffer if needed.
    pub(crate) fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        uniforms: &[DrawUniform],
    ) {
        if uniforms.is_empty() {
            return;
        }
        self.ensure_capacity(device, layout, uniforms.len());
        let Some(buffer) = self.buffer.as_ref() else { return };

        self.staging.clear();
        self.staging.resize(uniforms.len() * self.stride as usize, 0);
        for (slot, u) in self
            .staging
            .chunks_exact_mut(self.stride as usize)
            .zip(uniforms)
        {
            slot[..DRAW_UNIFORM_SIZE as usize].copy_from_slice(bytemuck::bytes_of(u));
        }

        queue.write_buffer(buffer, 0, &self.staging);
    }

    fn ensure_capacity(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        required: usize,
    ) {
        if required <= self.capacity && self.buffer.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(256);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cubes draw ubo"),
            size: new_cap as u64 * self.stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cubes draw bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(DRAW_UNIFORM_SIZE),
                }),
            }],
        });

        log::debug!("draw uniform ring grown to {new_cap} slots");
        self.buffer = Some(buffer);
        self.bind_group = Some(bind_group);
        self.capacity = new_cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_one_mat4() {
        assert_eq!(DRAW_UNIFORM_SIZE, 64);
    }

    #[test]
    fn stride_respects_device_alignment() {
        assert_eq!(UniformRing::new(256).offset(1), 256);
        assert_eq!(UniformRing::new(64).offset(1), 64);
        assert_eq!(UniformRing::new(0).offset(1), 64);
        assert_eq!(UniformRing::new(48).offset(1), 96);
    }

    #[test]
    fn offsets_are_stride_multiples() {
        let ring = UniformRing::new(256);
        assert_eq!(ring.offset(0), 0);
        assert_eq!(ring.offset(3), 768);
    }

    #[test]
    fn mvp_is_column_major() {
        let m = Mat4::from_translation(glam::vec3(1.0, 2.0, 3.0));
        let u = DrawUniform::new(m);
        assert_eq!(u.model_view_proj[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
