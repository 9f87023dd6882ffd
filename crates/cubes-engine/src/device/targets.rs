use winit::dpi::PhysicalSize;

/// Depth buffer format shared by every pipeline the gfx layer builds.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Largest sample count not above `requested` that both the color and the
/// depth format support. Falls back to 1.
pub(crate) fn supported_samples(
    requested: u32,
    color: wgpu::TextureFormatFeatureFlags,
    depth: wgpu::TextureFormatFeatureFlags,
) -> u32 {
    [16, 8, 4, 2]
        .into_iter()
        .filter(|&n| n <= requested)
        .find(|&n| color.sample_count_supported(n) && depth.sample_count_supported(n))
        .unwrap_or(1)
}

/// Offscreen attachments that follow the surface size: the depth buffer and,
/// when multisampling, the color target that resolves into the backbuffer.
pub(crate) struct RenderTargets {
    depth: wgpu::TextureView,
    msaa: Option<wgpu::TextureView>,
    size: PhysicalSize<u32>,
    samples: u32,
}

impl RenderTargets {
    pub(crate) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        samples: u32,
    ) -> Self {
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));
        let samples = samples.max(1);

        let depth = create_target(device, "cubes depth target", DEPTH_FORMAT, size, samples);
        let msaa = (samples > 1)
            .then(|| create_target(device, "cubes msaa color target", format, size, samples));

        Self {
            depth,
            msaa,
            size,
            samples,
        }
    }

    pub(crate) fn depth(&self) -> &wgpu::TextureView {
        &self.depth
    }

    pub(crate) fn msaa(&self) -> Option<&wgpu::TextureView> {
        self.msaa.as_ref()
    }

    pub(crate) fn matches(&self, size: PhysicalSize<u32>) -> bool {
        self.size == size
    }

    pub(crate) fn samples(&self) -> u32 {
        self.samples
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
    samples: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: samples,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormatFeatureFlags as Flags;

    #[test]
    fn supported_count_is_kept() {
        let both = Flags::MULTISAMPLE_X2 | Flags::MULTISAMPLE_X4;
        assert_eq!(supported_samples(4, both, both), 4);
        assert_eq!(supported_samples(1, both, both), 1);
    }

    #[test]
    fn unsupported_count_falls_back() {
        let x2 = Flags::MULTISAMPLE_X2;
        let x2_x4 = Flags::MULTISAMPLE_X2 | Flags::MULTISAMPLE_X4;
        assert_eq!(supported_samples(4, x2, x2_x4), 2);
        assert_eq!(supported_samples(4, x2_x4, x2), 2);
        assert_eq!(supported_samples(8, x2_x4, x2_x4), 4);
        assert_eq!(supported_samples(4, Flags::empty(), x2_x4), 1);
    }
}
