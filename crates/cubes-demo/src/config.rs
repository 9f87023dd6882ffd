use cubes_engine::device::GpuInit;
use cubes_engine::window::RuntimeConfig;
use winit::dpi::LogicalSize;

use crate::cubes::ColorMask;
use crate::geometry::Topology;
use crate::shaders::ShaderSupply;

/// Settings of the cubes sample. Fixed at startup.
#[derive(Debug, Clone)]
pub struct CubesConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,

    /// View 0 clear color, `0xRRGGBBAA`.
    pub clear_rgba: u32,

    pub topology: Topology,
    pub color_mask: ColorMask,

    pub shaders: ShaderSupply,

    /// Backbuffer sample count.
    pub msaa_samples: u32,
}

impl Default for CubesConfig {
    fn default() -> Self {
        Self {
            title: "bgfx".to_string(),
            width: 1280,
            height: 720,
            clear_rgba: 0x3030_30ff,
            topology: Topology::TriangleList,
            color_mask: ColorMask::default(),
            shaders: ShaderSupply::default(),
            msaa_samples: 4,
        }
    }
}

impl CubesConfig {
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(f64::from(self.width), f64::from(self.height)),
            resizable: false,
        }
    }

    pub fn gpu_init(&self) -> GpuInit {
        GpuInit {
            // Vertex colors and the clear color are display values.
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            msaa_samples: self.msaa_samples,
            ..GpuInit::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CubesConfig::default();
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.clear_rgba, 0x3030_30ff);
        assert_eq!(config.topology, Topology::TriangleList);
        assert_eq!(config.shaders, ShaderSupply::bundled_files());
    }

    #[test]
    fn window_and_gpu_follow_config() {
        let config = CubesConfig {
            width: 640,
            height: 480,
            msaa_samples: 1,
            ..CubesConfig::default()
        };
        let runtime = config.runtime_config();
        assert_eq!(runtime.title, "bgfx");
        assert_eq!(runtime.initial_size, LogicalSize::new(640.0, 480.0));

        let gpu = config.gpu_init();
        assert_eq!(gpu.msaa_samples, 1);
        assert_eq!(gpu.present_mode, wgpu::PresentMode::Fifo);
        assert!(!gpu.prefer_srgb);
    }
}
