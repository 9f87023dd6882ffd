use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::platform::PlatformData;

use super::surface;
use super::targets::{self, RenderTargets, DEPTH_FORMAT};
use super::{FrameAttachments, GpuFrame, GpuInit, SurfaceErrorAction};

/// Owns the wgpu device, the window surface and the attachments that follow
/// the surface size.
///
/// `'w` is the borrow of the window the surface was created from.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels (may be zero while minimized).
    size: PhysicalSize<u32>,

    targets: RenderTargets,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let platform =
            PlatformData::from_window(window).context("window has no native handles")?;
        log::debug!(
            "native window {:p}, display {:p}",
            platform.native_window_handle(),
            platform.native_display_handle()
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        // SAFETY: the handles come from `window`, which is borrowed for `'w`;
        // the returned surface is `Surface<'w>` and cannot outlive it.
        let surface = unsafe {
            let target = wgpu::SurfaceTargetUnsafe::from_window(&platform)
                .context("failed to build surface target from native handles")?;
            instance
                .create_surface_unsafe(target)
                .context("failed to create wgpu surface")?
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("adapter \"{}\" ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("cubes device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        device.on_uncaptured_error(Arc::new(|err| {
            log::error!("wgpu: {err}");
        }));

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&caps, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        let samples = targets::supported_samples(
            init.msaa_samples,
            adapter.get_texture_format_features(format).flags,
            adapter.get_texture_format_features(DEPTH_FORMAT).flags,
        );
        if samples != init.msaa_samples.max(1) {
            log::warn!(
                "{}x msaa not supported for {format:?}; using {samples}x",
                init.msaa_samples
            );
        }
        let targets = RenderTargets::new(&device, format, size, samples);

        Ok(Self {
            surface,
            adapter,
            device,
            queue,
            config,
            size,
            targets,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Backbuffer sample count.
    pub fn samples(&self) -> u32 {
        self.targets.samples()
    }

    /// Backend the adapter runs on.
    pub fn backend(&self) -> wgpu::Backend {
        self.adapter.get_info().backend
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface after a resize. Zero sizes are recorded but
    /// configuration waits for a usable size.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        surface::apply_resize(&self.surface, &self.device, &mut self.config, new_size);
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&mut self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let texture_size = surface_texture.texture.size();
        let target_size = PhysicalSize::new(texture_size.width, texture_size.height);
        if !self.targets.matches(target_size) {
            self.targets = RenderTargets::new(
                &self.device,
                self.config.format,
                target_size,
                self.targets.samples(),
            );
        }

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cubes frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Attachments for rendering into `view`, the acquired backbuffer view.
    pub fn attachments<'a>(&'a self, view: &'a wgpu::TextureView) -> FrameAttachments<'a> {
        match self.targets.msaa() {
            Some(msaa) => FrameAttachments {
                color: msaa,
                resolve: Some(view),
                depth: self.targets.depth(),
            },
            None => FrameAttachments {
                color: view,
                resolve: None,
                depth: self.targets.depth(),
            },
        }
    }

    /// Submits the recorded commands and presents the frame.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action, reconfiguring
    /// the surface where that is the remedy.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        let action = SurfaceErrorAction::for_error(&err);
        if action == SurfaceErrorAction::Reconfigured
            && self.size.width > 0
            && self.size.height > 0
        {
            self.surface.configure(&self.device, &self.config);
        }
        log::debug!("surface error {err:?} -> {action:?}");
        action
    }
}
