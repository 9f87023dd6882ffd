use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, InitCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::gfx::Gfx;
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "cubes".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            resizable: true,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until the window is closed or the
    /// app asks to exit.
    ///
    /// Errors from window/GPU creation and from `App::on_init` end the loop
    /// and are returned here.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,
    gfx: Option<Gfx>,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    started: bool,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            started: false,
            error: None,
        }
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        let mut entry = WindowEntryTryBuilder {
            clock: FrameClock::new(),
            gfx: None,
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        entry.with_mut(|fields| *fields.gfx = Some(Gfx::new(fields.gpu)));
        Ok(entry)
    }

    /// Creates the window, GPU and context, then runs `on_init`.
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let entry = self.create_window_entry(event_loop)?;
        let entry = self.entry.insert(entry);
        let app = &mut self.app;

        let result = entry.with_mut(|fields| {
            let Some(gfx) = fields.gfx.as_mut() else {
                anyhow::bail!("rendering context missing");
            };
            let mut ctx = InitCtx {
                window: WindowCtx {
                    id: fields.window.id(),
                    window: fields.window,
                },
                gpu: fields.gpu,
                gfx,
            };
            app.on_init(&mut ctx)
        });
        result.context("application init failed")?;

        // Animation time starts once init is done.
        entry.with_clock_mut(|clock| clock.reset_origin());
        entry.with_window(|w| w.request_redraw());
        Ok(())
    }

    /// Runs `on_shutdown` and tears down the context. Does nothing when
    /// already shut down.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut entry) = self.entry.take() {
            let app = &mut self.app;
            entry.with_gfx_mut(|gfx| {
                if let Some(mut gfx) = gfx.take() {
                    app.on_shutdown(&mut gfx);
                    gfx.shutdown();
                }
            });
            drop(entry);
            log::info!("window closed");
        }
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.shutdown(event_loop);
    }

    fn redraw(&mut self) -> AppControl {
        let Some(entry) = self.entry.as_mut() else {
            return AppControl::Continue;
        };
        let app = &mut self.app;

        entry.with_mut(|fields| {
            let Some(gfx) = fields.gfx.as_mut() else {
                return AppControl::Exit;
            };
            let time: FrameTime = fields.clock.tick();

            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: fields.window.id(),
                    window: fields.window,
                },
                gpu: fields.gpu,
                gfx,
                time,
            };
            app.on_frame(&mut ctx)
        })
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.entry.is_none() {
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.shutdown(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                }
            }

            WindowEvent::RedrawRequested => {
                if self.redraw() == AppControl::Exit {
                    self.shutdown(event_loop);
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.shutdown(event_loop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_matches_sample() {
        let config = RuntimeConfig::default();
        assert_eq!(config.title, "cubes");
        assert_eq!(config.initial_size, LogicalSize::new(1280.0, 720.0));
    }
}
