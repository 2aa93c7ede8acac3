use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ember_gfx::{
    ContextConfig, GraphicsContext, NativeSurface, StateWatch, SurfaceSize, WgpuApi, WgpuContext,
};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::render_thread::{RenderCommand, RenderThread};

/// How often the event loop checks on the render thread while idle.
const RENDER_POLL: Duration = Duration::from_millis(100);

/// Viewer configuration.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub clear: wgpu::Color,
    pub gpu: ContextConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "ember viewer".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            clear: wgpu::Color {
                r: 0.08,
                g: 0.09,
                b: 0.12,
                a: 1.0,
            },
            gpu: ContextConfig::default().with_env_overrides(),
        }
    }
}

/// Creates the GPU instance on the main thread, then runs the event loop.
pub fn run(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

    let mut ctx = WgpuContext::new(WgpuApi::new(config.gpu.clone()));
    ctx.init_api().context("no usable GPU; nothing to fall back to")?;

    let mut state = ViewerState::new(config, ctx);

    event_loop
        .run_app(&mut state)
        .context("winit event loop terminated with error")?;

    state.shutdown();
    Ok(())
}

struct ViewerState {
    config: ViewerConfig,
    watch: StateWatch,

    /// Present while the main thread holds the context (before spawn, while suspended).
    ctx: Option<WgpuContext>,
    window: Option<Arc<Window>>,
    render: Option<RenderThread>,
}

impl ViewerState {
    fn new(config: ViewerConfig, ctx: WgpuContext) -> Self {
        Self {
            config,
            watch: ctx.watch(),
            ctx: Some(ctx),
            window: None,
            render: None,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<Arc<Window>> {
        if let Some(window) = &self.window {
            return Ok(Arc::clone(window));
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        self.window = Some(Arc::clone(&window));
        Ok(window)
    }

    fn start_rendering(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = self.ensure_window(event_loop)?;
        let Some(ctx) = self.ctx.take() else {
            return Ok(());
        };

        let size = surface_size(window.inner_size());
        let surface = NativeSurface::new(Arc::clone(&window));
        self.render = Some(RenderThread::spawn(ctx, surface, size, self.config.clear)?);
        Ok(())
    }

    /// Brings the context back to the main thread with its surface detached.
    fn stop_rendering(&mut self) {
        if let Some(render) = self.render.take() {
            self.ctx = render.stop();
        }
    }

    fn shutdown(&mut self) {
        self.stop_rendering();
        if let Some(mut ctx) = self.ctx.take() {
            ctx.shutdown();
            log::info!("graphics context {}", ctx.state());
        }
        self.window = None;
    }

    fn send(&self, cmd: RenderCommand) {
        if let Some(render) = &self.render {
            render.send(cmd);
        }
    }
}

impl ApplicationHandler for ViewerState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.render.is_some() {
            return;
        }

        if let Err(e) = self.start_rendering(event_loop) {
            log::error!("failed to start rendering: {e:#}");
            event_loop.exit();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        // The native surface may go away while suspended; detach until resumed.
        self.stop_rendering();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.watch.has_failed() {
            log::error!("graphics context failed to initialize; closing");
            self.shutdown();
            event_loop.exit();
            return;
        }

        if self.render.as_ref().is_some_and(|r| r.has_exited()) {
            log::error!("render thread stopped on its own; closing");
            self.shutdown();
            event_loop.exit();
            return;
        }

        // The render thread paces its own frames; wake up only to check on it.
        if self.render.is_some() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + RENDER_POLL));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                self.send(RenderCommand::Resize {
                    width: new_size.width,
                    height: new_size.height,
                });
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let new_size = window.inner_size();
                    self.send(RenderCommand::Resize {
                        width: new_size.width,
                        height: new_size.height,
                    });
                }
            }

            _ => {}
        }
    }
}

/// Some platforms report 0x0 before the first layout pass.
fn surface_size(size: PhysicalSize<u32>) -> SurfaceSize {
    SurfaceSize::new(size.width.max(1), size.height.max(1))
}
