use anyhow::{Result, anyhow};
use clap::Parser;
use spincube_render::{CubeRenderer, RenderConfig};
use spincube_render_wgpu::WgpuContext;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "spincube-desktop", about = "Spinning colored cube")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Drawing surface width in pixels
    #[arg(long, default_value = "800")]
    width: u32,

    /// Drawing surface height in pixels
    #[arg(long, default_value = "600")]
    height: u32,
}

struct Running {
    window: Arc<Window>,
    ctx: WgpuContext,
    renderer: CubeRenderer,
}

struct CubeApp {
    size: PhysicalSize<u32>,
    config: RenderConfig,
    started: Instant,
    running: Option<Running>,
    failure: Option<anyhow::Error>,
}

impl CubeApp {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: PhysicalSize::new(width, height),
            config: RenderConfig::default(),
            started: Instant::now(),
            running: None,
            failure: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let attrs = Window::default_attributes()
            .with_title("Spinning Cube")
            .with_inner_size(self.size)
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let size = window.inner_size();
        let context = WgpuContext::new(window.clone(), size.width, size.height);
        let mut ctx = match pollster::block_on(context) {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!("context creation failed: {e}");
                eprintln!("Could not create a GPU context");
                return Err(anyhow!(e).context("Could not create a GPU context"));
            }
        };

        let mut renderer = spincube_render::setup(&mut ctx, &self.config)?;

        // First frame is drawn directly, without a scheduler timestamp.
        renderer.frame(&mut ctx, None)?;
        window.request_redraw();

        Ok(Running {
            window,
            ctx,
            renderer,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.failure = Some(err);
        self.running = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for CubeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.failure.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => {
                tracing::info!(
                    "cube running at {}x{} ({:?})",
                    self.size.width,
                    self.size.height,
                    running.ctx.surface_format()
                );
                self.running = Some(running);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let now = self.started.elapsed().as_secs_f64() * 1000.0;
                let Some(running) = &mut self.running else {
                    return;
                };

                if let Err(e) = running.renderer.frame(&mut running.ctx, Some(now)) {
                    self.fail(event_loop, e.into());
                    return;
                }
                running.window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("spincube-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = CubeApp::new(cli.width, cli.height);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
