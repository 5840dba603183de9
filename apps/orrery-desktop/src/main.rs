use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use orrery_assets::AssetCache;
use orrery_common::SurfaceSize;
use orrery_render::{
    DisplaySurface, PerspectiveCamera, RenderLoop, SceneContext, Scheduler, StepOutcome,
};
use orrery_render_wgpu::WgpuRenderer;
use orrery_scene::{SceneDescriptor, build_scene, preset};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "orrery-desktop", about = "Run an orrery scene in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Built-in scene to run
    #[arg(long, default_value = "solar-system")]
    preset: String,

    /// Scene file (YAML); overrides --preset
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Directory texture paths are resolved against
    #[arg(long, default_value = ".")]
    assets_root: PathBuf,

    /// Initial window width
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height
    #[arg(long, default_value = "720")]
    height: u32,
}

/// The window's drawable area. Layout follows the window; the backing size is
/// what the renderer was last configured with.
struct WindowSurface {
    window: Arc<Window>,
    backing: SurfaceSize,
}

impl DisplaySurface for WindowSurface {
    fn backing_size(&self) -> SurfaceSize {
        self.backing
    }

    fn layout_size(&self) -> SurfaceSize {
        let size = self.window.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn resize_backing(&mut self, size: SurfaceSize) {
        self.backing = size;
    }
}

/// Schedules the next step on the window's next redraw.
struct WindowScheduler(Arc<Window>);

impl Scheduler for WindowScheduler {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

type DesktopLoop = RenderLoop<WgpuRenderer, PerspectiveCamera, WindowSurface>;

struct App {
    scene: SceneDescriptor,
    assets_root: PathBuf,
    initial_size: SurfaceSize,
    window: Option<Arc<Window>>,
    render_loop: Option<DesktopLoop>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(scene: SceneDescriptor, assets_root: PathBuf, initial_size: SurfaceSize) -> Self {
        Self {
            scene,
            assets_root,
            initial_size,
            window: None,
            render_loop: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(format!("Orrery: {}", self.scene.name))
            .with_inner_size(PhysicalSize::new(
                self.initial_size.width,
                self.initial_size.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let inner = window.inner_size();
        let size = SurfaceSize::new(inner.width, inner.height).at_least_one();
        let mut renderer = WgpuRenderer::new(window.clone(), size)?;

        let mut assets = AssetCache::new();
        let built = build_scene(&self.scene, &mut renderer, &mut assets)?;
        for missing in assets.missing_under(&self.assets_root) {
            tracing::warn!(path = %missing.path, "texture not found under assets root");
        }
        tracing::info!(
            scene = %built.name,
            bodies = built.system.registry().len(),
            textures = assets.len(),
            "scene built"
        );

        let mut render_loop = RenderLoop::new(SceneContext {
            system: built.system,
            camera: built.camera,
            renderer,
            surface: WindowSurface {
                window: window.clone(),
                backing: size,
            },
        });
        render_loop.start(&mut WindowScheduler(window.clone()));

        self.window = Some(window);
        self.render_loop = Some(render_loop);
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(render_loop) = &mut self.render_loop {
            render_loop.stop();
        }
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::Resized(_) => {
                // The next step picks the new size up through check_resize.
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                let (Some(window), Some(render_loop)) = (&self.window, &mut self.render_loop)
                else {
                    return;
                };
                let mut scheduler = WindowScheduler(window.clone());
                match render_loop.step(&mut scheduler) {
                    Ok(StepOutcome::Drawn { .. }) | Ok(StepOutcome::NotRunning) => {}
                    Ok(StepOutcome::Stopped) => event_loop.exit(),
                    Err(e) => self.fail(event_loop, e.into()),
                }
            }
            _ => {}
        }
    }
}

fn load_scene(cli: &Cli) -> Result<SceneDescriptor> {
    match &cli.scene {
        Some(path) => SceneDescriptor::from_path(path)
            .with_context(|| format!("load scene {}", path.display())),
        None => Ok(preset(&cli.preset)?),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let scene = load_scene(&cli)?;
    tracing::info!(scene = %scene.name, "orrery-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(
        scene,
        cli.assets_root,
        SurfaceSize::new(cli.width, cli.height),
    );
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
