use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use orrery_assets::AssetCache;
use orrery_common::SurfaceSize;
use orrery_kernel::DEFAULT_VERTICAL_TILT;
use orrery_render::{
    DebugTextRenderer, FrameQueue, OffscreenSurface, RenderLoop, SceneContext, StepOutcome,
};
use orrery_scene::{PRESETS, SceneDescriptor, TICKS_PER_DAY, build_scene, preset};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orrery-cli", about = "CLI tool for orrery scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SceneArgs {
    /// Built-in scene
    #[arg(long, default_value = "solar-system")]
    preset: String,

    /// Scene file (YAML); overrides --preset
    #[arg(long)]
    scene: Option<PathBuf>,
}

impl SceneArgs {
    fn load(&self) -> anyhow::Result<SceneDescriptor> {
        match &self.scene {
            Some(path) => SceneDescriptor::from_path(path)
                .with_context(|| format!("load scene {}", path.display())),
            None => Ok(preset(&self.preset)?),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and defaults
    Info,
    /// List the built-in scenes
    Presets,
    /// Print a scene as YAML
    Dump {
        #[command(flatten)]
        scene: SceneArgs,
    },
    /// Build a scene and report problems
    Validate {
        #[command(flatten)]
        scene: SceneArgs,
        /// Directory texture paths are resolved against
        #[arg(long)]
        assets_root: Option<PathBuf>,
        /// Write the asset manifest (JSON) here
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Run the render loop headless for a number of ticks
    Simulate {
        #[command(flatten)]
        scene: SceneArgs,
        /// Number of frames (ticks) to run
        #[arg(short, long, default_value = "100")]
        ticks: u64,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// Print body states as JSON instead of the last frame
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Info => {
            println!("orrery-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("default vertical tilt: {DEFAULT_VERTICAL_TILT}");
            println!("ticks per day (presets): {TICKS_PER_DAY}");
            println!("presets: {}", PRESETS.join(", "));
        }
        Commands::Presets => {
            for name in PRESETS {
                let desc = preset(name)?;
                println!(
                    "{name:<16} {} bodies, {} attachments",
                    desc.bodies.len(),
                    desc.attachments.len()
                );
            }
        }
        Commands::Dump { scene } => {
            print!("{}", scene.load()?.to_yaml()?);
        }
        Commands::Validate {
            scene,
            assets_root,
            manifest,
        } => validate(&scene, assets_root.as_deref(), manifest.as_deref())?,
        Commands::Simulate {
            scene,
            ticks,
            width,
            height,
            json,
        } => simulate(&scene, ticks, SurfaceSize::new(width, height), json)?,
    }

    Ok(())
}

fn validate(
    scene: &SceneArgs,
    assets_root: Option<&Path>,
    manifest: Option<&Path>,
) -> anyhow::Result<()> {
    let desc = scene.load()?;
    let mut assets = AssetCache::new();
    let built = build_scene(&desc, &mut DebugTextRenderer::new(), &mut assets)?;
    println!(
        "{}: OK ({} bodies, {} attachments, {} textures)",
        built.name,
        built.system.registry().len(),
        built.system.registry().attachments().len(),
        assets.len()
    );
    if let Some(path) = manifest {
        assets.save(path)?;
        println!("manifest written to {}", path.display());
    }
    if let Some(root) = assets_root {
        let missing = assets.missing_under(root);
        for entry in &missing {
            println!("missing texture: {}", entry.path);
        }
        if !missing.is_empty() {
            bail!("{} texture(s) missing under {}", missing.len(), root.display());
        }
    }
    Ok(())
}

fn simulate(scene: &SceneArgs, ticks: u64, size: SurfaceSize, json: bool) -> anyhow::Result<()> {
    let desc = scene.load()?;
    let mut renderer = DebugTextRenderer::new();
    let built = build_scene(&desc, &mut renderer, &mut AssetCache::new())?;

    let mut render_loop = RenderLoop::new(SceneContext {
        system: built.system,
        camera: built.camera,
        renderer,
        surface: OffscreenSurface::new(size),
    });
    let mut queue = FrameQueue::new();
    render_loop.start(&mut queue);

    while queue.take() {
        if render_loop.frames() == ticks {
            render_loop.stop();
        }
        if render_loop.step(&mut queue)? == StepOutcome::Stopped {
            break;
        }
    }

    let ctx = render_loop.into_context();
    if json {
        println!("{}", serde_json::to_string_pretty(&ctx.system.states())?);
    } else {
        print!("{}", ctx.renderer.last_frame());
        println!(
            "tick={} frames={} hash={:#018x}",
            ctx.system.tick(),
            ctx.renderer.frames(),
            ctx.system.state_hash()
        );
    }
    Ok(())
}
