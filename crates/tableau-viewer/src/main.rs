use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tableau_engine::device::GpuInit;
use tableau_engine::logging::{LoggingConfig, init_logging};
use tableau_engine::render::ReadbackMode;
use tableau_engine::texture::TextureCache;
use tableau_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

mod app;
mod assets;
mod manifest;

use app::ViewerApp;

/// Opens a layered scene in a window.
///
/// Keys: Left/Right slide, Z zoom, B blur setting, S parallax setting,
/// D hover descriptions, H hide the top layer, Escape close item or quit.
#[derive(Parser, Debug)]
#[command(name = "tableau-viewer", version)]
struct Cli {
    /// Scene definition (TOML)
    #[arg(value_name = "SCENE")]
    scene: PathBuf,

    /// Directory of PNG textures, named by file stem; defaults to the scene's directory
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Pick target width, overriding the scene file
    #[arg(long)]
    target_width: Option<u32>,

    /// Read picks back without stalling; results lag a frame
    #[arg(long)]
    deferred_readback: bool,

    /// env_logger filter, e.g. "tableau_scene=debug"
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let mut file = manifest::load(&cli.scene)?;
    if let Some(w) = cli.target_width {
        file.config.target_width = w;
    }

    let asset_dir = match &cli.assets {
        Some(dir) => dir.clone(),
        None => cli
            .scene
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let mut textures = TextureCache::new();
    let loaded = assets::load_dir(&asset_dir, &mut textures)
        .with_context(|| format!("loading assets from {}", asset_dir.display()))?;
    log::info!("{loaded} textures from {}", asset_dir.display());

    let readback = if cli.deferred_readback {
        ReadbackMode::Deferred
    } else {
        ReadbackMode::Blocking
    };

    let title = cli
        .scene
        .file_stem()
        .and_then(|s| s.to_str())
        .map_or_else(|| "tableau".to_string(), |s| format!("tableau · {s}"));

    Runtime::run(
        RuntimeConfig {
            title: title.clone(),
            initial_size: LogicalSize::new(cli.width, cli.height),
        },
        GpuInit::default(),
        ViewerApp::new(title, file.definition, file.config, textures, readback),
    )
}
