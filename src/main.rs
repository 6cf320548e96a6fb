use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use modelview::{ReloadPolicy, ViewerApp, ViewerConfig};

/// Minimal 3D model viewer: drag with the left mouse button to rotate, drop a
/// file onto the window to open it
#[derive(Parser, Debug)]
#[command(name = "modelview", version, about)]
struct CliArgs {
    /// Model file to open on startup (.obj or .stl)
    model: Option<PathBuf>,
    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1200)]
    width: u32,
    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 800)]
    height: u32,
    /// Distance from the eye to the model center
    #[arg(long, default_value_t = 20.0)]
    camera_distance: f32,
    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 45.0)]
    fov: f32,
    /// What to do with the current model when opening another one fails
    #[arg(long, value_enum, default_value_t = ReloadArg::Retain)]
    reload_policy: ReloadArg,
    /// Output debug info
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ReloadArg {
    /// Keep showing the previous model
    Retain,
    /// Drop the previous model before loading
    DiscardFirst,
}

impl From<ReloadArg> for ReloadPolicy {
    fn from(arg: ReloadArg) -> Self {
        match arg {
            ReloadArg::Retain => ReloadPolicy::RetainPrevious,
            ReloadArg::DiscardFirst => ReloadPolicy::DiscardFirst,
        }
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = ViewerConfig::default()
        .with_window_size(args.width, args.height)
        .with_camera_distance(args.camera_distance)
        .with_fov(args.fov)
        .with_reload_policy(args.reload_policy.into());

    ViewerApp::new(config, args.model)?.run()?;
    Ok(())
}
