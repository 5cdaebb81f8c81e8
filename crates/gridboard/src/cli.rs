use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gridboard_layout::{LayoutEditor, TextSurface, default_layout};
use serde_json::json;
use tracing::info;

use crate::config::{GlobalArgs, GridboardConfig};
use crate::error::Result;
use crate::gateway::PersistenceGateway;
use crate::replay::{load_script, replay_events};
use crate::store::open_store;

#[derive(Debug, Parser)]
#[command(
    name = "gridboard",
    about = "Load, edit, and persist the dashboard panel layout",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load the layout and print it as a text grid and JSON.
    Show,

    /// Feed a JSON event script through the layout editor.
    Replay(ReplayArgs),

    /// Save the default layout for the panel set.
    Reset,
}

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// JSON array of input events.
    #[arg(long)]
    pub script: PathBuf,

    /// Print the final text grid after the transitions.
    #[arg(long = "show-grid")]
    pub show_grid: bool,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli, &mut std::io::stdout().lock())
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = GridboardConfig::from(cli.global);
    let mut gateway = PersistenceGateway::new(open_store(&config.store, config.timeout)?);
    match cli.command {
        Commands::Show => run_show(&config, &gateway, out),
        Commands::Replay(args) => run_replay(&config, &mut gateway, &args, out),
        Commands::Reset => run_reset(&config, &gateway, out),
    }
}

fn run_show(
    config: &GridboardConfig,
    gateway: &PersistenceGateway,
    out: &mut dyn Write,
) -> Result<()> {
    let loaded = gateway.load(&config.panels)?;
    let surface = TextSurface::new(&loaded.model);
    write!(out, "{}", surface.render())?;
    let report = json!({
        "store": gateway.store_location(),
        "source": loaded.origin,
        "layout": loaded.model.to_persistable(),
    });
    writeln!(out, "{report}")?;
    Ok(())
}

fn run_replay(
    config: &GridboardConfig,
    gateway: &mut PersistenceGateway,
    args: &ReplayArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let events = load_script(&args.script)?;
    let loaded = gateway.load(&config.panels)?;
    let mut surface = TextSurface::new(&loaded.model);
    let mut editor = LayoutEditor::new(loaded.model);
    let summary = replay_events(
        &mut editor,
        &events,
        &config.canvas,
        &mut surface,
        gateway,
        out,
    )?;
    let saves = gateway.wait_idle();
    info!(
        message = "replay.finished",
        events = summary.events,
        commits = summary.commits,
        saves_ok = saves.succeeded,
        saves_failed = saves.failed
    );
    if args.show_grid {
        write!(out, "{}", surface.render())?;
    }
    Ok(())
}

fn run_reset(
    config: &GridboardConfig,
    gateway: &PersistenceGateway,
    out: &mut dyn Write,
) -> Result<()> {
    let model = default_layout(&config.panels)?;
    gateway.save_now(&model.to_persistable())?;
    writeln!(
        out,
        "reset {} panels at {}",
        model.len(),
        gateway.store_location()
    )?;
    Ok(())
}
