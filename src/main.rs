//! R-Droid Designer
//!
//! Command line entry point for inspecting and editing GridLayouts.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, Level};
use tracing_subscriber::FmtSubscriber;

use r_droid_designer::commands::{
    ActionCommand, ConfigCommand, DropCommand, GridAction, InspectCommand, OverlayCommand, ResizeCommand,
};
use r_droid_designer::core::{AppConfig, EventBus, RDroidError, APP_NAME, VERSION};
use r_droid_designer::layout::Rect;

#[derive(Parser)]
#[command(name = "r-droid-designer", version, about = "Edit Android GridLayouts from the command line")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the rows, columns and children of a layout's grid
    Inspect {
        layout: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Add or remove rows and columns around the selected views
    Action {
        layout: PathBuf,
        #[arg(value_enum)]
        action: GridAction,
        /// Ids of the selected views
        #[arg(short, long, value_delimiter = ',')]
        select: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Drop a new widget at a point of the grid
    Drop {
        layout: PathBuf,
        /// Widget class, e.g. Button
        #[arg(short, long)]
        tag: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(short, long)]
        x: i32,
        #[arg(short, long)]
        y: i32,
        #[arg(long, default_value_t = 96)]
        width: i32,
        #[arg(long, default_value_t = 48)]
        height: i32,
        /// Snap to existing cells only
        #[arg(long)]
        grid_mode: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resize a view to new bounds
    Resize {
        layout: PathBuf,
        /// Id of the view to resize
        #[arg(short, long)]
        select: String,
        #[arg(short, long)]
        x: i32,
        #[arg(short, long)]
        y: i32,
        #[arg(long)]
        width: i32,
        #[arg(long)]
        height: i32,
        /// Change row and column spans instead of pixel sizes
        #[arg(long)]
        span: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the overlay paint commands as JSON
    Paint {
        layout: PathBuf,
        #[arg(long)]
        structure: bool,
        #[arg(long)]
        debug: bool,
    },
    /// Show or toggle grid editor settings
    Config {
        /// Setting to flip: grid-mode, snap-to-grid, show-structure, debug-overlay
        #[arg(long)]
        toggle: Option<String>,
    },
}

impl Command {
    fn layout(&self) -> Option<&PathBuf> {
        match self {
            Command::Inspect { layout, .. }
            | Command::Action { layout, .. }
            | Command::Drop { layout, .. }
            | Command::Resize { layout, .. }
            | Command::Paint { layout, .. } => Some(layout),
            Command::Config { .. } => None,
        }
    }
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    debug!("{} v{} starting", APP_NAME, VERSION);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => AppConfig::config_file().ok_or_else(|| anyhow!("Cannot determine config path"))?,
    };
    let mut config = AppConfig::load_from(&config_path).await?;

    let events = Arc::new(EventBus::new());
    let subscription = events.subscribe();

    if let Some(layout) = cli.command.layout() {
        config.add_recent_layout(layout.clone());
        config.save_to(&config_path).await?;
    }

    let output = match cli.command {
        Command::Inspect { layout, json } => {
            InspectCommand { layout, json }.execute(&config, events).await
        }
        Command::Action { layout, action, select, output } => {
            ActionCommand { layout, action, select, output }
                .execute(&config, events)
                .await
        }
        Command::Drop { layout, tag, id, x, y, width, height, grid_mode, output } => {
            DropCommand { layout, tag, id, x, y, width, height, grid_mode, output }
                .execute(&config, events)
                .await
        }
        Command::Resize { layout, select, x, y, width, height, span, output } => {
            let bounds = Rect::new(x, y, width, height);
            ResizeCommand { layout, select, bounds, span, output }
                .execute(&config, events)
                .await
        }
        Command::Paint { layout, structure, debug } => {
            OverlayCommand { layout, structure, debug }.execute(&config, events).await
        }
        Command::Config { toggle } => {
            ConfigCommand { path: config_path, toggle }
                .execute(&mut config, events)
                .await
        }
    };
    let output = match output {
        Ok(output) => output,
        Err(err) => {
            if let Some(e) = err.downcast_ref::<RDroidError>() {
                error!("{}", e.user_message());
            }
            return Err(err);
        }
    };

    for event in subscription.drain() {
        debug!("Event: {:?}", event);
    }

    println!("{}", output.trim_end());
    Ok(())
}
