//! Mediadock binary - runs the media controls service on the session bus.
//!
//! The default mode keeps running and prints the widget label whenever it
//! changes; the inspection subcommands take one snapshot and exit.

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use mediadock::{config::Config, service::MediaControls, tracing_config};

#[derive(Parser)]
#[command(name = "mediadock", about = "MPRIS media controls for dock widgets")]
struct Cli {
    /// Path to the config file (defaults to the XDG config location)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the controller and print the label on every change (default)
    Run,

    /// List discovered players and exit
    Players,

    /// Print the current label and exit
    Label,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_config::init()?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let controls = MediaControls::start(config).await?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Players => {
            let players = controls.players();
            if players.is_empty() {
                println!("No players available");
            }
            for entry in players {
                let marker = if entry.is_active { "*" } else { " " };
                println!("{marker} {}\t{}", entry.display_name, entry.id);
            }
        }
        Command::Label => {
            println!("{}", controls.label());
        }
        Command::Run => {
            info!("Watching for media state changes, Ctrl-C to exit");
            run_label_watch(&controls).await?;
        }
    }

    Ok(())
}

/// Prints the label every time the published state changes, until Ctrl-C.
async fn run_label_watch(controls: &MediaControls) -> Result<(), Box<dyn Error>> {
    let mut state_rx = controls.watch_state();
    let mut last_label = controls.label();
    println!("{last_label}");

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let label = controls.label();
                if label != last_label {
                    println!("{label}");
                    last_label = label;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
