use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "muxdeck")]
#[command(version, about = "Interactive tmux session manager", long_about = None)]
pub struct Args {
    /// Configuration file (default: <config dir>/muxdeck/config.toml)
    #[arg(short, long, global = true, env = "MUXDECK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List live tmux sessions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the configured session templates
    Templates {
        /// Show a single template
        #[arg(short, long)]
        name: Option<String>,
    },
}
