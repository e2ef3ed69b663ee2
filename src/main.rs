use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use clap::Parser;
use muxdeck::cli::{run_cli, Args};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, EnvFilter};

const LOG_ENV: &str = "MUXDECK_LOG";

/// `<cache dir>/muxdeck/muxdeck.log`, or a sink when it cannot be opened.
/// The TUI owns the terminal, so nothing is logged to stderr.
fn log_writer() -> BoxMakeWriter {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("muxdeck")) else {
        return BoxMakeWriter::new(std::io::sink);
    };

    let file = fs::create_dir_all(&dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("muxdeck.log"))
    });

    match file {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(_) => BoxMakeWriter::new(std::io::sink),
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_writer())
        .init();

    let args = Args::parse();

    if let Err(e) = run_cli(args).await {
        tracing::error!("{e}");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
