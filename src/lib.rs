pub mod cli;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod repo;
pub mod template;
pub mod tmux;
pub mod ui;

pub use error::{Error, Result};

/// Version of muxdeck
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
