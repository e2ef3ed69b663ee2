mod scanner;

pub use scanner::{expand_home, scan, MAX_DEPTH};

use std::path::PathBuf;

/// A git repository discovered under one of the configured roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub path: PathBuf,
}
