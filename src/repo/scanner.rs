use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};

use super::Repository;

/// How far below a configured root repositories are searched for
pub const MAX_DEPTH: usize = 3;

const GIT_DIR: &str = ".git";

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Find git repositories under `directories`.
///
/// Never fails: roots that are missing or unreadable are skipped.
pub fn scan<S: AsRef<str>>(directories: &[S]) -> Vec<Repository> {
    let mut repos = Vec::new();
    let mut seen = HashSet::new();

    for dir in directories {
        let dir = dir.as_ref().trim();
        if dir.is_empty() {
            continue;
        }

        let root = expand_home(dir);
        let root = std::path::absolute(&root).unwrap_or(root);
        if !root.is_dir() {
            tracing::debug!("Skipping missing repo directory {}", root.display());
            continue;
        }

        for repo in scan_root(&root) {
            if seen.insert(repo.path.clone()) {
                repos.push(repo);
            }
        }
    }

    repos.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    repos
}

fn scan_root(root: &Path) -> Vec<Repository> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .max_depth(Some(MAX_DEPTH))
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .build();

    let mut repos = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            continue;
        }

        let path = entry.path();
        if path.join(GIT_DIR).is_dir() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            repos.push(Repository {
                name,
                path: path.to_path_buf(),
            });
        }
    }

    repos
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
