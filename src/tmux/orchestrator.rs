use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::template::Template;

use super::manager::is_inside_tmux;
use super::multiplexer::Multiplexer;
use super::Session;

/// Turns user intent into tmux operations
#[derive(Clone)]
pub struct SessionOrchestrator {
    mux: Arc<dyn Multiplexer>,
    inside_client: bool,
}

impl SessionOrchestrator {
    pub fn new(mux: Arc<dyn Multiplexer>, inside_client: bool) -> Self {
        Self { mux, inside_client }
    }

    /// Detect from the environment whether attach should switch clients
    pub fn from_env(mux: Arc<dyn Multiplexer>) -> Self {
        Self::new(mux, is_inside_tmux())
    }

    pub fn inside_client(&self) -> bool {
        self.inside_client
    }

    /// Query the live session list
    pub fn list(&self) -> Result<Vec<Session>> {
        self.mux.list_sessions()
    }

    /// Create `name` in `path` with the windows of `template`.
    ///
    /// The first window creates the session; the rest are added in order and the
    /// first failure aborts. Focusing `template.focused_window` is best-effort.
    pub fn create_session(&self, name: &str, path: &Path, template: &Template) -> Result<()> {
        let Some((first, rest)) = template.windows.split_first() else {
            return Err(Error::invalid_input(format!(
                "Template '{}' has no windows",
                template.name
            )));
        };

        self.mux.new_session(name, path, first)?;

        for (i, window) in rest.iter().enumerate() {
            let position = i + 2;
            if let Err(e) = self.mux.new_window(name, path, window) {
                tracing::warn!("Window {position} of session {name} failed: {e}");
                let detail = match e {
                    Error::Tmux(msg) => msg,
                    other => other.to_string(),
                };
                return Err(Error::tmux(format!(
                    "Failed to create window {position}: {detail}"
                )));
            }
        }

        if let Some(focus) = template.focused_window() {
            if let Err(e) = self.mux.select_window(name, focus) {
                tracing::debug!("Ignoring focus failure for {name}:{focus}: {e}");
            }
        }

        tracing::info!(
            "Created session {name} in {} from template {}",
            path.display(),
            template.name
        );
        Ok(())
    }

    /// Attach to `name`, or switch the current client when already inside tmux
    pub fn attach(&self, name: &str) -> Result<()> {
        if self.inside_client {
            self.mux.switch_client(name)
        } else {
            self.mux.attach_session(name)
        }
    }

    /// Rename a session; callers check that `new` is non-empty and differs
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        self.mux.rename_session(old, new)?;
        tracing::info!("Renamed session {old} to {new}");
        Ok(())
    }

    /// Kill a session; callers confirm first when it is attached
    pub fn kill(&self, name: &str) -> Result<()> {
        self.mux.kill_session(name)?;
        tracing::info!("Killed session {name}");
        Ok(())
    }
}

/// Session name derived from the last component of `base_path`, suffixed with
/// `_2`, `_3`, ... until it does not collide with `existing`.
///
/// tmux rejects `.` and `:` in session names, so they become `_`.
pub fn generate_unique_name(base_path: &Path, existing: &[Session]) -> String {
    let base = base_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "session".to_string())
        .replace(['.', ':'], "_");

    let taken = |candidate: &str| existing.iter().any(|s| s.name == candidate);

    let mut name = base.clone();
    let mut counter = 1;
    while taken(&name) {
        counter += 1;
        name = format!("{base}_{counter}");
    }
    name
}
