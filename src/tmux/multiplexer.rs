use std::path::Path;

use crate::error::Result;
use crate::template::WindowSpec;

use super::Session;

/// Blocking capability interface over the tmux server.
///
/// Each call is one blocking round trip to the external tool.
pub trait Multiplexer: Send + Sync {
    /// Live sessions; an empty list when no server is running
    fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Create a detached session whose first window runs in `dir`
    fn new_session(&self, name: &str, dir: &Path, window: &WindowSpec) -> Result<()>;

    /// Append a window to an existing session
    fn new_window(&self, session: &str, dir: &Path, window: &WindowSpec) -> Result<()>;

    fn select_window(&self, session: &str, window: &str) -> Result<()>;

    /// Attach the controlling terminal; blocks until the client detaches
    fn attach_session(&self, name: &str) -> Result<()>;

    /// Move the current client (we are inside tmux) to another session
    fn switch_client(&self, name: &str) -> Result<()>;

    fn rename_session(&self, old: &str, new: &str) -> Result<()>;

    fn kill_session(&self, name: &str) -> Result<()>;
}
