use serde::Serialize;

use crate::error::{Error, Result};

/// `list-sessions` format string; one `name:windows:attached` line per session
pub const LIST_FORMAT: &str = "#{session_name}:#{session_windows}:#{session_attached}";

/// A live tmux session as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub name: String,
    pub windows: usize,
    pub attached: bool,
}

impl Session {
    pub fn new(name: impl Into<String>, windows: usize, attached: bool) -> Self {
        Self {
            name: name.into(),
            windows,
            attached,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.attached {
            "attached"
        } else {
            "detached"
        }
    }
}

/// Parse the output of `list-sessions -F LIST_FORMAT`.
pub fn parse_session_list(output: &str) -> Result<Vec<Session>> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(parse_session_line)
        .collect()
}

fn parse_session_line(line: &str) -> Result<Session> {
    // Split from the right: the two numeric fields never contain ':'.
    let mut parts = line.rsplitn(3, ':');
    let (Some(attached), Some(windows), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::tmux(format!("Unexpected session line: {line:?}")));
    };

    let windows = windows
        .parse::<usize>()
        .map_err(|_| Error::tmux(format!("Invalid window count in {line:?}")))?;
    let clients = attached
        .parse::<u32>()
        .map_err(|_| Error::tmux(format!("Invalid attached flag in {line:?}")))?;

    Ok(Session::new(name, windows, clients > 0))
}
