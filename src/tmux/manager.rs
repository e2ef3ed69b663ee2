use std::path::Path;
use std::process::{Command, Output};

use crate::error::{Error, Result};
use crate::template::WindowSpec;

use super::multiplexer::Multiplexer;
use super::session::{parse_session_list, Session, LIST_FORMAT};
use super::NO_SESSIONS_EXIT_CODE;

/// Whether this process runs inside a tmux client
pub fn is_inside_tmux() -> bool {
    std::env::var_os("TMUX").is_some_and(|v| !v.is_empty())
}

/// Tmux manager - runs tmux subprocesses on the caller's thread
#[derive(Debug, Default)]
pub struct TmuxManager;

impl TmuxManager {
    pub fn new() -> Self {
        Self
    }

    /// Check if tmux is available on PATH
    pub fn is_available() -> bool {
        Command::new("tmux").arg("-V").output().is_ok()
    }

    fn tmux_cmd(&self) -> Command {
        Command::new("tmux")
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!("tmux {}", args.join(" "));
        self.tmux_cmd()
            .args(args)
            .output()
            .map_err(|e| Error::tmux(format!("Failed to run tmux: {e}")))
    }

    /// Run a tmux command, turning a non-zero exit into an error
    fn run(&self, args: &[&str], what: &str) -> Result<()> {
        let output = self.output(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::tmux(format!("{what}: {}", stderr.trim())));
        }
        Ok(())
    }

    /// Shared tail of `new-session` / `new-window`: directory, name and command
    fn window_args(args: &mut Vec<String>, dir: &Path, window: &WindowSpec) {
        args.push("-c".to_string());
        args.push(dir.to_string_lossy().to_string());

        if let Some(name) = window.name() {
            args.push("-n".to_string());
            args.push(name.to_string());
        }

        // Keep a shell alive after the command exits so the window stays open.
        if let Some(command) = window.command() {
            args.push("sh".to_string());
            args.push("-c".to_string());
            args.push(format!("{command}; exec $SHELL"));
        }
    }
}

/// Map a finished `list-sessions` run to its session rows.
///
/// `code` is `None` when the process was killed by a signal. The "no server
/// running" exit means there are no sessions, not a failure.
fn sessions_from_output(
    code: Option<i32>,
    stdout: &[u8],
    stderr: &[u8],
) -> Result<Vec<Session>> {
    match code {
        Some(0) => parse_session_list(&String::from_utf8_lossy(stdout)),
        Some(NO_SESSIONS_EXIT_CODE) => Ok(Vec::new()),
        _ => {
            let stderr = String::from_utf8_lossy(stderr);
            Err(Error::tmux(format!(
                "Failed to list sessions: {}",
                stderr.trim()
            )))
        }
    }
}

impl Multiplexer for TmuxManager {
    fn list_sessions(&self) -> Result<Vec<Session>> {
        let output = self.output(&["list-sessions", "-F", LIST_FORMAT])?;
        let code = if output.status.success() {
            Some(0)
        } else {
            output.status.code()
        };
        sessions_from_output(code, &output.stdout, &output.stderr)
    }

    fn new_session(&self, name: &str, dir: &Path, window: &WindowSpec) -> Result<()> {
        let mut args = vec![
            "new-session".to_string(),
            "-d".to_string(),
            "-s".to_string(),
            name.to_string(),
        ];
        Self::window_args(&mut args, dir, window);

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args, "Failed to create session")
    }

    fn new_window(&self, session: &str, dir: &Path, window: &WindowSpec) -> Result<()> {
        let mut args = vec![
            "new-window".to_string(),
            "-t".to_string(),
            session.to_string(),
        ];
        Self::window_args(&mut args, dir, window);

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args, "Failed to create window")
    }

    fn select_window(&self, session: &str, window: &str) -> Result<()> {
        let target = format!("{session}:{window}");
        self.run(&["select-window", "-t", &target], "Failed to select window")
    }

    fn attach_session(&self, name: &str) -> Result<()> {
        tracing::debug!("tmux attach-session -t {name}");
        // Inherits stdin/stdout/stderr; returns when the client detaches.
        let status = self
            .tmux_cmd()
            .args(["attach-session", "-t", name])
            .status()?;

        if !status.success() {
            return Err(Error::tmux("Failed to attach to session"));
        }

        Ok(())
    }

    fn switch_client(&self, name: &str) -> Result<()> {
        self.run(&["switch-client", "-t", name], "Failed to switch client")
    }

    fn rename_session(&self, old: &str, new: &str) -> Result<()> {
        self.run(
            &["rename-session", "-t", old, new],
            "Failed to rename session",
        )
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        self.run(&["kill-session", "-t", name], "Failed to kill session")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_args_wraps_command() {
        let mut args = Vec::new();
        let window = WindowSpec::new(Some("editor"), Some("nvim ."));
        TmuxManager::window_args(&mut args, Path::new("/src/app"), &window);
        assert_eq!(
            args,
            vec!["-c", "/src/app", "-n", "editor", "sh", "-c", "nvim .; exec $SHELL"]
        );
    }

    #[test]
    fn test_window_args_plain_shell() {
        let mut args = Vec::new();
        TmuxManager::window_args(&mut args, Path::new("/src/app"), &WindowSpec::default());
        assert_eq!(args, vec!["-c", "/src/app"]);
    }

    #[test]
    fn test_no_server_exit_is_an_empty_list() {
        let sessions =
            sessions_from_output(Some(NO_SESSIONS_EXIT_CODE), b"", b"no server running").unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_other_list_failures_are_errors() {
        let err = sessions_from_output(Some(2), b"", b"unknown option\n").unwrap_err();
        assert!(matches!(err, Error::Tmux(_)));
        assert_eq!(err.to_string(), "Tmux error: Failed to list sessions: unknown option");

        let err = sessions_from_output(None, b"", b"").unwrap_err();
        assert!(matches!(err, Error::Tmux(_)));
    }

    #[test]
    fn test_successful_list_is_parsed() {
        let sessions = sessions_from_output(Some(0), b"api:3:1\ndocs:1:0\n", b"").unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].name, "api");
        assert!(sessions[0].attached);
        assert!(!sessions[1].attached);
    }
}
