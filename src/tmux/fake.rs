//! In-memory tmux stand-in for tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::template::WindowSpec;

use super::multiplexer::Multiplexer;
use super::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListSessions,
    NewSession {
        name: String,
        dir: PathBuf,
        window: WindowSpec,
    },
    NewWindow {
        session: String,
        dir: PathBuf,
        window: WindowSpec,
    },
    SelectWindow {
        session: String,
        window: String,
    },
    AttachSession(String),
    SwitchClient(String),
    RenameSession {
        old: String,
        new: String,
    },
    KillSession(String),
}

#[derive(Debug, Default)]
struct Failures {
    list: bool,
    new_session: bool,
    new_window_at: Option<usize>,
    select_window: bool,
    attach: bool,
    rename: bool,
    kill: HashSet<String>,
}

/// Records every call and keeps a session table that mutations update
#[derive(Debug, Default)]
pub struct FakeMultiplexer {
    sessions: Mutex<Vec<Session>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Failures>,
    new_window_count: Mutex<usize>,
}

impl FakeMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        let fake = Self::new();
        *fake.sessions.lock() = sessions;
        fake
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Calls other than `list-sessions`
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| *c != Call::ListSessions)
            .collect()
    }

    pub fn kills(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::KillSession(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn session_names(&self) -> Vec<String> {
        self.sessions.lock().iter().map(|s| s.name.clone()).collect()
    }

    pub fn fail_list(&self) {
        self.failures.lock().list = true;
    }

    pub fn fail_new_session(&self) {
        self.failures.lock().new_session = true;
    }

    /// Fail the `n`th `new-window` call (1-based)
    pub fn fail_new_window_at(&self, n: usize) {
        self.failures.lock().new_window_at = Some(n);
    }

    pub fn fail_select_window(&self) {
        self.failures.lock().select_window = true;
    }

    pub fn fail_attach(&self) {
        self.failures.lock().attach = true;
    }

    pub fn fail_rename(&self) {
        self.failures.lock().rename = true;
    }

    pub fn fail_kill(&self, name: &str) {
        self.failures.lock().kill.insert(name.to_string());
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl Multiplexer for FakeMultiplexer {
    fn list_sessions(&self) -> Result<Vec<Session>> {
        self.record(Call::ListSessions);
        if self.failures.lock().list {
            return Err(Error::tmux("server exploded"));
        }
        Ok(self.sessions.lock().clone())
    }

    fn new_session(&self, name: &str, dir: &Path, window: &WindowSpec) -> Result<()> {
        self.record(Call::NewSession {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            window: window.clone(),
        });
        if self.failures.lock().new_session {
            return Err(Error::tmux("duplicate session"));
        }
        self.sessions.lock().push(Session::new(name, 1, false));
        Ok(())
    }

    fn new_window(&self, session: &str, dir: &Path, window: &WindowSpec) -> Result<()> {
        self.record(Call::NewWindow {
            session: session.to_string(),
            dir: dir.to_path_buf(),
            window: window.clone(),
        });
        let n = {
            let mut count = self.new_window_count.lock();
            *count += 1;
            *count
        };
        if self.failures.lock().new_window_at == Some(n) {
            return Err(Error::tmux("no space for new window"));
        }
        if let Some(s) = self.sessions.lock().iter_mut().find(|s| s.name == session) {
            s.windows += 1;
        }
        Ok(())
    }

    fn select_window(&self, session: &str, window: &str) -> Result<()> {
        self.record(Call::SelectWindow {
            session: session.to_string(),
            window: window.to_string(),
        });
        if self.failures.lock().select_window {
            return Err(Error::tmux("can't find window"));
        }
        Ok(())
    }

    fn attach_session(&self, name: &str) -> Result<()> {
        self.record(Call::AttachSession(name.to_string()));
        if self.failures.lock().attach {
            return Err(Error::tmux("Failed to attach to session"));
        }
        Ok(())
    }

    fn switch_client(&self, name: &str) -> Result<()> {
        self.record(Call::SwitchClient(name.to_string()));
        if self.failures.lock().attach {
            return Err(Error::tmux("no current client"));
        }
        Ok(())
    }

    fn rename_session(&self, old: &str, new: &str) -> Result<()> {
        self.record(Call::RenameSession {
            old: old.to_string(),
            new: new.to_string(),
        });
        if self.failures.lock().rename {
            return Err(Error::tmux("duplicate session"));
        }
        if let Some(s) = self.sessions.lock().iter_mut().find(|s| s.name == old) {
            s.name = new.to_string();
        }
        Ok(())
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        self.record(Call::KillSession(name.to_string()));
        if self.failures.lock().kill.contains(name) {
            return Err(Error::tmux(format!("can't find session: {name}")));
        }
        self.sessions.lock().retain(|s| s.name != name);
        Ok(())
    }
}
