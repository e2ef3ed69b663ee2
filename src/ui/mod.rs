mod app;
mod dialogs;
mod input;
mod list;
mod render;
mod selection;
mod theme;

pub use app::{spawn_repo_scan, App, CREATE_OPTIONS};
pub use dialogs::DeleteConfirmDialog;
pub use input::TextInput;
pub use list::FilteredList;
pub use selection::VisualSelection;
pub use theme::Theme;

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};

use crate::repo::Repository;
use crate::template::Template;
use crate::tmux::Session;

/// UI events, dispatched to the app one at a time
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyCode, KeyModifiers),
    Tick,
    Resize(u16, u16),
    /// Background repository scan finished
    ReposLoaded(Vec<Repository>),
    /// Attach (or client switch) returned control to us
    AttachFinished {
        session: String,
        error: Option<String>,
    },
}

/// Where the session being created comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Repository(Repository),
    Manual { name: String, path: PathBuf },
}

/// The active screen. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    SessionList,
    CreateMode,
    Loading,
    RepoList,
    ManualCreate,
    ManualDirectory { name: String },
    TemplateSelect { origin: Origin },
    RenameSession { target: String },
    ConfirmDelete(DeleteConfirmDialog),
}

/// Item behind a list row
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Session(&'a Session),
    Repository(&'a Repository),
    Template(&'a Template),
}

/// One row of the list on screen
#[derive(Debug, Clone)]
pub struct Row<'a> {
    pub entry: Entry<'a>,
    /// Matched character positions against the row's search text
    pub highlights: Vec<usize>,
    /// Part of the visual-mode selection
    pub marked: bool,
}
