use std::io;
use std::mem;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{Config, KeyBindings};
use crate::error::Result;
use crate::fuzzy;
use crate::repo::{self, Repository};
use crate::template::{Template, TemplateRegistry};
use crate::tmux::{generate_unique_name, Session, SessionOrchestrator};

use super::{
    DeleteConfirmDialog, Entry, Event, FilteredList, Origin, Row, TextInput, Theme, View,
    VisualSelection,
};

/// Rows of the create-mode menu: title and description
pub const CREATE_OPTIONS: [(&str, &str); 2] = [
    ("From Git Repository", "Select from configured repo directories"),
    ("Manual Setup", "Enter custom name and directory"),
];

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Interactive session manager
pub struct App {
    view: View,
    should_quit: bool,

    // Live tmux sessions and the filtered view over them
    sessions: Vec<Session>,
    session_list: FilteredList,
    visual: Option<VisualSelection>,

    // Create flow
    repos: Vec<Repository>,
    repo_list: FilteredList,
    repo_dirs: Vec<String>,
    templates: TemplateRegistry,
    create_cursor: usize,
    template_cursor: usize,
    name_input: TextInput,
    path_input: TextInput,

    // Banners, cleared by the next key
    error: Option<String>,
    success: Option<String>,

    spinner_tick: usize,

    // Deferred actions that need the event loop
    pending_attach: Option<String>,
    pending_scan: Option<Vec<String>>,

    keys: KeyBindings,
    theme: Theme,
    orchestrator: SessionOrchestrator,
}

impl App {
    const TICK_RATE: Duration = Duration::from_millis(100);

    pub fn new(config: &Config, orchestrator: SessionOrchestrator) -> Self {
        let mut app = Self {
            view: View::SessionList,
            should_quit: false,
            sessions: Vec::new(),
            session_list: FilteredList::new(),
            visual: None,
            repos: Vec::new(),
            repo_list: FilteredList::new(),
            repo_dirs: config.repo_directories.clone(),
            templates: TemplateRegistry::new(config.templates.clone()),
            create_cursor: 0,
            template_cursor: 0,
            name_input: TextInput::new(),
            path_input: TextInput::new(),
            error: None,
            success: None,
            spinner_tick: 0,
            pending_attach: None,
            pending_scan: None,
            keys: config.key_bindings(),
            theme: Theme::from_palette(&config.colors),
            orchestrator,
        };
        app.refresh_sessions();
        app
    }

    /// Take over the terminal until the user quits or attaches
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        terminal.clear()?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        loop {
            terminal.draw(|f| super::render::draw(f, self))?;

            if event::poll(Self::TICK_RATE)? {
                match event::read()? {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_event(Event::Key(key.code, key.modifiers));
                    }
                    CrosstermEvent::Resize(w, h) => self.handle_event(Event::Resize(w, h)),
                    _ => {}
                }
            } else {
                self.handle_event(Event::Tick);
            }

            while let Ok(event) = rx.try_recv() {
                self.handle_event(event);
            }

            if let Some(dirs) = self.take_pending_scan() {
                spawn_repo_scan(dirs, tx.clone());
            }

            if let Some(name) = self.take_pending_attach() {
                let event = self.perform_attach(terminal, &name)?;
                self.handle_event(event);
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Hand the terminal to tmux. Inside a tmux client `switch-client` returns
    /// at once, so the screen is left alone.
    fn perform_attach(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        name: &str,
    ) -> Result<Event> {
        let handoff = !self.orchestrator.inside_client();

        if handoff {
            disable_raw_mode()?;
            execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
            terminal.show_cursor()?;
        }

        let result = self.orchestrator.attach(name);

        if handoff {
            enable_raw_mode()?;
            execute!(terminal.backend_mut(), EnterAlternateScreen)?;
            terminal.clear()?;
        }

        Ok(Event::AttachFinished {
            session: name.to_string(),
            error: result.err().map(|e| e.to_string()),
        })
    }

    /// Apply one event to the state machine
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(code, modifiers) => {
                self.error = None;
                self.success = None;

                let view = mem::replace(&mut self.view, View::SessionList);
                self.view = match view {
                    View::SessionList => self.on_session_list_key(code, modifiers),
                    View::CreateMode => self.on_create_mode_key(code, modifiers),
                    View::Loading => self.on_loading_key(code, modifiers),
                    View::RepoList => self.on_repo_list_key(code, modifiers),
                    View::ManualCreate => self.on_manual_create_key(code, modifiers),
                    View::ManualDirectory { name } => {
                        self.on_manual_directory_key(name, code, modifiers)
                    }
                    View::TemplateSelect { origin } => {
                        self.on_template_select_key(origin, code, modifiers)
                    }
                    View::RenameSession { target } => self.on_rename_key(target, code, modifiers),
                    View::ConfirmDelete(dialog) => {
                        self.on_confirm_delete_key(dialog, code, modifiers)
                    }
                };
            }
            Event::Tick => {
                if self.view == View::Loading {
                    self.spinner_tick = self.spinner_tick.wrapping_add(1);
                }
            }
            Event::Resize(w, h) => {
                // Next draw lays out against the new size
                tracing::trace!("Terminal resized to {w}x{h}");
            }
            Event::ReposLoaded(repos) => self.on_repos_loaded(repos),
            Event::AttachFinished { session, error } => match error {
                None => self.should_quit = true,
                Some(e) => {
                    tracing::warn!("Attach to {session} failed: {e}");
                    self.error = Some(format!("Failed to attach to session {session}: {e}"));
                    self.refresh_sessions();
                }
            },
        }
    }

    fn key(&self, action: &'static str, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.keys.matches(action, &code, modifiers)
    }

    fn on_session_list_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> View {
        if self.session_list.is_filtering() {
            let names = session_names(&self.sessions);
            self.session_list.handle_filter_key(code, modifiers, &names);
            return View::SessionList;
        }

        let visual = self.visual.is_some();

        if self.key("visual", code, modifiers) {
            if visual {
                self.visual = None;
            } else if !self.session_list.is_empty() {
                self.visual = Some(VisualSelection::new(self.session_list.cursor()));
            }
        } else if self.key("quit", code, modifiers) {
            if visual {
                self.visual = None;
            } else {
                self.should_quit = true;
            }
        } else if code == KeyCode::Esc {
            self.visual = None;
        } else if self.key("up", code, modifiers) {
            self.session_list.move_up();
            self.extend_visual();
        } else if self.key("down", code, modifiers) {
            self.session_list.move_down();
            self.extend_visual();
        } else if self.key("delete", code, modifiers) {
            return if visual {
                self.delete_marked()
            } else {
                self.delete_current()
            };
        } else if self.key("refresh", code, modifiers) {
            self.refresh_sessions();
        } else if visual {
            // Only movement and delete apply to a selection
        } else if self.key("filter", code, modifiers) {
            self.session_list.start_filtering();
        } else if self.key("select", code, modifiers) {
            if let Some(name) = self.current_session().map(|s| s.name.clone()) {
                self.pending_attach = Some(name);
            }
        } else if self.key("create", code, modifiers) {
            self.create_cursor = 0;
            return View::CreateMode;
        } else if self.key("rename", code, modifiers) {
            if let Some(target) = self.current_session().map(|s| s.name.clone()) {
                self.name_input.set_text(target.as_str());
                return View::RenameSession { target };
            }
        }

        View::SessionList
    }

    fn extend_visual(&mut self) {
        if let Some(selection) = self.visual.as_mut() {
            selection.extend_to(self.session_list.cursor(), self.session_list.len());
        }
    }

    fn current_session(&self) -> Option<&Session> {
        self.session_list
            .selected()
            .and_then(|i| self.sessions.get(i))
    }

    fn delete_current(&mut self) -> View {
        let Some(session) = self.current_session().cloned() else {
            return View::SessionList;
        };
        if session.attached {
            return View::ConfirmDelete(DeleteConfirmDialog::single(session.name));
        }
        self.kill_sessions(&[session.name]);
        View::SessionList
    }

    /// Kill the visual selection, or ask first when any member is attached
    fn delete_marked(&mut self) -> View {
        let Some(selection) = self.visual.as_ref() else {
            return View::SessionList;
        };

        let marked: Vec<&Session> = selection
            .indices()
            .filter_map(|row| self.session_list.source_index(row))
            .filter_map(|i| self.sessions.get(i))
            .collect();
        let targets: Vec<String> = marked.iter().map(|s| s.name.clone()).collect();
        let attached: Vec<String> = marked
            .iter()
            .filter(|s| s.attached)
            .map(|s| s.name.clone())
            .collect();

        if targets.is_empty() {
            return View::SessionList;
        }
        if !attached.is_empty() {
            return View::ConfirmDelete(DeleteConfirmDialog::batch(targets, attached));
        }

        self.kill_sessions(&targets);
        View::SessionList
    }

    fn kill_sessions(&mut self, names: &[String]) {
        let mut failures = Vec::new();
        for name in names {
            if let Err(e) = self.orchestrator.kill(name) {
                tracing::warn!("Failed to kill session {name}: {e}");
                failures.push((name.as_str(), e));
            }
        }

        match (names, failures.as_slice()) {
            ([name], []) => self.success = Some(format!("Killed session: {name}")),
            ([_], [(_, e)]) => self.error = Some(format!("Failed to kill session: {e}")),
            (_, []) => self.success = Some(format!("Killed {} sessions", names.len())),
            (_, failed) => {
                let failed: Vec<&str> = failed.iter().map(|(name, _)| *name).collect();
                self.error = Some(format!("Failed to kill sessions: {}", failed.join(", ")));
            }
        }

        self.refresh_sessions();
    }

    fn on_confirm_delete_key(
        &mut self,
        dialog: DeleteConfirmDialog,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> View {
        if self.key("confirm", code, modifiers) {
            self.kill_sessions(&dialog.targets);
            View::SessionList
        } else if self.key("cancel", code, modifiers) {
            self.visual = None;
            View::SessionList
        } else {
            View::ConfirmDelete(dialog)
        }
    }

    fn on_rename_key(&mut self, target: String, code: KeyCode, modifiers: KeyModifiers) -> View {
        match code {
            KeyCode::Esc => View::SessionList,
            KeyCode::Enter => {
                let new_name = self.name_input.text().trim().to_string();
                if new_name.is_empty() {
                    self.error = Some("Session name cannot be empty".to_string());
                    return View::RenameSession { target };
                }
                if new_name == target {
                    return View::SessionList;
                }

                match self.orchestrator.rename(&target, &new_name) {
                    Ok(()) => {
                        self.success = Some(format!("Renamed session to: {new_name}"));
                        self.refresh_sessions();
                        View::SessionList
                    }
                    Err(e) => {
                        tracing::warn!("Failed to rename {target} to {new_name}: {e}");
                        self.error = Some(format!("Failed to rename session: {e}"));
                        View::RenameSession { target }
                    }
                }
            }
            _ => {
                self.name_input.handle_key(code, modifiers);
                View::RenameSession { target }
            }
        }
    }

    fn on_create_mode_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> View {
        if self.key("back", code, modifiers) {
            View::SessionList
        } else if self.key("up", code, modifiers) {
            self.create_cursor = self.create_cursor.saturating_sub(1);
            View::CreateMode
        } else if self.key("down", code, modifiers) {
            self.create_cursor = (self.create_cursor + 1).min(CREATE_OPTIONS.len() - 1);
            View::CreateMode
        } else if self.key("select", code, modifiers) {
            if self.create_cursor == 0 {
                self.pending_scan = Some(self.repo_dirs.clone());
                self.spinner_tick = 0;
                View::Loading
            } else {
                self.name_input.clear();
                View::ManualCreate
            }
        } else {
            View::CreateMode
        }
    }

    /// Only an interrupt is accepted while the scan runs
    fn on_loading_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> View {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
        }
        View::Loading
    }

    fn on_repos_loaded(&mut self, repos: Vec<Repository>) {
        tracing::debug!("Loaded {} repositories", repos.len());
        self.repos = repos;
        let haystacks = repo_haystacks(&self.repos);
        self.repo_list.cancel_filter(&haystacks);
        if self.view == View::Loading {
            self.view = View::RepoList;
        }
    }

    fn on_repo_list_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> View {
        if self.repo_list.is_filtering() {
            let haystacks = repo_haystacks(&self.repos);
            self.repo_list.handle_filter_key(code, modifiers, &haystacks);
            return View::RepoList;
        }

        if self.key("back", code, modifiers) {
            return View::SessionList;
        } else if self.key("filter", code, modifiers) {
            self.repo_list.start_filtering();
        } else if self.key("up", code, modifiers) {
            self.repo_list.move_up();
        } else if self.key("down", code, modifiers) {
            self.repo_list.move_down();
        } else if self.key("select", code, modifiers) {
            if let Some(repo) = self.repo_list.selected().and_then(|i| self.repos.get(i)) {
                let origin = Origin::Repository(repo.clone());
                self.template_cursor = 0;
                return View::TemplateSelect { origin };
            }
        }

        View::RepoList
    }

    fn on_manual_create_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> View {
        match code {
            KeyCode::Esc => View::CreateMode,
            KeyCode::Enter => {
                let name = self.name_input.text().trim().to_string();
                if name.is_empty() {
                    self.error = Some("Session name cannot be empty".to_string());
                    return View::ManualCreate;
                }
                self.path_input.set_text(default_directory());
                View::ManualDirectory { name }
            }
            _ => {
                self.name_input.handle_key(code, modifiers);
                View::ManualCreate
            }
        }
    }

    fn on_manual_directory_key(
        &mut self,
        name: String,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> View {
        match code {
            KeyCode::Esc => View::ManualCreate,
            KeyCode::Enter => {
                let raw = self.path_input.text().trim();
                if raw.is_empty() {
                    self.error = Some("Directory path cannot be empty".to_string());
                    return View::ManualDirectory { name };
                }
                let path = repo::expand_home(raw);
                if !path.is_dir() {
                    self.error = Some(format!("Directory does not exist: {}", path.display()));
                    return View::ManualDirectory { name };
                }
                self.template_cursor = 0;
                View::TemplateSelect {
                    origin: Origin::Manual { name, path },
                }
            }
            _ => {
                self.path_input.handle_key(code, modifiers);
                View::ManualDirectory { name }
            }
        }
    }

    fn on_template_select_key(
        &mut self,
        origin: Origin,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> View {
        if self.key("back", code, modifiers) {
            return match origin {
                Origin::Repository(_) => View::RepoList,
                Origin::Manual { name, .. } => View::ManualDirectory { name },
            };
        }

        if self.key("up", code, modifiers) {
            self.template_cursor = self.template_cursor.saturating_sub(1);
        } else if self.key("down", code, modifiers) {
            if self.template_cursor + 1 < self.templates.len() {
                self.template_cursor += 1;
            }
        } else if self.key("select", code, modifiers) {
            if let Some(template) = self.templates.get(self.template_cursor).cloned() {
                return self.create_from(origin, &template);
            }
        }

        View::TemplateSelect { origin }
    }

    /// Create the session for `origin` and queue an attach to it
    fn create_from(&mut self, origin: Origin, template: &Template) -> View {
        let (name, path) = match &origin {
            Origin::Repository(repo) => {
                // Names are checked against the server, not a stale list
                self.refresh_sessions();
                (generate_unique_name(&repo.path, &self.sessions), repo.path.clone())
            }
            Origin::Manual { name, path } => (name.clone(), path.clone()),
        };

        match self.orchestrator.create_session(&name, &path, template) {
            Ok(()) => {
                self.refresh_sessions();
                self.pending_attach = Some(name);
                View::SessionList
            }
            Err(e) => {
                tracing::warn!("Failed to create session {name}: {e}");
                self.error = Some(format!("Failed to create session: {e}"));
                self.refresh_sessions();
                View::TemplateSelect { origin }
            }
        }
    }

    /// Re-query tmux. The filter query is re-applied, the cursor clamped and
    /// visual mode dropped since row positions may have shifted.
    fn refresh_sessions(&mut self) {
        match self.orchestrator.list() {
            Ok(sessions) => self.sessions = sessions,
            Err(e) => {
                tracing::warn!("Failed to list sessions: {e}");
                if self.error.is_none() {
                    self.error = Some(format!("Failed to list sessions: {e}"));
                }
            }
        }
        self.visual = None;
        let names = session_names(&self.sessions);
        self.session_list.reload(&names);
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session_list(&self) -> &FilteredList {
        &self.session_list
    }

    pub fn repo_list(&self) -> &FilteredList {
        &self.repo_list
    }

    pub fn visual(&self) -> Option<&VisualSelection> {
        self.visual.as_ref()
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn create_cursor(&self) -> usize {
        self.create_cursor
    }

    pub fn template_cursor(&self) -> usize {
        self.template_cursor
    }

    pub fn name_input(&self) -> &TextInput {
        &self.name_input
    }

    pub fn path_input(&self) -> &TextInput {
        &self.path_input
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn keys(&self) -> &KeyBindings {
        &self.keys
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_tick % SPINNER_FRAMES.len()]
    }

    /// Attach queued by the last event, for the loop to perform
    pub fn take_pending_attach(&mut self) -> Option<String> {
        self.pending_attach.take()
    }

    /// Scan queued by the last event, for the loop to spawn
    pub fn take_pending_scan(&mut self) -> Option<Vec<String>> {
        self.pending_scan.take()
    }

    /// Filtered session rows with visual-mode marks
    pub fn session_rows(&self) -> Vec<Row<'_>> {
        self.session_list
            .matches()
            .iter()
            .enumerate()
            .filter_map(|(row, m)| {
                let session = self.sessions.get(m.index)?;
                Some(Row {
                    entry: Entry::Session(session),
                    highlights: m.positions.clone(),
                    marked: self.visual.as_ref().is_some_and(|v| v.contains(row)),
                })
            })
            .collect()
    }

    /// Filtered repository rows; highlights index into `"{name} {path}"`
    pub fn repo_rows(&self) -> Vec<Row<'_>> {
        self.repo_list
            .matches()
            .iter()
            .filter_map(|m| {
                let repo = self.repos.get(m.index)?;
                Some(Row {
                    entry: Entry::Repository(repo),
                    highlights: m.positions.clone(),
                    marked: false,
                })
            })
            .collect()
    }

    pub fn template_rows(&self) -> Vec<Row<'_>> {
        self.templates
            .all()
            .iter()
            .map(|t| Row {
                entry: Entry::Template(t),
                highlights: Vec::new(),
                marked: false,
            })
            .collect()
    }
}

/// Run the repository scan off the loop thread and post the result back
pub fn spawn_repo_scan(
    directories: Vec<String>,
    tx: mpsc::UnboundedSender<Event>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let repos = repo::scan(&directories);
        if tx.send(Event::ReposLoaded(repos)).is_err() {
            tracing::debug!("Repository scan finished after the UI closed");
        }
    })
}

fn session_names(sessions: &[Session]) -> Vec<&str> {
    sessions.iter().map(|s| s.name.as_str()).collect()
}

fn repo_haystacks(repos: &[Repository]) -> Vec<String> {
    repos.iter().map(fuzzy::repository_haystack).collect()
}

/// Working directory, else home, else `.`
fn default_directory() -> String {
    std::env::current_dir()
        .ok()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::WindowSpec;
    use crate::tmux::fake::{Call, FakeMultiplexer};
    use crate::tmux::Multiplexer;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn app_with(sessions: Vec<Session>) -> (App, Arc<FakeMultiplexer>) {
        app_with_config(&Config::default(), sessions)
    }

    fn app_with_config(config: &Config, sessions: Vec<Session>) -> (App, Arc<FakeMultiplexer>) {
        let fake = Arc::new(FakeMultiplexer::with_sessions(sessions));
        let app = App::new(config, SessionOrchestrator::new(fake.clone(), false));
        (app, fake)
    }

    fn detached(names: &[&str]) -> Vec<Session> {
        names.iter().map(|n| Session::new(*n, 1, false)).collect()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(Event::Key(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App, ch: char) {
        app.handle_event(Event::Key(KeyCode::Char(ch), KeyModifiers::CONTROL));
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn marked_rows(app: &App) -> Vec<usize> {
        app.visual()
            .map(|v| v.indices().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_visual_selection_is_anchor_to_cursor() {
        let (mut app, _) = app_with(detached(&["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7"]));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        ctrl(&mut app, 'v');
        assert_eq!(marked_rows(&app), vec![2]);

        for _ in 0..5 {
            press(&mut app, KeyCode::Char('j'));
        }
        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(marked_rows(&app), vec![2, 3, 4, 5]);

        let marked: Vec<bool> = app.session_rows().iter().map(|r| r.marked).collect();
        assert_eq!(
            marked,
            vec![false, false, true, true, true, true, false, false]
        );
    }

    #[test]
    fn test_visual_mode_leaves_before_quitting() {
        let (mut app, _) = app_with(detached(&["a", "b"]));
        ctrl(&mut app, 'v');
        assert!(app.visual().is_some());

        press(&mut app, KeyCode::Char('q'));
        assert!(app.visual().is_none());
        assert!(!app.should_quit());

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_visual_mode_needs_sessions() {
        let (mut app, fake) = app_with(Vec::new());
        assert!(app.sessions().is_empty());
        ctrl(&mut app, 'v');
        assert!(app.visual().is_none());
        press(&mut app, KeyCode::Char('d'));
        assert!(fake.mutations().is_empty());
        assert_eq!(app.view(), &View::SessionList);
    }

    #[test]
    fn test_attached_delete_asks_first() {
        let (mut app, fake) = app_with(vec![
            Session::new("a", 1, false),
            Session::new("b", 2, true),
        ]);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(
            app.view(),
            &View::ConfirmDelete(DeleteConfirmDialog::single("b"))
        );
        assert!(fake.kills().is_empty());

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.view(), &View::SessionList);
        assert!(fake.kills().is_empty());

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('Y'));
        assert_eq!(fake.kills(), vec!["b"]);
        assert_eq!(app.success(), Some("Killed session: b"));
        assert_eq!(app.sessions().len(), 1);
    }

    #[test]
    fn test_detached_delete_is_immediate() {
        let (mut app, fake) = app_with(detached(&["a", "b"]));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.view(), &View::SessionList);
        assert_eq!(fake.kills(), vec!["a"]);
        assert_eq!(app.success(), Some("Killed session: a"));
        assert_eq!(fake.session_names(), vec!["b"]);
    }

    #[test]
    fn test_failed_kill_shows_error() {
        let (mut app, fake) = app_with(detached(&["a"]));
        fake.fail_kill("a");
        press(&mut app, KeyCode::Char('d'));
        let error = app.error().unwrap_or_default();
        assert!(error.starts_with("Failed to kill session:"), "{error}");
        assert_eq!(app.sessions().len(), 1);
    }

    fn visual_over_three(app: &mut App) {
        ctrl(app, 'v');
        press(app, KeyCode::Char('j'));
        press(app, KeyCode::Char('j'));
        press(app, KeyCode::Char('d'));
    }

    #[test]
    fn test_batch_with_attached_member_confirms_whole_batch() {
        let (mut app, fake) = app_with(vec![
            Session::new("a", 1, false),
            Session::new("b", 1, true),
            Session::new("c", 1, false),
        ]);
        visual_over_three(&mut app);
        assert_eq!(
            app.view(),
            &View::ConfirmDelete(DeleteConfirmDialog::batch(
                vec!["a".into(), "b".into(), "c".into()],
                vec!["b".into()],
            ))
        );
        assert!(fake.kills().is_empty());

        press(&mut app, KeyCode::Char('y'));
        assert_eq!(fake.kills(), vec!["a", "b", "c"]);
        assert_eq!(app.success(), Some("Killed 3 sessions"));
        assert!(app.visual().is_none());
        assert!(app.sessions().is_empty());
    }

    #[test]
    fn test_batch_cancel_kills_nothing() {
        let (mut app, fake) = app_with(vec![
            Session::new("a", 1, false),
            Session::new("b", 1, true),
            Session::new("c", 1, false),
        ]);
        visual_over_three(&mut app);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), &View::SessionList);
        assert!(fake.kills().is_empty());
        assert!(app.visual().is_none());
    }

    #[test]
    fn test_batch_of_detached_reports_failures() {
        let (mut app, fake) = app_with(detached(&["a", "b", "c"]));
        fake.fail_kill("b");
        visual_over_three(&mut app);
        assert_eq!(fake.kills(), vec!["a", "b", "c"]);
        assert_eq!(app.error(), Some("Failed to kill sessions: b"));
        assert_eq!(fake.session_names(), vec!["b"]);
        assert!(app.visual().is_none());
    }

    #[test]
    fn test_filter_without_match_keeps_source() {
        let (mut app, _) = app_with(detached(&["api", "web", "docs"]));
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "zz");
        assert!(app.session_list().is_empty());
        assert_eq!(app.sessions().len(), 3);

        // Keys edit the query while it has focus
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.session_list().query().text(), "zzd");

        press(&mut app, KeyCode::Esc);
        assert!(!app.session_list().is_filtering());
        assert_eq!(app.session_list().len(), 3);
    }

    #[test]
    fn test_filter_resets_cursor_and_maps_back() {
        let (mut app, fake) = app_with(detached(&["api", "web", "docs"]));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "doc");
        assert_eq!(app.session_list().cursor(), 0);
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(fake.kills(), vec!["docs"]);
    }

    #[test]
    fn test_refresh_reapplies_query() {
        let (mut app, fake) = app_with(detached(&["api", "web"]));
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "we");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session_list().len(), 1);

        fake.new_session("webhooks", Path::new("/tmp"), &WindowSpec::default())
            .unwrap();
        ctrl(&mut app, 'r');
        assert_eq!(app.session_list().query().text(), "we");
        assert_eq!(app.session_list().len(), 2);
    }

    #[test]
    fn test_create_from_repository_uses_unique_name() {
        let (mut app, fake) = app_with(detached(&["dev"]));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view(), &View::CreateMode);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view(), &View::Loading);
        assert_eq!(
            app.take_pending_scan(),
            Some(Config::default().repo_directories)
        );

        // Loading ignores everything but an interrupt
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.view(), &View::Loading);
        app.handle_event(Event::Tick);
        assert_eq!(app.spinner_frame(), "⠙");

        let repo = Repository {
            name: "dev".to_string(),
            path: PathBuf::from("/work/dev"),
        };
        app.handle_event(Event::ReposLoaded(vec![repo.clone()]));
        assert_eq!(app.view(), &View::RepoList);

        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.view(),
            &View::TemplateSelect {
                origin: Origin::Repository(repo)
            }
        );

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view(), &View::SessionList);
        assert_eq!(app.take_pending_attach(), Some("dev_2".to_string()));
        assert!(fake.mutations().contains(&Call::NewSession {
            name: "dev_2".to_string(),
            dir: PathBuf::from("/work/dev"),
            window: WindowSpec::new(Some("main"), None),
        }));
        assert!(app.sessions().iter().any(|s| s.name == "dev_2"));
    }

    #[test]
    fn test_template_select_back_returns_to_origin() {
        let (mut app, _) = app_with(Vec::new());
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        let repo = Repository {
            name: "api".to_string(),
            path: PathBuf::from("/work/api"),
        };
        app.handle_event(Event::ReposLoaded(vec![repo]));
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.view(), &View::RepoList);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), &View::SessionList);
    }

    fn enter_manual_directory(app: &mut App, name: &str, dir: &str) {
        press(app, KeyCode::Char('c'));
        press(app, KeyCode::Char('j'));
        press(app, KeyCode::Enter);
        assert_eq!(app.view(), &View::ManualCreate);
        type_text(app, name);
        press(app, KeyCode::Enter);
        assert_eq!(
            app.view(),
            &View::ManualDirectory {
                name: name.to_string()
            }
        );
        assert!(!app.path_input().is_empty());
        ctrl(app, 'u');
        type_text(app, dir);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_manual_directory_must_exist() {
        let (mut app, fake) = app_with(Vec::new());
        enter_manual_directory(&mut app, "scratch", "/definitely/not/here");
        assert_eq!(
            app.error(),
            Some("Directory does not exist: /definitely/not/here")
        );
        assert_eq!(
            app.view(),
            &View::ManualDirectory {
                name: "scratch".to_string()
            }
        );
        assert!(fake.mutations().is_empty());
    }

    #[test]
    fn test_zero_window_template_reports_and_stays() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            templates: vec![Template {
                name: "empty".to_string(),
                description: String::new(),
                windows: Vec::new(),
                focused_window: None,
            }],
            ..Config::default()
        };
        let (mut app, fake) = app_with_config(&config, Vec::new());
        let dir = tmp.path().display().to_string();
        enter_manual_directory(&mut app, "scratch", &dir);
        assert!(matches!(app.view(), View::TemplateSelect { .. }));

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.view(), View::TemplateSelect { .. }));
        let error = app.error().unwrap_or_default();
        assert!(error.starts_with("Failed to create session:"), "{error}");
        assert!(fake.mutations().is_empty());
        assert_eq!(app.take_pending_attach(), None);

        press(&mut app, KeyCode::Esc);
        assert_eq!(
            app.view(),
            &View::ManualDirectory {
                name: "scratch".to_string()
            }
        );
    }

    #[test]
    fn test_first_window_failure_reports_and_stays() {
        let tmp = TempDir::new().unwrap();
        let (mut app, fake) = app_with(Vec::new());
        fake.fail_new_session();
        let dir = tmp.path().display().to_string();
        enter_manual_directory(&mut app, "notes", &dir);

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.view(), View::TemplateSelect { .. }));
        assert_eq!(
            app.error(),
            Some("Failed to create session: Tmux error: duplicate session")
        );
        assert_eq!(app.take_pending_attach(), None);
        assert!(app.sessions().is_empty());
        assert_eq!(fake.mutations().len(), 1);
    }

    #[test]
    fn test_manual_create_uses_typed_name() {
        let tmp = TempDir::new().unwrap();
        let (mut app, fake) = app_with(Vec::new());
        let dir = tmp.path().display().to_string();
        enter_manual_directory(&mut app, "notes", &dir);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.take_pending_attach(), Some("notes".to_string()));
        let new_windows = fake
            .mutations()
            .iter()
            .filter(|c| matches!(c, Call::NewWindow { .. }))
            .count();
        assert_eq!(new_windows, 2);
    }

    #[test]
    fn test_rename_validation() {
        let (mut app, fake) = app_with(detached(&["a"]));
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(
            app.view(),
            &View::RenameSession {
                target: "a".to_string()
            }
        );
        assert_eq!(app.name_input().text(), "a");

        ctrl(&mut app, 'u');
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.error(), Some("Session name cannot be empty"));
        assert!(matches!(app.view(), View::RenameSession { .. }));

        type_text(&mut app, "a");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view(), &View::SessionList);
        assert!(fake.mutations().is_empty());

        press(&mut app, KeyCode::Char('r'));
        ctrl(&mut app, 'u');
        type_text(&mut app, "b");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.success(), Some("Renamed session to: b"));
        assert_eq!(fake.session_names(), vec!["b"]);
        assert_eq!(app.sessions()[0].name, "b");

        // Banners last until the next key
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.success(), None);
    }

    #[test]
    fn test_rename_failure_stays() {
        let (mut app, fake) = app_with(detached(&["a", "b"]));
        fake.fail_rename();
        press(&mut app, KeyCode::Char('r'));
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Enter);
        let error = app.error().unwrap_or_default();
        assert!(error.starts_with("Failed to rename session:"), "{error}");
        assert!(matches!(app.view(), View::RenameSession { .. }));
        assert_eq!(fake.session_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_attach_result() {
        let (mut app, fake) = app_with(detached(&["a"]));
        press(&mut app, KeyCode::Enter);
        let name = app.take_pending_attach().unwrap();
        assert_eq!(name, "a");

        fake.fail_attach();
        let err = SessionOrchestrator::new(fake.clone(), false)
            .attach(&name)
            .unwrap_err();
        app.handle_event(Event::AttachFinished {
            session: name.clone(),
            error: Some(err.to_string()),
        });
        assert!(!app.should_quit());
        assert!(app.error().unwrap_or_default().contains("Failed to attach"));

        app.handle_event(Event::AttachFinished {
            session: name,
            error: None,
        });
        assert!(app.should_quit());
    }

    #[test]
    fn test_list_failure_is_a_banner() {
        let fake = Arc::new(FakeMultiplexer::new());
        fake.fail_list();
        let app = App::new(&Config::default(), SessionOrchestrator::new(fake, false));
        assert!(app.sessions().is_empty());
        assert!(app
            .error()
            .unwrap_or_default()
            .starts_with("Failed to list sessions:"));
    }

    #[tokio::test]
    async fn test_repo_scan_posts_result() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("alpha").join(".git")).unwrap();
        std::fs::create_dir_all(tmp.path().join("notes")).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_repo_scan(vec![tmp.path().display().to_string()], tx)
            .await
            .unwrap();

        match rx.recv().await {
            Some(Event::ReposLoaded(repos)) => {
                assert_eq!(repos.len(), 1);
                assert_eq!(repos[0].name, "alpha");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
