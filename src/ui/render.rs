use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::fuzzy;

use super::app::{App, CREATE_OPTIONS};
use super::{DeleteConfirmDialog, Entry, Origin, Row, TextInput, Theme, View};

/// Main render function
pub fn draw(f: &mut Frame, app: &App) {
    let filtering = match app.view() {
        View::SessionList => app.session_list().is_filtering(),
        View::RepoList => app.repo_list().is_filtering(),
        _ => false,
    };
    let has_banner = app.error().is_some() || app.success().is_some();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                              // Title
            Constraint::Min(3),                                 // Content
            Constraint::Length(if filtering { 3 } else { 0 }),  // Filter input
            Constraint::Length(if has_banner { 1 } else { 0 }), // Banner
            Constraint::Length(1),                              // Help
        ])
        .split(f.area());

    render_title(f, chunks[0], app.theme());

    match app.view() {
        View::SessionList => render_session_list(f, chunks[1], app),
        View::CreateMode => render_create_mode(f, chunks[1], app),
        View::Loading => render_loading(f, chunks[1], app),
        View::RepoList => render_repo_list(f, chunks[1], app),
        View::ManualCreate => render_prompt(
            f,
            chunks[1],
            app.theme(),
            vec![Line::from("Enter session name:")],
            app.name_input(),
        ),
        View::ManualDirectory { name } => render_prompt(
            f,
            chunks[1],
            app.theme(),
            vec![
                Line::from(format!("Session: {name}")),
                Line::from(""),
                Line::from("Enter directory path:"),
            ],
            app.path_input(),
        ),
        View::TemplateSelect { origin } => render_template_select(f, chunks[1], app, origin),
        View::RenameSession { target } => render_prompt(
            f,
            chunks[1],
            app.theme(),
            vec![Line::from(format!("Rename session: {target}"))],
            app.name_input(),
        ),
        View::ConfirmDelete(dialog) => {
            let area = f.area();
            render_session_list(f, chunks[1], app);
            render_confirm_delete(f, area, app.theme(), dialog);
        }
    }

    if filtering {
        let query = match app.view() {
            View::RepoList => app.repo_list().query(),
            _ => app.session_list().query(),
        };
        render_filter(f, chunks[2], app.theme(), query);
    }

    render_banner(f, chunks[3], app);
    render_help(f, chunks[4], app, filtering);
}

fn render_title(f: &mut Frame, area: Rect, theme: &Theme) {
    let title = Paragraph::new(" muxdeck · tmux session manager ").style(theme.title);
    f.render_widget(title, area);
}

fn list_block<'a>(title: String, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(title)
}

fn render_rows(
    f: &mut Frame,
    area: Rect,
    theme: &Theme,
    title: String,
    rows: &[Row<'_>],
    cursor: usize,
) {
    let items: Vec<ListItem> = rows.iter().map(|row| row_item(row, theme)).collect();

    let list = List::new(items)
        .block(list_block(title, theme))
        .highlight_style(theme.selected)
        .highlight_symbol("▌ ");

    let selected = if rows.is_empty() { None } else { Some(cursor) };
    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, area, &mut state);
}

fn row_item<'a>(row: &Row<'a>, theme: &Theme) -> ListItem<'a> {
    match row.entry {
        Entry::Session(session) => {
            let mut title = highlighted(
                &session.name,
                &row.highlights,
                Style::default(),
                theme.highlight,
            );
            let mut desc = format!("{} windows, {}", session.windows, session.status_label());
            if row.marked {
                title.insert(0, Span::styled("● ", theme.selected));
                desc.insert_str(0, "✓ ");
            }
            let desc_style = if row.marked { theme.selected } else { theme.dimmed };
            ListItem::new(vec![
                Line::from(title),
                Line::from(Span::styled(desc, desc_style)),
            ])
        }
        Entry::Repository(repo) => {
            let (name_pos, path_pos) = fuzzy::split_repository_positions(repo, &row.highlights);
            let path = repo.path.display().to_string();
            ListItem::new(vec![
                Line::from(highlighted(&repo.name, &name_pos, Style::default(), theme.highlight)),
                Line::from(highlighted(&path, &path_pos, theme.dimmed, theme.highlight)),
            ])
        }
        Entry::Template(template) => {
            let windows: Vec<&str> = template
                .windows
                .iter()
                .map(|w| w.name().unwrap_or("shell"))
                .collect();
            let detail = if template.description.is_empty() {
                windows.join(", ")
            } else {
                format!("{} ({})", template.description, windows.join(", "))
            };
            ListItem::new(vec![
                Line::from(template.name.clone()),
                Line::from(Span::styled(detail, theme.dimmed)),
            ])
        }
    }
}

/// Split `text` into spans, styling the characters at `positions`
fn highlighted(
    text: &str,
    positions: &[usize],
    base: Style,
    highlight: Style,
) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_lit = false;

    for (i, ch) in text.chars().enumerate() {
        let lit = positions.contains(&i);
        if lit != run_lit && !run.is_empty() {
            let style = if run_lit { highlight } else { base };
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        run_lit = lit;
        run.push(ch);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, if run_lit { highlight } else { base }));
    }
    spans
}

fn render_session_list(f: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let title = match app.visual() {
        Some(v) => format!("Tmux Sessions (Visual: {} selected)", v.len()),
        None => "Tmux Sessions".to_string(),
    };

    if app.sessions().is_empty() {
        let empty = Paragraph::new(format!(
            "No tmux sessions.\n\nPress '{}' to create one.",
            app.keys().label("create")
        ))
        .style(theme.dimmed)
        .block(list_block(title, theme));
        f.render_widget(empty, area);
        return;
    }

    let rows = app.session_rows();
    render_rows(f, area, theme, title, &rows, app.session_list().cursor());
}

fn render_create_mode(f: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let items: Vec<ListItem> = CREATE_OPTIONS
        .iter()
        .map(|(title, desc)| {
            ListItem::new(vec![
                Line::from(*title),
                Line::from(Span::styled(*desc, theme.dimmed)),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(list_block("Create New Session".to_string(), theme))
        .highlight_style(theme.selected)
        .highlight_symbol("▌ ");
    let mut state = ListState::default().with_selected(Some(app.create_cursor()));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_loading(f: &mut Frame, area: Rect, app: &App) {
    let line = Line::from(vec![
        Span::styled(app.spinner_frame(), app.theme().spinner),
        Span::raw(" Loading repositories..."),
    ]);
    f.render_widget(Paragraph::new(vec![Line::from(""), line]), area);
}

fn render_repo_list(f: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let rows = app.repo_rows();
    if rows.is_empty() {
        let msg = if app.repo_list().query().is_empty() {
            "No git repositories found in the configured directories."
        } else {
            "No repositories match the filter."
        };
        let empty = Paragraph::new(msg)
            .style(theme.dimmed)
            .block(list_block("Select Repository".to_string(), theme));
        f.render_widget(empty, area);
        return;
    }
    render_rows(
        f,
        area,
        theme,
        "Select Repository".to_string(),
        &rows,
        app.repo_list().cursor(),
    );
}

fn render_template_select(f: &mut Frame, area: Rect, app: &App, origin: &Origin) {
    let theme = app.theme();
    let target = match origin {
        Origin::Repository(repo) => repo.path.display().to_string(),
        Origin::Manual { name, path } => format!("{name} in {}", path.display()),
    };
    let title = format!("Select Template ({target})");

    let rows = app.template_rows();
    if rows.is_empty() {
        let empty = Paragraph::new("No templates configured.")
            .style(theme.dimmed)
            .block(list_block(title, theme));
        f.render_widget(empty, area);
        return;
    }
    render_rows(f, area, theme, title, &rows, app.template_cursor());
}

/// Label lines above a focused single-line input
fn render_prompt(
    f: &mut Frame,
    area: Rect,
    theme: &Theme,
    mut lines: Vec<Line<'static>>,
    input: &TextInput,
) {
    lines.push(Line::from(""));
    let label_height = lines.len() as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(label_height),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    f.render_widget(Paragraph::new(lines), chunks[0]);
    render_input(f, chunks[1], theme.focused_input, None, input);
}

fn render_filter(f: &mut Frame, area: Rect, theme: &Theme, query: &TextInput) {
    render_input(f, area, theme.filter_border, Some("Filter"), query);
}

fn render_input(
    f: &mut Frame,
    area: Rect,
    border: Style,
    title: Option<&str>,
    input: &TextInput,
) {
    let mut block = Block::default().borders(Borders::ALL).border_style(border);
    if let Some(title) = title {
        block = block.title(title.to_string());
    }
    f.render_widget(Paragraph::new(input.text().to_string()).block(block), area);

    let max_x = area.x + area.width.saturating_sub(2);
    let x = (area.x + 1).saturating_add(input.cursor_column()).min(max_x);
    f.set_cursor_position((x, area.y + 1));
}

fn render_banner(f: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let line = if let Some(error) = app.error() {
        Line::from(Span::styled(format!("Error: {error}"), theme.error))
    } else if let Some(success) = app.success() {
        Line::from(Span::styled(success.to_string(), theme.success))
    } else {
        return;
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_help(f: &mut Frame, area: Rect, app: &App, filtering: bool) {
    let k = app.keys();
    let text = if filtering {
        "'enter' apply filter • 'esc' cancel filter".to_string()
    } else {
        match app.view() {
            View::SessionList if app.visual().is_some() => format!(
                "'{}/{}' select • '{}' delete selected • 'esc/{}' exit visual • '{}' quit",
                k.label("down"),
                k.label("up"),
                k.label("delete"),
                k.label("visual"),
                k.label("quit"),
            ),
            View::SessionList => format!(
                "'{}' create • '{}' rename • '{}' delete • '{}' filter • '{}' attach • '{}' visual • '{}' refresh • '{}' quit",
                k.label("create"),
                k.label("rename"),
                k.label("delete"),
                k.label("filter"),
                k.label("select"),
                k.label("visual"),
                k.label("refresh"),
                k.label("quit"),
            ),
            View::CreateMode => format!(
                "'{}' select • '{}/{}' navigate • '{}' back",
                k.label("select"),
                k.label("down"),
                k.label("up"),
                k.label("back"),
            ),
            View::RepoList => format!(
                "'{}' select • '{}/{}' navigate • '{}' filter • '{}' back",
                k.label("select"),
                k.label("down"),
                k.label("up"),
                k.label("filter"),
                k.label("back"),
            ),
            View::TemplateSelect { .. } => format!(
                "'{}' create session • '{}/{}' navigate • '{}' back",
                k.label("select"),
                k.label("down"),
                k.label("up"),
                k.label("back"),
            ),
            View::ManualCreate | View::ManualDirectory { .. } => {
                "'enter' continue • 'esc' back".to_string()
            }
            View::RenameSession { .. } => "'enter' rename • 'esc' cancel".to_string(),
            View::ConfirmDelete(_) => format!(
                "'{}' yes • '{}' no",
                k.label("confirm"),
                k.label("cancel"),
            ),
            View::Loading => "'ctrl+c' quit".to_string(),
        }
    };

    f.render_widget(Paragraph::new(text).style(app.theme().help), area);
}

fn render_confirm_delete(f: &mut Frame, area: Rect, theme: &Theme, d: &DeleteConfirmDialog) {
    let popup_area = centered_rect(60, 35, area);
    f.render_widget(Clear, popup_area);

    let heading = if d.attached.len() == 1 {
        format!("Delete attached session: {}?", d.attached_label())
    } else {
        format!("Delete attached sessions: {}?", d.attached_label())
    };

    let mut lines = vec![
        Line::from(Span::styled(heading, theme.error)),
        Line::from(""),
        Line::from("Attached sessions are in use; deleting closes all of their windows."),
    ];
    let detached = d.detached_count();
    if detached > 0 {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{detached} detached session(s) in the selection are deleted too."),
            theme.dimmed,
        )));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border.add_modifier(Modifier::BOLD))
                .title("Confirm"),
        );

    f.render_widget(p, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
