use ratatui::style::{Color, Modifier, Style};

use crate::config::Palette;

/// Ratatui styles resolved once from the configured palette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub title: Style,
    pub selected: Style,
    pub dimmed: Style,
    pub help: Style,
    pub error: Style,
    pub success: Style,
    pub border: Style,
    pub input: Style,
    pub focused_input: Style,
    pub spinner: Style,
    pub highlight: Style,
    pub filter_border: Style,
}

impl Theme {
    pub fn from_palette(p: &Palette) -> Self {
        let fg = |s: &str| Style::default().fg(color(s));
        Self {
            title: Style::default()
                .fg(color(&p.title.foreground))
                .bg(color(&p.title.background))
                .add_modifier(Modifier::BOLD),
            selected: fg(&p.selected).add_modifier(Modifier::BOLD),
            dimmed: fg(&p.dimmed),
            help: fg(&p.help),
            error: fg(&p.error).add_modifier(Modifier::BOLD),
            success: fg(&p.success).add_modifier(Modifier::BOLD),
            border: fg(&p.border),
            input: fg(&p.input),
            focused_input: fg(&p.focused_input),
            spinner: fg(&p.spinner),
            highlight: fg(&p.highlight).add_modifier(Modifier::BOLD),
            filter_border: fg(&p.filter_border),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_palette(&Palette::default())
    }
}

/// Unknown colour strings fall back to the terminal default
fn color(s: &str) -> Color {
    s.trim().parse::<Color>().unwrap_or(Color::Reset)
}
