use crossterm::event::{KeyCode, KeyModifiers};

use crate::fuzzy::{self, Match};

use super::input::TextInput;

/// Cursor plus fuzzy-filtered view over a list owned elsewhere.
///
/// Rows are positions into the filtered result; `source_index` maps a row back
/// to the full list.
#[derive(Debug, Clone, Default)]
pub struct FilteredList {
    query: TextInput,
    filtering: bool,
    matches: Vec<Match>,
    cursor: usize,
}

impl FilteredList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &TextInput {
        &self.query
    }

    /// Whether keystrokes currently edit the query
    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    pub fn start_filtering(&mut self) {
        self.filtering = true;
    }

    /// Stop editing and keep the current query applied
    pub fn commit_filter(&mut self) {
        self.filtering = false;
    }

    /// Stop editing, drop the query and show every candidate with the cursor on top
    pub fn cancel_filter<S: AsRef<str>>(&mut self, candidates: &[S]) {
        self.filtering = false;
        self.query.clear();
        self.refilter(candidates);
    }

    /// Key handling while the query has focus. `Esc` drops the query, `Enter`
    /// keeps it, anything else edits it and re-filters.
    pub fn handle_filter_key<S: AsRef<str>>(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        candidates: &[S],
    ) {
        match code {
            KeyCode::Esc => self.cancel_filter(candidates),
            KeyCode::Enter => self.commit_filter(),
            _ => {
                if self.query.handle_key(code, modifiers) {
                    self.refilter(candidates);
                }
            }
        }
    }

    /// Re-run the current query and put the cursor on the first row
    pub fn refilter<S: AsRef<str>>(&mut self, candidates: &[S]) {
        self.matches = fuzzy::filter(self.query.text(), candidates);
        self.cursor = 0;
    }

    /// Re-run the current query after the candidates changed, keeping the
    /// cursor position when it is still in range.
    pub fn reload<S: AsRef<str>>(&mut self, candidates: &[S]) {
        let cursor = self.cursor;
        self.matches = fuzzy::filter(self.query.text(), candidates);
        self.cursor = cursor.min(self.len().saturating_sub(1));
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.matches.len() {
            self.cursor += 1;
        }
    }

    /// Index into the full list of the row at `row`
    pub fn source_index(&self, row: usize) -> Option<usize> {
        self.matches.get(row).map(|m| m.index)
    }

    /// Index into the full list of the row under the cursor
    pub fn selected(&self) -> Option<usize> {
        self.source_index(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 4] = ["api", "web", "worker", "docs"];

    fn type_query(list: &mut FilteredList, query: &str) {
        list.start_filtering();
        for ch in query.chars() {
            list.handle_filter_key(KeyCode::Char(ch), KeyModifiers::NONE, &NAMES);
        }
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut list = FilteredList::new();
        list.refilter(&NAMES);
        list.move_up();
        assert_eq!(list.cursor(), 0);
        for _ in 0..10 {
            list.move_down();
        }
        assert_eq!(list.cursor(), 3);
        assert_eq!(list.selected(), Some(3));
    }

    #[test]
    fn test_filter_maps_rows_to_source() {
        let mut list = FilteredList::new();
        list.refilter(&NAMES);
        list.move_down();
        type_query(&mut list, "wor");
        assert_eq!(list.cursor(), 0);
        assert_eq!(list.len(), 1);
        assert_eq!(list.selected(), Some(2));
    }

    #[test]
    fn test_no_match_selects_nothing() {
        let mut list = FilteredList::new();
        type_query(&mut list, "zz");
        assert!(list.is_empty());
        assert_eq!(list.selected(), None);
    }

    #[test]
    fn test_cancel_restores_everything() {
        let mut list = FilteredList::new();
        type_query(&mut list, "zz");
        list.cancel_filter(&NAMES);
        assert!(!list.is_filtering());
        assert!(list.query().is_empty());
        assert_eq!(list.len(), NAMES.len());
    }

    #[test]
    fn test_reload_clamps_cursor() {
        let mut list = FilteredList::new();
        list.refilter(&NAMES);
        for _ in 0..3 {
            list.move_down();
        }
        list.reload(&NAMES[..2]);
        assert_eq!(list.cursor(), 1);
        list.reload::<&str>(&[]);
        assert_eq!(list.cursor(), 0);
        assert_eq!(list.selected(), None);
    }
}
