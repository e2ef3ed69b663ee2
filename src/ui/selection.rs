use std::collections::BTreeSet;

/// Visual-mode selection: the rows between a fixed anchor and the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualSelection {
    anchor: usize,
    selected: BTreeSet<usize>,
}

impl VisualSelection {
    /// Start at `anchor` with only that row selected
    pub fn new(anchor: usize) -> Self {
        Self {
            anchor,
            selected: BTreeSet::from([anchor]),
        }
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// Replace the selection with the closed interval anchor..=cursor,
    /// clipped to a list of `len` rows.
    pub fn extend_to(&mut self, cursor: usize, len: usize) {
        let (lo, hi) = if cursor < self.anchor {
            (cursor, self.anchor)
        } else {
            (self.anchor, cursor)
        };
        self.selected = (lo..=hi).filter(|&i| i < len).collect();
    }

    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }
}
