//! Fuzzy filtering for the session and repository lists.
//!
//! Results keep the index of each match in the source list so the UI can map a
//! filtered row back to its item, and the matched character positions so the
//! renderer can highlight them.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::repo::Repository;

/// A candidate that survived filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index into the unfiltered candidate list
    pub index: usize,
    pub score: i64,
    /// Matched character positions (char indices, not bytes)
    pub positions: Vec<usize>,
}

impl Match {
    fn unranked(index: usize) -> Self {
        Self {
            index,
            score: 0,
            positions: Vec::new(),
        }
    }
}

/// Filter `candidates` by `query`.
///
/// An empty query keeps every candidate in source order. Otherwise only
/// subsequence matches are kept, best score first, ties by source index.
pub fn filter<S: AsRef<str>>(query: &str, candidates: &[S]) -> Vec<Match> {
    if query.is_empty() {
        return (0..candidates.len()).map(Match::unranked).collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut matches: Vec<Match> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            matcher
                .fuzzy_indices(candidate.as_ref(), query)
                .map(|(score, positions)| Match {
                    index,
                    score,
                    positions,
                })
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
    matches
}

/// Searchable text for a repository: name and path, so either can match.
pub fn repository_haystack(repo: &Repository) -> String {
    format!("{} {}", repo.name, repo.path.display())
}

/// Split positions matched against [`repository_haystack`] into name and path
/// highlights (each relative to its own field).
pub fn split_repository_positions(
    repo: &Repository,
    positions: &[usize],
) -> (Vec<usize>, Vec<usize>) {
    let name_len = repo.name.chars().count();
    let mut name = Vec::new();
    let mut path = Vec::new();
    for &pos in positions {
        if pos < name_len {
            name.push(pos);
        } else if pos > name_len {
            path.push(pos - name_len - 1);
        }
    }
    (name, path)
}
