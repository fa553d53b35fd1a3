use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::{Item, ItemKey};

/// A host-supplied matcher. Receives the query and every item in logical order and must return
/// matching indices in ascending order.
pub type CustomMatcher<K> = Arc<dyn Fn(&str, &[&Item<K>]) -> Vec<usize> + Send + Sync>;

/// Strategy used by [`crate::Viewport::search`].
pub enum SearchMatcher<K = ItemKey> {
    /// Case-insensitive substring match against raw content.
    Substring,
    /// Every whitespace-separated query token must appear as a token of the content. Answered
    /// from the inverted index.
    Token,
    Custom(CustomMatcher<K>),
}

impl<K> SearchMatcher<K> {
    pub fn custom(f: impl Fn(&str, &[&Item<K>]) -> Vec<usize> + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }
}

impl<K> Default for SearchMatcher<K> {
    fn default() -> Self {
        Self::Substring
    }
}

impl<K> Clone for SearchMatcher<K> {
    fn clone(&self) -> Self {
        match self {
            Self::Substring => Self::Substring,
            Self::Token => Self::Token,
            Self::Custom(f) => Self::Custom(Arc::clone(f)),
        }
    }
}

impl<K> fmt::Debug for SearchMatcher<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring => f.write_str("Substring"),
            Self::Token => f.write_str("Token"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Lower-cased whitespace tokens of `content`.
pub fn tokenize(content: &str) -> impl Iterator<Item = String> + '_ {
    content.split_whitespace().map(str::to_lowercase)
}

/// Inverted word index: token → ascending logical indices.
#[derive(Clone, Debug, Default)]
pub struct SearchIndex {
    postings: BTreeMap<String, Vec<usize>>,
    items: usize,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the whole index from `contents` in logical order.
    pub fn rebuild<'a>(&mut self, contents: impl IntoIterator<Item = &'a str>) {
        self.postings.clear();
        self.items = 0;
        for (index, content) in contents.into_iter().enumerate() {
            for token in tokenize(content) {
                let list = self.postings.entry(token).or_default();
                if list.last() != Some(&index) {
                    list.push(index);
                }
            }
            self.items = index + 1;
        }
    }

    pub fn clear(&mut self) {
        self.postings.clear();
        self.items = 0;
    }

    /// Number of items indexed by the last rebuild.
    pub fn indexed_items(&self) -> usize {
        self.items
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Indices containing `token` (case-insensitive).
    pub fn postings(&self, token: &str) -> &[usize] {
        let lowered = token.to_lowercase();
        self.postings
            .get(lowered.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Indices containing every token of `query`, ascending. Empty for an empty query.
    pub fn query_tokens(&self, query: &str) -> Vec<usize> {
        let mut tokens = tokenize(query);
        let Some(first) = tokens.next() else {
            return Vec::new();
        };
        let mut acc: Vec<usize> = self
            .postings
            .get(first.as_str())
            .cloned()
            .unwrap_or_default();
        for token in tokens {
            if acc.is_empty() {
                break;
            }
            let list = self
                .postings
                .get(token.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            acc = intersect_sorted(&acc, list);
        }
        acc
    }
}

fn intersect_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            core::cmp::Ordering::Less => i += 1,
            core::cmp::Ordering::Greater => j += 1,
            core::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Case-insensitive substring scan.
pub(crate) fn substring_matches<'a, K: 'a>(
    query: &str,
    items: impl IntoIterator<Item = &'a Item<K>>,
) -> Vec<usize> {
    let needle = query.to_lowercase();
    items
        .into_iter()
        .enumerate()
        .filter(|(_, item)| item.content.to_lowercase().contains(needle.as_str()))
        .map(|(i, _)| i)
        .collect()
}

/// Bounds-checks host matcher output and restores strict ascending order.
pub(crate) fn sanitize_matches(mut matches: Vec<usize>, count: usize) -> Vec<usize> {
    let before = matches.len();
    matches.retain(|&i| i < count);
    if matches.len() != before {
        vwarn!(
            dropped = before - matches.len(),
            count,
            "search matcher returned out-of-bounds indices"
        );
    }
    if !matches.windows(2).all(|w| w[0] < w[1]) {
        vwarn!("search matcher returned unsorted indices; re-sorting");
        matches.sort_unstable();
        matches.dedup();
    }
    matches
}

/// Query, ordered matches and cursor of the active search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SearchState {
    pub(crate) query: String,
    pub(crate) matches: Vec<usize>,
    pub(crate) current: Option<usize>,
}

impl SearchState {
    pub(crate) fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current = None;
    }

    /// Replaces the match list, keeping the cursor where possible.
    pub(crate) fn set_matches(&mut self, matches: Vec<usize>, reset_cursor: bool) {
        self.matches = matches;
        self.current = if self.matches.is_empty() {
            None
        } else if reset_cursor {
            Some(0)
        } else {
            Some(self.current.unwrap_or(0).min(self.matches.len() - 1))
        };
    }

    pub(crate) fn current_index(&self) -> Option<usize> {
        self.matches.get(self.current?).copied()
    }

    pub(crate) fn is_match(&self, index: usize) -> bool {
        self.matches.binary_search(&index).is_ok()
    }

    pub(crate) fn step(&mut self, forward: bool) -> Option<usize> {
        let n = self.matches.len();
        if n == 0 {
            return None;
        }
        let cur = self.current.unwrap_or(0);
        let next = if forward { (cur + 1) % n } else { (cur + n - 1) % n };
        self.current = Some(next);
        self.current_index()
    }
}
