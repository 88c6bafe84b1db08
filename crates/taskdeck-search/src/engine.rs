//! Query execution: matching, scoring, sorting and pagination

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::index::IndexStore;
use crate::normalize::NormalizedText;
use crate::query::{SearchQuery, SearchResult, SearchResults, SortBy, SortOrder};
use crate::record::IndexedRecord;

/// Characters of context kept on each side of a content match
const SNIPPET_CONTEXT: usize = 40;

/// How a record matched the query, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    FuzzyContent,
    ExactContent,
    FuzzyTitle,
    ExactTitle,
}

impl MatchKind {
    /// Lower bound of this match kind's score band
    fn base(self) -> f64 {
        match self {
            MatchKind::FuzzyContent => 0.0,
            MatchKind::ExactContent => 100.0,
            MatchKind::FuzzyTitle => 200.0,
            MatchKind::ExactTitle => 300.0,
        }
    }
}

/// Execute `query` against the current contents of `store`
///
/// A blank query yields no results before its options are checked, so
/// `{query: "", limit: 0}` is empty rather than an error.
pub fn search(store: &IndexStore, query: &SearchQuery) -> Result<SearchResults> {
    if query.is_blank() {
        return Ok(SearchResults::empty());
    }
    query.validate()?;
    let candidates = store.snapshot(&query.filters);
    Ok(rank(candidates, query))
}

/// Rank an already-filtered set of records
///
/// Split from [`search`] so callers can take the snapshot under a lock and
/// do the matching after releasing it.
pub fn rank(candidates: Vec<Arc<IndexedRecord>>, query: &SearchQuery) -> SearchResults {
    let needle = NormalizedText::new(&query.query);
    if needle.is_empty() {
        return SearchResults::empty();
    }

    let mut hits: Vec<Hit> = candidates
        .into_iter()
        .filter_map(|entry| {
            let (kind, score) = score_record(&entry, &needle, query)?;
            Some(Hit { entry, kind, score })
        })
        .collect();

    hits.sort_by(|a, b| compare_hits(a, b, query.sort_by, query.sort_order));

    let total = hits.len();
    let results = hits
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .map(|hit| hit.into_result(&needle, query.include_content))
        .collect();

    debug!("Query '{}' matched {} records", query.query, total);
    SearchResults { results, total }
}

struct Hit {
    entry: Arc<IndexedRecord>,
    kind: MatchKind,
    score: f64,
}

impl Hit {
    fn into_result(self, needle: &NormalizedText, include_content: bool) -> SearchResult {
        let snippet = if include_content {
            let anchor = (self.kind == MatchKind::ExactContent).then_some(needle.text.as_str());
            snippet(&self.entry.record.content, anchor)
        } else {
            None
        };

        let record = &self.entry.record;
        SearchResult {
            id: record.id.clone(),
            kind: record.kind,
            workspace_id: record.workspace_id.clone(),
            workspace_name: record.workspace_name.clone(),
            title: record.title.clone(),
            score: self.score,
            snippet,
            metadata: record.metadata.clone(),
            updated_at: record.updated_at,
        }
    }
}

/// Best match of the record against the query, with its score
fn score_record(
    entry: &IndexedRecord,
    needle: &NormalizedText,
    query: &SearchQuery,
) -> Option<(MatchKind, f64)> {
    let title = entry.normalized_title();
    let content = entry.normalized_content();

    let (kind, field) = if title.contains_phrase(needle) {
        (MatchKind::ExactTitle, title)
    } else if query.fuzzy_search && title.contains_tokens(needle) {
        (MatchKind::FuzzyTitle, title)
    } else if query.include_content && content.contains_phrase(needle) {
        (MatchKind::ExactContent, content)
    } else if query.include_content && query.fuzzy_search && content.contains_tokens(needle) {
        (MatchKind::FuzzyContent, content)
    } else {
        return None;
    };

    Some((kind, kind.base() + 1.0 + 98.0 * specificity(needle, field)))
}

/// Share of the field's tokens covered by the query, in `(0, 1]`
///
/// Measured in tokens so that titles of equal word count tie regardless of
/// word lengths.
fn specificity(needle: &NormalizedText, field: &NormalizedText) -> f64 {
    let wanted = needle.tokens.len().max(1) as f64;
    let available = field.tokens.len().max(1) as f64;
    (wanted / available).min(1.0)
}

fn compare_hits(a: &Hit, b: &Hit, sort_by: SortBy, order: SortOrder) -> Ordering {
    let primary = match sort_by {
        SortBy::Relevance => a.score.total_cmp(&b.score),
        SortBy::UpdatedAt => a.entry.record.updated_at.cmp(&b.entry.record.updated_at),
        SortBy::Title => a
            .entry
            .normalized_title()
            .text
            .cmp(&b.entry.normalized_title().text),
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };

    // Fixed tie-break independent of the requested order: better score,
    // then newer, then kind and id.
    primary
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| b.entry.record.updated_at.cmp(&a.entry.record.updated_at))
        .then_with(|| a.entry.record.kind.cmp(&b.entry.record.kind))
        .then_with(|| a.entry.record.id.cmp(&b.entry.record.id))
}

/// Excerpt of `content` around `anchor`, or its beginning without one
fn snippet(content: &str, anchor: Option<&str>) -> Option<String> {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    let chars: Vec<char> = collapsed.chars().collect();
    let lowered = collapsed.to_lowercase();

    // Lower-casing can change the char count for a few scripts; positions
    // only carry over when it did not.
    let position = anchor
        .filter(|_| lowered.chars().count() == chars.len())
        .and_then(|anchor| {
            lowered
                .find(anchor)
                .map(|byte| (lowered[..byte].chars().count(), anchor.chars().count()))
        });

    let (from, to) = match position {
        Some((start, len)) => (
            start.saturating_sub(SNIPPET_CONTEXT),
            (start + len + SNIPPET_CONTEXT).min(chars.len()),
        ),
        None => (0, (2 * SNIPPET_CONTEXT).min(chars.len())),
    };

    let mut excerpt = String::new();
    if from > 0 {
        excerpt.push('…');
    }
    excerpt.extend(&chars[from..to]);
    if to < chars.len() {
        excerpt.push('…');
    }
    Some(excerpt)
}
