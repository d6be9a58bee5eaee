//! Query evaluation over an [`Index`].
//!
//! A record matches if it contains any query token. Its score is
//!
//! ```text
//! rel   = Σ_t (title_tf·title_weight + text_tf·text_weight) / ln(1 + weighted_len)
//! score = matched_tokens + rel / (1 + rel)
//! ```
//!
//! The fractional part stays below 1, so a record matching more distinct query
//! tokens always outranks one matching fewer. Within the same coverage, more
//! occurrences mean a higher score: adding an occurrence of weight `w` grows the
//! numerator by `w` and the weighted length by `w`, and `ln(1+x) >= x/(1+x)`
//! keeps the damping from catching up.
//!
//! Ties are broken by record order.

use crate::error::{Result, SearchError};
use crate::index::{DocId, Index};
use crate::record::{Category, Record};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

pub const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueryResult<'a> {
    pub record: &'a Record,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    /// Only return records of this category.
    pub category: Option<Category>,
}

impl Default for SearchOptions {
    fn default() -> Self { Self { limit: DEFAULT_LIMIT, category: None } }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHits<'a> {
    /// Number of matching records before truncation to the limit.
    pub total_hits: usize,
    pub results: Vec<QueryResult<'a>>,
}

/// Convert a caller-supplied signed limit.
pub fn checked_limit(limit: i64) -> Result<usize> {
    usize::try_from(limit).map_err(|_| SearchError::InvalidArgument(format!("limit must be >= 0, got {limit}")))
}

/// Return at most `limit` records matching `query`, best first.
pub fn search<'a>(index: &'a Index, query: &str, limit: usize) -> Vec<QueryResult<'a>> {
    search_with(index, query, &SearchOptions { limit, category: None }).results
}

pub fn search_with<'a>(index: &'a Index, query: &str, opts: &SearchOptions) -> SearchHits<'a> {
    let empty = SearchHits { total_hits: 0, results: Vec::new() };
    if opts.limit == 0 || index.is_empty() { return empty; }
    let terms = index.tokenizer().unique_tokens(query);
    if terms.is_empty() { return empty; }

    // doc -> (matched distinct terms, weighted occurrences)
    let mut acc: HashMap<DocId, (u32, f32)> = HashMap::new();
    for term in &terms {
        for p in index.postings(term) {
            let entry = acc.entry(p.doc_id).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += index.posting_weight(p);
        }
    }

    let scored = acc.into_iter().filter_map(|(doc_id, (matched, weight))| {
        let record = index.record(doc_id)?;
        if opts.category.is_some_and(|c| c != record.category) { return None; }
        let damping = index.damping(doc_id).max(f32::EPSILON);
        let rel = weight / damping;
        Some(Scored { doc_id, score: matched as f32 + rel / (1.0 + rel) })
    });

    let (total_hits, top) = top_k(scored, opts.limit);
    let results = top
        .into_iter()
        .filter_map(|s| index.record(s.doc_id).map(|record| QueryResult { record, score: s.score }))
        .collect();
    SearchHits { total_hits, results }
}

impl Index {
    pub fn search(&self, query: &str, limit: usize) -> Vec<QueryResult<'_>> {
        search(self, query, limit)
    }

    pub fn search_with(&self, query: &str, opts: &SearchOptions) -> SearchHits<'_> {
        search_with(self, query, opts)
    }
}

#[derive(Debug, Clone, Copy)]
struct Scored {
    doc_id: DocId,
    score: f32,
}

impl Scored {
    /// Best first: higher score, then lower doc id.
    fn rank(&self, other: &Self) -> Ordering {
        other.score.total_cmp(&self.score).then(self.doc_id.cmp(&other.doc_id))
    }
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool { self.rank(other) == Ordering::Equal }
}

impl Eq for Scored {}

impl Ord for Scored {
    // Worse entries compare greater so the heap top is the one to evict.
    fn cmp(&self, other: &Self) -> Ordering { self.rank(other) }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

/// Keep the best `k` entries with a bounded heap; returns the candidate count too.
fn top_k(scored: impl Iterator<Item = Scored>, k: usize) -> (usize, Vec<Scored>) {
    let mut total = 0usize;
    let mut heap: BinaryHeap<Scored> = BinaryHeap::with_capacity(k.saturating_add(1).min(1024));
    for s in scored {
        total += 1;
        if heap.len() < k {
            heap.push(s);
        } else if let Some(worst) = heap.peek() {
            if s < *worst {
                heap.pop();
                heap.push(s);
            }
        }
    }
    // ascending by `Ord` is best first
    (total, heap.into_sorted_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(doc_id: DocId, score: f32) -> Scored { Scored { doc_id, score } }

    #[test]
    fn top_k_orders_by_score_then_doc_id() {
        let input = vec![s(3, 1.5), s(0, 1.5), s(1, 2.0), s(2, 0.5)];
        let (total, top) = top_k(input.into_iter(), 3);
        assert_eq!(total, 4);
        let ids: Vec<DocId> = top.iter().map(|s| s.doc_id).collect();
        assert_eq!(ids, vec![1, 0, 3]);
    }

    #[test]
    fn top_k_with_large_limit_keeps_everything() {
        let (total, top) = top_k(vec![s(0, 1.0), s(1, 3.0)].into_iter(), 100);
        assert_eq!(total, 2);
        assert_eq!(top.iter().map(|s| s.doc_id).collect::<Vec<_>>(), vec![1, 0]);
    }

    #[test]
    fn negative_limit_is_rejected() {
        assert_eq!(checked_limit(5), Ok(5));
        assert!(matches!(checked_limit(-1), Err(SearchError::InvalidArgument(_))));
    }
}
