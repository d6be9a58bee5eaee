use crate::error::{Result, SearchError};
use crate::record::{Category, Record};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub tokenizer: TokenizerConfig,
    /// Weight of a title token occurrence.
    pub title_weight: f32,
    /// Weight of a text token occurrence.
    pub text_weight: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { tokenizer: TokenizerConfig::default(), title_weight: 2.0, text_weight: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub title_tf: u32,
    pub text_tf: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_postings: usize,
    pub by_category: BTreeMap<Category, usize>,
}

/// Immutable inverted index over a record set. Construct with [`IndexBuilder`].
#[derive(Debug)]
pub struct Index {
    records: Vec<Record>,
    dictionary: HashMap<String, TermId>,
    postings: Vec<Vec<Posting>>, // indexed by TermId, each sorted by doc_id
    /// ln(1 + weighted token length) per record.
    damping: Vec<f32>,
    doc_id_map: HashMap<String, DocId>,
    tokenizer: Tokenizer,
    title_weight: f32,
    text_weight: f32,
}

impl Index {
    /// Build with the default configuration.
    pub fn build(records: &[Record]) -> Result<Self> {
        IndexBuilder::default().build(records)
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn records(&self) -> &[Record] { &self.records }

    pub fn record(&self, doc_id: DocId) -> Option<&Record> { self.records.get(doc_id as usize) }

    /// Look a record up by its navigation anchor.
    pub fn get(&self, location: &str) -> Option<&Record> {
        self.doc_id_map.get(location).and_then(|&id| self.record(id))
    }

    pub fn num_terms(&self) -> usize { self.dictionary.len() }

    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

    /// Postings of an already-normalized term.
    pub fn postings(&self, term: &str) -> &[Posting] {
        match self.dictionary.get(term) {
            Some(&tid) => &self.postings[tid as usize],
            None => &[],
        }
    }

    pub(crate) fn posting_weight(&self, p: &Posting) -> f32 {
        p.title_tf as f32 * self.title_weight + p.text_tf as f32 * self.text_weight
    }

    pub(crate) fn damping(&self, doc_id: DocId) -> f32 { self.damping[doc_id as usize] }

    pub fn stats(&self) -> IndexStats {
        let mut by_category = BTreeMap::new();
        for r in &self.records {
            *by_category.entry(r.category).or_insert(0) += 1;
        }
        IndexStats {
            num_docs: self.records.len(),
            num_terms: self.dictionary.len(),
            num_postings: self.postings.iter().map(Vec::len).sum(),
            by_category,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    config: IndexConfig,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig) -> Self { Self { config } }

    /// Build an index over a private copy of `records`.
    ///
    /// Fails with [`SearchError::DuplicateKey`] if two records share a location.
    pub fn build(&self, records: &[Record]) -> Result<Index> {
        let IndexConfig { tokenizer, title_weight, text_weight } = &self.config;
        for (name, w) in [("title_weight", *title_weight), ("text_weight", *text_weight)] {
            if !w.is_finite() || w <= 0.0 {
                return Err(SearchError::InvalidArgument(format!("{name} must be positive, got {w}")));
            }
        }
        let tokenizer = Tokenizer::new(tokenizer.clone());

        let mut doc_id_map: HashMap<String, DocId> = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            if let Some(&first) = doc_id_map.get(&r.location) {
                return Err(SearchError::DuplicateKey {
                    location: r.location.clone(),
                    first: first as usize,
                    second: i,
                });
            }
            doc_id_map.insert(r.location.clone(), i as DocId);
        }

        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut postings: Vec<Vec<Posting>> = Vec::new();
        let mut damping: Vec<f32> = Vec::with_capacity(records.len());

        for (i, r) in records.iter().enumerate() {
            let doc_id = i as DocId;
            let title_tokens = tokenizer.tokenize(&r.title);
            let text_tokens = tokenizer.tokenize(&r.text);

            // (title_tf, text_tf) per term, in first-occurrence order so term ids are stable
            let mut order: Vec<TermId> = Vec::new();
            let mut tf: HashMap<TermId, (u32, u32)> = HashMap::new();
            let fields = title_tokens.into_iter().map(|t| (t, true)).chain(text_tokens.into_iter().map(|t| (t, false)));
            for (term, in_title) in fields {
                let tid = *dictionary.entry(term).or_insert_with(|| {
                    postings.push(Vec::new());
                    (postings.len() - 1) as TermId
                });
                let counts = tf.entry(tid).or_insert_with(|| {
                    order.push(tid);
                    (0, 0)
                });
                if in_title { counts.0 += 1 } else { counts.1 += 1 }
            }

            let mut weighted_len = 0.0f32;
            for tid in order {
                let (title_tf, text_tf) = tf[&tid];
                weighted_len += title_tf as f32 * title_weight + text_tf as f32 * text_weight;
                postings[tid as usize].push(Posting { doc_id, title_tf, text_tf });
            }
            damping.push((1.0 + weighted_len).ln());
        }

        tracing::debug!(num_docs = records.len(), num_terms = dictionary.len(), "built index");

        Ok(Index {
            records: records.to_vec(),
            dictionary,
            postings,
            damping,
            doc_id_map,
            tokenizer,
            title_weight: *title_weight,
            text_weight: *text_weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(location: &str, title: &str, text: &str) -> Record {
        Record::new(location, "P", title, text, Category::Type)
    }

    #[test]
    fn counts_title_and_text_separately() {
        let index = Index::build(&[rec("#a", "Tile coding", "tile tile features")]).unwrap();
        assert_eq!(index.postings("tile"), &[Posting { doc_id: 0, title_tf: 1, text_tf: 2 }]);
        assert_eq!(index.postings("coding"), &[Posting { doc_id: 0, title_tf: 1, text_tf: 0 }]);
        assert!(index.postings("missing").is_empty());
    }

    #[test]
    fn duplicate_location_names_both_positions() {
        let err = Index::build(&[rec("#a", "x1", ""), rec("#b", "y1", ""), rec("#a", "z1", "")]).unwrap_err();
        assert_eq!(err, SearchError::DuplicateKey { location: "#a".into(), first: 0, second: 2 });
    }

    #[test]
    fn rejects_non_positive_weights() {
        let builder = IndexBuilder::new(IndexConfig { text_weight: 0.0, ..Default::default() });
        assert!(matches!(builder.build(&[]), Err(SearchError::InvalidArgument(_))));
    }

    #[test]
    fn empty_fields_contribute_no_postings() {
        let index = Index::build(&[rec("#a", "", "")]).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.num_terms(), 0);
        assert_eq!(index.get("#a").map(|r| r.location.as_str()), Some("#a"));
    }

    #[test]
    fn stats_count_categories() {
        let records = vec![
            rec("#a", "alpha", ""),
            Record::new("#b", "P", "beta", "", Category::Function),
            rec("#c", "gamma", ""),
        ];
        let stats = Index::build(&records).unwrap().stats();
        assert_eq!(stats.num_docs, 3);
        assert_eq!(stats.by_category[&Category::Type], 2);
        assert_eq!(stats.by_category[&Category::Function], 1);
    }
}
