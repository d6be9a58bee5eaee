//! In-memory search over documentation-site records.
//!
//! Build an [`Index`] once from a record set, then run any number of concurrent
//! [`search`] calls against it.

pub mod error;
pub mod index;
pub mod query;
pub mod record;
pub mod source;
pub mod tokenizer;

pub use error::SearchError;
pub use index::{DocId, Index, IndexBuilder, IndexConfig, IndexStats, Posting, TermId};
pub use query::{checked_limit, search, search_with, QueryResult, SearchHits, SearchOptions, DEFAULT_LIMIT};
pub use record::{Category, Record};
pub use tokenizer::{tokenize, Tokenizer, TokenizerConfig};
