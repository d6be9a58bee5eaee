use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{M}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref DEFAULT_TOKENIZER: Tokenizer = Tokenizer::new(TokenizerConfig::default());
}

/// Articles and conjunctions.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "the",
    "and", "or", "but", "nor", "so", "yet",
    "if", "as", "because", "although", "though", "while", "whereas", "unless",
];

#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Tokens with fewer characters than this are dropped.
    pub min_token_len: usize,
    pub stopwords: HashSet<String>,
    /// Apply English snowball stemming to every kept token.
    pub stem: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_len: 2,
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            stem: false,
        }
    }
}

/// Splits text into normalized index terms. The same instance must be used
/// for building and querying, so an [`Index`](crate::Index) carries its own.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self { Self { config } }

    pub fn config(&self) -> &TokenizerConfig { &self.config }

    fn is_stopword(&self, token: &str) -> bool { self.config.stopwords.contains(token) }

    /// Tokenize text using NFKC normalization, lowercase, length and stopword filtering,
    /// and optional stemming.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if text.is_empty() { return Vec::new(); }
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        for mat in RE.find_iter(&normalized) {
            let token = mat.as_str();
            if token.chars().count() < self.config.min_token_len { continue; }
            if self.is_stopword(token) { continue; }
            if self.config.stem {
                tokens.push(STEMMER.stem(token).into_owned());
            } else {
                tokens.push(token.to_string());
            }
        }
        tokens
    }

    /// Distinct tokens in first-occurrence order.
    pub fn unique_tokens(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tokenize(text).into_iter().filter(|t| seen.insert(t.clone())).collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self { DEFAULT_TOKENIZER.clone() }
}

/// Tokenize with the default configuration.
pub fn tokenize(text: &str) -> Vec<String> {
    DEFAULT_TOKENIZER.tokenize(text)
}
