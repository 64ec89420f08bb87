//! N-gram language modelling library.
//!
//! This crate provides a word-level n-gram language model including:
//! - Unigram, bigram and optional trigram counting
//! - Simple Good-Turing and Katz count smoothing
//! - Weighted random sentence generation with back-off
//! - Perplexity scoring of held-out text
//! - Corpus readers for plain, verse-numbered and review corpora

/// Core counting, smoothing, generation and scoring logic.
pub mod model;

/// Corpus readers (verse splitting, review parsing, markup removal).
pub mod corpus;

/// Error type shared by every fallible operation of the crate.
pub mod error;

/// I/O utilities (file loading, path helpers).
pub mod io;

pub use error::{LmError, Result};
pub use model::config::{Discount, GenerationConfig, ModelConfig, WeightSource};
pub use model::generator::Generator;
pub use model::language_model::LanguageModel;
pub use model::ngram::Order;
pub use model::perplexity::{PerplexityReport, PerplexityScorer, perplexity};
pub use model::token::Token;
