//! Top-level module for the n-gram language model.
//!
//! This module provides:
//! - Tokens and n-gram keys (`Token`, `Bigram`, `Trigram`)
//! - Raw counting (`CountModel`)
//! - Count smoothing (`Smoother`, `Smoothed`)
//! - The trained model (`LanguageModel`)
//! - Sentence generation (`Generator`) and perplexity scoring (`PerplexityScorer`)

/// Token vocabulary, including sentence markers and the unknown word.
pub mod token;

/// N-gram orders and bigram/trigram keys.
pub mod ngram;

/// Sentence tokenizer and sentence splitter.
pub mod tokenizer;

/// Model and generation configuration.
pub mod config;

/// Raw n-gram counts.
///
/// Handles sentence ingestion, boundary markers, reserved unknown-word
/// keys and model merging.
pub mod counts;

/// Frequency-of-frequency tables, Good-Turing and Katz discounting.
pub mod smoothing;

/// Weighted random selection over count or probability maps.
pub mod sampler;

/// Outgoing transitions of one generation context.
///
/// Not exposed
mod state;

/// The trained, smoothed language model.
pub mod language_model;

/// Sentence generation by weighted walks over the model.
pub mod generator;

/// Perplexity scoring of held-out text.
pub mod perplexity;
