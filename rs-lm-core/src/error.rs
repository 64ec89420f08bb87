//! Error type shared by every stage of the pipeline.
//!
//! Tokenization and counting never fail. Smoothing, generation and scoring
//! validate their preconditions and fail fast with one of these variants
//! instead of letting NaN or infinity leak out.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::ngram::Order;

/// Convenient result type used throughout the crate.
pub type Result<T, E = LmError> = std::result::Result<T, E>;

/// Failures raised while configuring, training, smoothing or querying a model.
#[derive(Debug, Error)]
pub enum LmError {
	/// A configuration value failed validation.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// Training was attempted without a single sentence.
	#[error("corpus is empty, nothing to train on")]
	EmptyCorpus,

	/// No n-gram type was observed exactly `count` times, so `N_count` would
	/// be used as a zero denominator.
	#[error("{order} frequency class N_{count} is empty; corpus too small for the smoothing cutoff")]
	EmptyFrequencyClass { order: Order, count: usize },

	/// The discount formula produced an unusable value.
	#[error("{order} discount for count {count} is degenerate: {reason}")]
	DegenerateDiscount { order: Order, count: usize, reason: String },

	/// `V^n` does not fit in 64 bits.
	#[error("{order} space overflows for a vocabulary of {vocabulary} types")]
	VocabularyOverflow { order: Order, vocabulary: usize },

	/// A key needed during scoring is absent from a smoothed map.
	#[error("smoothed model has no entry for {key}")]
	MissingKey { key: String },

	/// A probability or one of its denominators is not strictly positive.
	#[error("zero probability while scoring {context}")]
	ZeroProbability { context: String },

	/// Held-out text contained no sentence to score.
	#[error("text contains no sentence to score")]
	EmptyText,

	/// The unigram distribution carries no mass at all.
	#[error("unigram distribution has zero total mass")]
	EmptyDistribution,

	/// Generation did not reach an end marker within the step cap.
	#[error("generation exceeded {steps} steps without reaching an end marker")]
	GenerationCapExceeded { steps: usize },

	/// The requested n-gram order was not counted when the model was trained.
	#[error("model was trained without {0} counts")]
	OrderNotTrained(Order),

	/// Filesystem error with the path involved, when known.
	#[error("io error while processing {path:?}: {source}")]
	Io {
		source: std::io::Error,
		path: Option<PathBuf>,
	},
}

impl LmError {
	/// Wraps an IO error and attaches the path being processed.
	pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
		Self::Io { source, path }
	}

	/// Builds a [`LmError::MissingKey`] from anything displayable.
	pub(crate) fn missing<K: std::fmt::Display>(key: K) -> Self {
		Self::MissingKey { key: key.to_string() }
	}
}

impl From<std::io::Error> for LmError {
	fn from(err: std::io::Error) -> Self {
		Self::io(err, None)
	}
}
