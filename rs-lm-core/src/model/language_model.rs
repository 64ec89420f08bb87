use std::path::Path;

use log::info;

use super::config::ModelConfig;
use super::counts::CountModel;
use super::ngram::{Bigram, Order, Trigram};
use super::smoothing::{Smoothed, Smoother};
use super::token::Token;
use crate::corpus::CorpusKind;
use crate::error::{LmError, Result};
use crate::io::read_to_string;

/// A trained and smoothed n-gram language model.
///
/// This struct owns:
/// - `counts`: raw unigram, bigram and (optionally) trigram counts,
///   reserved unknown-word keys included.
/// - one smoothed map per counted order, derived once from `counts`.
///
/// Every model owns its own maps; two models never share state.
///
/// # Invariants
/// - Each smoothed map covers exactly the keys of its count map
/// - `trigrams` is `Some` iff the configuration enabled trigrams
#[derive(Clone, Debug)]
pub struct LanguageModel {
	config: ModelConfig,
	counts: CountModel,
	unigrams: Smoothed<Token>,
	bigrams: Smoothed<Bigram>,
	trigrams: Option<Smoothed<Trigram>>,
}

impl LanguageModel {
	/// Counts every sentence, then smooths the counts.
	///
	/// # Errors
	/// - `InvalidConfig` if `config` does not validate.
	/// - `EmptyCorpus` if `sentences` is empty.
	/// - Any smoothing error (see [`Smoother::smooth`]).
	pub fn train<I, S>(sentences: I, config: ModelConfig) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		config.validate()?;
		let mut counts = CountModel::new(config.trigrams);
		for sentence in sentences {
			counts.observe_sentence(sentence.as_ref());
		}
		Self::from_counts(counts, config)
	}

	/// Reads a corpus file, splits it into sentences according to `kind` and trains on them.
	///
	/// # Errors
	/// Returns `Io` with the path if the file cannot be read, plus any
	/// [`LanguageModel::train`] error.
	pub fn from_file<P: AsRef<Path>>(path: P, kind: CorpusKind, config: ModelConfig) -> Result<Self> {
		let text = read_to_string(&path)?;
		let sentences = kind.sentences(&text);
		info!("read {} sentences from {}", sentences.len(), path.as_ref().display());
		Self::train(sentences, config)
	}

	/// Smooths an already populated count model.
	///
	/// Useful when shards were counted separately and merged with
	/// [`CountModel::merge`] beforehand.
	pub fn from_counts(mut counts: CountModel, config: ModelConfig) -> Result<Self> {
		config.validate()?;
		if counts.sentence_count() == 0 {
			return Err(LmError::EmptyCorpus);
		}
		if counts.trigrams_enabled() != config.trigrams {
			return Err(LmError::InvalidConfig(format!(
				"count model trigram setting ({}) differs from the configuration ({})",
				counts.trigrams_enabled(),
				config.trigrams
			)));
		}

		counts.reserve_unknown_keys();
		let smoother = Smoother::new(&config)?;
		let vocabulary = counts.vocabulary_size();

		let unigrams = smoother.smooth(Order::Unigram, counts.unigrams(), None)?;

		let unseen = Smoother::unseen_types(Order::Bigram, vocabulary, counts.observed_types(Order::Bigram))?;
		let bigrams = smoother.smooth(Order::Bigram, counts.bigrams(), Some(unseen))?;

		let trigrams = match counts.trigrams() {
			Some(map) => {
				let unseen = Smoother::unseen_types(Order::Trigram, vocabulary, counts.observed_types(Order::Trigram))?;
				Some(smoother.smooth(Order::Trigram, map, Some(unseen))?)
			}
			None => None,
		};

		info!(
			"trained on {} sentences: {} unigram, {} bigram types",
			counts.sentence_count(),
			vocabulary,
			counts.observed_types(Order::Bigram)
		);

		Ok(Self { config, counts, unigrams, bigrams, trigrams })
	}

	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	/// Raw counts, reserved keys included.
	pub fn counts(&self) -> &CountModel {
		&self.counts
	}

	pub fn smoothed_unigrams(&self) -> &Smoothed<Token> {
		&self.unigrams
	}

	pub fn smoothed_bigrams(&self) -> &Smoothed<Bigram> {
		&self.bigrams
	}

	/// Smoothed trigrams, `None` if the model was trained without them.
	pub fn smoothed_trigrams(&self) -> Option<&Smoothed<Trigram>> {
		self.trigrams.as_ref()
	}

	/// Whether the model has counts for `order`.
	pub fn has_order(&self, order: Order) -> bool {
		order != Order::Trigram || self.trigrams.is_some()
	}

	/// `true` if the token was observed during training.
	pub fn in_vocabulary(&self, token: &Token) -> bool {
		self.counts.contains(token)
	}

	/// Number of unigram types observed during training, markers included.
	pub fn vocabulary_size(&self) -> usize {
		self.counts.vocabulary_size()
	}
}
