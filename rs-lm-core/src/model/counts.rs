use std::collections::HashMap;
use std::hash::Hash;

use super::ngram::{Bigram, Order, Trigram};
use super::token::Token;
use super::tokenizer::tokenize;
use crate::error::{LmError, Result};

/// Raw occurrence counts of unigrams, bigrams and (optionally) trigrams.
///
/// # Responsibilities
/// - Tokenize sentences and accumulate n-gram counts, START/END included
/// - Merge with another count model built over a different shard
/// - Insert the reserved unknown-word keys before smoothing
///
/// # Invariants
/// - START and END unigram counts both equal the number of observed sentences
/// - For every token, the counts of bigrams starting with it sum to its
///   unigram count (reserved zero-count keys aside)
/// - Zero counts only exist for reserved unknown-word keys
#[derive(Clone, Debug, Default)]
pub struct CountModel {
	/// Whether trigram windows are counted.
	trigrams_enabled: bool,

	unigrams: HashMap<Token, u64>,
	bigrams: HashMap<Bigram, u64>,
	trigrams: HashMap<Trigram, u64>,

	/// Number of sentences observed.
	sentences: u64,

	/// Number of WORD token occurrences observed.
	tokens: u64,
}

fn bump<K: Eq + Hash>(map: &mut HashMap<K, u64>, key: K, by: u64) {
	*map.entry(key).or_insert(0) += by;
}

impl CountModel {
	/// Creates an empty count model, counting trigrams if `trigrams` is set.
	pub fn new(trigrams: bool) -> Self {
		Self { trigrams_enabled: trigrams, ..Self::default() }
	}

	/// Tokenizes a sentence and counts its n-grams.
	///
	/// # Notes
	/// - A sentence with no token still counts START, END and `(START, END)`.
	/// - Trigrams are the windows of three over `[START, t0, .., tn-1, END]`;
	///   an empty sentence yields none, a one-token one yields `(START, t0, END)`.
	pub fn observe_sentence(&mut self, sentence: &str) {
		let tokens = tokenize(sentence);
		self.observe_tokens(&tokens);
	}

	/// Counts an already tokenized sentence.
	pub fn observe_tokens(&mut self, tokens: &[Token]) {
		let mut bracketed = Vec::with_capacity(tokens.len() + 2);
		bracketed.push(Token::Start);
		bracketed.extend_from_slice(tokens);
		bracketed.push(Token::End);

		for token in &bracketed {
			bump(&mut self.unigrams, token.clone(), 1);
		}

		for pair in bracketed.windows(2) {
			bump(&mut self.bigrams, Bigram::new(pair[0].clone(), pair[1].clone()), 1);
		}

		if self.trigrams_enabled {
			for triple in bracketed.windows(3) {
				bump(
					&mut self.trigrams,
					Trigram::new(triple[0].clone(), triple[1].clone(), triple[2].clone()),
					1,
				);
			}
		}

		self.sentences += 1;
		self.tokens += tokens.len() as u64;
	}

	/// Inserts the reserved unknown-word keys with a count of 0.
	///
	/// Reserved keys are the unigram `UNK` and the bigrams `(w, UNK)`,
	/// `(UNK, UNK)` and `(UNK, w)` where `w` is [`Token::AnyWord`].
	/// Existing counts are never touched, so calling this twice is harmless.
	pub fn reserve_unknown_keys(&mut self) {
		self.unigrams.entry(Token::Unknown).or_insert(0);
		for key in reserved_bigrams() {
			self.bigrams.entry(key).or_insert(0);
		}
	}

	/// Merges another count model into this one by summing counts key-wise.
	///
	/// # Errors
	/// Returns an error if only one of the two models counts trigrams.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.trigrams_enabled != other.trigrams_enabled {
			return Err(LmError::InvalidConfig(
				"cannot merge count models with different trigram settings".to_owned(),
			));
		}

		for (key, count) in &other.unigrams {
			bump(&mut self.unigrams, key.clone(), *count);
		}
		for (key, count) in &other.bigrams {
			bump(&mut self.bigrams, key.clone(), *count);
		}
		for (key, count) in &other.trigrams {
			bump(&mut self.trigrams, key.clone(), *count);
		}
		self.sentences += other.sentences;
		self.tokens += other.tokens;

		Ok(())
	}

	pub fn unigrams(&self) -> &HashMap<Token, u64> {
		&self.unigrams
	}

	pub fn bigrams(&self) -> &HashMap<Bigram, u64> {
		&self.bigrams
	}

	/// Trigram counts, `None` if the model was built without them.
	pub fn trigrams(&self) -> Option<&HashMap<Trigram, u64>> {
		self.trigrams_enabled.then_some(&self.trigrams)
	}

	pub fn trigrams_enabled(&self) -> bool {
		self.trigrams_enabled
	}

	/// Number of sentences observed.
	pub fn sentence_count(&self) -> u64 {
		self.sentences
	}

	/// Number of WORD token occurrences observed (markers excluded).
	pub fn token_count(&self) -> u64 {
		self.tokens
	}

	/// Raw count of a unigram, 0 if unseen.
	pub fn count(&self, token: &Token) -> u64 {
		self.unigrams.get(token).copied().unwrap_or(0)
	}

	/// `true` if the token was observed at least once.
	pub fn contains(&self, token: &Token) -> bool {
		self.count(token) > 0
	}

	/// Number of unigram types observed at least once, markers included.
	pub fn vocabulary_size(&self) -> usize {
		self.unigrams.values().filter(|count| **count > 0).count()
	}

	/// Number of distinct keys of `order` observed at least once.
	pub fn observed_types(&self, order: Order) -> usize {
		match order {
			Order::Unigram => self.vocabulary_size(),
			Order::Bigram => self.bigrams.values().filter(|count| **count > 0).count(),
			Order::Trigram => self.trigrams.values().filter(|count| **count > 0).count(),
		}
	}
}

/// The reserved bigram keys standing in for unknown words.
pub fn reserved_bigrams() -> [Bigram; 3] {
	[
		Bigram::new(Token::AnyWord, Token::Unknown),
		Bigram::new(Token::Unknown, Token::Unknown),
		Bigram::new(Token::Unknown, Token::AnyWord),
	]
}
