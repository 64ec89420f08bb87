use log::debug;
use serde::Serialize;

use super::language_model::LanguageModel;
use super::ngram::Bigram;
use super::token::Token;
use super::tokenizer::{split_sentences, tokenize};
use crate::error::{LmError, Result};

/// Log-probability of one scored token.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TokenScore {
	pub token: Token,
	pub log10_prob: f64,
}

/// Result of scoring a text.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PerplexityReport {
	/// `10^(sum_log10 / token_count)`.
	pub perplexity: f64,
	/// Negated sum of `log10 P` over every scored token.
	pub sum_log10: f64,
	/// Number of scored tokens, START/END included.
	pub token_count: usize,
	/// Per-token trace, in text order.
	pub trace: Vec<TokenScore>,
}

/// Scores held-out text against the smoothed bigram model.
///
/// Words absent from the training vocabulary are replaced by UNK and scored
/// with the reserved unknown-word entries.
#[derive(Clone, Copy, Debug)]
pub struct PerplexityScorer<'a> {
	model: &'a LanguageModel,
}

impl<'a> PerplexityScorer<'a> {
	pub fn new(model: &'a LanguageModel) -> Self {
		Self { model }
	}

	/// Tokenizes a sentence, brackets it with START/END and replaces
	/// out-of-vocabulary words by UNK.
	pub fn prepare(&self, sentence: &str) -> Vec<Token> {
		let mut tokens = Vec::new();
		tokens.push(Token::Start);
		tokens.extend(tokenize(sentence).into_iter().map(|token| {
			if self.model.in_vocabulary(&token) { token } else { Token::Unknown }
		}));
		tokens.push(Token::End);
		tokens
	}

	/// Smoothed unigram mass of a token.
	fn unigram_mass(&self, token: &Token) -> Result<f64> {
		self.model.smoothed_unigrams().get(token).ok_or_else(|| LmError::missing(token))
	}

	/// Smoothed mass of a reserved bigram.
	fn reserved_mass(&self, key: Bigram) -> Result<f64> {
		self.model.smoothed_bigrams().get(&key).ok_or_else(|| LmError::missing(key))
	}

	/// `log10 P(token)` from the smoothed unigram distribution.
	pub fn unigram_log_prob(&self, token: &Token) -> Result<f64> {
		let total = self.model.smoothed_unigrams().total();
		if !(total > 0.0) {
			return Err(LmError::EmptyDistribution);
		}
		log10_ratio(self.unigram_mass(token)?, total, || token.to_string())
	}

	/// `log10 P(token | previous)` from the smoothed bigram model.
	///
	/// # Behavior
	/// - UNK after UNK: reserved `(UNK, UNK)` mass.
	/// - UNK after a word: reserved `(w, UNK)` mass.
	/// - A word after UNK: reserved `(UNK, w)` mass over the UNK unigram mass.
	/// - Unseen bigram: the unseen-bigram mass.
	/// - Otherwise the bigram's own mass, over the previous token's mass.
	///
	/// # Errors
	/// - `MissingKey` if a conditioning unigram or reserved bigram is absent.
	/// - `ZeroProbability` if a mass or denominator is not positive.
	pub fn bigram_log_prob(&self, previous: &Token, token: &Token) -> Result<f64> {
		let bigrams = self.model.smoothed_bigrams();
		let numerator = match (previous, token) {
			(Token::Unknown, Token::Unknown) => self.reserved_mass(Bigram::new(Token::Unknown, Token::Unknown))?,
			(_, Token::Unknown) => self.reserved_mass(Bigram::new(Token::AnyWord, Token::Unknown))?,
			(Token::Unknown, _) => self.reserved_mass(Bigram::new(Token::Unknown, Token::AnyWord))?,
			_ => bigrams.get_or_unseen(&Bigram::new(previous.clone(), token.clone())),
		};
		let denominator = self.unigram_mass(previous)?;

		log10_ratio(numerator, denominator, || format!("{} after {}", token, previous))
	}

	/// Scores every sentence of `text`.
	///
	/// # Errors
	/// `EmptyText` if `text` holds no sentence, plus any per-token error.
	pub fn score(&self, text: &str) -> Result<PerplexityReport> {
		let sentences = split_sentences(text);
		if sentences.is_empty() {
			return Err(LmError::EmptyText);
		}

		let mut trace = Vec::new();
		for sentence in sentences {
			let tokens = self.prepare(sentence);
			let mut previous: Option<&Token> = None;
			for token in &tokens {
				let log10_prob = match previous {
					None => self.unigram_log_prob(token)?,
					Some(prev) => self.bigram_log_prob(prev, token)?,
				};
				trace.push(TokenScore { token: token.clone(), log10_prob });
				previous = Some(token);
			}
		}

		let sum_log10: f64 = -trace.iter().map(|score| score.log10_prob).sum::<f64>();
		let token_count = trace.len();
		let perplexity = 10f64.powf(sum_log10 / token_count as f64);
		debug!("scored {} tokens, perplexity {}", token_count, perplexity);

		Ok(PerplexityReport { perplexity, sum_log10, token_count, trace })
	}
}

/// `log10(numerator / denominator)`, refusing non-positive inputs.
fn log10_ratio<F: FnOnce() -> String>(numerator: f64, denominator: f64, context: F) -> Result<f64> {
	if !(numerator > 0.0 && denominator > 0.0) {
		return Err(LmError::ZeroProbability { context: context() });
	}
	Ok((numerator / denominator).log10())
}

/// Base-10 perplexity of `text` under `model`.
pub fn perplexity(model: &LanguageModel, text: &str) -> Result<f64> {
	Ok(PerplexityScorer::new(model).score(text)?.perplexity)
}
