use std::collections::{BTreeMap, HashMap};

use log::debug;
use rand::Rng;

use super::config::{GenerationConfig, WeightSource};
use super::language_model::LanguageModel;
use super::ngram::{Bigram, Order, Trigram};
use super::sampler::{Weight, sample_weighted};
use super::state::{State, index_states};
use super::token::Token;
use crate::error::{LmError, Result};

/// Joins generated words with single spaces and capitalizes the first one.
fn render(words: &[String]) -> String {
	let mut sentence = words.join(" ");
	if let Some(first) = sentence.chars().next() {
		let upper: String = first.to_uppercase().collect();
		sentence.replace_range(..first.len_utf8(), &upper);
	}
	sentence
}

/// Generates a sentence by drawing independent unigrams.
///
/// # Behavior
/// - Draws until END is drawn or the map cannot be sampled.
/// - START, UNK and reserved pattern draws are skipped.
/// - The first word is capitalized; no final period is appended.
///
/// # Errors
/// `GenerationCapExceeded` if END is not drawn within `max_steps` draws.
pub fn generate_unigram_sentence<W, R>(unigrams: &HashMap<Token, W>, max_steps: usize, rng: &mut R) -> Result<String>
where
	W: Weight,
	R: Rng + ?Sized,
{
	// Token order keeps seeded draws reproducible
	let ordered: BTreeMap<&Token, W> = unigrams.iter().map(|(token, weight)| (token, *weight)).collect();
	let mut words = Vec::new();
	for _ in 0..max_steps {
		match sample_weighted(&ordered, rng).copied() {
			None | Some(Token::End) => return Ok(render(&words)),
			Some(Token::Word(word)) => words.push(word.clone()),
			Some(_) => continue,
		}
	}
	Err(LmError::GenerationCapExceeded { steps: max_steps })
}

/// Generates a sentence by walking bigram transitions from START.
///
/// At each step, only bigrams whose first token is the previous token are
/// candidates. Stops on END or when the previous token has no continuation.
///
/// # Errors
/// `GenerationCapExceeded` if END is not reached within `max_steps` draws.
pub fn generate_bigram_sentence<W, R>(bigrams: &HashMap<Bigram, W>, max_steps: usize, rng: &mut R) -> Result<String>
where
	W: Weight,
	R: Rng + ?Sized,
{
	let states = bigram_states(bigrams);
	walk(&states, &HashMap::new(), max_steps, rng)
}

/// Generates a sentence conditioning each token on the previous two.
///
/// The first token (only START as context) and any context without a
/// trigram continuation fall back to the bigram distribution of the
/// previous token.
pub fn generate_trigram_sentence<W, R>(
	bigrams: &HashMap<Bigram, W>,
	trigrams: &HashMap<Trigram, W>,
	max_steps: usize,
	rng: &mut R,
) -> Result<String>
where
	W: Weight,
	R: Rng + ?Sized,
{
	walk(&bigram_states(bigrams), &trigram_states(trigrams), max_steps, rng)
}

fn bigram_states<W: Weight>(bigrams: &HashMap<Bigram, W>) -> HashMap<Token, State> {
	index_states(
		bigrams
			.iter()
			.map(|(key, weight)| (key.first().clone(), key.second().clone(), weight.weight())),
	)
}

fn trigram_states<W: Weight>(trigrams: &HashMap<Trigram, W>) -> HashMap<(Token, Token), State> {
	index_states(
		trigrams
			.iter()
			.map(|(key, weight)| ((key.first().clone(), key.second().clone()), key.third().clone(), weight.weight())),
	)
}

/// Walks the transition graph from START until END.
///
/// Trigram states are tried first when two tokens of context exist;
/// otherwise (or when the trigram state yields nothing) the bigram state of
/// the last token is used, like reducing `n` when a longer prefix is unknown.
fn walk<R: Rng + ?Sized>(
	bigrams: &HashMap<Token, State>,
	trigrams: &HashMap<(Token, Token), State>,
	max_steps: usize,
	rng: &mut R,
) -> Result<String> {
	let mut words = Vec::new();
	let mut previous: Option<Token> = None;
	let mut current = Token::Start;

	for _ in 0..max_steps {
		let from_trigram = previous
			.as_ref()
			.and_then(|prev| trigrams.get(&(prev.clone(), current.clone())))
			.and_then(|state| state.predict(rng));

		let next = match from_trigram {
			Some(token) => token,
			None => match bigrams.get(&current).and_then(|state| state.predict(rng)) {
				Some(token) => token,
				None => {
					debug!("no continuation after {}", current);
					return Ok(render(&words));
				}
			},
		};

		match next {
			Token::End => return Ok(render(&words)),
			Token::Word(word) => words.push(word.clone()),
			_ => {}
		}
		previous = Some(std::mem::replace(&mut current, next.clone()));
	}

	Err(LmError::GenerationCapExceeded { steps: max_steps })
}

/// High-level generator over a trained model.
///
/// # Responsibilities
/// - Select raw or smoothed weights according to `GenerationConfig`
/// - Pre-index transitions per context once, then generate many sentences
/// - Append the final period for caller-facing output
#[derive(Debug)]
pub struct Generator<'a> {
	model: &'a LanguageModel,
	config: GenerationConfig,
	bigram_states: HashMap<Token, State>,
	trigram_states: HashMap<(Token, Token), State>,
}

impl<'a> Generator<'a> {
	/// Creates a generator and indexes the model's transitions.
	///
	/// # Errors
	/// `InvalidConfig` if `config` does not validate.
	pub fn new(model: &'a LanguageModel, config: GenerationConfig) -> Result<Self> {
		config.validate()?;

		let (bigram_states, trigram_states) = match config.weights {
			WeightSource::Raw => (
				bigram_states(model.counts().bigrams()),
				model.counts().trigrams().map(trigram_states).unwrap_or_default(),
			),
			WeightSource::Smoothed => (
				bigram_states(model.smoothed_bigrams().values()),
				model
					.smoothed_trigrams()
					.map(|smoothed| trigram_states(smoothed.values()))
					.unwrap_or_default(),
			),
		};

		Ok(Self { model, config, bigram_states, trigram_states })
	}

	pub fn config(&self) -> &GenerationConfig {
		&self.config
	}

	/// Generates one sentence of the given order, without the final period.
	///
	/// # Errors
	/// - `OrderNotTrained` for trigrams on a model trained without them.
	/// - `GenerationCapExceeded` if no END marker is reached in time.
	pub fn generate<R: Rng + ?Sized>(&self, order: Order, rng: &mut R) -> Result<String> {
		if !self.model.has_order(order) {
			return Err(LmError::OrderNotTrained(order));
		}
		let max_steps = self.config.max_steps;
		match (order, self.config.weights) {
			(Order::Unigram, WeightSource::Raw) => generate_unigram_sentence(self.model.counts().unigrams(), max_steps, rng),
			(Order::Unigram, WeightSource::Smoothed) => {
				generate_unigram_sentence(self.model.smoothed_unigrams().values(), max_steps, rng)
			}
			(Order::Bigram, _) => walk(&self.bigram_states, &HashMap::new(), max_steps, rng),
			(Order::Trigram, _) => walk(&self.bigram_states, &self.trigram_states, max_steps, rng),
		}
	}

	/// Generates one sentence terminated by a period.
	///
	/// No period is appended when the last generated token already ends the
	/// sentence (`.`, `!` or `?`).
	pub fn sentence<R: Rng + ?Sized>(&self, order: Order, rng: &mut R) -> Result<String> {
		let mut sentence = self.generate(order, rng)?;
		if !sentence.ends_with(['.', '!', '?']) {
			sentence.push('.');
		}
		Ok(sentence)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::config::ModelConfig;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn model(sentences: &[&str], trigrams: bool) -> LanguageModel {
		let cfg = ModelConfig::builder().cutoff(1).trigrams(trigrams).build().unwrap();
		LanguageModel::train(sentences, cfg).unwrap()
	}

	#[test]
	fn single_path_generates_hi() {
		let model = model(&["hi"], true);
		let mut rng = StdRng::seed_from_u64(11);

		for weights in [WeightSource::Raw, WeightSource::Smoothed] {
			let cfg = GenerationConfig::builder().weights(weights).build().unwrap();
			let generator = Generator::new(&model, cfg).unwrap();
			for _ in 0..20 {
				assert_eq!(generator.generate(Order::Bigram, &mut rng).unwrap(), "Hi");
				assert_eq!(generator.generate(Order::Trigram, &mut rng).unwrap(), "Hi");
			}
			assert_eq!(generator.sentence(Order::Bigram, &mut rng).unwrap(), "Hi.");
		}
	}

	#[test]
	fn bigram_generation_follows_observed_paths() {
		let model = model(&["The grey fox likes cats .", "The grey fox hates dogs ."], false);
		let generator = Generator::new(&model, GenerationConfig::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(5);

		for _ in 0..50 {
			let sentence = generator.generate(Order::Bigram, &mut rng).unwrap();
			assert!(
				sentence == "The grey fox likes cats ." || sentence == "The grey fox hates dogs .",
				"unexpected sentence {sentence}"
			);
		}
	}

	#[test]
	fn free_bigram_function_reads_raw_maps() {
		let mut bigrams: HashMap<Bigram, u64> = HashMap::new();
		bigrams.insert(Bigram::new(Token::Start, Token::word("hi")), 1);
		bigrams.insert(Bigram::new(Token::word("hi"), Token::End), 1);
		bigrams.insert(Bigram::new(Token::Start, Token::word("never")), 0);

		let mut rng = StdRng::seed_from_u64(9);
		assert_eq!(generate_bigram_sentence(&bigrams, 10, &mut rng).unwrap(), "Hi");
	}

	#[test]
	fn dead_end_terminates_early() {
		let bigrams: HashMap<Bigram, u64> = [(Bigram::new(Token::Start, Token::word("stuck")), 1)].into_iter().collect();
		let mut rng = StdRng::seed_from_u64(9);
		assert_eq!(generate_bigram_sentence(&bigrams, 10, &mut rng).unwrap(), "Stuck");
	}

	#[test]
	fn cycles_hit_the_step_cap() {
		let bigrams: HashMap<Bigram, u64> = [
			(Bigram::new(Token::Start, Token::word("again")), 1),
			(Bigram::new(Token::word("again"), Token::word("again")), 1),
		]
		.into_iter()
		.collect();
		let mut rng = StdRng::seed_from_u64(9);
		let err = generate_bigram_sentence(&bigrams, 25, &mut rng).unwrap_err();
		assert!(matches!(err, LmError::GenerationCapExceeded { steps: 25 }));
	}

	#[test]
	fn unigram_generation_skips_markers() {
		let model = model(&["hi"], false);
		let generator = Generator::new(&model, GenerationConfig::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(21);

		for _ in 0..50 {
			let sentence = generator.generate(Order::Unigram, &mut rng).unwrap();
			let words: Vec<&str> = sentence.split(' ').filter(|w| !w.is_empty()).collect();
			for (i, word) in words.iter().enumerate() {
				assert_eq!(*word, if i == 0 { "Hi" } else { "hi" });
			}
		}
	}

	#[test]
	fn unigram_generation_without_end_is_capped() {
		let unigrams: HashMap<Token, f64> = [(Token::word("on"), 1.0), (Token::Start, 1.0)].into_iter().collect();
		let mut rng = StdRng::seed_from_u64(2);
		assert!(matches!(
			generate_unigram_sentence(&unigrams, 100, &mut rng),
			Err(LmError::GenerationCapExceeded { steps: 100 })
		));

		let empty: HashMap<Token, f64> = HashMap::new();
		assert_eq!(generate_unigram_sentence(&empty, 100, &mut rng).unwrap(), "");
	}

	#[test]
	fn trigram_generation_requires_trigram_counts() {
		let model = model(&["hi"], false);
		let generator = Generator::new(&model, GenerationConfig::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(
			generator.generate(Order::Trigram, &mut rng),
			Err(LmError::OrderNotTrained(Order::Trigram))
		));
	}

	#[test]
	fn trigram_generation_uses_two_tokens_of_context() {
		// After "b", bigrams alone could continue with "x" or "y"; the
		// trigram context decides which one.
		let model = model(&["a b x", "c b y", "a b x", "c b y"], true);
		let cfg = GenerationConfig::builder().weights(WeightSource::Raw).build().unwrap();
		let generator = Generator::new(&model, cfg).unwrap();
		let mut rng = StdRng::seed_from_u64(8);

		for _ in 0..50 {
			let sentence = generator.generate(Order::Trigram, &mut rng).unwrap();
			assert!(sentence == "A b x" || sentence == "C b y", "unexpected sentence {sentence}");
		}
	}

	#[test]
	fn first_letter_is_capitalized() {
		assert_eq!(render(&["élan".to_owned(), "vital".to_owned()]), "Élan vital");
		assert_eq!(render(&[]), "");
	}

	#[test]
	fn sentence_keeps_a_single_terminator() {
		let model = model(&["The grey fox likes cats .", "Run !"], false);
		let generator = Generator::new(&model, GenerationConfig::default()).unwrap();
		let mut rng = StdRng::seed_from_u64(4);

		for _ in 0..30 {
			let sentence = generator.sentence(Order::Bigram, &mut rng).unwrap();
			assert!(sentence == "The grey fox likes cats ." || sentence == "Run !", "unexpected sentence {sentence}");
		}
	}

	#[test]
	fn free_trigram_function_reads_raw_maps() {
		let model = model(&["a b x", "c b y"], true);
		let counts = model.counts();
		let trigrams = counts.trigrams().unwrap();
		let mut rng = StdRng::seed_from_u64(13);

		for _ in 0..50 {
			let sentence = generate_trigram_sentence(counts.bigrams(), trigrams, 10, &mut rng).unwrap();
			assert!(sentence == "A b x" || sentence == "C b y", "unexpected sentence {sentence}");
		}
	}

	#[test]
	fn seeded_generation_does_not_depend_on_hashing() {
		// Each model owns maps with their own random hasher state
		let corpus = ["The grey fox likes cats .", "A small dog likes the grey cat .", "The dog sleeps ."];
		let first = model(&corpus, true);
		let second = model(&corpus, true);

		for order in [Order::Unigram, Order::Bigram, Order::Trigram] {
			for weights in [WeightSource::Raw, WeightSource::Smoothed] {
				let cfg = GenerationConfig::builder().weights(weights).build().unwrap();
				let run = |model: &LanguageModel| {
					let generator = Generator::new(model, cfg.clone()).unwrap();
					let mut rng = StdRng::seed_from_u64(42);
					(0..10).map(|_| generator.sentence(order, &mut rng).unwrap()).collect::<Vec<_>>()
				};
				assert_eq!(run(&first), run(&second), "{order} {weights:?}");
			}
		}
	}
}
