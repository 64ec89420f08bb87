use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_lm_core::model::counts::CountModel;
use rs_lm_core::model::ngram::Bigram;
use rs_lm_core::model::sampler::sample_weighted;
use rs_lm_core::model::smoothing::Smoother;
use rs_lm_core::{GenerationConfig, Generator, LanguageModel, ModelConfig, Order, Token, WeightSource, perplexity};

const CORPUS: [&str; 6] = [
	"The grey fox likes cats.",
	"The grey fox hates dogs.",
	"A small dog likes the grey cat.",
	"Cats sleep.",
	"The dog sleeps, the fox hunts.",
	"",
];

fn config(cutoff: usize) -> ModelConfig {
	ModelConfig::builder().cutoff(cutoff).build().unwrap()
}

fn counted(sentences: &[&str]) -> CountModel {
	let mut counts = CountModel::new(false);
	for sentence in sentences {
		counts.observe_sentence(sentence);
	}
	counts
}

fn bigram(a: &str, b: &str) -> Bigram {
	Bigram::new(Token::word(a), Token::word(b))
}

#[test]
fn two_sentence_counts() {
	let counts = counted(&["The grey fox likes cats.", "The grey fox hates dogs."]);
	let bigrams = counts.bigrams();
	assert_eq!(bigrams[&bigram("The", "grey")], 2);
	assert_eq!(bigrams[&bigram("fox", "likes")], 1);
	assert_eq!(bigrams[&bigram("fox", "hates")], 1);
	assert_eq!(counts.count(&Token::word(".")), 2);
}

#[test]
fn zero_weights_are_never_sampled() {
	let weights: HashMap<&str, u64> = HashMap::from([("A", 0), ("B", 5)]);
	let mut rng = StdRng::seed_from_u64(3);
	for _ in 0..500 {
		assert_eq!(sample_weighted(&weights, &mut rng), Some(&"B"));
	}
}

#[test]
fn markers_match_sentence_count() {
	let counts = counted(&CORPUS);
	assert_eq!(counts.sentence_count(), CORPUS.len() as u64);
	assert_eq!(counts.count(&Token::Start), CORPUS.len() as u64);
	assert_eq!(counts.count(&Token::End), CORPUS.len() as u64);
	assert_eq!(counts.bigrams()[&Bigram::new(Token::Start, Token::End)], 1);
}

#[test]
fn bigram_counts_sum_to_unigram_counts() {
	let model = LanguageModel::train(CORPUS, config(1)).unwrap();
	let counts = model.counts();

	let mut outgoing: HashMap<&Token, u64> = HashMap::new();
	for (key, count) in counts.bigrams() {
		*outgoing.entry(key.first()).or_insert(0) += count;
	}
	for (token, count) in counts.unigrams() {
		if *token == Token::End || *count == 0 {
			continue;
		}
		assert_eq!(outgoing.get(token).copied().unwrap_or(0), *count, "{token}");
	}
}

#[test]
fn discounts_stay_in_bounds() {
	let model = LanguageModel::train(CORPUS, config(2)).unwrap();

	for discounts in [model.smoothed_unigrams().discounts(), model.smoothed_bigrams().discounts()] {
		assert!(discounts[0] > 0.0);
		for (c, c_star) in discounts.iter().enumerate().skip(1) {
			assert!(*c_star > 0.0 && *c_star <= (c + 1) as f64, "c*[{c}] = {c_star}");
		}
	}
}

#[test]
fn smoothing_is_reproducible() {
	let model = LanguageModel::train(CORPUS, config(2)).unwrap();
	let counts = model.counts();
	let smoother = Smoother::new(model.config()).unwrap();
	let unseen = Smoother::unseen_types(Order::Bigram, counts.vocabulary_size(), counts.observed_types(Order::Bigram)).unwrap();

	let first = smoother.smooth(Order::Bigram, counts.bigrams(), Some(unseen)).unwrap();
	let second = smoother.smooth(Order::Bigram, counts.bigrams(), Some(unseen)).unwrap();
	assert_eq!(first.values(), second.values());
	assert_eq!(first.total().to_bits(), second.total().to_bits());
	assert_eq!(first.values(), model.smoothed_bigrams().values());
}

#[test]
fn single_path_generates_hi() {
	let model = LanguageModel::train(["hi"], config(1)).unwrap();
	let mut rng = StdRng::seed_from_u64(11);

	for weights in [WeightSource::Raw, WeightSource::Smoothed] {
		let generator = Generator::new(&model, GenerationConfig::builder().weights(weights).build().unwrap()).unwrap();
		assert_eq!(generator.generate(Order::Bigram, &mut rng).unwrap(), "Hi");
		assert_eq!(generator.sentence(Order::Bigram, &mut rng).unwrap(), "Hi.");
	}
}

#[test]
fn training_sentence_is_less_perplexing() {
	let model = LanguageModel::train(["The grey fox likes cats ."], config(1)).unwrap();
	let seen = perplexity(&model, "The grey fox likes cats .").unwrap();
	let unrelated = perplexity(&model, "Seven tall ships sailed home .").unwrap();

	assert!(seen.is_finite() && seen > 1.0);
	assert!(seen < unrelated);
}

#[test]
fn merged_shards_match_single_pass() {
	let (left, right) = CORPUS.split_at(3);
	let mut merged = counted(left);
	merged.merge(&counted(right)).unwrap();

	let together = LanguageModel::train(CORPUS, config(1)).unwrap();
	let sharded = LanguageModel::from_counts(merged, config(1)).unwrap();

	assert_eq!(sharded.counts().unigrams(), together.counts().unigrams());
	assert_eq!(sharded.counts().bigrams(), together.counts().bigrams());
	assert_eq!(sharded.smoothed_bigrams().values(), together.smoothed_bigrams().values());
	assert_eq!(sharded.smoothed_unigrams().total(), together.smoothed_unigrams().total());
}
