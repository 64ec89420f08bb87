use log::{info, warn};

use rs_lm_core::corpus::Review;
use rs_lm_core::{LanguageModel, LmError, ModelConfig, PerplexityScorer, Result};

/// A pair of models, one trained on truthful reviews and one on deceptive ones.
pub struct ReviewClassifier {
	truthful: LanguageModel,
	deceptive: LanguageModel,
}

impl ReviewClassifier {
	/// Trains both models from labelled reviews. Unlabelled reviews are ignored.
	///
	/// # Errors
	/// `EmptyCorpus` if either label has no review, plus any training error.
	pub fn train(reviews: &[Review], config: &ModelConfig) -> Result<Self> {
		let sentences = |label: bool| -> Vec<String> {
			reviews
				.iter()
				.filter(|review| review.label == Some(label))
				.flat_map(Review::sentences)
				.collect()
		};

		let truthful = sentences(true);
		let deceptive = sentences(false);
		info!("{} truthful and {} deceptive training sentences", truthful.len(), deceptive.len());

		Ok(Self {
			truthful: LanguageModel::train(truthful, config.clone())?,
			deceptive: LanguageModel::train(deceptive, config.clone())?,
		})
	}

	/// `true` when the truthful model finds the review less perplexing.
	///
	/// # Errors
	/// `EmptyText` if the review has no sentence.
	pub fn is_truthful(&self, review: &Review) -> Result<bool> {
		let text = review.sentences().join("\n");
		if text.is_empty() {
			return Err(LmError::EmptyText);
		}
		let truthful = PerplexityScorer::new(&self.truthful).score(&text)?.perplexity;
		let deceptive = PerplexityScorer::new(&self.deceptive).score(&text)?.perplexity;
		Ok(truthful < deceptive)
	}

	/// Labels every review, printing `index, 1|0` per line.
	///
	/// Reviews that cannot be scored are reported and skipped.
	pub fn print_labels(&self, reviews: &[Review]) {
		for (index, review) in reviews.iter().enumerate() {
			match self.is_truthful(review) {
				Ok(truthful) => println!("{}, {}", index, u8::from(truthful)),
				Err(e) => warn!("review {} skipped: {}", index, e),
			}
		}
	}
}
