use serde::{Deserialize, Serialize};

use crate::error::{LmError, Result};

/// Default Good-Turing cutoff: counts below it are discounted.
pub const DEFAULT_CUTOFF: usize = 5;

/// Default cap on draws per generated sentence.
pub const DEFAULT_MAX_STEPS: usize = 1_000;

/// Discount formula applied to counts below the cutoff `K`.
///
/// # Variants
/// - `GoodTuring`: `c* = (c+1) N_{c+1} / N_c`
/// - `Katz`: the Good-Turing estimate corrected for the cutoff,
///   `c* = [(c+1) N_{c+1}/N_c - c (K+1) N_{K+1}/N_c] / [1 - (K+1) N_{K+1}/N_c]`
/// - `KatzStandard`: the same correction normalised by `N_1` instead of `N_c`,
///   `c* = [(c+1) N_{c+1}/N_c - c (K+1) N_{K+1}/N_1] / [1 - (K+1) N_{K+1}/N_1]`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Discount {
	#[default]
	GoodTuring,
	Katz,
	KatzStandard,
}

impl std::str::FromStr for Discount {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"good-turing" | "goodturing" | "gt" => Ok(Discount::GoodTuring),
			"katz" => Ok(Discount::Katz),
			"katz-standard" | "katzstandard" => Ok(Discount::KatzStandard),
			other => Err(format!("Unknown discount '{}'", other)),
		}
	}
}

/// Weights used when sampling during generation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeightSource {
	/// Raw occurrence counts.
	Raw,
	/// Discounted `c*` masses.
	#[default]
	Smoothed,
}

/// Training parameters of a language model.
///
/// # Invariants
/// - `cutoff >= 1`: at least the zero-count class is discounted, otherwise
///   no mass would be reserved for unseen events.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelConfig {
	/// Smoothing cutoff `K`; counts `c < K` are discounted, larger ones kept.
	pub cutoff: usize,

	/// Discount formula.
	pub discount: Discount,

	/// Whether trigram counts are collected and smoothed.
	pub trigrams: bool,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self {
			cutoff: DEFAULT_CUTOFF,
			discount: Discount::default(),
			trigrams: false,
		}
	}
}

impl ModelConfig {
	/// Returns a builder initialised with the default settings.
	pub fn builder() -> ModelConfigBuilder {
		ModelConfigBuilder::default()
	}

	/// Checks the invariants required for smoothing.
	pub fn validate(&self) -> Result<()> {
		if self.cutoff == 0 {
			return Err(LmError::InvalidConfig("cutoff must be at least 1".to_owned()));
		}
		Ok(())
	}
}

/// Builder for [`ModelConfig`].
#[derive(Debug, Default, Clone)]
pub struct ModelConfigBuilder {
	cfg: ModelConfig,
}

impl ModelConfigBuilder {
	pub fn cutoff(mut self, cutoff: usize) -> Self {
		self.cfg.cutoff = cutoff;
		self
	}

	pub fn discount(mut self, discount: Discount) -> Self {
		self.cfg.discount = discount;
		self
	}

	pub fn trigrams(mut self, trigrams: bool) -> Self {
		self.cfg.trigrams = trigrams;
		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<ModelConfig> {
		self.cfg.validate()?;
		Ok(self.cfg)
	}
}

/// Parameters controlling sentence generation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerationConfig {
	/// Maximum number of draws for one sentence before giving up.
	pub max_steps: usize,

	/// Which weights the sampler reads.
	pub weights: WeightSource,
}

impl Default for GenerationConfig {
	fn default() -> Self {
		Self {
			max_steps: DEFAULT_MAX_STEPS,
			weights: WeightSource::default(),
		}
	}
}

impl GenerationConfig {
	pub fn builder() -> GenerationConfigBuilder {
		GenerationConfigBuilder::default()
	}

	pub fn validate(&self) -> Result<()> {
		if self.max_steps == 0 {
			return Err(LmError::InvalidConfig("max_steps must be greater than zero".to_owned()));
		}
		Ok(())
	}
}

/// Builder for [`GenerationConfig`].
#[derive(Debug, Default, Clone)]
pub struct GenerationConfigBuilder {
	cfg: GenerationConfig,
}

impl GenerationConfigBuilder {
	pub fn max_steps(mut self, max_steps: usize) -> Self {
		self.cfg.max_steps = max_steps;
		self
	}

	pub fn weights(mut self, weights: WeightSource) -> Self {
		self.cfg.weights = weights;
		self
	}

	pub fn build(self) -> Result<GenerationConfig> {
		self.cfg.validate()?;
		Ok(self.cfg)
	}
}
