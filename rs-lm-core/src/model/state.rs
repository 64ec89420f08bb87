use std::collections::{BTreeMap, HashMap};

use rand::Rng;

use super::sampler::sample_weighted;
use super::token::Token;

/// Outgoing transitions of one generation context.
///
/// A `State` corresponds to a fixed context (the previous token for bigrams,
/// the previous two for trigrams) and stores every token that followed it,
/// weighted by its raw or smoothed count.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Invariants
/// - Weights are non-negative; zero-weight transitions are never predicted
/// - Transitions are walked in token order, so a seeded rng always draws the same token
#[derive(Clone, Debug, Default)]
pub(crate) struct State {
	/// Outgoing transitions indexed by the next token.
	/// Example: { "fox" => 3.0, "deer" => 1.0 }
	transitions: BTreeMap<Token, f64>,
}

impl State {
	/// Records `weight` more mass toward `next`.
	pub(crate) fn add_transition(&mut self, next: Token, weight: f64) {
		*self.transitions.entry(next).or_insert(0.0) += weight;
	}

	/// Predicts the next token using weighted random sampling.
	///
	/// Returns `None` if the state has no transition with positive weight.
	pub(crate) fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Token> {
		sample_weighted(&self.transitions, rng)
	}
}

/// Builds one state per context from `(context, next, weight)` triples.
pub(crate) fn index_states<C, I>(entries: I) -> HashMap<C, State>
where
	C: Eq + std::hash::Hash,
	I: IntoIterator<Item = (C, Token, f64)>,
{
	let mut states: HashMap<C, State> = HashMap::new();
	for (context, next, weight) in entries {
		states.entry(context).or_default().add_transition(next, weight);
	}
	states
}
