use rand::Rng;

/// A value usable as a sampling weight.
///
/// Implemented for raw counts (`u64`) and smoothed masses (`f64`), so the
/// same sampler serves both distributions.
pub trait Weight: Copy {
	fn weight(self) -> f64;
}

impl Weight for u64 {
	fn weight(self) -> f64 {
		self as f64
	}
}

impl Weight for f64 {
	fn weight(self) -> f64 {
		self
	}
}

/// Draws a key with probability proportional to its weight.
///
/// Roulette selection: sums all weights, draws `r` uniformly in `[0, sum)`,
/// then walks the map accumulating weights and returns the first key whose
/// cumulative weight exceeds `r`.
///
/// The draw for a given `rng` state depends on the map's iteration order:
/// pass a `BTreeMap` when seeded runs must be reproducible, a `HashMap`
/// walks in a per-process order.
///
/// Returns `None` if the map is empty or the total weight is not strictly
/// positive. Keys with zero (or negative) weight are never returned.
pub fn sample_weighted<'a, K, W, M, R>(map: &'a M, rng: &mut R) -> Option<&'a K>
where
	K: 'a,
	W: Weight + 'a,
	&'a M: IntoIterator<Item = (&'a K, &'a W)>,
	<&'a M as IntoIterator>::IntoIter: Clone,
	R: Rng + ?Sized,
{
	sample_pairs(IntoIterator::into_iter(map).map(|(key, weight)| (key, weight.weight())), rng)
}

/// Roulette selection over `(key, weight)` pairs; see [`sample_weighted`].
///
/// The iterator is walked twice, once to sum and once to select.
pub fn sample_pairs<K, I, R>(pairs: I, rng: &mut R) -> Option<K>
where
	I: IntoIterator<Item = (K, f64)>,
	I::IntoIter: Clone,
	R: Rng + ?Sized,
{
	let pairs = pairs.into_iter();

	let total: f64 = pairs.clone().map(|(_, weight)| weight.max(0.0)).sum();
	if !(total > 0.0 && total.is_finite()) {
		return None;
	}

	let r = rng.random_range(0.0..total);

	let mut cumulative = 0.0;
	let mut fallback = None;
	for (key, weight) in pairs {
		if weight <= 0.0 {
			continue;
		}
		cumulative += weight;
		if cumulative > r {
			return Some(key);
		}
		fallback = Some(key);
	}

	// Rounding can leave r just above the final cumulative sum
	fallback
}

#[cfg(test)]
mod tests {
	use std::collections::{BTreeMap, HashMap};

	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn zero_weight_is_never_drawn() {
		let map: HashMap<&str, u64> = [("A", 0), ("B", 5)].into_iter().collect();
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..1_000 {
			assert_eq!(sample_weighted(&map, &mut rng), Some(&"B"));
		}
	}

	#[test]
	fn empty_or_weightless_maps_yield_nothing() {
		let mut rng = StdRng::seed_from_u64(7);
		let empty: HashMap<&str, f64> = HashMap::new();
		assert_eq!(sample_weighted(&empty, &mut rng), None);

		let zeros: HashMap<&str, f64> = [("A", 0.0), ("B", 0.0)].into_iter().collect();
		assert_eq!(sample_weighted(&zeros, &mut rng), None);
	}

	#[test]
	fn draws_follow_weights() {
		let map: HashMap<&str, f64> = [("rare", 1.0), ("common", 9.0)].into_iter().collect();
		let mut rng = StdRng::seed_from_u64(42);

		let common = (0..10_000)
			.filter(|_| sample_weighted(&map, &mut rng) == Some(&"common"))
			.count();
		assert!((8_500..9_500).contains(&common), "common drawn {} times", common);
	}

	#[test]
	fn fractional_weights_are_supported() {
		let map: HashMap<u8, f64> = [(1, 0.125), (2, 0.0)].into_iter().collect();
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(sample_weighted(&map, &mut rng), Some(&1));
	}

	#[test]
	fn ordered_maps_draw_the_same_sequence_for_a_seed() {
		let draws = |map: &BTreeMap<String, u64>| {
			let mut rng = StdRng::seed_from_u64(42);
			(0..50).map(|_| sample_weighted(map, &mut rng).cloned()).collect::<Vec<_>>()
		};
		let words = ["fox", "cat", "dog", "owl", "elk", "yak"];
		let forward: BTreeMap<String, u64> = words.iter().zip(1..).map(|(w, c)| (w.to_string(), c)).collect();
		let backward: BTreeMap<String, u64> = words.iter().zip(1..).collect::<Vec<_>>().into_iter().rev().map(|(w, c)| (w.to_string(), c)).collect();
		assert_eq!(draws(&forward), draws(&backward));
	}
}
