use std::collections::HashMap;
use std::hash::Hash;

use log::{debug, info, warn};
use serde::Serialize;

use super::config::{Discount, ModelConfig};
use super::ngram::Order;
use crate::error::{LmError, Result};

/// Frequency-of-frequencies table: `N_c` for `c = 0..=K+1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FrequencyTable {
	classes: Vec<u64>,
}

impl FrequencyTable {
	/// Tallies how many keys were seen exactly `c` times, for `c <= cutoff + 1`.
	///
	/// When `unseen` is given it replaces the tally of zero-count keys,
	/// which is how bigram and trigram `N_0` are estimated structurally.
	pub fn from_counts<'a, I>(counts: I, cutoff: usize, unseen: Option<u64>) -> Self
	where
		I: IntoIterator<Item = &'a u64>,
	{
		let mut classes = vec![0u64; cutoff + 2];
		for &count in counts {
			if let Some(slot) = usize::try_from(count).ok().and_then(|c| classes.get_mut(c)) {
				*slot += 1;
			}
		}
		if let Some(n_zero) = unseen {
			classes[0] = n_zero;
		}
		Self { classes }
	}

	/// `N_c`, 0 past the tallied range.
	pub fn get(&self, c: usize) -> u64 {
		self.classes.get(c).copied().unwrap_or(0)
	}

	/// Largest tallied class, `K + 1`.
	pub fn max_class(&self) -> usize {
		self.classes.len() - 1
	}
}

/// Katz-corrected Good-Turing estimate, the correction term
/// `(K+1) N_{K+1}` being divided by `normaliser`.
fn katz_estimate(order: Order, c: usize, good_turing: f64, table: &FrequencyTable, cutoff: usize, normaliser: f64) -> Result<f64> {
	let correction = (cutoff + 1) as f64 * table.get(cutoff + 1) as f64 / normaliser;
	let denominator = 1.0 - correction;
	if denominator <= 0.0 {
		return Err(LmError::DegenerateDiscount {
			order,
			count: c,
			reason: format!("Katz denominator is {}", denominator),
		});
	}
	Ok((good_turing - c as f64 * correction) / denominator)
}

impl Discount {
	/// Discounted estimate `c*` for keys seen `c` times.
	///
	/// # Errors
	/// - `EmptyFrequencyClass` if `N_c = 0` (or `N_1 = 0` for `KatzStandard`).
	/// - `DegenerateDiscount` if the Katz correction term reaches 1 or the
	///   result is not finite.
	///
	/// # Notes
	/// For `c >= 1` an estimate outside `(0, c + 1]` is replaced by `c`.
	pub fn estimate(self, order: Order, c: usize, table: &FrequencyTable, cutoff: usize) -> Result<f64> {
		let n_c = table.get(c);
		if n_c == 0 {
			return Err(LmError::EmptyFrequencyClass { order, count: c });
		}
		let n_c = n_c as f64;
		let good_turing = (c + 1) as f64 * table.get(c + 1) as f64 / n_c;

		let estimate = match self {
			Discount::GoodTuring => good_turing,
			Discount::Katz => katz_estimate(order, c, good_turing, table, cutoff, n_c)?,
			Discount::KatzStandard => {
				let n_one = table.get(1);
				if n_one == 0 {
					return Err(LmError::EmptyFrequencyClass { order, count: 1 });
				}
				katz_estimate(order, c, good_turing, table, cutoff, n_one as f64)?
			}
		};

		if !estimate.is_finite() {
			return Err(LmError::DegenerateDiscount {
				order,
				count: c,
				reason: format!("estimate is {}", estimate),
			});
		}

		if c > 0 && (estimate <= 0.0 || estimate > (c + 1) as f64) {
			warn!("{} c*[{}] = {} is out of bounds, keeping the raw count", order, c, estimate);
			return Ok(c as f64);
		}

		Ok(estimate)
	}
}

/// Discounted masses of every key of one n-gram order.
///
/// # Invariants
/// - Covers exactly the keys of the count map it was derived from
/// - `unseen` is `c*[0]`, the mass of any key absent from `values`
/// - Never mutated after construction
#[derive(Clone, Debug, Serialize)]
pub struct Smoothed<K: Eq + Hash> {
	order: Order,
	#[serde(skip)]
	values: HashMap<K, f64>,
	unseen: f64,
	discounts: Vec<f64>,
	table: FrequencyTable,
	total: f64,
}

impl<K: Eq + Hash> Smoothed<K> {
	pub fn order(&self) -> Order {
		self.order
	}

	/// Smoothed mass `c*` of a key present in the count map.
	pub fn get(&self, key: &K) -> Option<f64> {
		self.values.get(key).copied()
	}

	/// Smoothed mass of a key, falling back to the unseen mass.
	pub fn get_or_unseen(&self, key: &K) -> f64 {
		self.get(key).unwrap_or(self.unseen)
	}

	/// Mass assigned to any key of this order never seen in training.
	pub fn unseen(&self) -> f64 {
		self.unseen
	}

	/// `c*` for each `c` below the cutoff.
	pub fn discounts(&self) -> &[f64] {
		&self.discounts
	}

	/// The `N_c` table the discounts were computed from.
	pub fn frequency_table(&self) -> &FrequencyTable {
		&self.table
	}

	/// Sum of the smoothed masses of every key in the map.
	pub fn total(&self) -> f64 {
		self.total
	}

	pub fn values(&self) -> &HashMap<K, f64> {
		&self.values
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

/// Turns raw n-gram counts into Good-Turing / Katz discounted masses.
///
/// Each order is smoothed independently; counts below the cutoff `K` are
/// replaced by their discounted estimate, larger ones are kept as is.
#[derive(Clone, Copy, Debug)]
pub struct Smoother {
	cutoff: usize,
	discount: Discount,
}

impl Smoother {
	/// Creates a smoother from a validated configuration.
	pub fn new(config: &ModelConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { cutoff: config.cutoff, discount: config.discount })
	}

	pub fn cutoff(&self) -> usize {
		self.cutoff
	}

	pub fn discount(&self) -> Discount {
		self.discount
	}

	/// Structural `N_0` of an order: `V^n` minus the observed types.
	///
	/// # Errors
	/// Returns `VocabularyOverflow` if `V^n` does not fit in a `u64`.
	pub fn unseen_types(order: Order, vocabulary: usize, observed: usize) -> Result<u64> {
		let space = u64::try_from(vocabulary)
			.ok()
			.and_then(|v| v.checked_pow(order.n()))
			.ok_or(LmError::VocabularyOverflow { order, vocabulary })?;
		Ok(space.saturating_sub(observed as u64))
	}

	/// Computes `c*[c]` for every `c < K`.
	pub fn discount_table(&self, order: Order, table: &FrequencyTable) -> Result<Vec<f64>> {
		(0..self.cutoff)
			.map(|c| {
				let estimate = self.discount.estimate(order, c, table, self.cutoff)?;
				debug!("{} N_{} = {}, c* = {}", order, c, table.get(c), estimate);
				Ok(estimate)
			})
			.collect()
	}

	/// Smooths one count map.
	///
	/// # Parameters
	/// - `order`: order of the keys, used for reporting.
	/// - `counts`: raw counts, reserved keys included with count 0.
	/// - `unseen`: structural `N_0`; `None` tallies the zero-count keys instead.
	///
	/// # Errors
	/// Propagates `EmptyFrequencyClass` and `DegenerateDiscount`.
	pub fn smooth<K>(&self, order: Order, counts: &HashMap<K, u64>, unseen: Option<u64>) -> Result<Smoothed<K>>
	where
		K: Eq + Hash + Clone,
	{
		let table = FrequencyTable::from_counts(counts.values(), self.cutoff, unseen);
		let discounts = self.discount_table(order, &table)?;

		// Summed per class so the total does not depend on map iteration order
		let mut present = vec![0u64; self.cutoff];
		let mut raw_mass: u64 = 0;
		let values: HashMap<K, f64> = counts
			.iter()
			.map(|(key, &count)| {
				let smoothed = match usize::try_from(count) {
					Ok(c) if c < self.cutoff => {
						present[c] += 1;
						discounts[c]
					}
					_ => {
						raw_mass += count;
						count as f64
					}
				};
				(key.clone(), smoothed)
			})
			.collect();

		let total = raw_mass as f64
			+ present
				.iter()
				.zip(&discounts)
				.map(|(n, c_star)| *n as f64 * c_star)
				.sum::<f64>();

		let unseen = discounts[0];
		info!(
			"smoothed {} {} keys ({:?}), unseen mass {}, total mass {}",
			values.len(),
			order,
			self.discount,
			unseen,
			total
		);

		Ok(Smoothed { order, values, unseen, discounts, table, total })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn smoother(cutoff: usize, discount: Discount) -> Smoother {
		Smoother::new(&ModelConfig { cutoff, discount, trigrams: false }).unwrap()
	}

	/// Zipf-like counts: 20 keys seen once, 8 twice, 5 three times, ...
	fn zipf_counts() -> HashMap<String, u64> {
		let spread = [(1, 20), (2, 8), (3, 5), (4, 3), (5, 2), (6, 1), (9, 1)];
		let mut counts = HashMap::new();
		for (count, how_many) in spread {
			for i in 0..how_many {
				counts.insert(format!("w{}_{}", count, i), count);
			}
		}
		counts.insert("unk".to_owned(), 0);
		counts
	}

	#[test]
	fn frequency_table_tallies_classes() {
		let table = FrequencyTable::from_counts(zipf_counts().values(), 5, None);
		assert_eq!(table.get(0), 1);
		assert_eq!(table.get(1), 20);
		assert_eq!(table.get(2), 8);
		assert_eq!(table.get(6), 1);
		assert_eq!(table.get(7), 0);
		assert_eq!(table.max_class(), 6);

		let structural = FrequencyTable::from_counts(zipf_counts().values(), 5, Some(400));
		assert_eq!(structural.get(0), 400);
	}

	#[test]
	fn good_turing_discounts() {
		let counts = zipf_counts();
		let smoothed = smoother(5, Discount::GoodTuring).smooth(Order::Unigram, &counts, None).unwrap();

		assert_eq!(smoothed.unseen(), 20.0);
		assert_eq!(smoothed.discounts()[1], 2.0 * 8.0 / 20.0);
		assert_eq!(smoothed.discounts()[2], 1.875);
		assert_eq!(smoothed.get(&"w1_3".to_owned()), Some(2.0 * 8.0 / 20.0));
		assert_eq!(smoothed.get(&"w9_0".to_owned()), Some(9.0));
		assert_eq!(smoothed.get(&"w5_0".to_owned()), Some(5.0));
		assert_eq!(smoothed.get_or_unseen(&"never".to_owned()), 20.0);
		assert_eq!(smoothed.len(), counts.len());
	}

	#[test]
	fn discounts_stay_within_bounds() {
		for discount in [Discount::GoodTuring, Discount::KatzStandard] {
			let smoothed = smoother(5, discount).smooth(Order::Unigram, &zipf_counts(), None).unwrap();
			assert!(smoothed.unseen() > 0.0);
			for (c, c_star) in smoothed.discounts().iter().enumerate().skip(1) {
				assert!(*c_star > 0.0 && *c_star <= (c + 1) as f64, "{:?} c*[{}] = {}", discount, c, c_star);
			}
		}
	}

	// N = [100, 20, 8, 5, 3, 2, 1], K = 5
	fn katz_table() -> FrequencyTable {
		FrequencyTable::from_counts(zipf_counts().values(), 5, Some(100))
	}

	#[test]
	fn katz_divides_correction_by_n_c() {
		let table = katz_table();
		let estimate = |c| Discount::Katz.estimate(Order::Bigram, c, &table, 5);

		// correction 6 * 1 / 100
		assert!((estimate(0).unwrap() - 0.2 / 0.94).abs() < 1e-12);
		// correction 6 * 1 / 20, same as the N_1 reading
		assert!((estimate(1).unwrap() - 0.5 / 0.7).abs() < 1e-12);
		// GT 3 * 5 / 8 = 1.875, correction 6 / 8: (1.875 - 1.5) / 0.25
		assert!((estimate(2).unwrap() - 1.5).abs() < 1e-12);
		// correction 6 / 5 exceeds 1
		assert!(matches!(estimate(3), Err(LmError::DegenerateDiscount { count: 3, .. })));
	}

	#[test]
	fn katz_standard_divides_correction_by_n_one() {
		let table = katz_table();
		let correction = 6.0 * 1.0 / 20.0;
		let estimate = |c| Discount::KatzStandard.estimate(Order::Bigram, c, &table, 5).unwrap();

		assert!((estimate(0) - (20.0 / 100.0) / (1.0 - correction)).abs() < 1e-12);
		let expected = (2.0 * 8.0 / 20.0 - correction) / (1.0 - correction);
		assert!((estimate(1) - expected).abs() < 1e-12);
		assert!((estimate(2) - (1.875 - 2.0 * correction) / (1.0 - correction)).abs() < 1e-12);
		assert!((estimate(3) - (2.4 - 3.0 * correction) / (1.0 - correction)).abs() < 1e-12);
	}

	#[test]
	fn katz_standard_needs_singletons() {
		let table = FrequencyTable::from_counts([2u64, 3, 3].iter(), 2, Some(10));
		assert!(matches!(
			Discount::KatzStandard.estimate(Order::Bigram, 0, &table, 2),
			Err(LmError::EmptyFrequencyClass { count: 1, .. })
		));
	}

	#[test]
	fn katz_reports_degenerate_denominator() {
		// N_{K+1} large enough that (K+1) N_{K+1} / N_0 >= 1
		let mut counts: HashMap<u32, u64> = (0..3).map(|i| (i, 1)).collect();
		for i in 3..10 {
			counts.insert(i, 2);
		}
		counts.insert(99, 0);
		let err = smoother(1, Discount::Katz).smooth(Order::Unigram, &counts, None).unwrap_err();
		assert!(matches!(err, LmError::DegenerateDiscount { count: 0, .. }));
	}

	#[test]
	fn empty_class_is_reported() {
		let counts: HashMap<&str, u64> = [("a", 1), ("b", 1), ("c", 4), ("unk", 0)].into_iter().collect();
		let err = smoother(5, Discount::GoodTuring).smooth(Order::Unigram, &counts, None).unwrap_err();
		assert!(matches!(err, LmError::EmptyFrequencyClass { order: Order::Unigram, count: 2 }));

		let ok = smoother(2, Discount::GoodTuring).smooth(Order::Unigram, &counts, None).unwrap();
		// N_2 = 0 makes the estimate for c = 1 zero, which falls back to the raw count
		assert_eq!(ok.get(&"a"), Some(1.0));
		assert_eq!(ok.unseen(), 2.0);
	}

	#[test]
	fn unseen_types_are_structural() {
		assert_eq!(Smoother::unseen_types(Order::Bigram, 8, 7).unwrap(), 57);
		assert_eq!(Smoother::unseen_types(Order::Trigram, 10, 12).unwrap(), 988);
		assert!(matches!(
			Smoother::unseen_types(Order::Trigram, usize::MAX, 0),
			Err(LmError::VocabularyOverflow { .. })
		));
	}

	#[test]
	fn smoothing_is_deterministic() {
		let counts = zipf_counts();
		let s = smoother(5, Discount::KatzStandard);
		let first = s.smooth(Order::Bigram, &counts, Some(1_000)).unwrap();
		let second = s.smooth(Order::Bigram, &counts, Some(1_000)).unwrap();

		assert_eq!(first.values(), second.values());
		assert_eq!(first.total().to_bits(), second.total().to_bits());
		assert_eq!(first.unseen().to_bits(), second.unseen().to_bits());
	}

	#[test]
	fn total_matches_sum_of_values() {
		let smoothed = smoother(5, Discount::GoodTuring).smooth(Order::Unigram, &zipf_counts(), None).unwrap();
		let summed: f64 = smoothed.values().values().sum();
		assert!((smoothed.total() - summed).abs() < 1e-9);
	}
}
