use std::collections::HashMap;
use std::hash::Hash;

use rand::Rng;

use serde::{Deserialize, Serialize};

/// The multiset of observed successors for one fixed context.
///
/// Each entry records how many times a given state was observed as the
/// next state after the owning context. Conceptually, this is a node in
/// the Markov chain whose outgoing edges are weighted by their number
/// of observations.
///
/// ## Responsibilities
/// - Accumulate transition occurrences during training
/// - Derive totals and probabilities
/// - Sample the next state using weighted random selection
/// - Merge with another set for the same context (parallel training)
///
/// ## Invariants
/// - Every recorded occurrence count is strictly positive
/// - `total_count` equals the sum of all recorded counts
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransitionSet<S: Eq + Hash> {
	/// Outgoing transitions indexed by the next state.
	/// The value records how many times the transition was observed.
	counts: HashMap<S, usize>,
}

impl<S: Eq + Hash> TransitionSet<S> {
	/// Creates an empty set with no observations.
	pub fn new() -> Self {
		Self { counts: HashMap::new() }
	}

	/// The recorded count for `state`, or 0 if it has never been
	/// observed as a successor in this set.
	pub fn count_for(&self, state: &S) -> usize {
		self.counts.get(state).copied().unwrap_or(0)
	}

	/// The sum of all recorded counts. 0 for a freshly created set.
	pub fn total_count(&self) -> usize {
		self.counts.values().sum()
	}

	/// The probability of transitioning to `state`:
	/// `count_for(state) / total_count`.
	///
	/// When `total_count` is 0 this is a 0/0 division and yields
	/// `f64::NAN` — an untrained set has no defined distribution. This
	/// is deliberately distinct from a trained set returning 0.0 for an
	/// unseen candidate, and is never coerced to 0.
	pub fn probability_for(&self, state: &S) -> f64 {
		self.count_for(state) as f64 / self.total_count() as f64
	}

	/// Records one occurrence of a transition toward `state`.
	///
	/// - If the transition already exists, its count is increased.
	/// - Otherwise, a new entry is created with a count of 1.
	pub fn add_transition(&mut self, state: S) {
		*self.counts.entry(state).or_insert(0) += 1;
	}

	/// Samples a successor using weighted random selection.
	///
	/// The probability of selecting a state is proportional to its
	/// occurrence count. Returns `None` if the set has no observations.
	pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<&S> {
		let total = self.total_count();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);

		let mut fallback: Option<&S> = None;
		for (state, occurrence) in &self.counts {
			if r < *occurrence {
				return Some(state);
			}
			r -= occurrence;
			fallback = Some(state);
		}

		// Fallback: should not happen, but kept for safety.
		fallback
	}

	/// Iterates over the recorded (state, count) pairs, unordered.
	pub fn iter(&self) -> impl Iterator<Item = (&S, usize)> {
		self.counts.iter().map(|(state, count)| (state, *count))
	}
}

impl<S: Eq + Hash + Clone> TransitionSet<S> {
	/// Merges another set into this one, summing occurrence counts.
	///
	/// Both sets must describe the same context; the caller (the
	/// owning `MarkovChain`) guarantees this by merging per key.
	pub fn merge(&mut self, other: &Self) {
		for (state, occurrence) in &other.counts {
			*self.counts.entry(state.clone()).or_insert(0) += *occurrence;
		}
	}
}

impl<S: Eq + Hash> Default for TransitionSet<S> {
	fn default() -> Self {
		Self::new()
	}
}
