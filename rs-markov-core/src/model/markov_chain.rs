use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state_chain::StateChain;
use super::transition_set::TransitionSet;
use crate::error::MarkovError;

/// A variable-order Markov chain holding transitions from a context
/// (a non-empty sequence of states) to a next state.
///
/// Every training observation fans out across all trailing suffixes of
/// its context. A session that repeats
///
/// ```text
/// warm-up, squat, deadlift, X
/// ```
///
/// is recorded as the transitions
///
/// ```text
/// [warm-up] -> squat
/// [warm-up, squat] -> deadlift, [squat] -> deadlift
/// [warm-up, squat, deadlift] -> X, [squat, deadlift] -> X, [deadlift] -> X
/// ```
///
/// so that longer, more specific contexts accumulate sharper but
/// sparser statistics while shorter ones accumulate broader support.
/// This is the variable-order (backoff) idea at the heart of the
/// engine.
///
/// # Responsibilities
/// - Record observed transitions across all context suffixes
/// - Answer exact-context probability queries
/// - Score candidate next states with backoff weighting
/// - Merge with another chain (parallel training, combining models)
/// - Persist to and load from a compact binary form
///
/// # Invariants
/// - A context key exists only once it has received at least one
///   observation, and then persists for the chain's lifetime
/// - Stored keys never change; training clones context slices into the
///   map, so mutating a caller-held chain does not affect stored keys
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MarkovChain<S: Eq + Hash> {
	/// Observed successor distributions, keyed by exact context.
	transitions: HashMap<StateChain<S>, TransitionSet<S>>,
}

impl<S: Eq + Hash> MarkovChain<S> {
	/// Creates an empty chain with no recorded transitions.
	pub fn new() -> Self {
		Self { transitions: HashMap::new() }
	}

	/// The number of distinct context keys recorded so far.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	/// Whether no transition has been recorded yet.
	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Iterates over the recorded context keys, unordered.
	pub fn contexts(&self) -> impl Iterator<Item = &StateChain<S>> {
		self.transitions.keys()
	}

	/// The successor distribution recorded for an exact context, if
	/// that context has ever been trained.
	pub fn transition_set(&self, context: &StateChain<S>) -> Option<&TransitionSet<S>> {
		self.transitions.get(context)
	}
}

impl<S: Eq + Hash + Clone> MarkovChain<S> {
	/// Records a transition `[previous] -> next` with a single-state
	/// context.
	pub fn add_transition(&mut self, previous: S, next: S) {
		self.add_chain_transition(&StateChain::from_state(previous), next);
	}

	/// Records a transition `previous -> next`.
	///
	/// Every trailing suffix of `previous` (longest to shortest) gets
	/// its own entry updated: one observation with a context of length
	/// L increments L keyed distributions simultaneously.
	pub fn add_chain_transition(&mut self, previous: &StateChain<S>, next: S) {
		for slice in previous.slices() {
			self.transitions
				.entry(slice)
				.or_default()
				.add_transition(next.clone());
		}
	}

	/// The probability of moving from the single-state context
	/// `[from]` to `to`.
	pub fn transition_probability(&self, from: &S, to: &S) -> f64 {
		self.chain_transition_probability(&StateChain::from_state(from.clone()), to)
	}

	/// The probability of moving from the exact context `from` to
	/// `to`, in 0..1.
	///
	/// A context that was never trained yields a defined 0.0. (This is
	/// distinct from querying an untrained `TransitionSet` directly,
	/// which yields NaN; a stored set always has at least one
	/// observation.)
	pub fn chain_transition_probability(&self, from: &StateChain<S>, to: &S) -> f64 {
		self.transitions
			.get(from)
			.map_or(0.0, |set| set.probability_for(to))
	}

	/// All distinct states appearing as an element of any recorded
	/// context key.
	///
	/// This is the candidate universe used by
	/// [`transition_probabilities`](Self::transition_probabilities),
	/// recomputed from the full key set on each call. Note the
	/// asymmetry: states that only ever occurred as successors, never
	/// inside a context, are not included.
	pub fn observed_states(&self) -> Vec<S> {
		let states: HashSet<S> = self
			.transitions
			.keys()
			.flat_map(|context| context.states().iter().cloned())
			.collect();
		states.into_iter().collect()
	}

	/// Scores candidate next states for the context `from`, favouring
	/// longer suffixes.
	///
	/// For every suffix slice of `from` and every state in the
	/// candidate universe, emits `(candidate, probability * slice
	/// length)`. A slice of length L can therefore contribute a score
	/// up to L: specific contexts dominate when they have data, while
	/// shorter contexts still contribute when longer ones have none.
	///
	/// The result is unordered and unaggregated: a candidate appears
	/// once per slice length. Callers wanting one ranked entry per
	/// state must combine the scores themselves (or use
	/// [`Predictor::ranked`](super::predictor::Predictor::ranked)).
	pub fn transition_probabilities(&self, from: &StateChain<S>) -> Vec<(S, f64)> {
		let states = self.observed_states();

		let mut scored = Vec::with_capacity(from.len() * states.len());
		for slice in from.slices() {
			let weight = slice.len() as f64;
			for to in &states {
				let score = self.chain_transition_probability(&slice, to) * weight;
				scored.push((to.clone(), score));
			}
		}
		scored
	}

	/// Merges another chain into this one.
	///
	/// Transition counts for matching contexts are summed; contexts
	/// unknown to `self` are copied over. Merging partial chains built
	/// from disjoint observation sets is equivalent to training one
	/// chain on all observations sequentially.
	pub fn merge(&mut self, other: &Self) {
		for (context, set) in &other.transitions {
			if let Some(existing) = self.transitions.get_mut(context) {
				existing.merge(set);
			} else {
				self.transitions.insert(context.clone(), set.clone());
			}
		}
	}

	/// Builds a chain from a batch of observations, training in
	/// parallel.
	///
	/// The batch is split into chunks (CPU cores * factor), each chunk
	/// trains a partial chain on its own thread, and the partial
	/// chains are merged sequentially. The result is identical to
	/// sequential training on the same observations.
	///
	/// # Errors
	/// Returns [`MarkovError::Join`] if a worker thread panicked.
	pub fn train_batch(observations: Vec<(StateChain<S>, S)>) -> Result<Self, MarkovError>
	where
		S: Send + 'static,
	{
		if observations.is_empty() {
			return Ok(Self::new());
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = (observations.len() + chunks - 1) / chunks;
		debug!(observations = observations.len(), chunk_size, "training batch in parallel");

		let (tx, rx) = mpsc::channel();
		let mut workers = Vec::new();
		for chunk in observations.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<(StateChain<S>, S)> = chunk.to_vec();

			workers.push(thread::spawn(move || {
				let mut partial = MarkovChain::new();
				for (previous, next) in chunk {
					partial.add_chain_transition(&previous, next);
				}
				// Fails only if the receiver is gone; the join below
				// reports the panic that caused it.
				let _ = tx.send(partial);
			}));
		}
		drop(tx);

		let mut merged = Self::new();
		for partial in rx.iter() {
			merged.merge(&partial);
		}

		for worker in workers {
			worker.join().map_err(|_| MarkovError::Join)?;
		}

		Ok(merged)
	}
}

impl<S: Eq + Hash + Serialize> MarkovChain<S> {
	/// Serializes the chain to a compact binary file.
	///
	/// The format is the data model itself: the map from context to
	/// per-state counts, encoded with `postcard`.
	pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), MarkovError> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(&path, bytes)?;
		debug!(contexts = self.transitions.len(), "saved chain");
		Ok(())
	}
}

impl<S: Eq + Hash + DeserializeOwned> MarkovChain<S> {
	/// Loads a chain previously written by [`save_to`](Self::save_to).
	pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, MarkovError> {
		let bytes = std::fs::read(&path)?;
		let chain: Self = postcard::from_bytes(&bytes)?;
		debug!(contexts = chain.transitions.len(), "loaded chain");
		Ok(chain)
	}
}

impl<S: Eq + Hash> Default for MarkovChain<S> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_observation_gives_certainty() {
		let mut chain = MarkovChain::new();
		chain.add_transition("a", "b");

		assert_eq!(chain.transition_probability(&"a", &"b"), 1.0);
		assert_eq!(chain.transition_probability(&"a", &"a"), 0.0);
	}

	#[test]
	fn unknown_context_is_zero_not_nan() {
		let chain: MarkovChain<&str> = MarkovChain::new();
		assert_eq!(chain.transition_probability(&"a", &"b"), 0.0);
	}

	#[test]
	fn training_fans_out_across_suffixes() {
		let mut chain = MarkovChain::new();
		chain.add_chain_transition(&StateChain::from_states(vec!["x", "y"]), "z");

		let xy = StateChain::from_states(vec!["x", "y"]);
		let y = StateChain::from_state("y");
		let x = StateChain::from_state("x");

		assert_eq!(chain.chain_transition_probability(&xy, &"z"), 1.0);
		assert_eq!(chain.chain_transition_probability(&y, &"z"), 1.0);
		// [x] is not a suffix of [x, y]: untouched
		assert_eq!(chain.chain_transition_probability(&x, &"z"), 0.0);
		assert_eq!(chain.len(), 2);
	}

	#[test]
	fn repeated_observations_keep_the_key_set() {
		let mut chain = MarkovChain::new();
		let context = StateChain::from_states(vec!["x", "y"]);
		for _ in 0..5 {
			chain.add_chain_transition(&context, "z");
		}

		assert_eq!(chain.len(), 2);
		let set = chain.transition_set(&context).unwrap();
		assert_eq!(set.total_count(), 5);
		assert_eq!(chain.chain_transition_probability(&context, &"z"), 1.0);
	}

	#[test]
	fn stored_keys_are_unaffected_by_later_mutation() {
		let mut chain = MarkovChain::new();
		let mut context = StateChain::from_states(vec!["x", "y"]);
		chain.add_chain_transition(&context, "z");

		context.add_state("w");
		let xy = StateChain::from_states(vec!["x", "y"]);
		assert_eq!(chain.chain_transition_probability(&xy, &"z"), 1.0);
	}

	#[test]
	fn candidate_universe_comes_from_context_keys() {
		let mut chain = MarkovChain::new();
		// "b" occurs only as a successor, never inside a context
		chain.add_transition("a", "b");

		let states = chain.observed_states();
		assert_eq!(states, vec!["a"]);
	}

	#[test]
	fn scoring_emits_one_entry_per_slice_and_candidate() {
		let mut chain = MarkovChain::new();
		let ab = StateChain::from_states(vec!["a", "b"]);
		chain.add_chain_transition(&ab, "c");
		chain.add_transition("b", "d");

		let scored = chain.transition_probabilities(&ab);
		// 2 slices x 2 candidate states ("a", "b"); "c" and "d" only
		// ever occurred as successors, so they are not candidates
		assert_eq!(scored.len(), 4);
		for (state, score) in &scored {
			assert!(*state == "a" || *state == "b");
			assert_eq!(*score, 0.0);
		}
	}

	#[test]
	fn scoring_weights_longer_slices_higher() {
		let mut chain = MarkovChain::new();
		let ab = StateChain::from_states(vec!["a", "b"]);
		chain.add_chain_transition(&ab, "a");
		chain.add_transition("b", "a");

		// [a, b] -> a is certain at weight 2, [b] -> a at weight 1
		let scored = chain.transition_probabilities(&ab);
		let mut for_a: Vec<f64> = scored
			.iter()
			.filter(|(state, _)| *state == "a")
			.map(|(_, score)| *score)
			.collect();
		for_a.sort_by(|x, y| y.partial_cmp(x).unwrap());

		assert_eq!(for_a, vec![2.0, 1.0]);
	}

	#[test]
	fn merge_matches_sequential_training() {
		let mut sequential = MarkovChain::new();
		sequential.add_transition("a", "b");
		sequential.add_transition("a", "b");
		sequential.add_transition("a", "c");

		let mut left = MarkovChain::new();
		left.add_transition("a", "b");
		let mut right = MarkovChain::new();
		right.add_transition("a", "b");
		right.add_transition("a", "c");

		left.merge(&right);
		assert_eq!(left, sequential);
	}

	#[test]
	fn train_batch_matches_sequential_training() {
		let observations: Vec<(StateChain<&str>, &str)> = vec![
			(StateChain::from_states(vec!["a", "b"]), "c"),
			(StateChain::from_states(vec!["b", "c"]), "a"),
			(StateChain::from_state("c"), "a"),
			(StateChain::from_states(vec!["a", "b"]), "c"),
		];

		let mut sequential = MarkovChain::new();
		for (previous, next) in &observations {
			sequential.add_chain_transition(previous, *next);
		}

		let parallel = MarkovChain::train_batch(observations).unwrap();
		assert_eq!(parallel, sequential);
	}

	#[test]
	fn train_batch_on_empty_input_is_empty() {
		let chain = MarkovChain::<String>::train_batch(Vec::new()).unwrap();
		assert!(chain.is_empty());
	}
}
