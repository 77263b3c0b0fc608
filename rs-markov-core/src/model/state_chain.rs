use serde::{Deserialize, Serialize};

/// An ordered, finite sequence of states representing a context:
/// "the last K things observed", oldest first.
///
/// Conceptually this is the left-hand side of a transition in the
/// Markov model. Equality is positional: two chains are equal iff they
/// have the same length and equal states at every position, in order.
/// The derived `Hash` is order-sensitive, so equal chains hash equally.
///
/// ## Responsibilities
/// - Hold a context and let it grow (`add_state`) and shrink (`trim`)
/// - Decompose itself into all trailing suffixes (`slices`)
///
/// ## Invariants
/// - Order is significant for equality and hashing
/// - Copies are independent values; mutating one never aliases another
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateChain<S> {
	/// The states, oldest first.
	states: Vec<S>,
}

impl<S> StateChain<S> {
	/// Creates an empty chain.
	pub fn new() -> Self {
		Self { states: Vec::new() }
	}

	/// Creates a chain holding a single state.
	pub fn from_state(state: S) -> Self {
		Self { states: vec![state] }
	}

	/// Creates a chain from an explicit sequence, order preserved.
	pub fn from_states(states: Vec<S>) -> Self {
		Self { states }
	}

	/// Keeps only the most recent `maximum_count` states, discarding
	/// from the front. No-op if the chain is already within the bound.
	///
	/// `trim(0)` empties the chain.
	pub fn trim(&mut self, maximum_count: usize) {
		if self.states.len() > maximum_count {
			self.states.drain(..self.states.len() - maximum_count);
		}
	}

	/// Appends a state to the end of the chain.
	pub fn add_state(&mut self, state: S) {
		self.states.push(state);
	}

	/// The number of states in the chain.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	/// Whether the chain holds no states.
	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Read-only view of the states, oldest first.
	pub fn states(&self) -> &[S] {
		&self.states
	}
}

impl<S: Clone> StateChain<S> {
	/// All trailing suffixes of this chain, from the longest to the
	/// shortest.
	///
	/// For a chain of length n this yields exactly n chains: the first
	/// is the full chain, the last is the singleton of the most recent
	/// state. An empty chain yields no slices.
	///
	/// ```text
	/// [a, b, c, d]
	/// [   b, c, d]
	/// [      c, d]
	/// [         d]
	/// ```
	///
	/// Longer slices come first; the backoff scoring in `MarkovChain`
	/// weights them higher.
	pub fn slices(&self) -> Vec<StateChain<S>> {
		(0..self.states.len())
			.map(|i| StateChain::from_states(self.states[i..].to_vec()))
			.collect()
	}
}

impl<S> Default for StateChain<S> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slices_run_from_longest_to_shortest() {
		let chain = StateChain::from_states(vec!["x", "y", "z"]);
		let slices = chain.slices();

		assert_eq!(slices.len(), 3);
		assert_eq!(slices[0], StateChain::from_states(vec!["x", "y", "z"]));
		assert_eq!(slices[1], StateChain::from_states(vec!["y", "z"]));
		assert_eq!(slices[2], StateChain::from_state("z"));
	}

	#[test]
	fn empty_chain_has_no_slices() {
		let chain: StateChain<u32> = StateChain::new();
		assert!(chain.slices().is_empty());
		assert!(chain.is_empty());
	}

	#[test]
	fn trim_keeps_the_most_recent_states() {
		let mut chain = StateChain::from_states(vec![1, 2, 3, 4, 5]);
		chain.trim(3);
		assert_eq!(chain.states(), &[3, 4, 5]);

		// Already within the bound
		chain.trim(10);
		assert_eq!(chain.states(), &[3, 4, 5]);

		chain.trim(0);
		assert!(chain.is_empty());
	}

	#[test]
	fn add_state_appends() {
		let mut chain = StateChain::from_state("a");
		chain.add_state("b");
		assert_eq!(chain.len(), 2);
		assert_eq!(chain.states(), &["a", "b"]);
	}

	#[test]
	fn equality_is_positional() {
		let ab = StateChain::from_states(vec!["a", "b"]);
		let ba = StateChain::from_states(vec!["b", "a"]);
		assert_ne!(ab, ba);
		assert_eq!(ab, StateChain::from_states(vec!["a", "b"]));
	}

	#[test]
	fn copies_do_not_alias() {
		let original = StateChain::from_states(vec![1, 2]);
		let mut copy = original.clone();
		copy.add_state(3);
		assert_eq!(original.len(), 2);
		assert_eq!(copy.len(), 3);
	}
}
