use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use rand::Rng;

use super::markov_chain::MarkovChain;
use super::state_chain::StateChain;
use crate::error::MarkovError;

/// High-level interface that maintains a bounded recent history and
/// the chain trained from it.
///
/// Every observed state first trains the chain on the transition
/// `history -> state`, then enters the history, which is trimmed to
/// the configured window. Queries score candidates against the current
/// history with backoff weighting and aggregate the per-slice scores
/// into a single ranked list.
///
/// # Responsibilities
/// - Keep the sliding observation window
/// - Drive training from a stream of observations
/// - Aggregate backoff scores into one entry per candidate
/// - Sample a likely next state with weighted randomness
#[derive(Clone, Debug)]
pub struct Predictor<S: Eq + Hash> {
	chain: MarkovChain<S>,
	history: StateChain<S>,
	max_history: usize,
}

impl<S: Eq + Hash + Clone> Predictor<S> {
	/// Creates a predictor with an empty chain and history.
	///
	/// `max_history` bounds the context window: each observation keeps
	/// only the most recent `max_history` states as the next context.
	///
	/// # Errors
	/// Returns [`MarkovError::InvalidHistoryLimit`] if `max_history`
	/// is 0 (the predictor could never form a context).
	pub fn new(max_history: usize) -> Result<Self, MarkovError> {
		Self::with_chain(MarkovChain::new(), max_history)
	}

	/// Creates a predictor resuming from an existing chain, for
	/// example one restored with
	/// [`MarkovChain::load_from`](MarkovChain::load_from).
	///
	/// The history starts empty; queries become meaningful once
	/// states have been observed.
	///
	/// # Errors
	/// Returns [`MarkovError::InvalidHistoryLimit`] if `max_history`
	/// is 0.
	pub fn with_chain(chain: MarkovChain<S>, max_history: usize) -> Result<Self, MarkovError> {
		if max_history == 0 {
			return Err(MarkovError::InvalidHistoryLimit(max_history));
		}
		Ok(Self {
			chain,
			history: StateChain::new(),
			max_history,
		})
	}

	/// Feeds one observed state.
	///
	/// Trains the chain on `history -> state` (a no-op for the very
	/// first observation, when there is no context yet), then appends
	/// the state to the history and trims it to the window.
	pub fn observe(&mut self, state: S) {
		if !self.history.is_empty() {
			self.chain.add_chain_transition(&self.history, state.clone());
		}
		self.history.add_state(state);
		self.history.trim(self.max_history);
	}

	/// Ranks candidate next states for the current history.
	///
	/// Backoff scores are summed per candidate across all slice
	/// lengths and returned in descending score order. Empty when
	/// nothing has been observed yet.
	pub fn ranked(&self) -> Vec<(S, f64)> {
		let mut totals: HashMap<S, f64> = HashMap::new();
		for (state, score) in self.chain.transition_probabilities(&self.history) {
			*totals.entry(state).or_insert(0.0) += score;
		}

		let mut ranked: Vec<(S, f64)> = totals.into_iter().collect();
		ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
		ranked
	}

	/// Samples a next state with probability proportional to its
	/// aggregated score.
	///
	/// Returns `None` when no candidate has a positive score (nothing
	/// observed yet, or the history matches no trained context).
	pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<S> {
		let ranked = self.ranked();
		let total: f64 = ranked.iter().map(|(_, score)| score).sum();
		if total <= 0.0 {
			return None;
		}

		let mut r = rng.random_range(0.0..total);

		let mut fallback: Option<S> = None;
		for (state, score) in ranked {
			if r < score {
				return Some(state);
			}
			r -= score;
			fallback = Some(state);
		}

		// Fallback: should not happen, but kept for safety.
		fallback
	}

	/// The current observation window, oldest first.
	pub fn history(&self) -> &StateChain<S> {
		&self.history
	}

	/// The underlying trained chain.
	pub fn chain(&self) -> &MarkovChain<S> {
		&self.chain
	}

	/// The configured window size.
	pub fn max_history(&self) -> usize {
		self.max_history
	}

	/// Consumes the predictor, returning the trained chain (for
	/// persistence or merging).
	pub fn into_chain(self) -> MarkovChain<S> {
		self.chain
	}
}
