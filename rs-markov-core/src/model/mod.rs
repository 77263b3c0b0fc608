//! Top-level module for the Markov chain engine.
//!
//! This module provides a variable-order Markov model, including:
//! - Ordered state contexts (`StateChain`)
//! - Per-context transition counting (`TransitionSet`)
//! - The trained model itself (`MarkovChain`)
//! - A high-level sliding-window interface (`Predictor`)

/// Ordered, finite sequence of states representing a context.
///
/// Supports in-place trimming and appending, and produces all of its
/// trailing suffixes for variable-order training and scoring.
pub mod state_chain;

/// Multiset of observed successors for one fixed context.
///
/// Tracks occurrence counts, derived totals and probabilities, and
/// supports weighted random sampling and merging.
pub mod transition_set;

/// The trained Markov model.
///
/// Handles transition ingestion across all context suffixes,
/// exact-context probability lookup, backoff-weighted candidate
/// scoring, merging, parallel batch training and binary persistence.
pub mod markov_chain;

/// High-level interface maintaining a bounded recent history.
///
/// Exposes observation-driven training, aggregated ranking of
/// candidate next states and weighted random sampling.
pub mod predictor;
