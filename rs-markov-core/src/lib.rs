//! Variable-order Markov chain engine.
//!
//! This crate provides a generic, in-memory Markov model including:
//! - Ordered state-context chains with suffix slicing
//! - Transition counting with derived probabilities
//! - Variable-order (backoff) training and candidate scoring
//! - A high-level sliding-window predictor
//!
//! States are opaque caller-supplied values; the engine only requires
//! equality and hashing (plus `Clone` for training, and serde bounds
//! for the optional binary persistence).

/// Core Markov model types and the training/query logic.
///
/// This module exposes the chain, transition-set and predictor types
/// that make up the public API.
pub mod model;

/// Error type shared by the fallible operations (persistence, batch
/// training, predictor construction).
pub mod error;
