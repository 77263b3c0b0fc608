use thiserror::Error;

/// Errors produced by the fallible operations of the engine.
///
/// The probability queries themselves never fail: an unknown context
/// is a defined 0.0 and an untrained transition set yields NaN, both
/// plain numeric results.
#[derive(Debug, Error)]
pub enum MarkovError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] postcard::Error),

	#[error("History limit must be at least 1, got {0}")]
	InvalidHistoryLimit(usize),

	#[error("A training worker thread panicked")]
	Join,
}
