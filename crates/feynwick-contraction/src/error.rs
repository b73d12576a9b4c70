//! Error types for contraction enumeration.

use thiserror::Error;

use feynwick_model::{ModelError, OpIdx};

/// Result type for contraction operations.
pub type Result<T> = std::result::Result<T, WickError>;

/// Errors that can occur during Wick contraction enumeration.
///
/// Vanishing contractions are not errors: branches with no compatible
/// partner are pruned silently and contribute an empty result set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WickError {
    /// The number of candidate contractions exceeded the configured ceiling.
    /// Carries the partial count so the caller can retry with tighter
    /// constraints.
    #[error("candidate contraction count exceeded ceiling ({candidates} > {ceiling})")]
    CombinatorialOverflow { candidates: usize, ceiling: usize },

    /// A pairing the caller explicitly required is rejected by the
    /// compatibility oracle.
    #[error(
        "no valid propagator pairs operator {a} ({a_species}) with operator {b} ({b_species})"
    )]
    IncompatiblePair {
        a: OpIdx,
        b: OpIdx,
        a_species: String,
        b_species: String,
    },

    /// A required pairing references an operator outside the product, or an
    /// operator marked external.
    #[error("required pairing ({a}, {b}) is not over free internal operators")]
    InvalidRequiredPair { a: OpIdx, b: OpIdx },

    /// Model lookup failure.
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}
