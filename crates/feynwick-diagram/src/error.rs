//! Error types for diagram construction.

use thiserror::Error;

use feynwick_model::{ModelError, OpIdx};

/// Result type for diagram operations.
pub type Result<T> = std::result::Result<T, DiagramError>;

/// Errors raised while turning a contraction into a diagram graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagramError {
    /// An operator is covered by more than one contraction pair.
    #[error("operator {0} is covered by more than one edge")]
    OperatorReused(OpIdx),

    /// A pair references an operator outside the product.
    #[error("operator index {op} out of range for a product of {len} operators")]
    OperatorOutOfRange { op: OpIdx, len: usize },

    /// A pair covers an operator marked external.
    #[error("operator {0} is marked external but appears in a contraction pair")]
    ExternalContracted(OpIdx),

    /// Model lookup failure.
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}
