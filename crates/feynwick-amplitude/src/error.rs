//! Error types for amplitude assembly.

use thiserror::Error;

/// Failure of the algebra-reduction collaborator on one chain or tensor
/// structure. Never fatal for the amplitude: the term keeps an unresolved
/// marker instead.
#[derive(Debug, Clone, Error)]
pub enum AlgebraError {
    #[error("no reduction identity for structure {signature}")]
    UnsupportedIdentity { signature: String },
}

#[derive(Debug, Error)]
pub enum AmplitudeError {
    #[error(transparent)]
    Wick(#[from] feynwick_contraction::WickError),

    #[error(transparent)]
    Diagram(#[from] feynwick_diagram::DiagramError),

    #[error(transparent)]
    Model(#[from] feynwick_model::ModelError),
}

pub type Result<T> = std::result::Result<T, AmplitudeError>;
