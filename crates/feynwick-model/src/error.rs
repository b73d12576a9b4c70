//! Error types for model construction and species lookup.

use thiserror::Error;

use crate::species::SpeciesId;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while building or querying a model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A species id does not refer to any registered species.
    #[error("unknown species id {0}")]
    UnknownSpecies(SpeciesId),

    /// A species name was registered twice.
    #[error("duplicate species name: {0}")]
    DuplicateSpecies(String),

    /// A species name was looked up but never registered.
    #[error("no species named {0}")]
    NoSuchName(String),
}
