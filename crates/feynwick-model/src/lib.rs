//! Model-facing data types for the feynwick engine.
//!
//! This crate holds everything the contraction/diagram machinery consumes as
//! read-only input:
//!
//! - [`SpeciesTable`]: the registry of field species and the compatibility
//!   oracle deciding which pairs of operators admit a propagator.
//! - [`FieldOperator`] / [`InteractionTerm`]: one quantum-field insertion and
//!   one Lagrangian vertex type, immutable once constructed.
//! - [`Expr`]: a small symbolic expression carrier for couplings, propagators
//!   and reduced traces. It is deliberately not a computer algebra system;
//!   real simplification lives behind the algebra-reduction collaborator in
//!   `feynwick-amplitude`.

pub mod error;
pub mod expr;
pub mod operator;
pub mod species;
pub mod term;

pub use error::{ModelError, Result};
pub use expr::{AlgebraToken, Coeff, Expr};
pub use operator::{FieldOperator, OpIdx, OpRole};
pub use species::{IndexKind, SpeciesData, SpeciesId, SpeciesTable, SpinTag, Statistics};
pub use term::InteractionTerm;
