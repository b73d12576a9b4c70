//! Amplitude assembly on top of contraction enumeration and diagram
//! analysis: the algebra-reduction seam, the shared trace cache, per-diagram
//! coefficient assembly and the data-parallel driver.
//!
//! The output contract is an [`Amplitude`]: a finite, deterministically
//! ordered list of `(coefficient, topology)` terms. Vanishing contributions
//! are accounted, never errors; an unreduced index structure marks its term
//! with [`feynwick_model::Expr::Unresolved`] and leaves the rest intact.

pub mod algebra;
pub mod assembler;
pub mod cache;
pub mod driver;
pub mod error;

pub use algebra::{signature, AlgebraReducer, SymbolicReducer};
pub use assembler::{Amplitude, AmplitudeTerm, Assembler};
pub use cache::TraceCache;
pub use driver::{compute_amplitude, products_at_order, DriverOptions};
pub use error::{AlgebraError, AmplitudeError, Result};
