//! Wick contraction enumeration.
//!
//! Given a time-ordered product of field operators, this crate enumerates
//! every distinct full contraction (perfect matching of the non-external
//! operators under the species compatibility oracle), folds pairings that are
//! equivalent under relabeling of identical fields within one term into a
//! multiplicity factor, and annotates each contraction with the fermionic
//! reordering sign.
//!
//! The search is exact enumeration with deterministic output ordering; a
//! configurable ceiling guards against combinatorial blow-up.

pub mod enumerate;
pub mod error;
pub mod product;
pub mod sign;

pub use enumerate::{Contraction, ContractionPair, Enumerator, DEFAULT_CEILING};
pub use error::{Result, WickError};
pub use product::{TermInstance, TimeOrderedProduct};
pub use sign::{sign_of, Sign};
