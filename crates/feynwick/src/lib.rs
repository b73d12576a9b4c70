//! Umbrella crate: the whole contraction-to-amplitude pipeline behind one
//! dependency.
//!
//! The stages live in their own crates and are re-exported here as modules:
//!
//! - [`model`]: species registry, operators, interaction terms, the
//!   expression carrier;
//! - [`contraction`]: Wick contraction enumeration and fermionic signs;
//! - [`diagram`]: diagram graphs, components, fermion chains, symmetry
//!   factors and topologies;
//! - [`amplitude`]: algebra reduction, trace caching and amplitude assembly.

pub use feynwick_amplitude as amplitude;
pub use feynwick_contraction as contraction;
pub use feynwick_diagram as diagram;
pub use feynwick_model as model;

// The working vocabulary of a typical caller, flattened.
pub use feynwick_amplitude::{
    compute_amplitude, Amplitude, AmplitudeTerm, DriverOptions, SymbolicReducer, TraceCache,
};
pub use feynwick_contraction::{Contraction, Enumerator, Sign, TimeOrderedProduct};
pub use feynwick_diagram::{DiagramGraph, Topology, TopologyClass};
pub use feynwick_model::{
    Expr, IndexKind, InteractionTerm, SpeciesId, SpeciesTable, SpinTag, Statistics,
};
