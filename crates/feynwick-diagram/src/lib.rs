//! Diagram graph construction and topology analysis.
//!
//! A resolved contraction becomes a [`DiagramGraph`]: one vertex per
//! interaction-term instance, one edge per contraction pair, external legs
//! attached to their owning vertex. On top of the graph this crate provides:
//!
//! - connected components with deterministic ordering and spanning-leg
//!   retention ([`components`]),
//! - fermion chain identification, open and closed ([`chains`]),
//! - symmetry (automorphism) factors ([`symmetry`]),
//! - canonical topology descriptors for deduplication and for downstream
//!   rendering layers ([`topology`]).
//!
//! The graph is arena-style: vertices and edges are dense integer ids backed
//! by a petgraph `StableGraph`; components and chains are views, never
//! independently owned.

pub mod chains;
pub mod components;
pub mod error;
pub mod graph;
pub mod symmetry;
pub mod topology;

pub use chains::{closed_loop_count, fermion_chains, FermionChain};
pub use components::{connected_components, Components};
pub use error::{DiagramError, Result};
pub use graph::{DiagramGraph, EdgeData, ExternalLeg, VertexData};
pub use symmetry::symmetry_factor;
pub use topology::{Topology, TopologyClass, TopologyEdge, TopologyLeg, TopologyVertex};
