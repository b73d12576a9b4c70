//! The diagram graph: vertices, edges and external legs.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::Undirected;

use feynwick_contraction::{Contraction, TimeOrderedProduct};
use feynwick_model::{Expr, FieldOperator, OpIdx, SpeciesId, SpeciesTable};

use crate::error::{DiagramError, Result};

/// One interaction-term instance placed in the diagram, with its operators
/// partitioned into contracted and external.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// Term-instance ordinal (equals the dense vertex id).
    pub term: usize,
    /// Name of the originating interaction term.
    pub name: String,
    /// Coupling coefficient of this vertex.
    pub coupling: Expr,
    /// Operators of this vertex attached to an edge.
    pub contracted_ops: Vec<OpIdx>,
    /// Operators of this vertex that are external legs.
    pub external_ops: Vec<OpIdx>,
}

/// One contraction pair realized as a graph edge.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Dense edge id (creation order: pairs sorted by first position).
    pub id: usize,
    /// Flat positions of the paired operators, `a < b`.
    pub a: OpIdx,
    pub b: OpIdx,
    /// Vertex ids owning `a` and `b`. Equal for self-loops (tadpole or
    /// self-energy insertions on one vertex).
    pub va: usize,
    pub vb: usize,
    pub species: SpeciesId,
    pub fermionic: bool,
    /// Resolved propagator expression of the pair.
    pub propagator: Expr,
}

/// An uncontracted operator attached to its owning vertex.
#[derive(Debug, Clone)]
pub struct ExternalLeg {
    pub op: OpIdx,
    pub vertex: usize,
    pub species: SpeciesId,
    pub fermionic: bool,
}

/// Graph form of one resolved contraction.
///
/// Invariants: every edge references exactly two endpoints drawn from the
/// vertex pool, and no operator is covered by more than one edge; both are
/// checked during [`DiagramGraph::build`].
#[derive(Debug, Clone)]
pub struct DiagramGraph {
    graph: StableGraph<VertexData, EdgeData, Undirected>,
    nodes: Vec<NodeIndex>,
    edge_indices: Vec<EdgeIndex>,
    legs: Vec<ExternalLeg>,
    ops: Vec<FieldOperator>,
}

impl DiagramGraph {
    /// Build the graph for one contraction over a time-ordered product.
    pub fn build(
        product: &TimeOrderedProduct,
        contraction: &Contraction,
        table: &SpeciesTable,
    ) -> Result<Self> {
        let ops = product.ops();
        let n = ops.len();

        let mut graph = StableGraph::default();
        let mut nodes = Vec::with_capacity(product.n_terms());
        for (i, term) in product.terms().iter().enumerate() {
            nodes.push(graph.add_node(VertexData {
                term: i,
                name: term.name.clone(),
                coupling: term.coupling.clone(),
                contracted_ops: Vec::new(),
                external_ops: Vec::new(),
            }));
        }

        let mut covered = vec![false; n];
        let mut edge_indices = Vec::with_capacity(contraction.pairs.len());
        for (id, pair) in contraction.pairs.iter().enumerate() {
            for op in [pair.a, pair.b] {
                if op >= n {
                    return Err(DiagramError::OperatorOutOfRange { op, len: n });
                }
                if covered[op] {
                    return Err(DiagramError::OperatorReused(op));
                }
                if ops[op].external {
                    return Err(DiagramError::ExternalContracted(op));
                }
                covered[op] = true;
            }
            let (va, vb) = (ops[pair.a].term, ops[pair.b].term);
            let species = ops[pair.a].species;
            let fermionic = table.statistics(species)?.anticommuting();
            let edge = graph.add_edge(
                nodes[va],
                nodes[vb],
                EdgeData {
                    id,
                    a: pair.a,
                    b: pair.b,
                    va,
                    vb,
                    species,
                    fermionic,
                    propagator: pair.propagator.clone(),
                },
            );
            edge_indices.push(edge);
            graph[nodes[va]].contracted_ops.push(pair.a);
            graph[nodes[vb]].contracted_ops.push(pair.b);
        }

        // Every uncovered operator becomes an external leg on its vertex.
        let mut legs = Vec::new();
        for (op, field) in ops.iter().enumerate() {
            if covered[op] {
                continue;
            }
            let fermionic = table.statistics(field.species)?.anticommuting();
            graph[nodes[field.term]].external_ops.push(op);
            legs.push(ExternalLeg {
                op,
                vertex: field.term,
                species: field.species,
                fermionic,
            });
        }

        Ok(Self {
            graph,
            nodes,
            edge_indices,
            legs,
            ops: ops.to_vec(),
        })
    }

    pub fn n_vertices(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edge_indices.len()
    }

    /// Vertex data by dense id.
    pub fn vertex(&self, v: usize) -> &VertexData {
        &self.graph[self.nodes[v]]
    }

    /// Edge data by dense id.
    pub fn edge(&self, e: usize) -> &EdgeData {
        &self.graph[self.edge_indices[e]]
    }

    /// Iterate vertices in dense-id order.
    pub fn vertices(&self) -> impl Iterator<Item = (usize, &VertexData)> {
        self.nodes.iter().enumerate().map(|(i, &n)| (i, &self.graph[n]))
    }

    /// Iterate edges in dense-id order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, &EdgeData)> {
        self.edge_indices
            .iter()
            .enumerate()
            .map(|(i, &e)| (i, &self.graph[e]))
    }

    /// External legs, ascending by operator position.
    pub fn legs(&self) -> &[ExternalLeg] {
        &self.legs
    }

    /// Operator record by flat position.
    pub fn op(&self, i: OpIdx) -> &FieldOperator {
        &self.ops[i]
    }

    /// Dense vertex id owning an operator.
    pub fn vertex_of_op(&self, op: OpIdx) -> usize {
        self.ops[op].term
    }

    /// Neighboring vertex ids (with multiplicity) of a vertex.
    pub fn neighbors(&self, v: usize) -> Vec<usize> {
        self.graph
            .neighbors(self.nodes[v])
            .map(|n| self.graph[n].term)
            .collect()
    }

    /// Number of independent loops of the whole graph: `E - V + C`.
    pub fn n_loops(&self, n_components: usize) -> usize {
        (self.n_edges() + n_components).saturating_sub(self.n_vertices())
    }
}
