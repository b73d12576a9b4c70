//! Connected components of a diagram graph.
//!
//! Components are computed with union-find and ordered deterministically by
//! their lowest member vertex id. For an S-matrix element only the component
//! spanning every required external leg is retained; discarded components
//! are a zero contribution for that observable, never an error.

use log::debug;
use petgraph::unionfind::UnionFind;

use feynwick_model::OpIdx;

use crate::graph::DiagramGraph;

/// Partition of the diagram's vertices into maximal connected subgraphs.
#[derive(Debug, Clone)]
pub struct Components {
    /// Vertex id -> component id.
    membership: Vec<usize>,
    /// Component id -> member vertex ids, ascending.
    members: Vec<Vec<usize>>,
}

/// Compute connected components; component ids are assigned in order of each
/// component's lowest vertex id.
pub fn connected_components(g: &DiagramGraph) -> Components {
    let n = g.n_vertices();
    let mut uf = UnionFind::<usize>::new(n);
    for (_, edge) in g.edges() {
        uf.union(edge.va, edge.vb);
    }
    let labels = uf.into_labeling();

    // Reindex by first appearance, which is the lowest vertex id of each
    // component since we scan ascending.
    let mut remap = vec![usize::MAX; n];
    let mut members: Vec<Vec<usize>> = Vec::new();
    let mut membership = vec![0usize; n];
    for v in 0..n {
        let root = labels[v];
        if remap[root] == usize::MAX {
            remap[root] = members.len();
            members.push(Vec::new());
        }
        let c = remap[root];
        membership[v] = c;
        members[c].push(v);
    }
    Components { membership, members }
}

impl Components {
    /// Number of components; never exceeds the number of vertices.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Component id of a vertex.
    pub fn component_of(&self, v: usize) -> usize {
        self.membership[v]
    }

    /// Member vertex ids of a component, ascending.
    pub fn members(&self, c: usize) -> &[usize] {
        &self.members[c]
    }

    /// Iterate components in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.members.iter().enumerate().map(|(i, m)| (i, m.as_slice()))
    }

    /// Component ids that touch every required external leg.
    ///
    /// With an empty requirement every component is retained (vacuum
    /// diagrams). Otherwise at most one component can span all legs; the
    /// others are dropped as zero contributions for the requested observable.
    pub fn retain_spanning(&self, g: &DiagramGraph, required: &[OpIdx]) -> Vec<usize> {
        if required.is_empty() {
            return (0..self.count()).collect();
        }
        let mut wanted: Option<usize> = None;
        for &op in required {
            let c = self.component_of(g.vertex_of_op(op));
            match wanted {
                None => wanted = Some(c),
                Some(w) if w != c => {
                    debug!("external legs split across components, no spanning component");
                    return Vec::new();
                }
                _ => {}
            }
        }
        let retained: Vec<usize> = wanted.into_iter().collect();
        let dropped = self.count() - retained.len();
        if dropped > 0 {
            debug!("dropping {dropped} component(s) not touching the required legs");
        }
        retained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feynwick_contraction::{Enumerator, TimeOrderedProduct};
    use feynwick_model::{Expr, InteractionTerm, SpeciesTable, SpinTag, Statistics};

    #[test]
    fn disconnected_pairings_split_into_components() {
        let mut table = SpeciesTable::new();
        let phi = table
            .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let mut product = TimeOrderedProduct::new();
        for _ in 0..4 {
            let term = InteractionTerm::new("src", Expr::one())
                .add_field(&table, phi, false)
                .unwrap();
            product.push_term(&term);
        }
        let contractions = Enumerator::for_product(&table, &product).enumerate().unwrap();
        // First contraction pairs (0,1) and (2,3): two components.
        let g = DiagramGraph::build(&product, &contractions[0], &table).unwrap();
        let comps = connected_components(&g);
        assert_eq!(comps.count(), 2);
        assert_eq!(comps.members(0), &[0, 1]);
        assert_eq!(comps.members(1), &[2, 3]);
        // Every edge's endpoints lie in one component.
        for (_, e) in g.edges() {
            assert_eq!(comps.component_of(e.va), comps.component_of(e.vb));
        }
    }
}
