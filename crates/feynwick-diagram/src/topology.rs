//! Canonical topology descriptors.
//!
//! A [`Topology`] is the rendering- and deduplication-oriented summary of one
//! connected component: vertex list, edge list and external-leg assignment.
//! [`Topology::canonical_key`] produces a string invariant under relabeling
//! of identical vertices (and thereby of external legs attached to them), so
//! amplitude terms with the same physical topology can be merged by adding
//! coefficients.

use std::collections::HashMap;

use itertools::Itertools;

use feynwick_model::{OpIdx, SpeciesId};

use crate::graph::DiagramGraph;

/// Classification of a component by its number of external legs, following
/// the usual loop-function nomenclature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyClass {
    Vacuum,
    Tadpole,
    SelfEnergy,
    Triangle,
    Box,
    Pentagon,
    MultiLeg(usize),
}

impl TopologyClass {
    pub fn from_legs(n: usize) -> Self {
        match n {
            0 => TopologyClass::Vacuum,
            1 => TopologyClass::Tadpole,
            2 => TopologyClass::SelfEnergy,
            3 => TopologyClass::Triangle,
            4 => TopologyClass::Box,
            5 => TopologyClass::Pentagon,
            n => TopologyClass::MultiLeg(n),
        }
    }
}

/// One vertex of a topology descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopologyVertex {
    /// Interaction-term name of the vertex.
    pub name: String,
}

/// One internal line; `from`/`to` are positions into the vertex list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopologyEdge {
    pub from: usize,
    pub to: usize,
    pub species: SpeciesId,
    pub fermionic: bool,
}

/// One external leg attached to a vertex of the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopologyLeg {
    pub vertex: usize,
    pub op: OpIdx,
    pub species: SpeciesId,
}

/// Topology of one connected component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topology {
    pub vertices: Vec<TopologyVertex>,
    pub edges: Vec<TopologyEdge>,
    pub legs: Vec<TopologyLeg>,
}

/// Above this many interchangeable vertices the canonical key falls back to
/// the color-refined form without trying permutations.
const CANONICAL_LIMIT: usize = 8;

impl Topology {
    /// Extract the topology of one component (vertex ids remapped to
    /// 0..members.len() in ascending member order).
    pub fn of_component(g: &DiagramGraph, members: &[usize]) -> Self {
        let remap: HashMap<usize, usize> =
            members.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let vertices = members
            .iter()
            .map(|&v| TopologyVertex {
                name: g.vertex(v).name.clone(),
            })
            .collect();
        let edges = g
            .edges()
            .filter(|(_, e)| remap.contains_key(&e.va))
            .map(|(_, e)| TopologyEdge {
                from: remap[&e.va],
                to: remap[&e.vb],
                species: e.species,
                fermionic: e.fermionic,
            })
            .collect();
        let legs = g
            .legs()
            .iter()
            .filter(|l| remap.contains_key(&l.vertex))
            .map(|l| TopologyLeg {
                vertex: remap[&l.vertex],
                op: l.op,
                species: l.species,
            })
            .collect();
        Self {
            vertices,
            edges,
            legs,
        }
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Independent loops of the (connected) component: `E - V + 1`.
    pub fn n_loops(&self) -> usize {
        (self.edges.len() + 1).saturating_sub(self.vertices.len())
    }

    pub fn class(&self) -> TopologyClass {
        TopologyClass::from_legs(self.legs.len())
    }

    /// True when a loop correction sits on an external line: some bridge
    /// edge separates a looped subgraph carrying exactly one external leg
    /// from the rest. Such diagrams are dropped by amputation schemes.
    pub fn has_external_leg_correction(&self) -> bool {
        if self.n_loops() == 0 || self.legs.len() < 2 {
            return false;
        }
        (0..self.edges.len()).any(|cut| self.cut_isolates_looped_leg(cut))
    }

    /// Removing edge `cut`: does one side hold exactly one leg and a cycle?
    fn cut_isolates_looped_leg(&self, cut: usize) -> bool {
        let n = self.vertices.len();
        // Flood fill from the cut edge's `from` endpoint.
        let mut side = vec![false; n];
        let mut stack = vec![self.edges[cut].from];
        while let Some(v) = stack.pop() {
            if side[v] {
                continue;
            }
            side[v] = true;
            for (i, e) in self.edges.iter().enumerate() {
                if i == cut {
                    continue;
                }
                if e.from == v && !side[e.to] {
                    stack.push(e.to);
                } else if e.to == v && !side[e.from] {
                    stack.push(e.from);
                }
            }
        }
        if side[self.edges[cut].to] {
            // Not a bridge.
            return false;
        }
        for on in [true, false] {
            let legs = self.legs.iter().filter(|l| side[l.vertex] == on).count();
            let vertices = side.iter().filter(|&&s| s == on).count();
            let edges = (0..self.edges.len())
                .filter(|&i| i != cut && side[self.edges[i].from] == on)
                .count();
            if legs == 1 && edges + 1 > vertices {
                return true;
            }
        }
        false
    }

    /// Color of one vertex under relabeling: term name plus the multiset of
    /// external-leg species attached to it.
    fn color(&self, v: usize) -> String {
        let legs = self
            .legs
            .iter()
            .filter(|l| l.vertex == v)
            .map(|l| l.species.as_u32())
            .sorted()
            .join(",");
        format!("{}|{}", self.vertices[v].name, legs)
    }

    fn serialize(&self, perm: &[usize]) -> String {
        let edges = self
            .edges
            .iter()
            .map(|e| {
                let (mut x, mut y) = (perm[e.from], perm[e.to]);
                if !e.fermionic && x > y {
                    std::mem::swap(&mut x, &mut y);
                }
                format!("{}-{}:{}{}", x, y, e.species.as_u32(), if e.fermionic { "f" } else { "b" })
            })
            .sorted()
            .join(";");
        let legs = self
            .legs
            .iter()
            .map(|l| format!("{}@{}", l.species.as_u32(), perm[l.vertex]))
            .sorted()
            .join(";");
        format!("E[{edges}]L[{legs}]")
    }

    /// Canonical key: minimal serialization over relabelings of
    /// same-colored vertices. Terms whose topologies are identical up to
    /// external-leg relabeling share a key; distinct topologies never do.
    pub fn canonical_key(&self) -> String {
        let n = self.vertices.len();
        let mut colors: Vec<String> = (0..n).map(|v| self.color(v)).collect();

        // Group vertex positions by color.
        let mut classes: HashMap<String, Vec<usize>> = HashMap::new();
        for (v, c) in colors.iter().enumerate() {
            classes.entry(c.clone()).or_default().push(v);
        }
        let movable = classes.values().map(|c| c.len()).max().unwrap_or(0);
        colors.sort();
        let color_prefix = colors.iter().join("/");

        if movable > CANONICAL_LIMIT {
            // Refinement-only fallback; still deterministic, may keep
            // distinguishable keys for some equivalent relabelings.
            let identity: Vec<usize> = (0..n).collect();
            return format!("{color_prefix}#{}", self.serialize(&identity));
        }

        // Enumerate permutations class by class and take the minimum.
        let class_lists: Vec<Vec<usize>> = classes
            .into_iter()
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, v)| v)
            .collect();
        let mut best: Option<String> = None;
        let mut perm: Vec<usize> = (0..n).collect();
        self.search_perm(&class_lists, 0, &mut perm, &mut best);
        format!("{color_prefix}#{}", best.unwrap_or_else(|| self.serialize(&(0..n).collect::<Vec<_>>())))
    }

    fn search_perm(
        &self,
        classes: &[Vec<usize>],
        class: usize,
        perm: &mut Vec<usize>,
        best: &mut Option<String>,
    ) {
        if class == classes.len() {
            let s = self.serialize(perm);
            if best.as_ref().map_or(true, |b| s < *b) {
                *best = Some(s);
            }
            return;
        }
        let positions = &classes[class];
        let targets: Vec<Vec<usize>> = positions
            .iter()
            .copied()
            .permutations(positions.len())
            .collect();
        for assignment in targets {
            for (src, dst) in positions.iter().zip(assignment.iter()) {
                perm[*src] = *dst;
            }
            self.search_perm(classes, class + 1, perm, best);
        }
        for &p in positions {
            perm[p] = p;
        }
    }
}
