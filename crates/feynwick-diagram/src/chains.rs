//! Fermion chain identification.
//!
//! A fermion chain is the ordered sequence of fermionic edges along one
//! continuous fermion line. The line continues through a vertex when the
//! vertex pairs one conjugated with one unconjugated fermionic attachment;
//! at vertices with several fermionic pairs the attachments are paired in
//! operator order, which is deterministic. Open chains terminate at external
//! fermion legs or at vertices with an unpaired attachment; closed chains
//! (loops) are walked starting from their lowest edge id.

use std::collections::BTreeMap;
use std::collections::HashMap;

use feynwick_model::OpIdx;

use crate::graph::DiagramGraph;

/// One continuous fermion line through the diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FermionChain {
    /// Dense edge ids in walk order.
    pub edges: Vec<usize>,
    /// Vertex ids in walk order (one entry per visited vertex).
    pub vertices: Vec<usize>,
    /// Operator positions touched by the walk, in order.
    pub ops: Vec<OpIdx>,
    /// True for a closed loop: the walk returns to its starting attachment.
    pub closed: bool,
}

/// One attachment of a fermion line: either an end of a fermionic edge or an
/// external fermionic leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Port {
    End { edge: usize, side: u8 },
    Leg { leg: usize },
}

struct Ports<'g> {
    g: &'g DiagramGraph,
    /// Pairing of attachments through a vertex.
    through: HashMap<Port, Port>,
}

impl<'g> Ports<'g> {
    fn op_of(&self, p: Port) -> OpIdx {
        match p {
            Port::End { edge, side } => {
                let e = self.g.edge(edge);
                if side == 0 {
                    e.a
                } else {
                    e.b
                }
            }
            Port::Leg { leg } => self.g.legs()[leg].op,
        }
    }

    fn vertex_of(&self, p: Port) -> usize {
        match p {
            Port::End { edge, side } => {
                let e = self.g.edge(edge);
                if side == 0 {
                    e.va
                } else {
                    e.vb
                }
            }
            Port::Leg { leg } => self.g.legs()[leg].vertex,
        }
    }

    /// Cross a fermionic edge to its other end; legs have no cross link.
    fn cross(&self, p: Port) -> Option<Port> {
        match p {
            Port::End { edge, side } => Some(Port::End {
                edge,
                side: 1 - side,
            }),
            Port::Leg { .. } => None,
        }
    }

    fn advance(&self, p: Port, via_cross: bool) -> Option<Port> {
        if via_cross {
            self.cross(p)
        } else {
            self.through.get(&p).copied()
        }
    }
}

/// Identify all fermion chains of a diagram graph.
///
/// Output order is deterministic: open chains sorted by the operator
/// position of their starting terminal, then closed chains by lowest edge id.
pub fn fermion_chains(g: &DiagramGraph) -> Vec<FermionChain> {
    // Collect fermionic attachments per vertex.
    let mut at_vertex: BTreeMap<usize, Vec<(OpIdx, Port, bool)>> = BTreeMap::new();
    for (id, edge) in g.edges() {
        if !edge.fermionic {
            continue;
        }
        at_vertex.entry(edge.va).or_default().push((
            edge.a,
            Port::End { edge: id, side: 0 },
            g.op(edge.a).conjugated,
        ));
        at_vertex.entry(edge.vb).or_default().push((
            edge.b,
            Port::End { edge: id, side: 1 },
            g.op(edge.b).conjugated,
        ));
    }
    for (li, leg) in g.legs().iter().enumerate() {
        if !leg.fermionic {
            continue;
        }
        at_vertex.entry(leg.vertex).or_default().push((
            leg.op,
            Port::Leg { leg: li },
            g.op(leg.op).conjugated,
        ));
    }

    // Pair conjugated with unconjugated attachments, in operator order.
    let mut through: HashMap<Port, Port> = HashMap::new();
    for items in at_vertex.values_mut() {
        items.sort_unstable();
        let conj: Vec<Port> = items.iter().filter(|i| i.2).map(|i| i.1).collect();
        let plain: Vec<Port> = items.iter().filter(|i| !i.2).map(|i| i.1).collect();
        for (c, p) in conj.iter().zip(plain.iter()) {
            through.insert(*c, *p);
            through.insert(*p, *c);
        }
        // Self-conjugate fermions carry no flag distinction; pair the
        // leftover attachments sequentially so Majorana lines continue.
        // Anything still unpaired terminates its line at this vertex.
        let leftover: Vec<Port> = items
            .iter()
            .map(|i| i.1)
            .filter(|p| !through.contains_key(p))
            .collect();
        for pair in leftover.chunks_exact(2) {
            through.insert(pair[0], pair[1]);
            through.insert(pair[1], pair[0]);
        }
    }
    let ports = Ports { g, through };

    // Terminals: legs that take part in a line, and edge ends without a
    // through partner.
    let mut terminals: Vec<Port> = Vec::new();
    for (li, leg) in g.legs().iter().enumerate() {
        if leg.fermionic {
            terminals.push(Port::Leg { leg: li });
        }
    }
    for (id, edge) in g.edges() {
        if !edge.fermionic {
            continue;
        }
        for side in [0u8, 1u8] {
            let p = Port::End { edge: id, side };
            if !ports.through.contains_key(&p) {
                terminals.push(p);
            }
        }
    }
    terminals.sort_unstable_by_key(|&p| ports.op_of(p));

    let mut consumed: std::collections::HashSet<Port> = std::collections::HashSet::new();
    let mut used_edge = vec![false; g.n_edges()];
    let mut chains = Vec::new();

    // Open chains.
    for &start in &terminals {
        if consumed.contains(&start) {
            continue;
        }
        // An isolated fermionic leg with no through partner is a bare
        // external line, not a chain.
        if matches!(start, Port::Leg { .. }) && !ports.through.contains_key(&start) {
            consumed.insert(start);
            continue;
        }
        let mut chain = FermionChain {
            edges: Vec::new(),
            vertices: vec![ports.vertex_of(start)],
            ops: vec![ports.op_of(start)],
            closed: false,
        };
        consumed.insert(start);
        let mut cur = start;
        // Legs enter their vertex first; unpaired edge ends cross first.
        let mut via_cross = matches!(start, Port::End { .. });
        while let Some(next) = ports.advance(cur, via_cross) {
            if consumed.contains(&next) {
                break;
            }
            consumed.insert(next);
            if via_cross {
                if let Port::End { edge, .. } = cur {
                    chain.edges.push(edge);
                    used_edge[edge] = true;
                }
                chain.vertices.push(ports.vertex_of(next));
            }
            chain.ops.push(ports.op_of(next));
            cur = next;
            via_cross = !via_cross;
        }
        chains.push(chain);
    }

    // Closed chains: whatever fermionic edges remain lie on loops.
    for (id, edge) in g.edges() {
        if !edge.fermionic || used_edge[id] {
            continue;
        }
        let start = Port::End { edge: id, side: 0 };
        if consumed.contains(&start) {
            continue;
        }
        let mut chain = FermionChain {
            edges: Vec::new(),
            vertices: vec![ports.vertex_of(start)],
            ops: vec![ports.op_of(start)],
            closed: true,
        };
        consumed.insert(start);
        let mut cur = start;
        let mut via_cross = true;
        loop {
            let next = match ports.advance(cur, via_cross) {
                Some(p) => p,
                // A loop walk always advances; a missing link means the
                // pairing degenerated, close the chain defensively.
                None => break,
            };
            if next == start {
                if let Port::End { edge, .. } = cur {
                    if via_cross {
                        chain.edges.push(edge);
                        used_edge[edge] = true;
                    }
                }
                break;
            }
            consumed.insert(next);
            if via_cross {
                if let Port::End { edge, .. } = cur {
                    chain.edges.push(edge);
                    used_edge[edge] = true;
                }
                chain.vertices.push(ports.vertex_of(next));
            }
            chain.ops.push(ports.op_of(next));
            cur = next;
            via_cross = !via_cross;
        }
        // A loop walk re-enters its starting vertex; drop the duplicate.
        if chain.vertices.len() > 1 && chain.vertices.last() == chain.vertices.first() {
            chain.vertices.pop();
        }
        chains.push(chain);
    }

    chains
}

/// Number of closed fermion loops; each contributes a global factor of -1 to
/// its diagram.
pub fn closed_loop_count(chains: &[FermionChain]) -> usize {
    chains.iter().filter(|c| c.closed).count()
}
