//! Symmetry factors from diagram automorphisms.
//!
//! The symmetry factor of a component is the order of the automorphism group
//! of its internal structure: relabelings of identical internal vertices and
//! identical internal lines that map the graph to itself with every external
//! leg held fixed. The amplitude divides by this factor.

use std::collections::HashMap;

use crate::graph::DiagramGraph;

/// Normalized record of one edge for automorphism comparison. Fermionic
/// edges are directed (unconjugated end to conjugated end), bosonic edges
/// are unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct EdgeRec {
    from: usize,
    to: usize,
    species: u32,
    directed: bool,
}

fn edge_records(g: &DiagramGraph, members: &[usize]) -> Vec<EdgeRec> {
    let mut records = Vec::new();
    for (_, e) in g.edges() {
        if !members.contains(&e.va) {
            continue;
        }
        let rec = if e.fermionic {
            // Orient along fermion flow.
            let (from, to) = if g.op(e.a).conjugated {
                (e.vb, e.va)
            } else {
                (e.va, e.vb)
            };
            EdgeRec {
                from,
                to,
                species: e.species.as_u32(),
                directed: true,
            }
        } else {
            EdgeRec {
                from: e.va.min(e.vb),
                to: e.va.max(e.vb),
                species: e.species.as_u32(),
                directed: false,
            }
        };
        records.push(rec);
    }
    records.sort_unstable();
    records
}

fn apply(rec: EdgeRec, map: &HashMap<usize, usize>) -> EdgeRec {
    let from = map[&rec.from];
    let to = map[&rec.to];
    if rec.directed {
        EdgeRec { from, to, ..rec }
    } else {
        EdgeRec {
            from: from.min(to),
            to: from.max(to),
            ..rec
        }
    }
}

/// Color of a vertex for automorphism purposes: vertices may only map onto
/// vertices of the same term type with the same external-leg content.
fn vertex_color(g: &DiagramGraph, v: usize) -> (String, Vec<u32>, usize) {
    let data = g.vertex(v);
    let mut legs: Vec<u32> = data
        .external_ops
        .iter()
        .map(|&op| g.op(op).species.as_u32())
        .collect();
    legs.sort_unstable();
    (data.name.clone(), legs, data.contracted_ops.len())
}

fn count_vertex_automorphisms(g: &DiagramGraph, members: &[usize]) -> u64 {
    // External legs are pinned: a vertex carrying any leg may only map to
    // itself.
    let movable: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&v| g.vertex(v).external_ops.is_empty())
        .collect();
    let records = edge_records(g, members);

    // Group movable vertices by color.
    let mut classes: Vec<Vec<usize>> = Vec::new();
    let mut class_index: HashMap<(String, Vec<u32>, usize), usize> = HashMap::new();
    for &v in &movable {
        let color = vertex_color(g, v);
        let idx = *class_index.entry(color).or_insert_with(|| {
            classes.push(Vec::new());
            classes.len() - 1
        });
        classes[idx].push(v);
    }

    let mut identity: HashMap<usize, usize> = members.iter().map(|&v| (v, v)).collect();
    let mut count = 0u64;
    assign(&records, &classes, 0, &mut identity, &mut count);
    count.max(1)
}

fn assign(
    records: &[EdgeRec],
    classes: &[Vec<usize>],
    class: usize,
    map: &mut HashMap<usize, usize>,
    count: &mut u64,
) {
    if class == classes.len() {
        let mut mapped: Vec<EdgeRec> = records.iter().map(|&r| apply(r, map)).collect();
        mapped.sort_unstable();
        if mapped == records {
            *count += 1;
        }
        return;
    }
    permute_class(records, classes, class, 0, &mut classes[class].to_vec(), map, count);
}

#[allow(clippy::too_many_arguments)]
fn permute_class(
    records: &[EdgeRec],
    classes: &[Vec<usize>],
    class: usize,
    pos: usize,
    remaining: &mut Vec<usize>,
    map: &mut HashMap<usize, usize>,
    count: &mut u64,
) {
    let sources = &classes[class];
    if pos == sources.len() {
        assign(records, classes, class + 1, map, count);
        return;
    }
    for i in 0..remaining.len() {
        let target = remaining.remove(i);
        map.insert(sources[pos], target);
        permute_class(records, classes, class, pos + 1, remaining, map, count);
        map.insert(sources[pos], sources[pos]);
        remaining.insert(i, target);
    }
}

fn factorial(n: u64) -> u64 {
    (1..=n).product::<u64>().max(1)
}

/// Symmetry factor of one connected component: vertex automorphisms times
/// permutations of identical parallel internal lines times the flip of every
/// undirected self-loop.
pub fn symmetry_factor(g: &DiagramGraph, members: &[usize]) -> u64 {
    let mut factor = count_vertex_automorphisms(g, members);

    // Identical parallel edges between one vertex pair.
    let mut parallel: HashMap<EdgeRec, u64> = HashMap::new();
    for rec in edge_records(g, members) {
        *parallel.entry(rec).or_insert(0) += 1;
    }
    for (rec, m) in &parallel {
        if rec.from == rec.to && !rec.directed {
            // m identical undirected self-loops: m! orderings, each loop
            // flippable.
            factor *= factorial(*m) * (1u64 << m);
        } else {
            factor *= factorial(*m);
        }
    }
    factor
}
