//! Connectivity, chain and symmetry-factor laws of the diagram builder.

use anyhow::Result;

use feynwick_contraction::{Enumerator, TimeOrderedProduct};
use feynwick_diagram::{
    closed_loop_count, connected_components, fermion_chains, symmetry_factor, DiagramGraph,
    Topology, TopologyClass,
};
use feynwick_model::{
    Expr, IndexKind, InteractionTerm, SpeciesId, SpeciesTable, SpinTag, Statistics,
};

/// Yukawa-like model: charged fermion psi, real scalar phi, vertex psibar psi phi.
fn yukawa() -> Result<(SpeciesTable, SpeciesId, SpeciesId, InteractionTerm)> {
    let mut table = SpeciesTable::new();
    let psi = table.add_charged("psi", Statistics::Fermi, SpinTag::Fermion, vec![IndexKind::Dirac])?;
    let phi = table.add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])?;
    let vertex = InteractionTerm::new("yuk", Expr::symbol("g"))
        .add_field(&table, psi, true)?
        .add_field(&table, psi, false)?
        .add_field(&table, phi, false)?;
    Ok((table, psi, phi, vertex))
}

fn phi3() -> Result<(SpeciesTable, InteractionTerm)> {
    let mut table = SpeciesTable::new();
    let phi = table.add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])?;
    let vertex = InteractionTerm::new("phi3", Expr::symbol("lambda"))
        .add_field(&table, phi, false)?
        .add_field(&table, phi, false)?
        .add_field(&table, phi, false)?;
    Ok((table, vertex))
}

/// Two vertices of a 3-point term, the third field external on each side.
fn two_point_product(vertex: &InteractionTerm) -> TimeOrderedProduct {
    let mut product = TimeOrderedProduct::new();
    let r0 = product.push_term(vertex);
    let r1 = product.push_term(vertex);
    product.mark_external(r0.start + 2);
    product.mark_external(r1.start + 2);
    product
}

#[test]
fn components_never_exceed_vertices_and_edges_stay_inside() -> Result<()> {
    let (table, _, _, vertex) = yukawa()?;
    let product = two_point_product(&vertex);
    let contractions = Enumerator::for_product(&table, &product).enumerate()?;
    assert!(!contractions.is_empty());
    for c in &contractions {
        let g = DiagramGraph::build(&product, c, &table)?;
        let comps = connected_components(&g);
        assert!(comps.count() <= g.n_vertices());
        for (_, e) in g.edges() {
            assert_eq!(comps.component_of(e.va), comps.component_of(e.vb));
        }
    }
    Ok(())
}

#[test]
fn scalar_two_point_loop_is_one_component_with_one_closed_chain() -> Result<()> {
    let (table, _, _, vertex) = yukawa()?;
    let product = two_point_product(&vertex);
    let externals: Vec<usize> = product.externals().into_iter().collect();
    let contractions = Enumerator::for_product(&table, &product).enumerate()?;

    // Exactly one contraction survives the spanning-leg requirement: the one
    // routing the fermions across both vertices.
    let mut spanning = Vec::new();
    for c in &contractions {
        let g = DiagramGraph::build(&product, c, &table)?;
        let comps = connected_components(&g);
        let retained = comps.retain_spanning(&g, &externals);
        if !retained.is_empty() {
            spanning.push((g, comps, retained));
        }
    }
    assert_eq!(spanning.len(), 1);

    let (g, comps, retained) = &spanning[0];
    assert_eq!(retained.len(), 1);
    assert_eq!(comps.members(retained[0]).len(), 2);

    let chains = fermion_chains(g);
    assert_eq!(chains.len(), 1);
    assert_eq!(closed_loop_count(&chains), 1);
    assert!(chains[0].closed);
    assert_eq!(chains[0].edges.len(), 2);
    assert_eq!(chains[0].vertices, vec![0, 1]);
    Ok(())
}

#[test]
fn fermionic_parallel_lines_carry_no_symmetry_factor() -> Result<()> {
    // The fermion bubble has two parallel but oppositely-directed lines:
    // symmetry factor 1.
    let (table, _, _, vertex) = yukawa()?;
    let product = two_point_product(&vertex);
    let contractions = Enumerator::for_product(&table, &product).enumerate()?;
    let externals: Vec<usize> = product.externals().into_iter().collect();
    for c in &contractions {
        let g = DiagramGraph::build(&product, c, &table)?;
        let comps = connected_components(&g);
        for cid in comps.retain_spanning(&g, &externals) {
            assert_eq!(symmetry_factor(&g, comps.members(cid)), 1);
        }
    }
    Ok(())
}

#[test]
fn scalar_bubble_has_symmetry_factor_two() -> Result<()> {
    // phi^3 vertices with one leg external on each side: two parallel
    // identical scalar lines between the vertices.
    let (table, vertex) = phi3()?;
    let product = two_point_product(&vertex);

    let contractions = Enumerator::for_product(&table, &product).enumerate()?;
    let externals: Vec<usize> = product.externals().into_iter().collect();
    let mut seen_bubble = false;
    for c in &contractions {
        let g = DiagramGraph::build(&product, c, &table)?;
        let comps = connected_components(&g);
        for cid in comps.retain_spanning(&g, &externals) {
            let members = comps.members(cid);
            if g.n_edges() == 2 && members.len() == 2 {
                assert_eq!(symmetry_factor(&g, members), 2);
                // The two cross pairings folded into one candidate.
                assert_eq!(c.multiplicity, 2);
                seen_bubble = true;
            }
        }
    }
    assert!(seen_bubble);
    Ok(())
}

#[test]
fn tadpole_self_loop_is_permitted_and_classified() -> Result<()> {
    let (table, vertex) = phi3()?;
    let mut product = TimeOrderedProduct::new();
    let r0 = product.push_term(&vertex);
    product.mark_external(r0.start + 2);

    let contractions = Enumerator::for_product(&table, &product).enumerate()?;
    assert_eq!(contractions.len(), 1);
    let g = DiagramGraph::build(&product, &contractions[0], &table)?;
    assert_eq!(g.n_vertices(), 1);
    assert_eq!(g.n_edges(), 1);
    let e = g.edge(0);
    assert_eq!(e.va, e.vb);

    let comps = connected_components(&g);
    let topo = Topology::of_component(&g, comps.members(0));
    assert_eq!(topo.class(), TopologyClass::Tadpole);
    assert_eq!(topo.n_loops(), 1);
    // Undirected self-loop: flip symmetry 2.
    assert_eq!(symmetry_factor(&g, comps.members(0)), 2);
    Ok(())
}

#[test]
fn equivalent_topologies_share_a_canonical_key() -> Result<()> {
    let (table, _, _, vertex) = yukawa()?;
    let product = two_point_product(&vertex);
    let contractions = Enumerator::for_product(&table, &product).enumerate()?;

    // The contraction closing a fermion self-loop on each vertex splits into
    // two one-vertex components that are relabelings of one another: their
    // topologies share a key.
    let tadpoles: Vec<_> = contractions
        .iter()
        .filter(|c| c.pairs.iter().all(|p| (p.a < 3) == (p.b < 3)))
        .collect();
    assert_eq!(tadpoles.len(), 1);
    let g = DiagramGraph::build(&product, tadpoles[0], &table)?;
    let comps = connected_components(&g);
    assert_eq!(comps.count(), 2);
    let t0 = Topology::of_component(&g, comps.members(0));
    let t1 = Topology::of_component(&g, comps.members(1));
    assert_eq!(t0.canonical_key(), t1.canonical_key());
    Ok(())
}

#[test]
fn external_leg_corrections_are_detected() {
    use feynwick_diagram::{TopologyEdge, TopologyLeg, TopologyVertex};
    let phi = SpeciesId(0);
    let v = |name: &str| TopologyVertex { name: name.into() };
    let edge = |from, to| TopologyEdge {
        from,
        to,
        species: phi,
        fermionic: false,
    };
    let leg = |vertex, op| TopologyLeg {
        vertex,
        op,
        species: phi,
    };

    // Bubble between v1 and v2, bridged to the leg at v0: a self-energy
    // insertion sitting on the external line of v2's leg.
    let corrected = Topology {
        vertices: vec![v("phi3"), v("phi3"), v("phi3")],
        edges: vec![edge(0, 1), edge(1, 2), edge(1, 2)],
        legs: vec![leg(0, 0), leg(2, 5)],
    };
    assert_eq!(corrected.n_loops(), 1);
    assert!(corrected.has_external_leg_correction());

    // The ordinary self-energy bubble has its loop between the two external
    // vertices and no bridge: not an external-line correction.
    let bubble = Topology {
        vertices: vec![v("phi3"), v("phi3")],
        edges: vec![edge(0, 1), edge(0, 1)],
        legs: vec![leg(0, 0), leg(1, 4)],
    };
    assert_eq!(bubble.n_loops(), 1);
    assert!(!bubble.has_external_leg_correction());
}

#[test]
fn loop_counting_matches_cyclomatic_number() -> Result<()> {
    let (table, _, _, vertex) = yukawa()?;
    let product = two_point_product(&vertex);
    let contractions = Enumerator::for_product(&table, &product).enumerate()?;
    for c in &contractions {
        let g = DiagramGraph::build(&product, c, &table)?;
        let comps = connected_components(&g);
        let total: usize = (0..comps.count())
            .map(|i| Topology::of_component(&g, comps.members(i)).n_loops())
            .sum();
        assert_eq!(total, g.n_loops(comps.count()));
    }
    Ok(())
}
