//! Counting, determinism and sign laws of the contraction enumerator.

use anyhow::Result;

use feynwick_contraction::{sign_of, Enumerator, Sign, TimeOrderedProduct};
use feynwick_model::{Expr, InteractionTerm, SpeciesId, SpeciesTable, SpinTag, Statistics};

fn majorana_model() -> (SpeciesTable, SpeciesId) {
    let mut table = SpeciesTable::new();
    let chi = table
        .add_self_conjugate("chi", Statistics::Fermi, SpinTag::Fermion, vec![])
        .unwrap();
    (table, chi)
}

fn product_of_insertions(
    table: &SpeciesTable,
    species: SpeciesId,
    flags: &[bool],
) -> TimeOrderedProduct {
    let mut product = TimeOrderedProduct::new();
    for &conjugated in flags {
        let term = InteractionTerm::new("src", Expr::one())
            .add_field(table, species, conjugated)
            .unwrap();
        product.push_term(&term);
    }
    product
}

#[test]
fn four_fermions_give_three_pairings_with_canonical_signs() -> Result<()> {
    let (table, chi) = majorana_model();
    let product = product_of_insertions(&table, chi, &[false; 4]);
    let out = Enumerator::for_product(&table, &product).enumerate()?;

    assert_eq!(out.len(), 3);
    assert_eq!(out[0].pair_positions(), vec![(0, 1), (2, 3)]);
    assert_eq!(out[1].pair_positions(), vec![(0, 2), (1, 3)]);
    assert_eq!(out[2].pair_positions(), vec![(0, 3), (1, 2)]);
    let signs: Vec<Sign> = out.iter().map(|c| c.sign).collect();
    assert_eq!(signs, vec![Sign::Plus, Sign::Minus, Sign::Plus]);
    Ok(())
}

#[test]
fn double_factorial_counting() -> Result<()> {
    // n mutually compatible bosonic operators admit (n-1)!! full pairings.
    let mut table = SpeciesTable::new();
    let phi = table.add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])?;
    for (n, expected) in [(2usize, 1usize), (4, 3), (6, 15), (8, 105)] {
        let product = product_of_insertions(&table, phi, &vec![false; n]);
        let out = Enumerator::for_product(&table, &product).enumerate()?;
        assert_eq!(out.len(), expected, "n = {n}");
    }
    Ok(())
}

#[test]
fn compatibility_classes_restrict_the_matching() -> Result<()> {
    // Two charged fermion pairs: psi may only pair with psi-bar, so only
    // 2! = 2 of the 3 unrestricted pairings survive.
    let mut table = SpeciesTable::new();
    let psi = table.add_charged("psi", Statistics::Fermi, SpinTag::Fermion, vec![])?;
    let product = product_of_insertions(&table, psi, &[false, true, false, true]);
    let out = Enumerator::for_product(&table, &product).enumerate()?;
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].pair_positions(), vec![(0, 1), (2, 3)]);
    assert_eq!(out[1].pair_positions(), vec![(0, 3), (1, 2)]);
    Ok(())
}

#[test]
fn enumeration_is_idempotent() -> Result<()> {
    let (table, chi) = majorana_model();
    let product = product_of_insertions(&table, chi, &[false; 6]);
    let first = Enumerator::for_product(&table, &product).enumerate()?;
    let second = Enumerator::for_product(&table, &product).enumerate()?;

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.pair_positions(), b.pair_positions());
        assert_eq!(a.sign, b.sign);
        assert_eq!(a.multiplicity, b.multiplicity);
    }
    Ok(())
}

#[test]
fn swapping_two_fermions_negates_the_sign() {
    // Relabeling the input order by a fermionic transposition carries every
    // contraction to one of exactly opposite sign.
    let (table, chi) = majorana_model();
    let product = product_of_insertions(&table, chi, &[false; 4]);
    let ops = product.ops();

    let swap = |i: usize| match i {
        1 => 2,
        2 => 1,
        other => other,
    };
    for pairs in [vec![(0, 1), (2, 3)], vec![(0, 2), (1, 3)], vec![(0, 3), (1, 2)]] {
        let swapped: Vec<(usize, usize)> =
            pairs.iter().map(|&(a, b)| (swap(a), swap(b))).collect();
        let original = sign_of(&pairs, ops, &table);
        let negated = sign_of(&swapped, ops, &table);
        assert_eq!(original, negated.flip(), "pairs {pairs:?}");
    }
}

#[test]
fn mixed_statistics_only_fermions_carry_sign() {
    // A crossed pairing of two bosons contributes no sign; the same crossing
    // of two fermions does.
    let mut table = SpeciesTable::new();
    let phi = table
        .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
        .unwrap();
    let chi = table
        .add_self_conjugate("chi", Statistics::Fermi, SpinTag::Fermion, vec![])
        .unwrap();

    let mut product = TimeOrderedProduct::new();
    for species in [chi, phi, chi, phi] {
        let term = InteractionTerm::new("src", Expr::one())
            .add_field(&table, species, false)
            .unwrap();
        product.push_term(&term);
    }
    let ops = product.ops();
    // Fermions at 0 and 2 pair with each other, bosons at 1 and 3 likewise;
    // the crossing is boson-fermion and carries no sign.
    assert_eq!(sign_of(&[(0, 2), (1, 3)], ops, &table), Sign::Plus);
}
