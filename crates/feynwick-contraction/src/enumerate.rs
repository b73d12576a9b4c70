//! Exact enumeration of Wick contractions.
//!
//! The search is a recursive assignment: pick the earliest unassigned
//! operator, try every still-compatible partner in order of increasing
//! operator index, recurse on the remainder, backtrack on exhaustion. An
//! operator with no compatible partner prunes the whole branch (a vanishing
//! contraction, never an error). Every distinct pairing appears exactly once;
//! pairings identical under relabeling of identical fields within one term
//! instance are folded into a multiplicity factor.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use feynwick_model::{Expr, FieldOperator, OpIdx, SpeciesTable};

use crate::error::{Result, WickError};
use crate::product::TimeOrderedProduct;
use crate::sign::{sign_of, Sign};

/// Default ceiling on the number of full candidate contractions.
pub const DEFAULT_CEILING: usize = 1 << 20;

/// A matched pair of compatible operators with its resolved propagator.
/// Owns no operators; `a < b` are flat positions in the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractionPair {
    pub a: OpIdx,
    pub b: OpIdx,
    pub propagator: Expr,
}

/// One full contraction: disjoint pairs covering every non-external
/// operator, the external legs, the fold multiplicity and the fermionic
/// reordering sign.
#[derive(Debug, Clone)]
pub struct Contraction {
    /// Pairs sorted by first position.
    pub pairs: Vec<ContractionPair>,
    /// Uncontracted operator positions, ascending.
    pub external: Vec<OpIdx>,
    /// Number of equivalent pairings folded into this contraction.
    pub multiplicity: u64,
    /// Reordering sign of the fermionic subsequence.
    pub sign: Sign,
}

impl Contraction {
    /// Pair list as flat position tuples.
    pub fn pair_positions(&self) -> Vec<(OpIdx, OpIdx)> {
        self.pairs.iter().map(|p| (p.a, p.b)).collect()
    }
}

/// Equivalence class of an operator under relabeling of identical fields
/// within one term instance.
type OpClass = (usize, u32, bool);

fn class_of(op: &FieldOperator) -> OpClass {
    (op.term, op.species.as_u32(), op.conjugated)
}

/// Builder-style contraction enumerator.
pub struct Enumerator<'a> {
    table: &'a SpeciesTable,
    ops: &'a [FieldOperator],
    external: BTreeSet<OpIdx>,
    required: Vec<(OpIdx, OpIdx)>,
    ceiling: usize,
}

impl<'a> Enumerator<'a> {
    pub fn new(table: &'a SpeciesTable, ops: &'a [FieldOperator]) -> Self {
        let external = ops
            .iter()
            .enumerate()
            .filter(|(_, o)| o.external)
            .map(|(i, _)| i)
            .collect();
        Self {
            table,
            ops,
            external,
            required: Vec::new(),
            ceiling: DEFAULT_CEILING,
        }
    }

    /// Enumerator over a time-ordered product, externals taken from the
    /// product's markings.
    pub fn for_product(table: &'a SpeciesTable, product: &'a TimeOrderedProduct) -> Self {
        Self::new(table, product.ops())
    }

    /// Replace the external set (operators that must remain uncontracted).
    pub fn externals(mut self, external: impl IntoIterator<Item = OpIdx>) -> Self {
        self.external = external.into_iter().collect();
        self
    }

    /// Require a specific pairing in every enumerated contraction. If the
    /// oracle rejects it, enumeration fails with
    /// [`WickError::IncompatiblePair`].
    pub fn require_pair(mut self, a: OpIdx, b: OpIdx) -> Self {
        self.required.push(if a <= b { (a, b) } else { (b, a) });
        self
    }

    /// Ceiling on the number of full candidates before
    /// [`WickError::CombinatorialOverflow`].
    pub fn ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Run the exhaustive search.
    ///
    /// The output is deterministic: contractions appear in lexicographic
    /// order of their pair lists (by increasing operator index), so repeated
    /// runs on the same input produce identical, identically-ordered results.
    pub fn enumerate(&self) -> Result<Vec<Contraction>> {
        let n = self.ops.len();
        let mut assigned = vec![false; n];
        for &e in &self.external {
            if e < n {
                assigned[e] = true;
            }
        }
        for &(a, b) in &self.required {
            if a >= n || b >= n || a == b || self.external.contains(&a) || self.external.contains(&b)
            {
                return Err(WickError::InvalidRequiredPair { a, b });
            }
            if assigned[a] || assigned[b] {
                return Err(WickError::InvalidRequiredPair { a, b });
            }
            if !self.table.contractible(&self.ops[a], &self.ops[b]) {
                return Err(WickError::IncompatiblePair {
                    a,
                    b,
                    a_species: self.species_name(a),
                    b_species: self.species_name(b),
                });
            }
            assigned[a] = true;
            assigned[b] = true;
        }

        let free = assigned.iter().filter(|&&x| !x).count();
        if free % 2 != 0 {
            // Odd number of operators to match: the whole product vanishes.
            debug!("odd free operator count ({free}), no full contraction exists");
            return Ok(Vec::new());
        }

        let mut raw: Vec<Vec<(OpIdx, OpIdx)>> = Vec::new();
        let mut stack: Vec<(OpIdx, OpIdx)> = self.required.clone();
        self.search(&mut assigned, &mut stack, &mut raw)?;
        debug!(
            "enumerated {} raw candidates over {} operators ({} external)",
            raw.len(),
            n,
            self.external.len()
        );
        self.fold(raw)
    }

    fn species_name(&self, i: OpIdx) -> String {
        self.table
            .get(self.ops[i].species)
            .map(|s| s.name.clone())
            .unwrap_or_else(|_| self.ops[i].species.to_string())
    }

    fn search(
        &self,
        assigned: &mut [bool],
        stack: &mut Vec<(OpIdx, OpIdx)>,
        out: &mut Vec<Vec<(OpIdx, OpIdx)>>,
    ) -> Result<()> {
        let first = match assigned.iter().position(|&x| !x) {
            Some(i) => i,
            None => {
                if out.len() >= self.ceiling {
                    return Err(WickError::CombinatorialOverflow {
                        candidates: out.len() + 1,
                        ceiling: self.ceiling,
                    });
                }
                let mut pairs = stack.clone();
                pairs.sort_unstable();
                out.push(pairs);
                return Ok(());
            }
        };

        assigned[first] = true;
        for partner in (first + 1)..assigned.len() {
            if assigned[partner] {
                continue;
            }
            if !self.table.contractible(&self.ops[first], &self.ops[partner]) {
                continue;
            }
            assigned[partner] = true;
            stack.push((first, partner));
            self.search(assigned, stack, out)?;
            stack.pop();
            assigned[partner] = false;
        }
        assigned[first] = false;
        // No compatible partner for `first`: this branch contributes zero and
        // is pruned without reporting.
        Ok(())
    }

    /// Fold raw candidates that are identical under relabeling of identical
    /// fields within one term instance. The fold key maps every operator to
    /// its (term instance, species, conjugation) class and keeps the sign, so
    /// contributions of opposite sign are never conflated.
    fn fold(&self, raw: Vec<Vec<(OpIdx, OpIdx)>>) -> Result<Vec<Contraction>> {
        type FoldKey = (Vec<(OpClass, OpClass)>, Sign);
        let mut index: HashMap<FoldKey, usize> = HashMap::new();
        let mut out: Vec<Contraction> = Vec::new();

        let external: Vec<OpIdx> = self.external.iter().copied().collect();
        for pairs in raw {
            let sign = sign_of(&pairs, self.ops, self.table);
            let mut key: Vec<(OpClass, OpClass)> = pairs
                .iter()
                .map(|&(a, b)| {
                    let (ca, cb) = (class_of(&self.ops[a]), class_of(&self.ops[b]));
                    if ca <= cb {
                        (ca, cb)
                    } else {
                        (cb, ca)
                    }
                })
                .collect();
            key.sort_unstable();

            match index.get(&(key.clone(), sign)) {
                Some(&i) => out[i].multiplicity += 1,
                None => {
                    let resolved: Result<Vec<ContractionPair>> = pairs
                        .iter()
                        .map(|&(a, b)| {
                            let propagator = self
                                .table
                                .propagator(&self.ops[a], &self.ops[b])
                                .unwrap_or_else(Expr::zero);
                            Ok(ContractionPair { a, b, propagator })
                        })
                        .collect();
                    index.insert((key, sign), out.len());
                    out.push(Contraction {
                        pairs: resolved?,
                        external: external.clone(),
                        multiplicity: 1,
                        sign,
                    });
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feynwick_model::{InteractionTerm, SpinTag, Statistics};

    fn single_op_terms(
        table: &SpeciesTable,
        species: feynwick_model::SpeciesId,
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
    fn two_point_contraction_of_a_real_scalar() {
        let mut table = SpeciesTable::new();
        let phi = table
            .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let product = single_op_terms(&table, phi, &[false, false]);
        let out = Enumerator::for_product(&table, &product).enumerate().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pair_positions(), vec![(0, 1)]);
        assert_eq!(out[0].sign, Sign::Plus);
    }

    #[test]
    fn six_bosons_give_fifteen_pairings() {
        // (6-1)!! = 15 perfect matchings of six mutually compatible operators.
        let mut table = SpeciesTable::new();
        let phi = table
            .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let product = single_op_terms(&table, phi, &[false; 6]);
        let out = Enumerator::for_product(&table, &product).enumerate().unwrap();
        assert_eq!(out.len(), 15);
    }

    #[test]
    fn absent_conjugate_species_vanishes() {
        // Charged scalar insertions with no phi-star partner anywhere: every
        // branch is pruned and the result set is empty, not an error.
        let mut table = SpeciesTable::new();
        let phi = table
            .add_charged("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let product = single_op_terms(&table, phi, &[false, false]);
        let out = Enumerator::for_product(&table, &product).enumerate().unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn odd_operator_count_vanishes() {
        let mut table = SpeciesTable::new();
        let phi = table
            .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let product = single_op_terms(&table, phi, &[false; 3]);
        let out = Enumerator::for_product(&table, &product).enumerate().unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn identical_fields_within_one_term_fold_into_multiplicity() {
        let mut table = SpeciesTable::new();
        let phi = table
            .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let term = InteractionTerm::new("phi4", Expr::symbol("lambda"))
            .add_field(&table, phi, false)
            .unwrap()
            .add_field(&table, phi, false)
            .unwrap()
            .add_field(&table, phi, false)
            .unwrap()
            .add_field(&table, phi, false)
            .unwrap();
        let mut product = TimeOrderedProduct::new();
        product.push_term(&term);
        let out = Enumerator::for_product(&table, &product).enumerate().unwrap();
        // The 3 pairings of the vacuum phi^4 bubble are one physical term.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].multiplicity, 3);
    }

    #[test]
    fn ceiling_aborts_with_partial_count() {
        let mut table = SpeciesTable::new();
        let phi = table
            .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let product = single_op_terms(&table, phi, &[false; 8]);
        let err = Enumerator::for_product(&table, &product)
            .ceiling(10)
            .enumerate()
            .unwrap_err();
        match err {
            WickError::CombinatorialOverflow { candidates, ceiling } => {
                assert_eq!(ceiling, 10);
                assert!(candidates > 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn required_incompatible_pair_is_reported() {
        let mut table = SpeciesTable::new();
        let phi = table
            .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let psi = table
            .add_charged("psi", Statistics::Fermi, SpinTag::Fermion, vec![])
            .unwrap();
        let mut product = TimeOrderedProduct::new();
        for (species, conj) in [(phi, false), (psi, false), (psi, true), (phi, false)] {
            let term = InteractionTerm::new("src", Expr::one())
                .add_field(&table, species, conj)
                .unwrap();
            product.push_term(&term);
        }
        let err = Enumerator::for_product(&table, &product)
            .require_pair(0, 1)
            .enumerate()
            .unwrap_err();
        match err {
            WickError::IncompatiblePair { a, b, a_species, b_species } => {
                assert_eq!((a, b), (0, 1));
                assert_eq!((a_species.as_str(), b_species.as_str()), ("phi", "psi"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn externals_stay_uncontracted() {
        let mut table = SpeciesTable::new();
        let phi = table
            .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let mut product = single_op_terms(&table, phi, &[false; 4]);
        product.mark_external(0);
        product.mark_external(3);
        let out = Enumerator::for_product(&table, &product).enumerate().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pair_positions(), vec![(1, 2)]);
        assert_eq!(out[0].external, vec![0, 3]);
    }
}
