//! Fermionic reordering sign of a contraction.
//!
//! The canonical normal form places the two operators of every contraction
//! pair adjacently, pairs ordered left-to-right by the original position of
//! their first member, followed by the uncontracted (external) operators in
//! original order. The sign of a contraction is the parity of the permutation
//! taking the original operator order to this normal form, restricted to the
//! anticommuting subsequence: transpositions involving a bosonic operator
//! contribute nothing.

use std::ops::Mul;

use feynwick_model::{FieldOperator, OpIdx, SpeciesTable};

/// Sign of a contraction term: +1, -1, or identically zero (vanishing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Plus,
    Minus,
    /// The contraction vanishes identically (self-contraction, or a pairing
    /// the oracle forbids). A zero-valued term, not a failure.
    Zero,
}

impl Sign {
    /// Integer factor: +1, -1 or 0.
    pub fn factor(self) -> i64 {
        match self {
            Sign::Plus => 1,
            Sign::Minus => -1,
            Sign::Zero => 0,
        }
    }

    pub fn flip(self) -> Sign {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
            Sign::Zero => Sign::Zero,
        }
    }

    /// Sign from permutation parity: even is +1.
    pub fn from_parity(transpositions: usize) -> Sign {
        if transpositions % 2 == 0 {
            Sign::Plus
        } else {
            Sign::Minus
        }
    }
}

impl Mul for Sign {
    type Output = Sign;

    fn mul(self, rhs: Sign) -> Sign {
        match (self, rhs) {
            (Sign::Zero, _) | (_, Sign::Zero) => Sign::Zero,
            (Sign::Plus, s) => s,
            (Sign::Minus, s) => s.flip(),
        }
    }
}

/// Computes the reordering sign of a contraction given as a pair list over
/// flat operator positions.
///
/// Returns [`Sign::Zero`] for contractions that vanish identically:
/// self-contraction of one position, out-of-range positions, or a pair the
/// compatibility oracle rejects.
pub fn sign_of(pairs: &[(OpIdx, OpIdx)], ops: &[FieldOperator], table: &SpeciesTable) -> Sign {
    let n = ops.len();
    let mut covered = vec![false; n];
    for &(a, b) in pairs {
        if a == b || a >= n || b >= n {
            return Sign::Zero;
        }
        if covered[a] || covered[b] {
            // An operator covered by two pairs is not a contraction.
            return Sign::Zero;
        }
        covered[a] = true;
        covered[b] = true;
        if !table.contractible(&ops[a], &ops[b]) {
            return Sign::Zero;
        }
    }

    // Canonical target order: pairs (first member ascending), each pair's
    // lower position first, then the uncontracted operators ascending.
    let mut sorted: Vec<(OpIdx, OpIdx)> = pairs
        .iter()
        .map(|&(a, b)| if a <= b { (a, b) } else { (b, a) })
        .collect();
    sorted.sort_unstable();

    let mut target: Vec<OpIdx> = Vec::with_capacity(n);
    for &(a, b) in &sorted {
        target.push(a);
        target.push(b);
    }
    for (i, c) in covered.iter().enumerate() {
        if !c {
            target.push(i);
        }
    }

    // Restrict to the anticommuting subsequence; the original order is
    // ascending, so the parity is the inversion count of the target
    // subsequence.
    let fermi: Vec<OpIdx> = target
        .into_iter()
        .filter(|&i| ops[i].anticommuting(table))
        .collect();
    let mut inversions = 0usize;
    for i in 0..fermi.len() {
        for j in (i + 1)..fermi.len() {
            if fermi[i] > fermi[j] {
                inversions += 1;
            }
        }
    }
    Sign::from_parity(inversions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feynwick_model::{Expr, InteractionTerm, SpeciesTable, SpinTag, Statistics};

    fn majorana_ops(n: usize) -> (SpeciesTable, Vec<FieldOperator>) {
        let mut table = SpeciesTable::new();
        let chi = table
            .add_self_conjugate("chi", Statistics::Fermi, SpinTag::Fermion, vec![])
            .unwrap();
        let mut ops = Vec::new();
        for i in 0..n {
            let term = InteractionTerm::new("src", Expr::one())
                .add_field(&table, chi, false)
                .unwrap();
            let mut op = term.operators()[0].clone();
            op.term = i;
            ops.push(op);
        }
        (table, ops)
    }

    #[test]
    fn four_fermion_pairings_have_canonical_signs() {
        let (table, ops) = majorana_ops(4);
        assert_eq!(sign_of(&[(0, 1), (2, 3)], &ops, &table), Sign::Plus);
        assert_eq!(sign_of(&[(0, 2), (1, 3)], &ops, &table), Sign::Minus);
        assert_eq!(sign_of(&[(0, 3), (1, 2)], &ops, &table), Sign::Plus);
    }

    #[test]
    fn pair_order_inside_the_list_does_not_matter() {
        let (table, ops) = majorana_ops(4);
        assert_eq!(sign_of(&[(1, 3), (0, 2)], &ops, &table), Sign::Minus);
        assert_eq!(sign_of(&[(3, 0), (2, 1)], &ops, &table), Sign::Plus);
    }

    #[test]
    fn self_contraction_is_zero() {
        let (table, ops) = majorana_ops(2);
        assert_eq!(sign_of(&[(0, 0)], &ops, &table), Sign::Zero);
    }

    #[test]
    fn double_coverage_is_zero() {
        let (table, ops) = majorana_ops(3);
        assert_eq!(sign_of(&[(0, 1), (1, 2)], &ops, &table), Sign::Zero);
    }

    #[test]
    fn bosonic_reordering_carries_no_sign() {
        let mut table = SpeciesTable::new();
        let phi = table
            .add_self_conjugate("phi", Statistics::Bose, SpinTag::Scalar, vec![])
            .unwrap();
        let mut ops = Vec::new();
        for i in 0..4 {
            let term = InteractionTerm::new("src", Expr::one())
                .add_field(&table, phi, false)
                .unwrap();
            let mut op = term.operators()[0].clone();
            op.term = i;
            ops.push(op);
        }
        assert_eq!(sign_of(&[(0, 2), (1, 3)], &ops, &table), Sign::Plus);
    }

    #[test]
    fn sign_algebra() {
        assert_eq!(Sign::Minus * Sign::Minus, Sign::Plus);
        assert_eq!(Sign::Minus * Sign::Zero, Sign::Zero);
        assert_eq!(Sign::Plus.flip(), Sign::Minus);
    }
}
