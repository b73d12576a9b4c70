//! Lightweight symbolic expression carrier.
//!
//! The engine owns coupling products, propagator products and reduced trace
//! results as values of [`Expr`]. The type supports exactly the operations
//! amplitude assembly needs: flattening products and sums, folding exact
//! rational prefactors, and carrying an unresolved-reduction marker. Anything
//! beyond that (index algebra, Fierz identities, trace evaluation) is the job
//! of the algebra-reduction collaborator.

use std::fmt;

use itertools::Itertools;
use num_rational::Ratio;
use num_traits::{One, Zero};

/// Exact rational coefficient.
pub type Coeff = Ratio<i64>;

/// One ordered algebra-index token of a fermion chain or tensor contraction,
/// as submitted to the algebra-reduction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlgebraToken {
    /// Token head, e.g. a propagator numerator or vertex insertion symbol.
    pub symbol: String,
    /// Operator positions whose algebra indices this token carries.
    pub indices: Vec<u32>,
}

impl AlgebraToken {
    pub fn new(symbol: impl Into<String>, indices: Vec<u32>) -> Self {
        Self {
            symbol: symbol.into(),
            indices,
        }
    }
}

impl fmt::Display for AlgebraToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indices.is_empty() {
            write!(f, "{}", self.symbol)
        } else {
            write!(f, "{}_{{{}}}", self.symbol, self.indices.iter().join(","))
        }
    }
}

/// Symbolic expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Exact rational constant.
    Rational(Coeff),
    /// Opaque symbol (coupling, propagator, reduced trace).
    Symbol(String),
    /// Flattened product; never empty, never nested products.
    Prod(Vec<Expr>),
    /// Flattened sum; never empty, never nested sums.
    Sum(Vec<Expr>),
    /// Marker for an index structure the reduction collaborator could not
    /// handle; the amplitude term carrying it stays valid.
    Unresolved(String),
}

impl Expr {
    pub fn int(n: i64) -> Self {
        Expr::Rational(Ratio::from_integer(n))
    }

    pub fn rational(numer: i64, denom: i64) -> Self {
        Expr::Rational(Ratio::new(numer, denom))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn zero() -> Self {
        Expr::Rational(Ratio::zero())
    }

    pub fn one() -> Self {
        Expr::Rational(Ratio::one())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Rational(r) if r.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Rational(r) if r.is_one())
    }

    /// Smart product constructor: flattens nested products, folds rational
    /// factors, drops ones; zero annihilates.
    pub fn prod(factors: Vec<Expr>) -> Self {
        let mut coeff = Coeff::one();
        let mut rest: Vec<Expr> = Vec::with_capacity(factors.len());
        let mut stack = factors;
        stack.reverse();
        while let Some(factor) = stack.pop() {
            match factor {
                Expr::Rational(r) => {
                    if r.is_zero() {
                        return Expr::zero();
                    }
                    coeff *= r;
                }
                Expr::Prod(inner) => {
                    for f in inner.into_iter().rev() {
                        stack.push(f);
                    }
                }
                other => rest.push(other),
            }
        }
        if rest.is_empty() {
            return Expr::Rational(coeff);
        }
        if !coeff.is_one() {
            rest.insert(0, Expr::Rational(coeff));
        }
        if rest.len() == 1 {
            return rest.pop().unwrap_or_else(Expr::one);
        }
        Expr::Prod(rest)
    }

    /// Smart sum constructor: flattens nested sums, folds rational terms,
    /// drops zeros.
    pub fn sum(terms: Vec<Expr>) -> Self {
        let mut coeff = Coeff::zero();
        let mut seen_rational = false;
        let mut rest: Vec<Expr> = Vec::with_capacity(terms.len());
        let mut stack = terms;
        stack.reverse();
        while let Some(term) = stack.pop() {
            match term {
                Expr::Rational(r) => {
                    seen_rational = true;
                    coeff += r;
                }
                Expr::Sum(inner) => {
                    for t in inner.into_iter().rev() {
                        stack.push(t);
                    }
                }
                other => rest.push(other),
            }
        }
        if seen_rational && !coeff.is_zero() {
            rest.push(Expr::Rational(coeff));
        }
        match rest.len() {
            0 => Expr::zero(),
            1 => rest.pop().unwrap_or_else(Expr::zero),
            _ => Expr::Sum(rest),
        }
    }

    /// Negate: multiply by -1.
    pub fn neg(self) -> Self {
        Expr::prod(vec![Expr::int(-1), self])
    }

    /// True when any subexpression is an unresolved-reduction marker.
    pub fn has_unresolved(&self) -> bool {
        match self {
            Expr::Unresolved(_) => true,
            Expr::Prod(xs) | Expr::Sum(xs) => xs.iter().any(Expr::has_unresolved),
            _ => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Rational(r) => {
                if r.is_integer() {
                    write!(f, "{}", r.numer())
                } else {
                    write!(f, "{}/{}", r.numer(), r.denom())
                }
            }
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::Prod(xs) => write!(f, "{}", xs.iter().map(|x| x.to_string()).join("*")),
            Expr::Sum(xs) => write!(f, "({})", xs.iter().map(|x| x.to_string()).join(" + ")),
            Expr::Unresolved(sig) => write!(f, "Unresolved[{sig}]"),
        }
    }
}
