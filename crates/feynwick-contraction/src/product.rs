//! The time-ordered product under expansion.
//!
//! A [`TimeOrderedProduct`] is the flat, immutable list of field operators
//! drawn from one or more interaction-term instances, together with the
//! per-instance bookkeeping (name, coupling, operator range) the diagram
//! builder needs to turn a contraction into vertices.

use std::collections::BTreeSet;
use std::ops::Range;

use feynwick_model::{Expr, FieldOperator, InteractionTerm, OpIdx};

/// One placed instance of an interaction term. Two instances of the same
/// term are distinct vertices.
#[derive(Debug, Clone)]
pub struct TermInstance {
    /// Name of the originating interaction term.
    pub name: String,
    /// Coupling coefficient of the instance.
    pub coupling: Expr,
    /// Flat operator range owned by this instance.
    pub ops: Range<OpIdx>,
}

/// Flat operator list of a time-ordered product, plus term-instance records.
#[derive(Debug, Clone, Default)]
pub struct TimeOrderedProduct {
    ops: Vec<FieldOperator>,
    terms: Vec<TermInstance>,
}

impl TimeOrderedProduct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place one instance of an interaction term; returns the flat operator
    /// range of the instance. Repeated calls with the same term create
    /// distinct instances.
    pub fn push_term(&mut self, term: &InteractionTerm) -> Range<OpIdx> {
        let start = self.ops.len();
        let instance = self.terms.len();
        for op in term.operators() {
            let mut op = op.clone();
            op.term = instance;
            self.ops.push(op);
        }
        let range = start..self.ops.len();
        self.terms.push(TermInstance {
            name: term.name.clone(),
            coupling: term.coupling.clone(),
            ops: range.clone(),
        });
        range
    }

    /// Mark an operator as external: it must remain uncontracted and becomes
    /// an external leg of the diagram.
    pub fn mark_external(&mut self, op: OpIdx) {
        if let Some(o) = self.ops.get_mut(op) {
            o.external = true;
        }
    }

    /// The flat operator list, in time-ordered-product order.
    pub fn ops(&self) -> &[FieldOperator] {
        &self.ops
    }

    /// Flat positions of all external-marked operators, ascending.
    pub fn externals(&self) -> BTreeSet<OpIdx> {
        self.ops
            .iter()
            .enumerate()
            .filter(|(_, o)| o.external)
            .map(|(i, _)| i)
            .collect()
    }

    /// Term-instance records in placement order.
    pub fn terms(&self) -> &[TermInstance] {
        &self.terms
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn n_ops(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
