//! Interaction terms: one vertex type of the Lagrangian.

use crate::error::Result;
use crate::expr::Expr;
use crate::operator::{FieldOperator, OpRole};
use crate::species::{SpeciesId, SpeciesTable};

/// An ordered sequence of field operators with a symbolic coupling
/// coefficient. One `InteractionTerm` describes one vertex type; placing it
/// in a time-ordered product creates an instance (a diagram vertex).
#[derive(Debug, Clone)]
pub struct InteractionTerm {
    /// Display name, used to identify the vertex type in topologies.
    pub name: String,
    /// Symbolic coupling coefficient (owned).
    pub coupling: Expr,
    operators: Vec<FieldOperator>,
}

impl InteractionTerm {
    pub fn new(name: &str, coupling: Expr) -> Self {
        Self {
            name: name.to_owned(),
            coupling,
            operators: Vec::new(),
        }
    }

    /// Append a field insertion to the term. The operator's index slots are
    /// copied from the species record; its role follows the conjugation flag.
    pub fn add_field(
        mut self,
        table: &SpeciesTable,
        species: SpeciesId,
        conjugated: bool,
    ) -> Result<Self> {
        let data = table.get(species)?;
        let mut op = FieldOperator::new(
            species,
            OpRole::for_conjugation(conjugated),
            conjugated,
            self.operators.len(),
        );
        op.index_slots = data.index_slots.clone();
        self.operators.push(op);
        Ok(self)
    }

    /// The ordered operators of the term.
    pub fn operators(&self) -> &[FieldOperator] {
        &self.operators
    }

    /// Number of field insertions.
    pub fn arity(&self) -> usize {
        self.operators.len()
    }
}
