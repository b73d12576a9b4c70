//! A single quantum-field insertion in a time-ordered product.

use crate::species::{IndexKind, SpeciesId, SpeciesTable, Statistics};

/// Flat position of an operator in the time-ordered product under expansion.
pub type OpIdx = usize;

/// Creation/annihilation role of an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpRole {
    Creation,
    Annihilation,
}

impl OpRole {
    /// Conventional role for a conjugation flag: conjugated insertions create
    /// particles, plain ones annihilate them.
    pub fn for_conjugation(conjugated: bool) -> Self {
        if conjugated {
            OpRole::Creation
        } else {
            OpRole::Annihilation
        }
    }
}

/// One quantum-field insertion. Immutable once constructed from an
/// interaction term; the enumerator and diagram builder only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldOperator {
    pub species: SpeciesId,
    pub role: OpRole,
    /// Conjugation flag (psi-bar / phi-star insertions).
    pub conjugated: bool,
    /// Index slots carried by this insertion, copied from the species record.
    pub index_slots: Vec<IndexKind>,
    /// Ordinal of the owning term instance in the time-ordered product.
    pub term: usize,
    /// Position of this operator inside its owning term.
    pub pos_in_term: usize,
    /// Marked external: must remain uncontracted and becomes an external leg.
    pub external: bool,
}

impl FieldOperator {
    /// Construct an operator with empty index slots; the slot list is filled
    /// in from the species record when the operator joins a product.
    pub fn new(species: SpeciesId, role: OpRole, conjugated: bool, pos_in_term: usize) -> Self {
        Self {
            species,
            role,
            conjugated,
            index_slots: Vec::new(),
            term: 0,
            pos_in_term,
            external: false,
        }
    }

    /// Statistics of this operator's species.
    pub fn statistics(&self, table: &SpeciesTable) -> Statistics {
        table
            .get(self.species)
            .map(|s| s.statistics)
            .unwrap_or(Statistics::Bose)
    }

    /// True for anticommuting operators.
    pub fn anticommuting(&self, table: &SpeciesTable) -> bool {
        self.statistics(table).anticommuting()
    }
}
