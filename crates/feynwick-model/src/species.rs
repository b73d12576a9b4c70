//! Field species registry and contraction compatibility oracle.
//!
//! A *species* is one field of the theory (scalar, fermion, vector, ghost),
//! identified by a dense [`SpeciesId`]. The [`SpeciesTable`] owns all species
//! records and answers the only two questions the contraction engine ever
//! asks about the model:
//!
//! - may these two operators be contracted into a propagator
//!   ([`SpeciesTable::contractible`]), and
//! - what propagator expression results ([`SpeciesTable::propagator`]).
//!
//! Statistics (commuting/anticommuting) is tracked separately from the spin
//! tag so that anticommuting scalars (Faddeev-Popov ghosts) are expressible
//! without a dedicated variant hierarchy.

use std::fmt;

use crate::error::{ModelError, Result};
use crate::expr::Expr;
use crate::operator::FieldOperator;

/// Dense identifier of a field species inside a [`SpeciesTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpeciesId(pub u32);

impl SpeciesId {
    /// Returns the raw index into the species table.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Commutation statistics of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistics {
    /// Commuting (bosonic) field.
    Bose,
    /// Anticommuting (fermionic or ghost) field.
    Fermi,
}

impl Statistics {
    /// True for anticommuting fields: every transposition with another
    /// anticommuting operator contributes a factor -1.
    #[inline]
    pub fn anticommuting(self) -> bool {
        matches!(self, Statistics::Fermi)
    }
}

/// Index-shape capability tag of a species.
///
/// This replaces the deep scalar/vector/fermion inheritance of typical
/// field-theory codes with a flat tag; the index slots carried by each
/// species are listed explicitly in [`SpeciesData::index_slots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpinTag {
    Scalar,
    Fermion,
    Vector,
    /// Anticommuting scalar (Faddeev-Popov ghost).
    Ghost,
}

/// Kind of one Lorentz/algebra index slot carried by a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKind {
    Lorentz,
    Dirac,
    Color,
    Flavor,
}

/// One registered field species.
#[derive(Debug, Clone)]
pub struct SpeciesData {
    /// Display name, unique within the table.
    pub name: String,
    pub statistics: Statistics,
    pub spin: SpinTag,
    /// True when the field is its own antiparticle.
    pub self_conjugate: bool,
    /// Conjugate species; equals the species' own id unless the particle and
    /// antiparticle were registered as distinct species.
    pub conjugate: SpeciesId,
    /// Ordered index slots (Lorentz/Dirac/color/flavor) of one insertion.
    pub index_slots: Vec<IndexKind>,
    /// Symbol used for the propagator of this species.
    pub propagator_symbol: String,
}

/// Registry of field species; the compatibility oracle of the engine.
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    species: Vec<SpeciesData>,
}

impl SpeciesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    fn check_fresh_name(&self, name: &str) -> Result<()> {
        if self.species.iter().any(|s| s.name == name) {
            return Err(ModelError::DuplicateSpecies(name.to_owned()));
        }
        Ok(())
    }

    /// Register a self-conjugate species (real scalar, photon, Majorana
    /// fermion). Contractions between two insertions of such a species are
    /// allowed regardless of conjugation flags.
    pub fn add_self_conjugate(
        &mut self,
        name: &str,
        statistics: Statistics,
        spin: SpinTag,
        index_slots: Vec<IndexKind>,
    ) -> Result<SpeciesId> {
        self.check_fresh_name(name)?;
        let id = SpeciesId(self.species.len() as u32);
        self.species.push(SpeciesData {
            name: name.to_owned(),
            statistics,
            spin,
            self_conjugate: true,
            conjugate: id,
            index_slots,
            propagator_symbol: format!("D({name})"),
        });
        Ok(id)
    }

    /// Register a charged species whose antiparticle is represented by the
    /// conjugation flag on the operator (Dirac fermion psi / psi-bar, complex
    /// scalar phi / phi-star). Contraction requires opposite conjugation.
    pub fn add_charged(
        &mut self,
        name: &str,
        statistics: Statistics,
        spin: SpinTag,
        index_slots: Vec<IndexKind>,
    ) -> Result<SpeciesId> {
        self.check_fresh_name(name)?;
        let id = SpeciesId(self.species.len() as u32);
        self.species.push(SpeciesData {
            name: name.to_owned(),
            statistics,
            spin,
            self_conjugate: false,
            conjugate: id,
            index_slots,
            propagator_symbol: format!("D({name})"),
        });
        Ok(id)
    }

    /// Register a particle/antiparticle pair as two distinct species pointing
    /// at each other (W+/W- style). Contraction requires one operator of each.
    pub fn add_conjugate_pair(
        &mut self,
        name: &str,
        conjugate_name: &str,
        statistics: Statistics,
        spin: SpinTag,
        index_slots: Vec<IndexKind>,
    ) -> Result<(SpeciesId, SpeciesId)> {
        self.check_fresh_name(name)?;
        self.check_fresh_name(conjugate_name)?;
        let id = SpeciesId(self.species.len() as u32);
        let cid = SpeciesId(self.species.len() as u32 + 1);
        self.species.push(SpeciesData {
            name: name.to_owned(),
            statistics,
            spin,
            self_conjugate: false,
            conjugate: cid,
            index_slots: index_slots.clone(),
            propagator_symbol: format!("D({name})"),
        });
        self.species.push(SpeciesData {
            name: conjugate_name.to_owned(),
            statistics,
            spin,
            self_conjugate: false,
            conjugate: id,
            // The propagator is shared by the pair; name it after the particle.
            propagator_symbol: format!("D({name})"),
            index_slots,
        });
        Ok((id, cid))
    }

    /// Look up a species record.
    pub fn get(&self, id: SpeciesId) -> Result<&SpeciesData> {
        self.species
            .get(id.0 as usize)
            .ok_or(ModelError::UnknownSpecies(id))
    }

    /// Find a species by name.
    pub fn lookup(&self, name: &str) -> Result<SpeciesId> {
        self.species
            .iter()
            .position(|s| s.name == name)
            .map(|i| SpeciesId(i as u32))
            .ok_or_else(|| ModelError::NoSuchName(name.to_owned()))
    }

    /// The conjugate species id (identity for self-conjugate and
    /// flag-conjugated species).
    pub fn conjugate_of(&self, id: SpeciesId) -> Result<SpeciesId> {
        Ok(self.get(id)?.conjugate)
    }

    /// Statistics of a species, panicking never: unknown ids are reported.
    pub fn statistics(&self, id: SpeciesId) -> Result<Statistics> {
        Ok(self.get(id)?.statistics)
    }

    /// Decides whether two operators may be paired into a propagator.
    ///
    /// Two operators are contractible when they are mutual conjugates of the
    /// same species family: either the species is self-conjugate, or the two
    /// species are a registered particle/antiparticle pair, or they share one
    /// charged species with opposite conjugation flags.
    ///
    /// Unknown species ids make the pair non-contractible rather than
    /// erroring; a vanishing pairing is a value, not a failure.
    pub fn contractible(&self, a: &FieldOperator, b: &FieldOperator) -> bool {
        let (da, db) = match (self.get(a.species), self.get(b.species)) {
            (Ok(da), Ok(db)) => (da, db),
            _ => return false,
        };
        // Conjugation is registered mutually, so the check is symmetric in
        // the two operators.
        if da.conjugate != b.species || db.conjugate != a.species {
            return false;
        }
        if da.self_conjugate {
            return true;
        }
        if a.species != b.species {
            // Distinct particle/antiparticle species: the pair itself already
            // encodes the conjugation.
            return true;
        }
        // Single charged species: phi may only pair with phi-star.
        a.conjugated != b.conjugated
    }

    /// The propagator expression for a contractible pair, `None` when the
    /// pair vanishes.
    ///
    /// The symbol is species-level only; momentum routing belongs to the
    /// excluded kinematics layer, and keeping the symbol label-free lets
    /// equivalent topologies merge after external-leg relabeling.
    pub fn propagator(&self, a: &FieldOperator, b: &FieldOperator) -> Option<Expr> {
        if !self.contractible(a, b) {
            return None;
        }
        // Shared symbol for the pair: charged pairs registered as two species
        // store the particle's symbol on both records.
        let data = self.get(a.species).ok()?;
        Some(Expr::symbol(&data.propagator_symbol))
    }

    /// Iterate over all species records in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SpeciesId, &SpeciesData)> {
        self.species
            .iter()
            .enumerate()
            .map(|(i, s)| (SpeciesId(i as u32), s))
    }
}
