//! Amplitude assembly.
//!
//! Turns the enumerated contractions of one time-ordered product into a list
//! of `(coefficient, topology)` pairs. Per retained component the coefficient
//! is
//!
//! ```text
//! sign * (-1)^(closed fermion loops) * multiplicity / symmetry
//!   * product(couplings) * product(index-free bosonic propagators)
//!   * contracted tensor structure * product(reduced fermion chains)
//! ```
//!
//! Fermionic propagators enter through the chain tokens handed to the
//! algebra reducer, never directly, and bosonic lines whose species carries
//! index slots enter through the tensor-contraction call, so nothing is
//! counted twice. Vanishing
//! contractions (zero sign, no spanning component) are counted, not errors.

use std::collections::HashMap;

use log::debug;

use feynwick_contraction::{Contraction, Sign, TimeOrderedProduct};
use feynwick_diagram::{
    connected_components, fermion_chains, symmetry_factor, Components, DiagramGraph, FermionChain,
    Topology,
};
use feynwick_model::{AlgebraToken, Expr, OpIdx, SpeciesTable};

use crate::algebra::{signature, AlgebraReducer};
use crate::cache::TraceCache;
use crate::error::{AlgebraError, Result};

/// One assembled contribution: scalar coefficient plus the topology it is
/// attached to.
#[derive(Debug, Clone)]
pub struct AmplitudeTerm {
    pub coefficient: Expr,
    pub topology: Topology,
    pub n_loops: usize,
}

/// Finite, ordered amplitude. `vanishing` counts the contractions and
/// components that contributed zero.
#[derive(Debug, Clone, Default)]
pub struct Amplitude {
    pub terms: Vec<AmplitudeTerm>,
    pub vanishing: usize,
}

impl Amplitude {
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// Merge terms whose topologies share a canonical key by adding
    /// coefficients. First-occurrence order is kept; distinct topologies are
    /// never conflated.
    pub fn merged(self) -> Amplitude {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut out: Vec<AmplitudeTerm> = Vec::new();
        for term in self.terms {
            let key = term.topology.canonical_key();
            match index.get(&key) {
                Some(&i) => {
                    let prev = std::mem::replace(&mut out[i].coefficient, Expr::zero());
                    out[i].coefficient = Expr::sum(vec![prev, term.coefficient]);
                }
                None => {
                    index.insert(key, out.len());
                    out.push(term);
                }
            }
        }
        // A merge can cancel exactly; zero-coefficient terms are dropped.
        out.retain(|t| !t.coefficient.is_zero());
        Amplitude {
            terms: out,
            vanishing: self.vanishing,
        }
    }
}

/// Assembles contractions into amplitude terms through an algebra reducer
/// and a shared trace cache.
pub struct Assembler<'a, R: AlgebraReducer> {
    table: &'a SpeciesTable,
    reducer: &'a R,
    cache: &'a TraceCache,
}

impl<'a, R: AlgebraReducer> Assembler<'a, R> {
    pub fn new(table: &'a SpeciesTable, reducer: &'a R, cache: &'a TraceCache) -> Self {
        Self {
            table,
            reducer,
            cache,
        }
    }

    /// Assemble every contraction of one product. External legs are taken
    /// from the product's markings; only components spanning all of them are
    /// kept.
    pub fn assemble(
        &self,
        product: &TimeOrderedProduct,
        contractions: &[Contraction],
    ) -> Result<Amplitude> {
        let required: Vec<OpIdx> = product.externals().into_iter().collect();
        let mut amplitude = Amplitude::default();
        for contraction in contractions {
            if contraction.sign == Sign::Zero {
                amplitude.vanishing += 1;
                continue;
            }
            let g = DiagramGraph::build(product, contraction, self.table)?;
            let comps = connected_components(&g);
            let retained = comps.retain_spanning(&g, &required);
            if retained.is_empty() {
                amplitude.vanishing += 1;
                continue;
            }
            let chains = fermion_chains(&g);
            for cid in retained {
                amplitude
                    .terms
                    .push(self.component_term(&g, &comps, cid, &chains, contraction)?);
            }
        }
        debug!(
            "assembled {} term(s), {} vanishing contribution(s)",
            amplitude.terms.len(),
            amplitude.vanishing
        );
        Ok(amplitude)
    }

    fn component_term(
        &self,
        g: &DiagramGraph,
        comps: &Components,
        cid: usize,
        chains: &[FermionChain],
        contraction: &Contraction,
    ) -> Result<AmplitudeTerm> {
        let members = comps.members(cid);
        let in_component =
            |chain: &&FermionChain| comps.component_of(chain.vertices[0]) == cid;
        let closed_loops = chains
            .iter()
            .filter(in_component)
            .filter(|c| c.closed)
            .count();

        let loop_sign = if closed_loops % 2 == 0 { 1 } else { -1 };
        let numer = contraction.sign.factor() * loop_sign * contraction.multiplicity as i64;
        let symmetry = symmetry_factor(g, members);
        let mut factors = vec![Expr::rational(numer, symmetry as i64)];

        for &v in members {
            factors.push(g.vertex(v).coupling.clone());
        }
        // Index-free bosonic lines multiply in directly; lines carrying
        // Lorentz/color slots go through the tensor-contraction collaborator
        // below.
        for (_, edge) in g.edges() {
            if comps.component_of(edge.va) != cid || edge.fermionic {
                continue;
            }
            if self.table.get(edge.species)?.index_slots.is_empty() {
                factors.push(edge.propagator.clone());
            }
        }
        if let Some(tensor) = self.reduce_tensors(g, comps, cid)? {
            factors.push(tensor);
        }
        for chain in chains.iter().filter(in_component) {
            factors.push(self.reduce_chain(g, chain)?);
        }

        let topology = Topology::of_component(g, members);
        let n_loops = topology.n_loops();
        Ok(AmplitudeTerm {
            coefficient: Expr::prod(factors),
            topology,
            n_loops,
        })
    }

    /// Contract the non-fermionic index structure of a component: one token
    /// per bosonic edge whose species carries index slots, in edge-id order,
    /// handed to the collaborator as a single tensor contraction. `None` when
    /// the component has no indexed bosonic lines.
    fn reduce_tensors(
        &self,
        g: &DiagramGraph,
        comps: &Components,
        cid: usize,
    ) -> Result<Option<Expr>> {
        let mut tokens = Vec::new();
        for (_, edge) in g.edges() {
            if comps.component_of(edge.va) != cid || edge.fermionic {
                continue;
            }
            let species = self.table.get(edge.species)?;
            if species.index_slots.is_empty() {
                continue;
            }
            tokens.push(AlgebraToken::new(
                species.propagator_symbol.clone(),
                vec![edge.a as u32, edge.b as u32],
            ));
        }
        if tokens.is_empty() {
            return Ok(None);
        }
        let key = format!("tensor:{}", signature(&tokens));
        let reduced = self.cache.get_or_insert_with(&key, || {
            match self.reducer.contract_tensor(&tokens) {
                Ok(expr) => expr,
                Err(AlgebraError::UnsupportedIdentity { signature }) => {
                    debug!("uncontracted tensor structure {signature}");
                    Expr::Unresolved(signature)
                }
            }
        });
        Ok(Some(reduced))
    }

    /// Reduce one fermion chain through the cache. An unsupported identity
    /// becomes an unresolved marker on the term, never an error.
    fn reduce_chain(&self, g: &DiagramGraph, chain: &FermionChain) -> Result<Expr> {
        let tokens = self.chain_tokens(g, chain)?;
        let key = format!(
            "{}:{}",
            if chain.closed { "closed" } else { "open" },
            signature(&tokens)
        );
        let reduced = self.cache.get_or_insert_with(&key, || {
            let result = if chain.closed {
                self.reducer.reduce_closed(&tokens)
            } else {
                self.reducer.reduce_open(&tokens)
            };
            match result {
                Ok(expr) => expr,
                Err(AlgebraError::UnsupportedIdentity { signature }) => {
                    debug!("unreduced chain structure {signature}");
                    Expr::Unresolved(signature)
                }
            }
        });
        Ok(reduced)
    }

    /// One token per chain edge: the propagator symbol of the line's species
    /// carrying the flat positions of its two attachments.
    fn chain_tokens(&self, g: &DiagramGraph, chain: &FermionChain) -> Result<Vec<AlgebraToken>> {
        chain
            .edges
            .iter()
            .map(|&id| {
                let edge = g.edge(id);
                let species = self.table.get(edge.species)?;
                Ok(AlgebraToken::new(
                    species.propagator_symbol.clone(),
                    vec![edge.a as u32, edge.b as u32],
                ))
            })
            .collect()
    }
}
