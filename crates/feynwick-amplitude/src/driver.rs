//! Data-parallel amplitude driver.
//!
//! A request carries one time-ordered product per independent vertex-choice
//! combination. The combinations share nothing but the species table and the
//! trace cache, so they are evaluated with rayon and the partial amplitudes
//! concatenated in request order, which keeps the output deterministic.

use rayon::prelude::*;

use feynwick_contraction::{Enumerator, TimeOrderedProduct, DEFAULT_CEILING};
use feynwick_model::{InteractionTerm, SpeciesTable};
use itertools::Itertools;

use crate::algebra::AlgebraReducer;
use crate::assembler::{Amplitude, Assembler};
use crate::cache::TraceCache;
use crate::error::Result;

/// Knobs of one driver run.
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Candidate ceiling handed to every enumerator.
    pub ceiling: usize,
    /// Merge terms with identical canonical topology across the whole run.
    pub merge: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
            merge: true,
        }
    }
}

/// All distinct vertex-choice combinations of `order` insertions drawn from
/// `terms`, each as its own time-ordered product. External markings are
/// applied by the caller afterwards.
pub fn products_at_order(terms: &[InteractionTerm], order: usize) -> Vec<TimeOrderedProduct> {
    (0..terms.len())
        .combinations_with_replacement(order)
        .map(|choice| {
            let mut product = TimeOrderedProduct::new();
            for i in choice {
                product.push_term(&terms[i]);
            }
            product
        })
        .collect()
}

/// Enumerate, assemble and (optionally) merge the amplitude of a batch of
/// independent products.
pub fn compute_amplitude<R>(
    table: &SpeciesTable,
    products: &[TimeOrderedProduct],
    reducer: &R,
    cache: &TraceCache,
    options: &DriverOptions,
) -> Result<Amplitude>
where
    R: AlgebraReducer + Sync,
{
    let assembler = Assembler::new(table, reducer, cache);
    let partials: Vec<Amplitude> = products
        .par_iter()
        .map(|product| {
            let contractions = Enumerator::for_product(table, product)
                .ceiling(options.ceiling)
                .enumerate()?;
            assembler.assemble(product, &contractions)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut amplitude = Amplitude::default();
    for partial in partials {
        amplitude.terms.extend(partial.terms);
        amplitude.vanishing += partial.vanishing;
    }
    if options.merge {
        amplitude = amplitude.merged();
    }
    Ok(amplitude)
}
