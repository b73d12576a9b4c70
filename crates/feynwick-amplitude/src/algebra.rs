//! The algebra-reduction collaborator.
//!
//! The assembler hands ordered token sequences (one per fermion chain or
//! tensor structure) to an [`AlgebraReducer`] and receives a scalar-valued
//! [`Expr`] back. The calls are pure: same tokens, same result, which is what
//! makes the trace cache sound.

use itertools::Itertools;

use feynwick_model::{AlgebraToken, Expr};

use crate::error::AlgebraError;

/// Reduces index structures to scalar expressions.
///
/// An implementation that lacks an identity for some structure returns
/// [`AlgebraError::UnsupportedIdentity`]; the assembler turns that into an
/// [`Expr::Unresolved`] marker on the affected term and carries on.
pub trait AlgebraReducer {
    /// Reduce a closed (cyclic) chain of tokens to a scalar.
    fn reduce_closed(&self, tokens: &[AlgebraToken]) -> Result<Expr, AlgebraError>;

    /// Reduce an open chain of tokens, terminated by external spinors.
    fn reduce_open(&self, tokens: &[AlgebraToken]) -> Result<Expr, AlgebraError>;

    /// Contract a non-chain tensor structure (color factors and the like).
    fn contract_tensor(&self, tokens: &[AlgebraToken]) -> Result<Expr, AlgebraError>;
}

/// Stable textual signature of a token sequence; doubles as the cache key.
pub fn signature(tokens: &[AlgebraToken]) -> String {
    tokens.iter().map(|t| t.to_string()).join(".")
}

/// Default collaborator: emits opaque `Tr[...]` and chain symbols without
/// evaluating any algebra. The real Dirac and color identities live in a
/// model layer outside this engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolicReducer;

impl AlgebraReducer for SymbolicReducer {
    fn reduce_closed(&self, tokens: &[AlgebraToken]) -> Result<Expr, AlgebraError> {
        Ok(Expr::symbol(format!("Tr[{}]", signature(tokens))))
    }

    fn reduce_open(&self, tokens: &[AlgebraToken]) -> Result<Expr, AlgebraError> {
        Ok(Expr::symbol(format!("Chain[{}]", signature(tokens))))
    }

    fn contract_tensor(&self, tokens: &[AlgebraToken]) -> Result<Expr, AlgebraError> {
        Ok(Expr::symbol(format!("Contract[{}]", signature(tokens))))
    }
}
