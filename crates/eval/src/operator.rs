//! Operator cardinality and the construction-time arity check.
//!
//! Every operator kind declares a fixed `Cardinality`. Constructors call
//! `Cardinality::check` once, so a malformed operator never exists and
//! evaluation never has to re-validate its operand list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Number of operands (or child propositions) an operator kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Exactly one.
    Unary,
    /// Exactly two.
    Binary,
    /// One or more.
    Multiple,
    /// Zero or more.
    Variadic,
}

impl Cardinality {
    /// Whether `count` operands satisfy this cardinality.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Cardinality::Unary => count == 1,
            Cardinality::Binary => count == 2,
            Cardinality::Multiple => count >= 1,
            Cardinality::Variadic => true,
        }
    }

    /// Validate an operand count for the named operator.
    pub fn check(self, operator: &str, count: usize) -> Result<(), EvalError> {
        if self.accepts(count) {
            return Ok(());
        }
        tracing::debug!(operator, expected = %self, actual = count, "rejected operand count");
        Err(EvalError::InvalidArgument {
            operator: operator.to_string(),
            expected: self,
            actual: count,
        })
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Unary => write!(f, "exactly 1 operand"),
            Cardinality::Binary => write!(f, "exactly 2 operands"),
            Cardinality::Multiple => write!(f, "at least 1 operand"),
            Cardinality::Variadic => write!(f, "any number of operands"),
        }
    }
}
