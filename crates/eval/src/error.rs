//! Error taxonomy for rule construction and evaluation.

use crate::operator::Cardinality;

/// Errors raised while building or evaluating a proposition tree.
///
/// `InvalidArgument` is the only construction-time error; everything else
/// surfaces from `Proposition::evaluate` and is never caught inside the tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// An arithmetic operation received a non-numeric operand.
    #[error("arithmetic error: {message}")]
    Arithmetic { message: String },

    /// Divide or modulo with a divisor that is numerically zero.
    #[error("division by zero in {operation}")]
    DivisionByZero { operation: String },

    /// An operator was built with an operand count its cardinality rejects.
    #[error("{operator} takes {expected}, got {actual}")]
    InvalidArgument {
        operator: String,
        expected: Cardinality,
        actual: usize,
    },

    /// A variable has no fact in the context and no default value.
    #[error("missing fact: {name}")]
    MissingFact { name: String },

    /// A temporal comparison received a value that is not a timestamp.
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp { value: String },

    /// Input data could not be converted into values.
    #[error("deserialization error: {message}")]
    Deserialize { message: String },

    /// Decimal arithmetic left the representable range.
    #[error("numeric overflow: {message}")]
    Overflow { message: String },
}

impl EvalError {
    pub(crate) fn arithmetic(operation: &str, type_name: &str) -> Self {
        EvalError::Arithmetic {
            message: format!("{} requires numeric operands, got {}", operation, type_name),
        }
    }

    pub(crate) fn overflow(operation: &str) -> Self {
        EvalError::Overflow {
            message: format!("{} overflow", operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_display() {
        let err = EvalError::InvalidArgument {
            operator: "greater_than".to_string(),
            expected: Cardinality::Binary,
            actual: 3,
        };
        assert_eq!(err.to_string(), "greater_than takes exactly 2 operands, got 3");
    }

    #[test]
    fn arithmetic_display() {
        let err = EvalError::arithmetic("add", "Text");
        assert_eq!(
            err.to_string(),
            "arithmetic error: add requires numeric operands, got Text"
        );
    }

    #[test]
    fn division_by_zero_display() {
        let err = EvalError::DivisionByZero {
            operation: "modulo".to_string(),
        };
        assert_eq!(err.to_string(), "division by zero in modulo");
    }
}
