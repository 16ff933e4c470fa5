//! Proposition tree evaluator.
//!
//! A proposition evaluates to a boolean against a context. Comparison nodes
//! resolve their operands to values and call one `Value` method; logical
//! nodes combine child propositions, short-circuiting where the operator
//! allows it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::EvalError;
use crate::operand::Operand;
use crate::operator::Cardinality;

// ──────────────────────────────────────────────
// Trait
// ──────────────────────────────────────────────

/// A node that evaluates to a boolean given a context.
///
/// Trees are immutable once built, so one tree may be evaluated from many
/// threads at once against different contexts.
pub trait Proposition: fmt::Debug + Send + Sync {
    fn evaluate(&self, ctx: &dyn Context) -> Result<bool, EvalError>;
}

impl<P: Proposition + ?Sized> Proposition for Box<P> {
    fn evaluate(&self, ctx: &dyn Context) -> Result<bool, EvalError> {
        (**self).evaluate(ctx)
    }
}

// ──────────────────────────────────────────────
// Comparison operators
// ──────────────────────────────────────────────

/// Comparison operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    EqualTo,
    NotEqualTo,
    SameAs,
    NotSameAs,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
    In,
    NotIn,
    Contains,
    NotContains,
    InIpRange,
    AfterThan,
    BeforeThan,
    Exists,
}

impl ComparisonOp {
    pub const ALL: [ComparisonOp; 16] = [
        ComparisonOp::EqualTo,
        ComparisonOp::NotEqualTo,
        ComparisonOp::SameAs,
        ComparisonOp::NotSameAs,
        ComparisonOp::GreaterThan,
        ComparisonOp::LessThan,
        ComparisonOp::GreaterThanOrEqualTo,
        ComparisonOp::LessThanOrEqualTo,
        ComparisonOp::In,
        ComparisonOp::NotIn,
        ComparisonOp::Contains,
        ComparisonOp::NotContains,
        ComparisonOp::InIpRange,
        ComparisonOp::AfterThan,
        ComparisonOp::BeforeThan,
        ComparisonOp::Exists,
    ];

    pub fn cardinality(self) -> Cardinality {
        match self {
            ComparisonOp::Exists => Cardinality::Unary,
            _ => Cardinality::Binary,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComparisonOp::EqualTo => "equal_to",
            ComparisonOp::NotEqualTo => "not_equal_to",
            ComparisonOp::SameAs => "same_as",
            ComparisonOp::NotSameAs => "not_same_as",
            ComparisonOp::GreaterThan => "greater_than",
            ComparisonOp::LessThan => "less_than",
            ComparisonOp::GreaterThanOrEqualTo => "greater_than_or_equal_to",
            ComparisonOp::LessThanOrEqualTo => "less_than_or_equal_to",
            ComparisonOp::In => "in",
            ComparisonOp::NotIn => "not_in",
            ComparisonOp::Contains => "contains",
            ComparisonOp::NotContains => "not_contains",
            ComparisonOp::InIpRange => "in_ip_range",
            ComparisonOp::AfterThan => "after_than",
            ComparisonOp::BeforeThan => "before_than",
            ComparisonOp::Exists => "exists",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComparisonOp {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComparisonOp::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| EvalError::Deserialize {
                message: format!("unknown comparison operator '{}'", s),
            })
    }
}

/// Compares resolved operands with one `Value` method.
#[derive(Debug, Clone)]
pub struct Comparison {
    op: ComparisonOp,
    operands: Vec<Operand>,
}

impl Comparison {
    /// Build a comparison, validating the operand count.
    pub fn new(op: ComparisonOp, operands: Vec<Operand>) -> Result<Self, EvalError> {
        op.cardinality().check(op.name(), operands.len())?;
        Ok(Comparison { op, operands })
    }

    /// Build a two-operand comparison; fails for unary kinds.
    pub fn binary(op: ComparisonOp, left: Operand, right: Operand) -> Result<Self, EvalError> {
        Self::new(op, vec![left, right])
    }

    /// Whether the operand resolves to a non-null value.
    pub fn exists(operand: Operand) -> Self {
        Comparison {
            op: ComparisonOp::Exists,
            operands: vec![operand],
        }
    }

    pub fn op(&self) -> ComparisonOp {
        self.op
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }
}

impl Proposition for Comparison {
    fn evaluate(&self, ctx: &dyn Context) -> Result<bool, EvalError> {
        let values = self
            .operands
            .iter()
            .map(|operand| operand.prepare_value(ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let result = match (self.op, values.as_slice()) {
            (ComparisonOp::Exists, [value]) => !value.is_null(),
            (ComparisonOp::EqualTo, [l, r]) => l.equal_to(r),
            (ComparisonOp::NotEqualTo, [l, r]) => !l.equal_to(r),
            (ComparisonOp::SameAs, [l, r]) => l.same_as(r),
            (ComparisonOp::NotSameAs, [l, r]) => !l.same_as(r),
            (ComparisonOp::GreaterThan, [l, r]) => l.greater_than(r),
            (ComparisonOp::LessThan, [l, r]) => l.less_than(r),
            (ComparisonOp::GreaterThanOrEqualTo, [l, r]) => l.greater_than(r) || l.equal_to(r),
            (ComparisonOp::LessThanOrEqualTo, [l, r]) => l.less_than(r) || l.equal_to(r),
            (ComparisonOp::In, [l, r]) => l.is_in(r),
            (ComparisonOp::NotIn, [l, r]) => !l.is_in(r),
            (ComparisonOp::Contains, [l, r]) => l.contains(r),
            (ComparisonOp::NotContains, [l, r]) => !l.contains(r),
            (ComparisonOp::InIpRange, [l, r]) => l.in_ip_range(r),
            (ComparisonOp::AfterThan, [l, r]) => l.after_than(r)?,
            (ComparisonOp::BeforeThan, [l, r]) => l.before_than(r)?,
            (op, values) => {
                return Err(EvalError::InvalidArgument {
                    operator: op.name().to_string(),
                    expected: op.cardinality(),
                    actual: values.len(),
                })
            }
        };
        tracing::trace!(op = %self.op, result, "comparison evaluated");
        Ok(result)
    }
}

// ──────────────────────────────────────────────
// Logical operators
// ──────────────────────────────────────────────

/// Logical operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
    Xor,
    Not,
}

impl LogicalOp {
    pub const ALL: [LogicalOp; 4] = [LogicalOp::And, LogicalOp::Or, LogicalOp::Xor, LogicalOp::Not];

    pub fn cardinality(self) -> Cardinality {
        match self {
            LogicalOp::Not => Cardinality::Unary,
            LogicalOp::And | LogicalOp::Or | LogicalOp::Xor => Cardinality::Variadic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
            LogicalOp::Xor => "xor",
            LogicalOp::Not => "not",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogicalOp {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogicalOp::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| EvalError::Deserialize {
                message: format!("unknown logical operator '{}'", s),
            })
    }
}

/// Combines the results of child propositions.
#[derive(Debug)]
pub struct Logical {
    op: LogicalOp,
    propositions: Vec<Box<dyn Proposition>>,
}

impl Logical {
    /// Build a logical node, validating the child count.
    pub fn new(op: LogicalOp, propositions: Vec<Box<dyn Proposition>>) -> Result<Self, EvalError> {
        op.cardinality().check(op.name(), propositions.len())?;
        Ok(Logical { op, propositions })
    }

    pub fn and(propositions: Vec<Box<dyn Proposition>>) -> Self {
        Logical {
            op: LogicalOp::And,
            propositions,
        }
    }

    pub fn or(propositions: Vec<Box<dyn Proposition>>) -> Self {
        Logical {
            op: LogicalOp::Or,
            propositions,
        }
    }

    pub fn xor(propositions: Vec<Box<dyn Proposition>>) -> Self {
        Logical {
            op: LogicalOp::Xor,
            propositions,
        }
    }

    pub fn not(proposition: impl Proposition + 'static) -> Self {
        Logical {
            op: LogicalOp::Not,
            propositions: vec![Box::new(proposition)],
        }
    }

    pub fn op(&self) -> LogicalOp {
        self.op
    }

    pub fn propositions(&self) -> &[Box<dyn Proposition>] {
        &self.propositions
    }
}

impl Proposition for Logical {
    fn evaluate(&self, ctx: &dyn Context) -> Result<bool, EvalError> {
        match self.op {
            LogicalOp::And => {
                for (i, proposition) in self.propositions.iter().enumerate() {
                    if !proposition.evaluate(ctx)? {
                        // Short-circuit: remaining children are never evaluated
                        tracing::trace!(index = i, "and short-circuited");
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicalOp::Or => {
                for (i, proposition) in self.propositions.iter().enumerate() {
                    if proposition.evaluate(ctx)? {
                        tracing::trace!(index = i, "or short-circuited");
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            LogicalOp::Xor => {
                let mut odd = false;
                for proposition in &self.propositions {
                    if proposition.evaluate(ctx)? {
                        odd = !odd;
                    }
                }
                Ok(odd)
            }
            LogicalOp::Not => match self.propositions.as_slice() {
                [proposition] => Ok(!proposition.evaluate(ctx)?),
                children => Err(EvalError::InvalidArgument {
                    operator: self.op.name().to_string(),
                    expected: self.op.cardinality(),
                    actual: children.len(),
                }),
            },
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
