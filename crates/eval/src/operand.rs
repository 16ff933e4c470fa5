//! Operands: nodes that resolve to a `Value` against a context.
//!
//! An operand is a named variable, a literal constant, or a computed
//! arithmetic node that resolves its own operands first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::EvalError;
use crate::operator::Cardinality;
use crate::value::Value;

// ──────────────────────────────────────────────
// Operand
// ──────────────────────────────────────────────

/// A value-producing node of a rule.
#[derive(Debug, Clone)]
pub enum Operand {
    Variable(Variable),
    Literal(Value),
    Computed(Box<Arithmetic>),
}

impl Operand {
    /// Resolve this operand against `ctx`.
    pub fn prepare_value(&self, ctx: &dyn Context) -> Result<Value, EvalError> {
        match self {
            Operand::Variable(var) => var.prepare_value(ctx),
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Computed(arithmetic) => arithmetic.prepare_value(ctx),
        }
    }

    /// Variable without a default; missing facts are an error.
    pub fn var(name: impl Into<String>) -> Operand {
        Operand::Variable(Variable::new(name))
    }

    pub fn lit(value: impl Into<Value>) -> Operand {
        Operand::Literal(value.into())
    }

    pub fn add(left: Operand, right: Operand) -> Operand {
        Arithmetic::binary(ArithmeticOp::Add, left, right)
    }

    pub fn subtract(left: Operand, right: Operand) -> Operand {
        Arithmetic::binary(ArithmeticOp::Subtract, left, right)
    }

    pub fn multiply(left: Operand, right: Operand) -> Operand {
        Arithmetic::binary(ArithmeticOp::Multiply, left, right)
    }

    pub fn divide(left: Operand, right: Operand) -> Operand {
        Arithmetic::binary(ArithmeticOp::Divide, left, right)
    }

    pub fn modulo(left: Operand, right: Operand) -> Operand {
        Arithmetic::binary(ArithmeticOp::Modulo, left, right)
    }

    pub fn exponentiate(base: Operand, exponent: Operand) -> Operand {
        Arithmetic::binary(ArithmeticOp::Exponentiate, base, exponent)
    }

    pub fn negate(operand: Operand) -> Operand {
        Arithmetic::unary(ArithmeticOp::Negate, operand)
    }

    pub fn ceil(operand: Operand) -> Operand {
        Arithmetic::unary(ArithmeticOp::Ceil, operand)
    }

    pub fn floor(operand: Operand) -> Operand {
        Arithmetic::unary(ArithmeticOp::Floor, operand)
    }
}

impl From<Variable> for Operand {
    fn from(var: Variable) -> Self {
        Operand::Variable(var)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Literal(value)
    }
}

impl From<Arithmetic> for Operand {
    fn from(arithmetic: Arithmetic) -> Self {
        Operand::Computed(Box::new(arithmetic))
    }
}

// ──────────────────────────────────────────────
// Variable
// ──────────────────────────────────────────────

/// A named fact, with an optional fallback when the context lacks it.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    default: Option<Value>,
}

impl Variable {
    /// A variable that fails with `MissingFact` when the fact is absent.
    pub fn new(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Variable {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    /// A variable that resolves to `Null` when the fact is absent.
    pub fn optional(name: impl Into<String>) -> Self {
        Self::with_default(name, Value::Null)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Look the fact up once; fall back to the default.
    pub fn prepare_value(&self, ctx: &dyn Context) -> Result<Value, EvalError> {
        if let Some(fact) = ctx.fact(&self.name) {
            return Ok(fact);
        }
        match &self.default {
            Some(default) => {
                tracing::trace!(variable = %self.name, "fact missing, using default");
                Ok(default.clone())
            }
            None => Err(EvalError::MissingFact {
                name: self.name.clone(),
            }),
        }
    }
}

// ──────────────────────────────────────────────
// Arithmetic
// ──────────────────────────────────────────────

/// Arithmetic operator kinds usable as computed operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponentiate,
    Negate,
    Ceil,
    Floor,
    Min,
    Max,
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; 11] = [
        ArithmeticOp::Add,
        ArithmeticOp::Subtract,
        ArithmeticOp::Multiply,
        ArithmeticOp::Divide,
        ArithmeticOp::Modulo,
        ArithmeticOp::Exponentiate,
        ArithmeticOp::Negate,
        ArithmeticOp::Ceil,
        ArithmeticOp::Floor,
        ArithmeticOp::Min,
        ArithmeticOp::Max,
    ];

    pub fn cardinality(self) -> Cardinality {
        match self {
            ArithmeticOp::Negate | ArithmeticOp::Ceil | ArithmeticOp::Floor => Cardinality::Unary,
            ArithmeticOp::Min | ArithmeticOp::Max => Cardinality::Multiple,
            _ => Cardinality::Binary,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Divide => "divide",
            ArithmeticOp::Modulo => "modulo",
            ArithmeticOp::Exponentiate => "exponentiate",
            ArithmeticOp::Negate => "negate",
            ArithmeticOp::Ceil => "ceil",
            ArithmeticOp::Floor => "floor",
            ArithmeticOp::Min => "min",
            ArithmeticOp::Max => "max",
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArithmeticOp {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArithmeticOp::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| EvalError::Deserialize {
                message: format!("unknown arithmetic operator '{}'", s),
            })
    }
}

/// A computed operand: applies an arithmetic operator to resolved operands.
#[derive(Debug, Clone)]
pub struct Arithmetic {
    op: ArithmeticOp,
    operands: Vec<Operand>,
}

impl Arithmetic {
    /// Build a computed operand, validating the operand count.
    pub fn new(op: ArithmeticOp, operands: Vec<Operand>) -> Result<Self, EvalError> {
        op.cardinality().check(op.name(), operands.len())?;
        Ok(Arithmetic { op, operands })
    }

    fn binary(op: ArithmeticOp, left: Operand, right: Operand) -> Operand {
        Operand::from(Arithmetic {
            op,
            operands: vec![left, right],
        })
    }

    fn unary(op: ArithmeticOp, operand: Operand) -> Operand {
        Operand::from(Arithmetic {
            op,
            operands: vec![operand],
        })
    }

    pub fn op(&self) -> ArithmeticOp {
        self.op
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Resolve the operands in order and apply the operator.
    pub fn prepare_value(&self, ctx: &dyn Context) -> Result<Value, EvalError> {
        let values = self
            .operands
            .iter()
            .map(|operand| operand.prepare_value(ctx))
            .collect::<Result<Vec<_>, _>>()?;
        match (self.op, values.as_slice()) {
            (ArithmeticOp::Add, [a, b]) => a.add(b),
            (ArithmeticOp::Subtract, [a, b]) => a.subtract(b),
            (ArithmeticOp::Multiply, [a, b]) => a.multiply(b),
            (ArithmeticOp::Divide, [a, b]) => a.divide(b),
            (ArithmeticOp::Modulo, [a, b]) => a.modulo(b),
            (ArithmeticOp::Exponentiate, [a, b]) => a.exponentiate(b),
            (ArithmeticOp::Negate, [a]) => a.negate(),
            (ArithmeticOp::Ceil, [a]) => a.ceil(),
            (ArithmeticOp::Floor, [a]) => a.floor(),
            (ArithmeticOp::Min, values) => Value::min_of(values),
            (ArithmeticOp::Max, values) => Value::max_of(values),
            (op, values) => Err(EvalError::InvalidArgument {
                operator: op.name().to_string(),
                expected: op.cardinality(),
                actual: values.len(),
            }),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FactSet;

    #[test]
    fn variable_resolves_fact() {
        let facts = FactSet::new().with("age", 30);
        let value = Operand::var("age").prepare_value(&facts).unwrap();
        assert_eq!(value, Value::Integer(30));
    }

    #[test]
    fn variable_without_default_fails_when_missing() {
        let err = Operand::var("age").prepare_value(&FactSet::new()).unwrap_err();
        assert_eq!(
            err,
            EvalError::MissingFact {
                name: "age".to_string()
            }
        );
    }

    #[test]
    fn variable_default_only_applies_when_missing() {
        let var = Variable::with_default("country", "US");
        assert_eq!(var.prepare_value(&FactSet::new()).unwrap(), Value::from("US"));
        let facts = FactSet::new().with("country", "NZ");
        assert_eq!(var.prepare_value(&facts).unwrap(), Value::from("NZ"));
        assert_eq!(var.default_value(), Some(&Value::from("US")));
    }

    #[test]
    fn optional_variable_defaults_to_null() {
        let var = Variable::optional("nickname");
        assert_eq!(var.name(), "nickname");
        assert_eq!(var.prepare_value(&FactSet::new()).unwrap(), Value::Null);
    }

    #[test]
    fn literal_ignores_context() {
        let facts = FactSet::new().with("x", 1);
        assert_eq!(Operand::lit(7).prepare_value(&facts).unwrap(), Value::Integer(7));
    }

    #[test]
    fn computed_operands_nest() {
        // (price * quantity) - discount
        let total = Operand::subtract(
            Operand::multiply(Operand::var("price"), Operand::var("quantity")),
            Operand::var("discount"),
        );
        let facts = FactSet::new()
            .with("price", "2.50")
            .with("quantity", 4)
            .with("discount", 1);
        let value = total.prepare_value(&facts).unwrap();
        assert!(value.equal_to(&Value::Integer(9)));
    }

    #[test]
    fn computed_operand_propagates_arithmetic_errors() {
        let expr = Operand::add(Operand::var("name"), Operand::lit(1));
        let facts = FactSet::new().with("name", "Ada");
        assert!(matches!(
            expr.prepare_value(&facts),
            Err(EvalError::Arithmetic { .. })
        ));
        let expr = Operand::modulo(Operand::lit(5), Operand::lit(0));
        assert!(matches!(
            expr.prepare_value(&facts),
            Err(EvalError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn unary_arithmetic() {
        let facts = FactSet::new().with("x", "-2.5");
        assert_eq!(
            Operand::ceil(Operand::var("x")).prepare_value(&facts).unwrap(),
            Value::Integer(-2)
        );
        assert_eq!(
            Operand::floor(Operand::var("x")).prepare_value(&facts).unwrap(),
            Value::Integer(-3)
        );
        let negated = Operand::negate(Operand::var("x")).prepare_value(&facts).unwrap();
        assert!(negated.equal_to(&Value::from("2.5")));
    }

    #[test]
    fn min_and_max_over_multiple_operands() {
        let facts = FactSet::new().with("bids", Value::list([12, 40, 7]));
        let max = Arithmetic::new(
            ArithmeticOp::Max,
            vec![Operand::var("bids"), Operand::lit(25)],
        )
        .unwrap();
        assert_eq!(max.prepare_value(&facts).unwrap(), Value::Integer(40));
        let min = Arithmetic::new(ArithmeticOp::Min, vec![Operand::var("bids")]).unwrap();
        assert_eq!(min.prepare_value(&facts).unwrap(), Value::Integer(7));
    }

    #[test]
    fn arithmetic_cardinality_is_checked_at_construction() {
        let err = Arithmetic::new(ArithmeticOp::Add, vec![Operand::lit(1)]).unwrap_err();
        assert!(matches!(
            err,
            EvalError::InvalidArgument {
                expected: Cardinality::Binary,
                actual: 1,
                ..
            }
        ));
        assert!(Arithmetic::new(ArithmeticOp::Negate, vec![]).is_err());
        assert!(Arithmetic::new(ArithmeticOp::Max, vec![]).is_err());
        assert!(Arithmetic::new(ArithmeticOp::Max, vec![Operand::lit(1)]).is_ok());
    }

    #[test]
    fn operator_names_round_trip() {
        for op in ArithmeticOp::ALL {
            assert_eq!(op.name().parse::<ArithmeticOp>().unwrap(), op);
        }
        assert!("sqrt".parse::<ArithmeticOp>().is_err());
        let op: ArithmeticOp = serde_json::from_str("\"exponentiate\"").unwrap();
        assert_eq!(op, ArithmeticOp::Exponentiate);
    }
}
