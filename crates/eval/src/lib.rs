//! Tenet rule evaluator -- evaluates proposition trees against facts.
//!
//! A rule is a tree of propositions. Comparison nodes resolve operands
//! (variables, literals, computed arithmetic) to `Value`s through a
//! `Context` and compare them; logical nodes combine child results.
//!
//! Trees are immutable after construction. Operand counts are validated
//! when an operator is built, so evaluation only ever fails on the data:
//! missing facts, non-numeric arithmetic, division by zero or unparseable
//! timestamps.

pub mod context;
pub mod error;
pub mod ip_range;
pub mod numeric;
pub mod operand;
pub mod operator;
pub mod proposition;
pub mod timestamp;
pub mod value;

pub use context::{Context, FactSet};
pub use error::EvalError;
pub use operand::{Arithmetic, ArithmeticOp, Operand, Variable};
pub use operator::Cardinality;
pub use proposition::{Comparison, ComparisonOp, Logical, LogicalOp, Proposition};
pub use value::Value;

/// Evaluate a proposition against a JSON object of facts.
///
/// Convenience entry point for callers holding facts as JSON; anything
/// else should implement `Context` and call `Proposition::evaluate`.
pub fn evaluate(
    proposition: &dyn Proposition,
    facts: &serde_json::Value,
) -> Result<bool, EvalError> {
    let fact_set = FactSet::from_json(facts)?;
    proposition.evaluate(&fact_set)
}

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Adult customers from the office network, or any admin.
    fn access_rule() -> Logical {
        let adult = Comparison::binary(
            ComparisonOp::GreaterThanOrEqualTo,
            Operand::var("age"),
            Operand::lit(18),
        )
        .unwrap();
        let office = Comparison::binary(
            ComparisonOp::InIpRange,
            Operand::var("ip"),
            Operand::lit(Value::list(["10.0.0.0/8", "192.168.0.1-192.168.0.50"])),
        )
        .unwrap();
        let admin = Comparison::binary(
            ComparisonOp::In,
            Operand::lit("admin"),
            Variable::with_default("roles", Value::list(Vec::<Value>::new())).into(),
        )
        .unwrap();
        Logical::or(vec![
            Box::new(Logical::and(vec![Box::new(adult), Box::new(office)])),
            Box::new(admin),
        ])
    }

    #[test]
    fn evaluate_rule_from_json_facts() {
        let rule = access_rule();
        let facts = serde_json::json!({ "age": "21", "ip": "192.168.0.17" });
        assert!(evaluate(&rule, &facts).unwrap());

        let facts = serde_json::json!({ "age": 16, "ip": "10.1.2.3" });
        assert!(!evaluate(&rule, &facts).unwrap());

        let facts = serde_json::json!({ "age": 16, "ip": "8.8.8.8", "roles": ["admin"] });
        assert!(evaluate(&rule, &facts).unwrap());
    }

    #[test]
    fn evaluate_ignores_unread_huge_facts() {
        let facts = serde_json::json!({ "age": 30, "ip": "10.0.0.1", "balance": 1.0e300 });
        assert!(evaluate(&access_rule(), &facts).unwrap());
    }

    #[test]
    fn evaluate_reports_missing_facts() {
        let rule = access_rule();
        let facts = serde_json::json!({ "ip": "10.0.0.1" });
        assert_eq!(
            evaluate(&rule, &facts).unwrap_err(),
            EvalError::MissingFact {
                name: "age".to_string()
            }
        );
    }

    #[test]
    fn evaluate_rejects_non_object_facts() {
        let rule = access_rule();
        assert!(matches!(
            evaluate(&rule, &serde_json::json!("age=21")),
            Err(EvalError::Deserialize { .. })
        ));
    }
}
