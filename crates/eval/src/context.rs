//! Fact lookup contract and the in-memory fact set.
//!
//! A `Context` supplies named facts to variables during evaluation. How
//! facts get there (databases, request payloads, caches) is up to the
//! implementation; the evaluator only ever asks for one name at a time.

use std::collections::BTreeMap;

use crate::error::EvalError;
use crate::value::Value;

// ──────────────────────────────────────────────
// Trait
// ──────────────────────────────────────────────

/// Read-only source of facts for one evaluation.
///
/// Implementations must answer consistently for the duration of an
/// evaluation pass. They are shared across threads when a rule tree is
/// evaluated concurrently, hence the `Send + Sync` bound.
pub trait Context: Send + Sync {
    /// The fact stored under `name`, if any.
    fn fact(&self, name: &str) -> Option<Value>;

    /// Whether a fact is stored under `name`.
    fn has_fact(&self, name: &str) -> bool {
        self.fact(name).is_some()
    }
}

// ──────────────────────────────────────────────
// FactSet
// ──────────────────────────────────────────────

/// A set of fact values keyed by name.
#[derive(Debug, Clone, Default)]
pub struct FactSet(BTreeMap<String, Value>);

impl FactSet {
    pub fn new() -> Self {
        FactSet(BTreeMap::new())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style `insert`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a fact set from a JSON object mapping names to values.
    pub fn from_json(facts: &serde_json::Value) -> Result<FactSet, EvalError> {
        let obj = facts.as_object().ok_or_else(|| EvalError::Deserialize {
            message: format!("facts must be a JSON object, got {}", facts),
        })?;
        let mut set = FactSet::new();
        for (name, v) in obj {
            set.insert(name.clone(), Value::from_json(v)?);
        }
        Ok(set)
    }
}

impl Context for FactSet {
    fn fact(&self, name: &str) -> Option<Value> {
        self.0.get(name).cloned()
    }

    fn has_fact(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FactSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = FactSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_set_operations() {
        let mut facts = FactSet::new();
        assert!(facts.is_empty());
        facts.insert("age", 42);
        facts.insert("name", "Ada");
        assert_eq!(facts.len(), 2);
        assert_eq!(facts.get("age"), Some(&Value::Integer(42)));
        assert!(facts.has_fact("name"));
        assert!(!facts.has_fact("email"));
        assert_eq!(facts.fact("email"), None);
    }

    #[test]
    fn null_fact_is_still_present() {
        let facts = FactSet::new().with("deleted_at", Value::Null);
        assert!(facts.has_fact("deleted_at"));
        assert_eq!(facts.fact("deleted_at"), Some(Value::Null));
    }

    #[test]
    fn from_json_object() {
        let facts = FactSet::from_json(&serde_json::json!({
            "ip": "10.0.0.5",
            "roles": ["admin"],
            "score": 7.5
        }))
        .unwrap();
        assert_eq!(facts.fact("ip"), Some(Value::from("10.0.0.5")));
        assert_eq!(facts.fact("roles"), Some(Value::list(["admin"])));
        assert!(facts.fact("score").unwrap().is_numeric());
    }

    #[test]
    fn from_json_keeps_numbers_beyond_decimal_range() {
        let facts = FactSet::from_json(&serde_json::json!({ "x": 1.0e300, "y": 1 })).unwrap();
        assert_eq!(facts.fact("x"), Some(Value::Float(1.0e300)));
        assert_eq!(facts.fact("y"), Some(Value::Integer(1)));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        let err = FactSet::from_json(&serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err, EvalError::Deserialize { .. }));
    }

    #[test]
    fn collect_from_pairs() {
        let facts: FactSet = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(facts.fact("b"), Some(Value::Integer(2)));
    }
}
