//! Runtime values: the facts and constants a proposition compares.
//!
//! `Value` is a closed tagged variant. Every coercion between variants is
//! spelled out in `loose_cmp` (loose equality and ordering) and `same_as`
//! (strict identity); nothing relies on implicit conversion.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::EvalError;
use crate::ip_range;
use crate::numeric::{self, parse_numeric, Number};
use crate::timestamp::{from_unix_seconds, parse_timestamp};

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// An immutable fact or constant.
///
/// Lists and maps sit behind `Arc`: cloning a value shares the nested data
/// instead of copying it, and there is no way to mutate it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    /// Numbers outside `Decimal`'s range or precision.
    Float(f64),
    Text(String),
    Timestamp(OffsetDateTime),
    List(Arc<Vec<Value>>),
    Map(Arc<BTreeMap<String, Value>>),
}

impl Value {
    /// Build a list value from anything convertible to values.
    pub fn list<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Integer(_) => "Integer",
            Value::Decimal(_) => "Decimal",
            Value::Float(_) => "Float",
            Value::Text(_) => "Text",
            Value::Timestamp(_) => "Timestamp",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean interpretation used when comparing against `Null` or `Bool`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Decimal(d) => !d.is_zero(),
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !(s.is_empty() || s == "0"),
            Value::Timestamp(_) => true,
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
        }
    }

    /// The numeric reading of this value, if it has one.
    ///
    /// Integers, decimals, floats and fully numeric text qualify; booleans do not.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Integer(i) => Some(Number::Int(*i)),
            Value::Decimal(d) => Some(Number::Decimal(*d)),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::Text(s) => parse_numeric(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Text form of a scalar, used as a substring needle.
    fn scalar_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => Some(Cow::Borrowed("")),
            Value::Bool(true) => Some(Cow::Borrowed("1")),
            Value::Bool(false) => Some(Cow::Borrowed("")),
            Value::Integer(i) => Some(Cow::Owned(i.to_string())),
            Value::Decimal(d) => Some(Cow::Owned(d.normalize().to_string())),
            Value::Float(f) => Some(Cow::Owned(f.to_string())),
            Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Timestamp(_) | Value::List(_) | Value::Map(_) => None,
        }
    }
}

// ──────────────────────────────────────────────
// Comparison
// ──────────────────────────────────────────────

impl Value {
    /// Loose ordering between two values; `None` when they are incomparable.
    ///
    /// Rules, first match wins:
    /// 1. `Null` equals `Null`; `Null` against text compares `""` with it.
    /// 2. Anything against `Null` or `Bool` compares truthiness.
    /// 3. Numbers compare numerically, also against numeric text; against
    ///    other text the number's canonical text is compared bytewise.
    /// 4. Text compares numerically when both sides are numeric, else bytewise.
    /// 5. Timestamps compare as instants, also against parseable text.
    /// 6. Lists compare by length, then element-wise.
    /// 7. Maps are only ever equal (same keys, loosely equal values).
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, Value::Text(s)) => Some("".cmp(s.as_str())),
            (Value::Text(s), Value::Null) => Some(s.as_str().cmp("")),
            (Value::Null | Value::Bool(_), _) | (_, Value::Null | Value::Bool(_)) => {
                Some(self.is_truthy().cmp(&other.is_truthy()))
            }
            (
                Value::Integer(_) | Value::Decimal(_) | Value::Float(_),
                Value::Integer(_) | Value::Decimal(_) | Value::Float(_),
            ) => {
                Some(self.as_number()?.cmp_numeric(other.as_number()?))
            }
            (Value::Integer(_) | Value::Decimal(_) | Value::Float(_), Value::Text(s)) => {
                let n = self.as_number()?;
                Some(match parse_numeric(s) {
                    Some(m) => n.cmp_numeric(m),
                    None => n.to_string().as_str().cmp(s.as_str()),
                })
            }
            (Value::Text(_), Value::Integer(_) | Value::Decimal(_) | Value::Float(_)) => {
                other.loose_cmp(self).map(Ordering::reverse)
            }
            (Value::Text(a), Value::Text(b)) => match (parse_numeric(a), parse_numeric(b)) {
                (Some(x), Some(y)) => Some(x.cmp_numeric(y)),
                _ => Some(a.cmp(b)),
            },
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Text(s)) => parse_timestamp(s).map(|b| a.cmp(&b)),
            (Value::Text(s), Value::Timestamp(b)) => parse_timestamp(s).map(|a| a.cmp(b)),
            (Value::List(a), Value::List(b)) => cmp_lists(a, b),
            (Value::Map(a), Value::Map(b)) => maps_loosely_equal(a, b).then_some(Ordering::Equal),
            _ => None,
        }
    }

    /// Loose equality: `"1" == 1`, `"1.0" == "1"`, `0 == false`.
    pub fn equal_to(&self, other: &Value) -> bool {
        self.loose_cmp(other) == Some(Ordering::Equal)
    }

    /// Strict equality: same variant and identical payload.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b && a.offset() == b.offset(),
            (Value::List(a), Value::List(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_as(y)))
            }
            (Value::Map(a), Value::Map(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.len() == b.len()
                        && a.iter()
                            .all(|(k, v)| b.get(k).is_some_and(|w| v.same_as(w))))
            }
            _ => false,
        }
    }

    pub fn greater_than(&self, other: &Value) -> bool {
        self.loose_cmp(other) == Some(Ordering::Greater)
    }

    pub fn less_than(&self, other: &Value) -> bool {
        self.loose_cmp(other) == Some(Ordering::Less)
    }

    /// Membership: list elements and map values by loose equality, text by
    /// substring. Any other container never contains anything.
    pub fn contains(&self, needle: &Value) -> bool {
        match self {
            Value::List(items) => items.iter().any(|item| item.equal_to(needle)),
            Value::Map(entries) => entries.values().any(|item| item.equal_to(needle)),
            Value::Text(haystack) => needle
                .scalar_text()
                .is_some_and(|n| haystack.contains(n.as_ref())),
            _ => false,
        }
    }

    /// Inverse of `contains`: whether this value occurs in `container`.
    pub fn is_in(&self, container: &Value) -> bool {
        container.contains(self)
    }

    /// Whether this dotted-quad text lies in any of the given ranges.
    ///
    /// `ranges` is one range or a list of ranges; anything
    /// malformed is a non-match, never an error.
    pub fn in_ip_range(&self, ranges: &Value) -> bool {
        let Value::Text(ip) = self else {
            return false;
        };
        match ranges {
            Value::Text(range) => ip_range::ip_in_range(ip, range),
            Value::List(items) => items
                .iter()
                .any(|item| matches!(item, Value::Text(range) if ip_range::ip_in_range(ip, range))),
            _ => false,
        }
    }

    /// The absolute instant this value denotes.
    ///
    /// Integers are Unix epoch seconds; text is parsed as RFC 3339, a naive
    /// UTC date-time or a date.
    pub fn to_instant(&self) -> Result<OffsetDateTime, EvalError> {
        let instant = match self {
            Value::Timestamp(t) => Some(*t),
            Value::Integer(seconds) => from_unix_seconds(*seconds),
            Value::Text(s) => parse_timestamp(s),
            _ => None,
        };
        instant.ok_or_else(|| EvalError::InvalidTimestamp {
            value: self.to_string(),
        })
    }

    pub fn after_than(&self, other: &Value) -> Result<bool, EvalError> {
        Ok(self.to_instant()? > other.to_instant()?)
    }

    pub fn before_than(&self, other: &Value) -> Result<bool, EvalError> {
        Ok(self.to_instant()? < other.to_instant()?)
    }
}

fn cmp_lists(a: &[Value], b: &[Value]) -> Option<Ordering> {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        unequal => return Some(unequal),
    }
    for (x, y) in a.iter().zip(b) {
        match x.loose_cmp(y)? {
            Ordering::Equal => continue,
            decided => return Some(decided),
        }
    }
    Some(Ordering::Equal)
}

fn maps_loosely_equal(a: &BTreeMap<String, Value>, b: &BTreeMap<String, Value>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, v)| b.get(k).is_some_and(|w| v.equal_to(w)))
}

// ──────────────────────────────────────────────
// Arithmetic
// ──────────────────────────────────────────────

type BinaryFn = fn(Number, Number) -> Result<Number, EvalError>;

impl Value {
    fn operand_number(&self, operation: &str) -> Result<Number, EvalError> {
        self.as_number()
            .ok_or_else(|| EvalError::arithmetic(operation, self.type_name()))
    }

    fn binary_arithmetic(
        &self,
        other: &Value,
        operation: &str,
        apply: BinaryFn,
    ) -> Result<Value, EvalError> {
        let a = self.operand_number(operation)?;
        let b = other.operand_number(operation)?;
        apply(a, b).map(Value::from)
    }

    pub fn add(&self, other: &Value) -> Result<Value, EvalError> {
        self.binary_arithmetic(other, "add", numeric::add)
    }

    pub fn subtract(&self, other: &Value) -> Result<Value, EvalError> {
        self.binary_arithmetic(other, "subtract", numeric::subtract)
    }

    pub fn multiply(&self, other: &Value) -> Result<Value, EvalError> {
        self.binary_arithmetic(other, "multiply", numeric::multiply)
    }

    /// Fails with `DivisionByZero` when `other` is numerically zero.
    pub fn divide(&self, other: &Value) -> Result<Value, EvalError> {
        self.binary_arithmetic(other, "divide", numeric::divide)
    }

    /// Fails with `DivisionByZero` when `other` is numerically zero.
    pub fn modulo(&self, other: &Value) -> Result<Value, EvalError> {
        self.binary_arithmetic(other, "modulo", numeric::modulo)
    }

    pub fn exponentiate(&self, other: &Value) -> Result<Value, EvalError> {
        self.binary_arithmetic(other, "exponentiate", numeric::exponentiate)
    }

    pub fn negate(&self) -> Result<Value, EvalError> {
        numeric::negate(self.operand_number("negate")?).map(Value::from)
    }

    pub fn ceil(&self) -> Result<Value, EvalError> {
        Ok(numeric::ceil(self.operand_number("ceil")?).into())
    }

    pub fn floor(&self) -> Result<Value, EvalError> {
        Ok(numeric::floor(self.operand_number("floor")?).into())
    }

    /// Smallest numeric value; list operands contribute their elements.
    pub fn min_of(values: &[Value]) -> Result<Value, EvalError> {
        Self::extremum(values, "min", numeric::min)
    }

    /// Largest numeric value; list operands contribute their elements.
    pub fn max_of(values: &[Value]) -> Result<Value, EvalError> {
        Self::extremum(values, "max", numeric::max)
    }

    fn extremum(
        values: &[Value],
        operation: &str,
        pick: fn(&[Number]) -> Option<Number>,
    ) -> Result<Value, EvalError> {
        let mut numbers = Vec::with_capacity(values.len());
        for value in values {
            match value {
                Value::List(items) => {
                    for item in items.iter() {
                        numbers.push(item.operand_number(operation)?);
                    }
                }
                other => numbers.push(other.operand_number(operation)?),
            }
        }
        pick(&numbers)
            .map(Value::from)
            .ok_or_else(|| EvalError::Arithmetic {
                message: format!("{} of an empty collection", operation),
            })
    }
}

// ──────────────────────────────────────────────
// Conversions
// ──────────────────────────────────────────────

impl Value {
    /// Convert a JSON document into a value.
    ///
    /// Integral JSON numbers become `Integer` when they fit in `i64`, other
    /// numbers become `Decimal`, or `Float` past `Decimal`'s range. Strings
    /// stay `Text`.
    pub fn from_json(v: &serde_json::Value) -> Result<Value, EvalError> {
        Ok(match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => parse_numeric(&n.to_string())
                    .or_else(|| n.as_f64().map(Number::Float))
                    .map(Value::from)
                    .ok_or_else(|| EvalError::Deserialize {
                        message: format!("unsupported JSON number {}", n),
                    })?,
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::List(Arc::new(
                items.iter().map(Value::from_json).collect::<Result<_, _>>()?,
            )),
            serde_json::Value::Object(entries) => {
                let mut map = BTreeMap::new();
                for (k, item) in entries {
                    map.insert(k.clone(), Value::from_json(item)?);
                }
                Value::Map(Arc::new(map))
            }
        })
    }

    /// Convert a value to JSON for output. Timestamps render as RFC 3339.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::json!(b),
            Value::Integer(i) => serde_json::json!(i),
            Value::Decimal(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(_) => serde_json::Value::String(self.to_string()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d.normalize()),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Timestamp(t) => match t.format(&Rfc3339) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "{}", t),
            },
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => Value::Integer(i),
            Number::Decimal(d) => Value::Decimal(d),
            Number::Float(f) => Value::Float(f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(t: OffsetDateTime) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(Arc::new(entries))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
