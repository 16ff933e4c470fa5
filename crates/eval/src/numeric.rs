//! Numeric model backing `Value` arithmetic and numeric comparison.
//!
//! Integers stay `i64` while every operand is integral and the result is
//! exact; otherwise work moves to `rust_decimal::Decimal`. Magnitudes that
//! `Decimal` cannot hold (beyond roughly 7.9e28, or nonzero values below
//! 1e-28) fall back to `f64`, and a non-finite `f64` result is an overflow.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::{MathematicalOps, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::EvalError;

/// A resolved numeric operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Decimal(Decimal),
    Float(f64),
}

impl Number {
    /// Exact decimal form; `None` for floats.
    pub fn as_decimal(self) -> Option<Decimal> {
        match self {
            Number::Int(i) => Some(Decimal::from(i)),
            Number::Decimal(d) => Some(d),
            Number::Float(_) => None,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Decimal(d) => d.to_f64().unwrap_or_default(),
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Decimal(d) => d.is_zero(),
            Number::Float(f) => f == 0.0,
        }
    }

    pub fn is_negative(self) -> bool {
        match self {
            Number::Int(i) => i < 0,
            Number::Decimal(d) => d.is_sign_negative() && !d.is_zero(),
            Number::Float(f) => f < 0.0,
        }
    }

    pub fn is_integral(self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Decimal(d) => d.fract().is_zero(),
            Number::Float(f) => f.fract() == 0.0,
        }
    }

    /// Numeric order across representations.
    pub fn cmp_numeric(self, other: Number) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(&b),
            (Number::Float(_), _) | (_, Number::Float(_)) => self
                .to_f64()
                .partial_cmp(&other.to_f64())
                .unwrap_or(Ordering::Equal),
            (a, b) => match (a.as_decimal(), b.as_decimal()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Decimal(d) => write!(f, "{}", d.normalize()),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

// ──────────────────────────────────────────────
// Numeric strings
// ──────────────────────────────────────────────

/// Parse a string that is numeric in its entirety.
///
/// Accepts `[+-]? (digits ("." digits*)? | "." digits) ([eE] [+-]? digits)?`.
/// Surrounding whitespace or any other character makes the string
/// non-numeric. Every string the grammar accepts is numeric: literals
/// `Decimal` cannot represent exactly enough become `Number::Float`.
pub fn parse_numeric(s: &str) -> Option<Number> {
    let literal = NumericLiteral::scan(s)?;
    if literal.exponent.is_none() && literal.frac.is_none() {
        if let Ok(i) = i64::from_str(s) {
            return Some(Number::Int(i));
        }
    }
    let decimal = match literal.exponent {
        Some(exponent) => {
            Decimal::from_scientific(&format!("{}e{}", literal.mantissa(), exponent)).ok()
        }
        None => Decimal::from_str(&literal.mantissa()).ok(),
    };
    match decimal {
        // Decimal rounds past 28 fractional digits; a nonzero literal must stay nonzero
        Some(d) if !(d.is_zero() && literal.has_nonzero_digit()) => Some(Number::Decimal(d)),
        _ => literal.to_f64().map(Number::Float),
    }
}

/// Borrowed pieces of a numeric literal that passed the grammar check.
struct NumericLiteral<'a> {
    negative: bool,
    int: &'a str,
    frac: Option<&'a str>,
    exponent: Option<&'a str>,
}

impl<'a> NumericLiteral<'a> {
    fn scan(s: &'a str) -> Option<Self> {
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (mantissa, exponent) = match rest.find(['e', 'E']) {
            Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
            None => (rest, None),
        };
        let (int, frac) = match mantissa.split_once('.') {
            Some((int, frac)) => (int, Some(frac)),
            None => (mantissa, None),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int) || !frac.map_or(true, all_digits) {
            return None;
        }
        if int.is_empty() && frac.map_or(true, str::is_empty) {
            return None;
        }
        if let Some(exp) = exponent {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if digits.is_empty() || !all_digits(digits) {
                return None;
            }
        }
        Some(NumericLiteral {
            negative,
            int,
            frac,
            exponent,
        })
    }

    /// Canonical `-?digits(.digits)?` form of the mantissa.
    fn mantissa(&self) -> String {
        let sign = if self.negative { "-" } else { "" };
        let int = if self.int.is_empty() { "0" } else { self.int };
        match self.frac {
            Some(frac) if !frac.is_empty() => format!("{}{}.{}", sign, int, frac),
            _ => format!("{}{}", sign, int),
        }
    }

    fn has_nonzero_digit(&self) -> bool {
        self.int
            .bytes()
            .chain(self.frac.unwrap_or_default().bytes())
            .any(|b| b != b'0')
    }

    fn to_f64(&self) -> Option<f64> {
        let exponent = self.exponent.unwrap_or("0");
        f64::from_str(&format!("{}e{}", self.mantissa(), exponent)).ok()
    }
}

// ──────────────────────────────────────────────
// Arithmetic
// ──────────────────────────────────────────────

/// Apply `exact` in `Decimal`, falling back to `inexact` in `f64` when an
/// operand is already a float or the decimal result is out of range.
fn widened(
    a: Number,
    b: Number,
    operation: &str,
    exact: impl Fn(Decimal, Decimal) -> Option<Decimal>,
    inexact: impl Fn(f64, f64) -> f64,
) -> Result<Number, EvalError> {
    if let (Some(x), Some(y)) = (a.as_decimal(), b.as_decimal()) {
        if let Some(d) = exact(x, y) {
            return Ok(Number::Decimal(d.normalize()));
        }
    }
    finite(inexact(a.to_f64(), b.to_f64()), operation)
}

fn finite(f: f64, operation: &str) -> Result<Number, EvalError> {
    if f.is_finite() {
        Ok(Number::Float(f))
    } else {
        Err(EvalError::overflow(operation))
    }
}

pub fn add(a: Number, b: Number) -> Result<Number, EvalError> {
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        if let Some(sum) = x.checked_add(y) {
            return Ok(Number::Int(sum));
        }
    }
    widened(a, b, "addition", Decimal::checked_add, |x, y| x + y)
}

pub fn subtract(a: Number, b: Number) -> Result<Number, EvalError> {
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        if let Some(diff) = x.checked_sub(y) {
            return Ok(Number::Int(diff));
        }
    }
    widened(a, b, "subtraction", Decimal::checked_sub, |x, y| x - y)
}

pub fn multiply(a: Number, b: Number) -> Result<Number, EvalError> {
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        if let Some(product) = x.checked_mul(y) {
            return Ok(Number::Int(product));
        }
    }
    widened(a, b, "multiplication", Decimal::checked_mul, |x, y| x * y)
}

pub fn divide(a: Number, b: Number) -> Result<Number, EvalError> {
    if b.is_zero() {
        return Err(EvalError::DivisionByZero {
            operation: "divide".to_string(),
        });
    }
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        if x.checked_rem(y) == Some(0) {
            if let Some(quotient) = x.checked_div(y) {
                return Ok(Number::Int(quotient));
            }
        }
    }
    widened(a, b, "division", Decimal::checked_div, |x, y| x / y)
}

/// Remainder carrying the sign of the dividend.
pub fn modulo(a: Number, b: Number) -> Result<Number, EvalError> {
    if b.is_zero() {
        return Err(EvalError::DivisionByZero {
            operation: "modulo".to_string(),
        });
    }
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        // i64::MIN % -1 overflows; the mathematical remainder is zero.
        return Ok(Number::Int(x.checked_rem(y).unwrap_or(0)));
    }
    widened(a, b, "modulo", Decimal::checked_rem, |x, y| x % y)
}

/// Power with real results only.
///
/// Zero has no negative power and a negative base needs an integral
/// exponent; both fail with `Arithmetic`.
pub fn exponentiate(base: Number, exponent: Number) -> Result<Number, EvalError> {
    if base.is_zero() && exponent.is_negative() {
        return Err(EvalError::Arithmetic {
            message: format!("zero raised to negative power {}", exponent),
        });
    }
    if base.is_negative() && !exponent.is_integral() {
        return Err(EvalError::Arithmetic {
            message: format!("negative base {} raised to fractional power {}", base, exponent),
        });
    }
    if let (Number::Int(b), Number::Int(e)) = (base, exponent) {
        if let Some(pow) = u32::try_from(e).ok().and_then(|e| b.checked_pow(e)) {
            return Ok(Number::Int(pow));
        }
    }
    if let (Some(b), Some(e)) = (base.as_decimal(), exponent.as_decimal()) {
        let pow = if e.fract().is_zero() {
            e.to_i64().and_then(|e| b.checked_powi(e))
        } else {
            b.checked_powd(e)
        };
        if let Some(d) = pow {
            return Ok(Number::Decimal(d.normalize()));
        }
    }
    finite(base.to_f64().powf(exponent.to_f64()), "exponentiation")
}

pub fn negate(a: Number) -> Result<Number, EvalError> {
    match a {
        Number::Int(i) => Ok(i
            .checked_neg()
            .map(Number::Int)
            .unwrap_or_else(|| Number::Decimal(-Decimal::from(i)))),
        Number::Decimal(d) => Ok(Number::Decimal(-d)),
        Number::Float(f) => Ok(Number::Float(-f)),
    }
}

pub fn ceil(a: Number) -> Number {
    match a {
        Number::Int(_) => a,
        Number::Decimal(d) => integral(d.ceil()),
        Number::Float(f) => integral_float(f.ceil()),
    }
}

pub fn floor(a: Number) -> Number {
    match a {
        Number::Int(_) => a,
        Number::Decimal(d) => integral(d.floor()),
        Number::Float(f) => integral_float(f.floor()),
    }
}

fn integral(d: Decimal) -> Number {
    d.to_i64()
        .map(Number::Int)
        .unwrap_or_else(|| Number::Decimal(d.normalize()))
}

fn integral_float(f: f64) -> Number {
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Number::Int(f as i64)
    } else {
        Number::Float(f)
    }
}

/// Smallest number of a non-empty collection.
pub fn min(numbers: &[Number]) -> Option<Number> {
    numbers
        .iter()
        .copied()
        .reduce(|a, b| if b.cmp_numeric(a) == Ordering::Less { b } else { a })
}

/// Largest number of a non-empty collection.
pub fn max(numbers: &[Number]) -> Option<Number> {
    numbers
        .iter()
        .copied()
        .reduce(|a, b| if b.cmp_numeric(a) == Ordering::Greater { b } else { a })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
