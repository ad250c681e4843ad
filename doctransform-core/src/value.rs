//! Normalised views over BSON values used by the field transforms.
//!
//! [`Numeric`] gives the arithmetic transforms a single type for BSON's three number
//! representations. [`ValueKey`] gives array elements a hashable identity so that
//! membership checks can run through a `HashSet`.

use bson::Bson;
use std::cmp::Ordering;

use crate::error::{DocumentTransformError, DocumentTransformResult};

/// A BSON number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// 64-bit float
    Double(f64),
}

impl Numeric {
    /// Returns the numeric view of `value`, or `None` for every non-number (booleans included).
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::Int32(value) => Some(Numeric::Int32(*value)),
            Bson::Int64(value) => Some(Numeric::Int64(*value)),
            Bson::Double(value) => Some(Numeric::Double(*value)),
            _ => None,
        }
    }

    /// The additive identity used when a field has no numeric value yet.
    pub fn zero() -> Self {
        Numeric::Int32(0)
    }

    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int32(value) => value as f64,
            Numeric::Int64(value) => value as f64,
            Numeric::Double(value) => value,
        }
    }

    fn as_i64(self) -> Option<i64> {
        match self {
            Numeric::Int32(value) => Some(i64::from(value)),
            Numeric::Int64(value) => Some(value),
            Numeric::Double(_) => None,
        }
    }

    /// Adds two numbers.
    ///
    /// The sum is a float if either side is a float. Integer sums stay 32-bit while both
    /// sides are 32-bit and the result fits, widen to 64-bit otherwise, and saturate at the
    /// 64-bit bounds.
    pub fn add(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Int32(a), Numeric::Int32(b)) => match a.checked_add(b) {
                Some(sum) => Numeric::Int32(sum),
                None => Numeric::Int64(i64::from(a) + i64::from(b)),
            },
            (Numeric::Double(a), b) => Numeric::Double(a + b.as_f64()),
            (a, Numeric::Double(b)) => Numeric::Double(a.as_f64() + b),
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => Numeric::Int64(a.saturating_add(b)),
                _ => Numeric::Double(a.as_f64() + b.as_f64()),
            },
        }
    }

    /// Compares two numbers by value, exactly for integers and as floats otherwise.
    ///
    /// Returns `None` when either side is NaN.
    pub fn compare(self, other: Numeric) -> Option<Ordering> {
        match (self.as_i64(), other.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl From<Numeric> for Bson {
    fn from(value: Numeric) -> Self {
        match value {
            Numeric::Int32(value) => Bson::Int32(value),
            Numeric::Int64(value) => Bson::Int64(value),
            Numeric::Double(value) => Bson::Double(value),
        }
    }
}

/// Hashable identity of a scalar BSON value.
///
/// Numbers are keyed by value, so `Int32(1)`, `Int64(1)` and `Double(1.0)` are the same
/// element. Arrays and documents have no key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey<'a> {
    /// `null`.
    Null,
    /// A boolean. Never equal to a number, so `true` and `1` are different keys.
    Bool(bool),
    /// Any integer, or a float with an integral value inside the `i64` range.
    Int(i64),
    /// Bit pattern of a float with a fractional part or outside the `i64` range
    Float(u64),
    /// A string, compared by content.
    String(&'a str),
    /// A datetime, as milliseconds since the Unix epoch.
    DateTime(i64),
    /// An object id, as its raw bytes.
    ObjectId([u8; 12]),
}

impl<'a> ValueKey<'a> {
    /// Computes the key of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentTransformError::UnhashableElement`] for arrays, documents and any
    /// other BSON type without a stable scalar identity.
    pub fn of(value: &'a Bson) -> DocumentTransformResult<Self> {
        match value {
            Bson::Null => Ok(ValueKey::Null),
            Bson::Boolean(value) => Ok(ValueKey::Bool(*value)),
            Bson::Int32(value) => Ok(ValueKey::Int(i64::from(*value))),
            Bson::Int64(value) => Ok(ValueKey::Int(*value)),
            Bson::Double(value) => Ok(float_key(*value)),
            Bson::String(value) => Ok(ValueKey::String(value)),
            Bson::DateTime(value) => Ok(ValueKey::DateTime(value.timestamp_millis())),
            Bson::ObjectId(value) => Ok(ValueKey::ObjectId(value.bytes())),
            other => Err(DocumentTransformError::UnhashableElement(format!(
                "{:?} values cannot be compared by membership",
                other.element_type()
            ))),
        }
    }
}

fn float_key(value: f64) -> ValueKey<'static> {
    // 2^63 as f64; every integral float strictly inside this range converts exactly.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    if value.fract() == 0.0 && value >= -BOUND && value < BOUND {
        ValueKey::Int(value as i64)
    } else {
        ValueKey::Float(value.to_bits())
    }
}
