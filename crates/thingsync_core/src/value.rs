//! Property value union and comparison.

use serde::{Deserialize, Serialize};

/// Type tag of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    /// Boolean.
    Bool,
    /// Signed 32-bit integer.
    Int,
    /// Single-precision float.
    Float,
    /// UTF-8 string.
    Str,
}

/// A property value.
///
/// The enumeration is closed on purpose: the wire protocol knows exactly
/// these shapes, and every encode/decode/compare path matches on it
/// exhaustively. Multi-field object values (colors, locations, ...) are
/// represented as several scalar properties sharing a `base:attribute`
/// name rather than as a nested variant.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean value.
    Bool(bool),
    /// Signed 32-bit integer value.
    Int(i32),
    /// Single-precision float value.
    Float(f32),
    /// UTF-8 string value.
    Str(String),
}

impl PropertyValue {
    /// The type tag of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            PropertyValue::Bool(_) => TypeTag::Bool,
            PropertyValue::Int(_) => TypeTag::Int,
            PropertyValue::Float(_) => TypeTag::Float,
            PropertyValue::Str(_) => TypeTag::Str,
        }
    }

    /// Whether this value is meaningfully different from `other`.
    ///
    /// `min_delta` bounds numeric comparisons: two numbers closer than
    /// the delta count as equal. Booleans and strings compare exactly.
    /// Values of different type tags always differ.
    pub fn differs_from(&self, other: &PropertyValue, min_delta: f64) -> bool {
        match (self, other) {
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a != b,
            #[allow(clippy::cast_precision_loss)]
            (PropertyValue::Int(a), PropertyValue::Int(b)) => {
                a != b && (i64::from(*a) - i64::from(*b)).abs() as f64 >= min_delta
            }
            (PropertyValue::Float(a), PropertyValue::Float(b)) => {
                ieee754_different(f64::from(*a), f64::from(*b), min_delta)
            }
            (PropertyValue::Str(a), PropertyValue::Str(b)) => a != b,
            _ => true,
        }
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            PropertyValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a float, if it is one.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get this value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Int(n)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

/// IEEE-754-aware difference check.
///
/// Two values with identical bit patterns are never different; in
/// particular NaN equals NaN here, so a property stuck at NaN on both
/// sides does not re-publish forever. Otherwise any non-finite or
/// subnormal operand counts as different, and two ordinary numbers
/// differ when they are at least `min_delta` apart.
pub(crate) fn ieee754_different(a: f64, b: f64, min_delta: f64) -> bool {
    use std::num::FpCategory;

    if a.is_nan() && b.is_nan() {
        return false;
    }
    if a.to_bits() == b.to_bits() {
        return false;
    }
    let irregular = |v: f64| {
        matches!(
            v.classify(),
            FpCategory::Nan | FpCategory::Infinite | FpCategory::Subnormal
        )
    };
    irregular(a) || irregular(b) || (a - b).abs() >= min_delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn type_tags() {
        assert_eq!(PropertyValue::Bool(true).type_tag(), TypeTag::Bool);
        assert_eq!(PropertyValue::Int(1).type_tag(), TypeTag::Int);
        assert_eq!(PropertyValue::Float(1.0).type_tag(), TypeTag::Float);
        assert_eq!(PropertyValue::from("x").type_tag(), TypeTag::Str);
    }

    #[test]
    fn bool_and_string_compare_exactly() {
        assert!(PropertyValue::Bool(true).differs_from(&PropertyValue::Bool(false), 0.0));
        assert!(!PropertyValue::Bool(true).differs_from(&PropertyValue::Bool(true), 0.0));
        assert!(PropertyValue::from("a").differs_from(&PropertyValue::from("b"), 0.0));
        assert!(!PropertyValue::from("a").differs_from(&PropertyValue::from("a"), 0.0));
    }

    #[test]
    fn int_delta_threshold() {
        let a = PropertyValue::Int(10);
        assert!(!a.differs_from(&PropertyValue::Int(14), 6.0));
        assert!(a.differs_from(&PropertyValue::Int(18), 6.0));
        assert!(a.differs_from(&PropertyValue::Int(11), 0.0));
        assert!(!a.differs_from(&PropertyValue::Int(10), 0.0));
    }

    #[test]
    fn float_delta_threshold() {
        let a = PropertyValue::Float(1.0);
        assert!(!a.differs_from(&PropertyValue::Float(1.4), 0.5));
        assert!(a.differs_from(&PropertyValue::Float(1.6), 0.5));
    }

    #[test]
    fn nan_equals_nan() {
        let nan = PropertyValue::Float(f32::NAN);
        assert!(!nan.differs_from(&PropertyValue::Float(f32::NAN), 0.0));
        assert!(nan.differs_from(&PropertyValue::Float(1.0), 0.0));
        assert!(PropertyValue::Float(1.0).differs_from(&nan, 0.0));
    }

    #[test]
    fn infinities_always_differ_from_numbers() {
        let inf = PropertyValue::Float(f32::INFINITY);
        assert!(inf.differs_from(&PropertyValue::Float(1.0), 1000.0));
        assert!(!inf.differs_from(&PropertyValue::Float(f32::INFINITY), 0.0));
    }

    #[test]
    fn mismatched_tags_always_differ() {
        assert!(PropertyValue::Bool(true).differs_from(&PropertyValue::Int(1), 0.0));
        assert!(PropertyValue::Int(0).differs_from(&PropertyValue::from(""), 0.0));
    }

    proptest! {
        #[test]
        fn value_never_differs_from_itself(v in proptest::num::f64::NORMAL) {
            prop_assert!(!ieee754_different(v, v, 0.0));
        }

        #[test]
        fn difference_is_symmetric(a in proptest::num::f64::NORMAL, b in proptest::num::f64::NORMAL, d in 0.0f64..10.0) {
            prop_assert_eq!(ieee754_different(a, b, d), ieee754_different(b, a, d));
        }
    }
}
