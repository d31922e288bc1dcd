#![forbid(unsafe_code)]

//! The four numeric cast forms.
//!
//! `as?` and `as!` share one convertibility test ([`convert_exact`]); they
//! differ only in what happens on failure. `as truncated` and `as saturated`
//! are total.

use std::fmt;

use crate::fault::Fault;
use crate::numeric::{FloatType, IntType, NumericType, wrap_to};

/// A numeric runtime value stripped of its declared type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Int(i128),
    Float(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
        }
    }
}

fn round_to(ty: FloatType, v: f64) -> f64 {
    match ty {
        FloatType::F32 => v as f32 as f64,
        FloatType::F64 => v,
    }
}

/// The value of `value` in `target` when it is representable there without
/// changing it.
///
/// Integers must lie in the target range. Floats converted to integers must be
/// finite and integral. Integers converted to floats must survive the round
/// trip. A finite float narrowed to `f32` must lie within `f32`'s finite
/// range; rounding of the mantissa is accepted. NaN and the infinities exist
/// in both float types and carry over unchanged.
pub fn convert_exact(value: Scalar, target: NumericType) -> Option<Scalar> {
    match (value, target) {
        (Scalar::Int(v), NumericType::Int(ty)) => ty.contains(v).then_some(Scalar::Int(v)),
        (Scalar::Float(v), NumericType::Int(ty)) => {
            if !v.is_finite() || v.fract() != 0.0 {
                return None;
            }
            let i = v as i128;
            ty.contains(i).then_some(Scalar::Int(i))
        }
        (Scalar::Int(v), NumericType::Float(ty)) => {
            let f = round_to(ty, v as f64);
            (f as i128 == v).then_some(Scalar::Float(f))
        }
        (Scalar::Float(v), NumericType::Float(ty)) => {
            if v.is_finite() && v.abs() > ty.max() {
                None
            } else {
                Some(Scalar::Float(round_to(ty, v)))
            }
        }
    }
}

/// `as?`: absent when the value is not representable.
pub fn fallible_cast(value: Scalar, target: NumericType) -> Option<Scalar> {
    convert_exact(value, target)
}

/// `as!`: faults when the value is not representable.
pub fn asserting_cast(value: Scalar, target: NumericType) -> Result<Scalar, Fault> {
    convert_exact(value, target).ok_or_else(|| Fault::CastFailed {
        value: value.to_string(),
        target: target.to_string(),
    })
}

/// `as truncated`: keeps the low bits of the destination width. Floats are
/// first truncated toward zero; NaN becomes 0.
pub fn truncating_cast(value: Scalar, target: NumericType) -> Scalar {
    match (value, target) {
        (Scalar::Int(v), NumericType::Int(ty)) => Scalar::Int(wrap_to(ty, v)),
        (Scalar::Float(v), NumericType::Int(ty)) => {
            if v.is_nan() {
                Scalar::Int(0)
            } else {
                Scalar::Int(wrap_to(ty, v.trunc() as i128))
            }
        }
        (Scalar::Int(v), NumericType::Float(ty)) => Scalar::Float(round_to(ty, v as f64)),
        (Scalar::Float(v), NumericType::Float(ty)) => Scalar::Float(round_to(ty, v)),
    }
}

fn clamp_int(ty: IntType, v: i128) -> i128 {
    v.clamp(ty.min_value(), ty.max_value())
}

/// `as saturated`: clamps to the destination range; NaN becomes 0.
pub fn saturating_cast(value: Scalar, target: NumericType) -> Scalar {
    match (value, target) {
        (Scalar::Int(v), NumericType::Int(ty)) => Scalar::Int(clamp_int(ty, v)),
        (Scalar::Float(v), NumericType::Int(ty)) => {
            if v.is_nan() {
                Scalar::Int(0)
            } else {
                // `as i128` saturates at the i128 bounds, which lie outside
                // every supported width.
                Scalar::Int(clamp_int(ty, v.trunc() as i128))
            }
        }
        (Scalar::Int(v), NumericType::Float(ty)) => Scalar::Float(round_to(ty, v as f64)),
        (Scalar::Float(v), NumericType::Float(ty)) => {
            if v.is_nan() {
                Scalar::Float(0.0)
            } else {
                Scalar::Float(round_to(ty, v.clamp(-ty.max(), ty.max())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const U8: NumericType = NumericType::Int(IntType::U8);
    const I8: NumericType = NumericType::Int(IntType::I8);
    const F32: NumericType = NumericType::Float(FloatType::F32);

    #[test]
    fn fallible_cast_rejects_out_of_range() {
        assert_eq!(fallible_cast(Scalar::Int(300), U8), None);
        assert_eq!(fallible_cast(Scalar::Int(200), U8), Some(Scalar::Int(200)));
        assert_eq!(fallible_cast(Scalar::Int(-1), U8), None);
    }

    #[test]
    fn float_to_int_must_be_integral() {
        assert_eq!(fallible_cast(Scalar::Float(2.5), I8), None);
        assert_eq!(fallible_cast(Scalar::Float(-3.0), I8), Some(Scalar::Int(-3)));
        assert_eq!(fallible_cast(Scalar::Float(f64::NAN), I8), None);
    }

    #[test]
    fn asserting_cast_faults_with_value_and_target() {
        let err = asserting_cast(Scalar::Int(300), U8).unwrap_err();
        assert_eq!(
            err,
            Fault::CastFailed {
                value: "300".into(),
                target: "u8".into()
            }
        );
    }

    #[test]
    fn truncation_keeps_low_bits() {
        assert_eq!(truncating_cast(Scalar::Int(300), U8), Scalar::Int(44));
        assert_eq!(truncating_cast(Scalar::Int(255), I8), Scalar::Int(-1));
        assert_eq!(truncating_cast(Scalar::Float(-1.9), U8), Scalar::Int(255));
        assert_eq!(truncating_cast(Scalar::Float(f64::NAN), U8), Scalar::Int(0));
    }

    #[test]
    fn saturation_clamps() {
        assert_eq!(saturating_cast(Scalar::Int(300), U8), Scalar::Int(255));
        assert_eq!(saturating_cast(Scalar::Int(-300), I8), Scalar::Int(-128));
        assert_eq!(saturating_cast(Scalar::Float(1e300), I8), Scalar::Int(127));
        assert_eq!(saturating_cast(Scalar::Float(f64::NAN), I8), Scalar::Int(0));
        assert_eq!(
            saturating_cast(Scalar::Float(1e300), F32),
            Scalar::Float(f32::MAX as f64)
        );
    }

    #[test]
    fn narrowing_float_outside_f32_fails() {
        assert_eq!(fallible_cast(Scalar::Float(1e300), F32), None);
        assert_eq!(fallible_cast(Scalar::Float(1.5), F32), Some(Scalar::Float(1.5)));
    }

    #[test]
    fn non_finite_floats_carry_over_between_float_types() {
        assert_eq!(
            fallible_cast(Scalar::Float(f64::INFINITY), F32),
            Some(Scalar::Float(f64::INFINITY))
        );
        assert_eq!(
            asserting_cast(Scalar::Float(f64::NEG_INFINITY), F32),
            Ok(Scalar::Float(f64::NEG_INFINITY))
        );
        match fallible_cast(Scalar::Float(f64::NAN), F32) {
            Some(Scalar::Float(v)) => assert!(v.is_nan()),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
