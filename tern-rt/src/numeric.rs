#![forbid(unsafe_code)]

use std::fmt;

use crate::fault::Fault;

/// Fixed-width integer type. Values of every supported width are carried in
/// an `i128`, which holds any intermediate result of a single 64-bit
/// add/sub/neg/div exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntType {
    bits: u8,
    signed: bool,
}

impl IntType {
    pub const I8: IntType = IntType::new(8, true);
    pub const I16: IntType = IntType::new(16, true);
    pub const I32: IntType = IntType::new(32, true);
    pub const I64: IntType = IntType::new(64, true);
    pub const U8: IntType = IntType::new(8, false);
    pub const U16: IntType = IntType::new(16, false);
    pub const U32: IntType = IntType::new(32, false);
    pub const U64: IntType = IntType::new(64, false);

    pub const ALL: [IntType; 8] = [
        IntType::I8,
        IntType::I16,
        IntType::I32,
        IntType::I64,
        IntType::U8,
        IntType::U16,
        IntType::U32,
        IntType::U64,
    ];

    const fn new(bits: u8, signed: bool) -> Self {
        Self { bits, signed }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "i8" => IntType::I8,
            "i16" => IntType::I16,
            "i32" => IntType::I32,
            "i64" | "isize" => IntType::I64,
            "u8" => IntType::U8,
            "u16" => IntType::U16,
            "u32" => IntType::U32,
            "u64" | "usize" => IntType::U64,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match (self.bits, self.signed) {
            (8, true) => "i8",
            (16, true) => "i16",
            (32, true) => "i32",
            (64, true) => "i64",
            (8, false) => "u8",
            (16, false) => "u16",
            (32, false) => "u32",
            _ => "u64",
        }
    }

    pub fn bits(self) -> u8 {
        self.bits
    }

    pub fn is_signed(self) -> bool {
        self.signed
    }

    pub fn min_value(self) -> i128 {
        if self.signed {
            -(1i128 << (self.bits - 1))
        } else {
            0
        }
    }

    pub fn max_value(self) -> i128 {
        if self.signed {
            (1i128 << (self.bits - 1)) - 1
        } else {
            (1i128 << self.bits) - 1
        }
    }

    pub fn contains(self, value: i128) -> bool {
        value >= self.min_value() && value <= self.max_value()
    }

    /// Every value of `other` is representable in `self`.
    pub fn contains_range_of(self, other: IntType) -> bool {
        self.min_value() <= other.min_value() && self.max_value() >= other.max_value()
    }
}

impl fmt::Display for IntType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloatType {
    F32,
    F64,
}

impl FloatType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "f32" => Some(FloatType::F32),
            "f64" => Some(FloatType::F64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FloatType::F32 => "f32",
            FloatType::F64 => "f64",
        }
    }

    pub fn max(self) -> f64 {
        match self {
            FloatType::F32 => f32::MAX as f64,
            FloatType::F64 => f64::MAX,
        }
    }
}

impl fmt::Display for FloatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumericType {
    Int(IntType),
    Float(FloatType),
}

impl NumericType {
    pub fn from_name(name: &str) -> Option<Self> {
        IntType::from_name(name)
            .map(NumericType::Int)
            .or_else(|| FloatType::from_name(name).map(NumericType::Float))
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericType::Int(t) => t.fmt(f),
            NumericType::Float(t) => t.fmt(f),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
}

impl IntOp {
    pub fn symbol(self) -> &'static str {
        match self {
            IntOp::Add => "+",
            IntOp::Sub => "-",
            IntOp::Mul => "*",
            IntOp::Div => "/",
            IntOp::Rem => "%",
            IntOp::Neg => "neg",
        }
    }

    pub fn can_divide_by_zero(self) -> bool {
        matches!(self, IntOp::Div | IntOp::Rem)
    }
}

impl fmt::Display for IntOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Default arithmetic: any result outside `ty` is an `IntegerOverflow` fault.
///
/// Operands must already be in range for `ty`. `rhs` is ignored for `Neg`.
/// `MIN % -1` counts as overflow, matching the quotient it implies.
pub fn checked_binary(op: IntOp, ty: IntType, lhs: i128, rhs: i128) -> Result<i128, Fault> {
    if op.can_divide_by_zero() && rhs == 0 {
        return Err(Fault::DivideByZero { op, ty });
    }
    let overflow = Fault::IntegerOverflow { op, ty };
    let raw = match op {
        IntOp::Add => lhs.checked_add(rhs),
        IntOp::Sub => lhs.checked_sub(rhs),
        IntOp::Mul => lhs.checked_mul(rhs),
        IntOp::Div => lhs.checked_div(rhs),
        IntOp::Rem => {
            let quotient = lhs.checked_div(rhs).ok_or_else(|| overflow.clone())?;
            if !ty.contains(quotient) {
                return Err(overflow);
            }
            lhs.checked_rem(rhs)
        }
        IntOp::Neg => lhs.checked_neg(),
    };
    match raw {
        Some(v) if ty.contains(v) => Ok(v),
        _ => Err(overflow),
    }
}

pub fn checked_neg(ty: IntType, value: i128) -> Result<i128, Fault> {
    checked_binary(IntOp::Neg, ty, value, 0)
}

/// The explicitly requested wrapping form: two's-complement wrap-around.
/// Division by zero still faults.
pub fn wrapping_binary(op: IntOp, ty: IntType, lhs: i128, rhs: i128) -> Result<i128, Fault> {
    if op.can_divide_by_zero() && rhs == 0 {
        return Err(Fault::DivideByZero { op, ty });
    }
    let raw = match op {
        IntOp::Add => lhs.wrapping_add(rhs),
        IntOp::Sub => lhs.wrapping_sub(rhs),
        IntOp::Mul => lhs.wrapping_mul(rhs),
        IntOp::Div => lhs.wrapping_div(rhs),
        IntOp::Rem => lhs.wrapping_rem(rhs),
        IntOp::Neg => lhs.wrapping_neg(),
    };
    Ok(wrap_to(ty, raw))
}

/// Keeps the low `ty.bits()` bits of `value` and reinterprets them with
/// `ty`'s signedness.
pub fn wrap_to(ty: IntType, value: i128) -> i128 {
    let bits = u32::from(ty.bits());
    let mask: u128 = (1u128 << bits) - 1;
    let low = (value as u128) & mask;
    if ty.is_signed() && (low >> (bits - 1)) & 1 == 1 {
        low as i128 - (1i128 << bits)
    } else {
        low as i128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_match_two_complement_widths() {
        assert_eq!(IntType::I8.min_value(), -128);
        assert_eq!(IntType::I8.max_value(), 127);
        assert_eq!(IntType::U8.max_value(), 255);
        assert_eq!(IntType::I64.min_value(), i64::MIN as i128);
        assert_eq!(IntType::U64.max_value(), u64::MAX as i128);
    }

    #[test]
    fn checked_add_faults_instead_of_wrapping() {
        let err = checked_binary(IntOp::Add, IntType::I32, i32::MAX as i128, 1).unwrap_err();
        assert!(err.is_overflow());
        assert_eq!(checked_binary(IntOp::Add, IntType::I32, 40, 2), Ok(42));
    }

    #[test]
    fn unsigned_subtraction_below_zero_overflows() {
        assert!(checked_binary(IntOp::Sub, IntType::U8, 0, 1).unwrap_err().is_overflow());
    }

    #[test]
    fn min_div_and_rem_by_minus_one_overflow() {
        let min = IntType::I32.min_value();
        assert!(checked_binary(IntOp::Div, IntType::I32, min, -1).unwrap_err().is_overflow());
        assert!(checked_binary(IntOp::Rem, IntType::I32, min, -1).unwrap_err().is_overflow());
        assert!(checked_neg(IntType::I32, min).unwrap_err().is_overflow());
    }

    #[test]
    fn division_by_zero_is_its_own_fault() {
        assert_eq!(
            checked_binary(IntOp::Div, IntType::U16, 1, 0),
            Err(Fault::DivideByZero {
                op: IntOp::Div,
                ty: IntType::U16
            })
        );
        assert!(wrapping_binary(IntOp::Rem, IntType::U16, 1, 0).is_err());
    }

    #[test]
    fn wrapping_forms_wrap() {
        assert_eq!(wrapping_binary(IntOp::Add, IntType::U8, 255, 1), Ok(0));
        assert_eq!(wrapping_binary(IntOp::Add, IntType::I8, 127, 1), Ok(-128));
        assert_eq!(
            wrapping_binary(IntOp::Mul, IntType::U64, u64::MAX as i128, u64::MAX as i128),
            Ok(1)
        );
    }

    #[test]
    fn wrap_to_reinterprets_sign() {
        assert_eq!(wrap_to(IntType::I8, 200), -56);
        assert_eq!(wrap_to(IntType::U8, -1), 255);
        assert_eq!(wrap_to(IntType::U16, 0x1_2345), 0x2345);
    }
}
