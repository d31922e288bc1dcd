#![forbid(unsafe_code)]

use crate::cast::Scalar;
use crate::heap::{Handle, WeakHandle};
use crate::numeric::{FloatType, IntType};

/// Runtime value.
///
/// `Clone` copies the representation only. Copying a value in program terms
/// goes through [`crate::Heap::copy_value`], which also retains every strong
/// handle reachable through inline aggregates.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Void,
    Bool(bool),
    Int { ty: IntType, value: i128 },
    Float { ty: FloatType, value: f64 },
    Str(String),
    /// Value-type aggregate; fields live inline.
    Struct(StructValue),
    /// Strong reference to a class instance.
    Class(Handle),
    /// Strong reference to shared array storage.
    Array(Handle),
    Weak(WeakHandle),
    Enum(EnumValue),
    Optional(Option<Box<Value>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    pub name: String,
    pub fields: Vec<(String, Value)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub variant: String,
    pub payload: EnumPayload,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EnumPayload {
    Unit,
    Single(Box<Value>),
    Fields(Vec<(String, Value)>),
}

impl Value {
    /// Integer value, or `None` when `value` does not fit `ty`.
    pub fn int(ty: IntType, value: i128) -> Option<Value> {
        ty.contains(value).then_some(Value::Int { ty, value })
    }

    pub fn float(ty: FloatType, value: f64) -> Value {
        let value = match ty {
            FloatType::F32 => value as f32 as f64,
            FloatType::F64 => value,
        };
        Value::Float { ty, value }
    }

    pub fn none() -> Value {
        Value::Optional(None)
    }

    pub fn some(inner: Value) -> Value {
        Value::Optional(Some(Box::new(inner)))
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Int { value, .. } => Some(Scalar::Int(*value)),
            Value::Float { value, .. } => Some(Scalar::Float(*value)),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            Value::Class(h) | Value::Array(h) => Some(*h),
            _ => None,
        }
    }

    /// Every strong handle owned by this value, including those nested in
    /// inline struct fields, enum payloads and optionals. Weak handles and
    /// the contents of heap objects are not included.
    pub fn strong_handles(&self) -> Vec<Handle> {
        let mut out = Vec::new();
        self.collect_handles(&mut out);
        out
    }

    fn collect_handles(&self, out: &mut Vec<Handle>) {
        match self {
            Value::Class(h) | Value::Array(h) => out.push(*h),
            Value::Struct(s) => {
                for (_, v) in &s.fields {
                    v.collect_handles(out);
                }
            }
            Value::Enum(e) => match &e.payload {
                EnumPayload::Unit => {}
                EnumPayload::Single(v) => v.collect_handles(out),
                EnumPayload::Fields(fields) => {
                    for (_, v) in fields {
                        v.collect_handles(out);
                    }
                }
            },
            Value::Optional(Some(v)) => v.collect_handles(out),
            Value::Optional(None)
            | Value::Void
            | Value::Bool(_)
            | Value::Int { .. }
            | Value::Float { .. }
            | Value::Str(_)
            | Value::Weak(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_constructor_checks_range() {
        assert!(Value::int(IntType::U8, 256).is_none());
        assert_eq!(
            Value::int(IntType::I8, -128),
            Some(Value::Int {
                ty: IntType::I8,
                value: -128
            })
        );
    }

    #[test]
    fn strong_handles_reach_through_inline_aggregates() {
        let a = Handle::new(0, 0);
        let b = Handle::new(1, 0);
        let v = Value::Struct(StructValue {
            name: "Pair".into(),
            fields: vec![
                ("left".into(), Value::Class(a)),
                ("right".into(), Value::some(Value::Array(b))),
                ("back".into(), Value::Weak(WeakHandle::new(a))),
            ],
        });
        assert_eq!(v.strong_handles(), vec![a, b]);
    }
}
