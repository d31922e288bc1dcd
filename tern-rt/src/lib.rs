#![forbid(unsafe_code)]

//! Runtime model for checked Tern programs.
//!
//! Generated code calls into these operations at the points the safety core
//! marked: checked arithmetic, the cast forms, bounds checks and the
//! reference-counted heap. The compile-time folder in `tern-core` uses the
//! same functions so static and dynamic results agree.

pub mod bounds;
pub mod cast;
pub mod fault;
pub mod heap;
pub mod numeric;
pub mod value;

pub use bounds::check_index;
pub use cast::{Scalar, asserting_cast, convert_exact, fallible_cast, saturating_cast, truncating_cast};
pub use fault::Fault;
pub use heap::{Handle, Heap, Object, Release, WeakHandle};
pub use numeric::{
    FloatType, IntOp, IntType, NumericType, checked_binary, checked_neg, wrap_to, wrapping_binary,
};
pub use value::{EnumPayload, EnumValue, StructValue, Value};
