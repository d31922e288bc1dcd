#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use crate::numeric::{IntOp, IntType};

/// Unrecoverable runtime fault.
///
/// A fault terminates the running program at the fault point. Runtime entry
/// points return `Result<_, Fault>` so the host can report before exiting;
/// nothing may resume execution after receiving one.
#[derive(Clone, Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum Fault {
    #[error("integer overflow: `{op}` on {ty} produced a value outside [{min}, {max}]", min = .ty.min_value(), max = .ty.max_value())]
    #[diagnostic(code(tern::rt::integer_overflow))]
    IntegerOverflow { op: IntOp, ty: IntType },

    #[error("division by zero in `{op}` on {ty}")]
    #[diagnostic(code(tern::rt::divide_by_zero))]
    DivideByZero { op: IntOp, ty: IntType },

    #[error("index {index} out of bounds for length {len}")]
    #[diagnostic(code(tern::rt::bounds))]
    BoundsError { index: i128, len: usize },

    #[error("cast of {value} to {target} failed")]
    #[diagnostic(code(tern::rt::cast_failed), help("use `as?` to get an absent value instead of a fault"))]
    CastFailed { value: String, target: String },

    #[error("handle #{index} refers to a destroyed object")]
    #[diagnostic(code(tern::rt::dangling_handle))]
    DanglingHandle { index: u32 },

    #[error("object kind mismatch: expected {expected}")]
    #[diagnostic(code(tern::rt::kind_mismatch))]
    KindMismatch { expected: &'static str },

    #[error("no field named '{field}'")]
    #[diagnostic(code(tern::rt::unknown_field))]
    UnknownField { field: String },
}

impl Fault {
    /// Process exit status used when a fault terminates the program.
    pub const EXIT_STATUS: i32 = 134;

    /// Reports the fault on stderr and terminates without unwinding.
    pub fn abort(self) -> ! {
        eprintln!("{:?}", miette::Report::new(self));
        std::process::exit(Self::EXIT_STATUS)
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, Fault::IntegerOverflow { .. })
    }
}
