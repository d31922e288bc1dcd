#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::fmt;

use miette::Diagnostic;
use tern_ast::Span;
use thiserror::Error;

#[derive(Clone, Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum SemanticError {
    #[error("type '{name}' is already declared in this namespace")]
    #[diagnostic(code(tern::sema::duplicate_type))]
    DuplicateType {
        name: String,
        #[label("redeclared here")]
        span: Span,
        #[label("first declared here")]
        previous: Span,
    },

    #[error("function '{name}' is already declared in this namespace")]
    #[diagnostic(code(tern::sema::duplicate_function))]
    DuplicateFunction {
        name: String,
        #[label("redeclared here")]
        span: Span,
        #[label("first declared here")]
        previous: Span,
    },

    #[error("unknown type '{name}'")]
    #[diagnostic(code(tern::sema::unknown_type))]
    UnknownType {
        name: String,
        #[label]
        span: Span,
    },

    #[error("type '{name}' expects {expected} type arguments, got {found}")]
    #[diagnostic(code(tern::sema::generic_arity))]
    GenericArity {
        name: String,
        expected: usize,
        found: usize,
        #[label]
        span: Span,
    },

    #[error("ownership error: {message}")]
    #[diagnostic(
        code(tern::sema::ownership),
        help("weak references are only usable as `Optional<Weak<T>>` where `T` is a class")
    )]
    Ownership {
        message: String,
        #[label]
        span: Span,
    },

    #[error("{what} requires an `unsafe` block")]
    #[diagnostic(code(tern::sema::unsafe_context))]
    UnsafeContext {
        what: &'static str,
        #[label]
        span: Span,
    },

    #[error("invalid cast `{from} {keyword} {to}`: {reason}")]
    #[diagnostic(code(tern::sema::invalid_cast))]
    InvalidCast {
        from: String,
        to: String,
        keyword: &'static str,
        reason: &'static str,
        #[label]
        span: Span,
    },

    #[error("non-exhaustive match on '{enum_name}': missing {list}", list = .missing.join(", "))]
    #[diagnostic(
        code(tern::sema::non_exhaustive_match),
        help("add arms for the missing variants or a final catch-all arm")
    )]
    NonExhaustiveMatch {
        enum_name: String,
        missing: Vec<String>,
        #[label]
        span: Span,
    },

    #[error("unreachable match arm: {covered} already covered by an earlier arm")]
    #[diagnostic(code(tern::sema::unreachable_arm))]
    UnreachableArm {
        covered: String,
        #[label]
        span: Span,
    },

    #[error("pattern does not match variant shape: {message}")]
    #[diagnostic(code(tern::sema::pattern_shape))]
    PatternShape {
        message: String,
        #[label]
        span: Span,
    },

    #[error("failure of '{callee}' escapes '{function}', which is not marked `throws`")]
    #[diagnostic(
        code(tern::sema::propagation),
        help("mark '{function}' with `throws` or handle the failure in `try ... catch`")
    )]
    Propagation {
        callee: String,
        function: String,
        #[label]
        span: Span,
    },

    #[error("invalid enum: {message}")]
    #[diagnostic(code(tern::sema::invalid_enum))]
    InvalidEnum {
        message: String,
        #[label]
        span: Span,
    },

    #[error("constant expression fails at compile time: {message}")]
    #[diagnostic(code(tern::sema::constant_overflow))]
    ConstantOverflow {
        message: String,
        #[label]
        span: Span,
    },

    #[error("invalid index: {message}")]
    #[diagnostic(code(tern::sema::invalid_index))]
    InvalidIndex {
        message: String,
        #[label]
        span: Span,
    },

    #[error("cannot register '{name}': the type registry is closed")]
    #[diagnostic(code(tern::sema::registry_closed))]
    RegistryClosed {
        name: String,
        #[label]
        span: Span,
    },
}

/// Field-less mirror of [`SemanticError`] for matching and counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    DuplicateType,
    DuplicateFunction,
    UnknownType,
    GenericArity,
    Ownership,
    UnsafeContext,
    InvalidCast,
    NonExhaustiveMatch,
    UnreachableArm,
    PatternShape,
    Propagation,
    InvalidEnum,
    ConstantOverflow,
    InvalidIndex,
    RegistryClosed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl SemanticError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SemanticError::DuplicateType { .. } => ErrorKind::DuplicateType,
            SemanticError::DuplicateFunction { .. } => ErrorKind::DuplicateFunction,
            SemanticError::UnknownType { .. } => ErrorKind::UnknownType,
            SemanticError::GenericArity { .. } => ErrorKind::GenericArity,
            SemanticError::Ownership { .. } => ErrorKind::Ownership,
            SemanticError::UnsafeContext { .. } => ErrorKind::UnsafeContext,
            SemanticError::InvalidCast { .. } => ErrorKind::InvalidCast,
            SemanticError::NonExhaustiveMatch { .. } => ErrorKind::NonExhaustiveMatch,
            SemanticError::UnreachableArm { .. } => ErrorKind::UnreachableArm,
            SemanticError::PatternShape { .. } => ErrorKind::PatternShape,
            SemanticError::Propagation { .. } => ErrorKind::Propagation,
            SemanticError::InvalidEnum { .. } => ErrorKind::InvalidEnum,
            SemanticError::ConstantOverflow { .. } => ErrorKind::ConstantOverflow,
            SemanticError::InvalidIndex { .. } => ErrorKind::InvalidIndex,
            SemanticError::RegistryClosed { .. } => ErrorKind::RegistryClosed,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            SemanticError::DuplicateType { span, .. }
            | SemanticError::DuplicateFunction { span, .. }
            | SemanticError::UnknownType { span, .. }
            | SemanticError::GenericArity { span, .. }
            | SemanticError::Ownership { span, .. }
            | SemanticError::UnsafeContext { span, .. }
            | SemanticError::InvalidCast { span, .. }
            | SemanticError::NonExhaustiveMatch { span, .. }
            | SemanticError::UnreachableArm { span, .. }
            | SemanticError::PatternShape { span, .. }
            | SemanticError::Propagation { span, .. }
            | SemanticError::InvalidEnum { span, .. }
            | SemanticError::ConstantOverflow { span, .. }
            | SemanticError::InvalidIndex { span, .. }
            | SemanticError::RegistryClosed { span, .. } => *span,
        }
    }

    pub(crate) fn ownership(message: impl Into<String>, span: Span) -> Self {
        SemanticError::Ownership {
            message: message.into(),
            span,
        }
    }

    pub(crate) fn pattern_shape(message: impl Into<String>, span: Span) -> Self {
        SemanticError::PatternShape {
            message: message.into(),
            span,
        }
    }

    pub(crate) fn invalid_enum(message: impl Into<String>, span: Span) -> Self {
        SemanticError::InvalidEnum {
            message: message.into(),
            span,
        }
    }
}
