#![forbid(unsafe_code)]

mod annotate;
mod arith;
mod body;
mod checker;
mod config;
mod diagnostics;
mod error;
mod exhaustive;
mod instantiate;
mod ownership;
mod propagation;
mod registry;
mod resolve;
mod signatures;
mod types;

pub use annotate::{Annotations, BindingDecl, BindingId, CallRoute, CastCheck, CheckMarker, MatchPlan, Obligation};
pub use arith::cast_check;
pub use body::{Body, collect_bodies};
pub use checker::{Analysis, Checker};
pub use config::CheckConfig;
pub use diagnostics::Diagnostics;
pub use error::{ErrorKind, SemanticError};
pub use exhaustive::{MatchCoverage, check_match};
pub use instantiate::{ConcreteType, Instantiator};
pub use ownership::{CountedPaths, OwnershipKind, OwnershipTable, check_weak_wrapping};
pub use registry::{
    FieldDef, MethodSig, PayloadDef, TypeDef, TypeDefKind, TypeRegistry, TypeScope, VariantDef,
    assign_enum_values,
};
pub use signatures::{FnSig, SignatureTable};
pub use types::{Type, TypeId};
