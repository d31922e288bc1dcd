#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fmt;

use tern_rt::{FloatType, IntType, NumericType};

/// Index of a definition in the [`crate::TypeRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Resolved semantic type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// Resolution failed; already reported. Checks treat it permissively.
    Unknown,
    Void,
    Bool,
    Int(IntType),
    Float(FloatType),
    Str,
    /// A registered struct, class or enum applied to its arguments.
    Adt {
        def: TypeId,
        name: String,
        args: Vec<Type>,
    },
    /// Generic parameter in scope.
    Param(String),
    Optional(Box<Type>),
    Weak(Box<Type>),
    RawPtr(Box<Type>),
    Array(Box<Type>),
}

/// Builtin type constructors taking exactly one argument.
pub const BUILTIN_WRAPPERS: [&str; 4] = ["Optional", "Weak", "RawPtr", "Array"];

impl Type {
    /// Builtin type with no arguments.
    pub fn scalar(name: &str) -> Option<Type> {
        match name {
            "void" => Some(Type::Void),
            "bool" => Some(Type::Bool),
            "String" => Some(Type::Str),
            _ => NumericType::from_name(name).map(|n| match n {
                NumericType::Int(t) => Type::Int(t),
                NumericType::Float(t) => Type::Float(t),
            }),
        }
    }

    /// Builtin wrapper applied to `arg`.
    pub fn wrapper(name: &str, arg: Type) -> Option<Type> {
        let arg = Box::new(arg);
        match name {
            "Optional" => Some(Type::Optional(arg)),
            "Weak" => Some(Type::Weak(arg)),
            "RawPtr" => Some(Type::RawPtr(arg)),
            "Array" => Some(Type::Array(arg)),
            _ => None,
        }
    }

    pub fn optional(inner: Type) -> Type {
        Type::Optional(Box::new(inner))
    }

    pub fn numeric(&self) -> Option<NumericType> {
        match self {
            Type::Int(t) => Some(NumericType::Int(*t)),
            Type::Float(t) => Some(NumericType::Float(*t)),
            _ => None,
        }
    }

    pub fn int(&self) -> Option<IntType> {
        match self {
            Type::Int(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn adt(&self) -> Option<(TypeId, &[Type])> {
        match self {
            Type::Adt { def, args, .. } => Some((*def, args)),
            _ => None,
        }
    }

    /// `Optional<Weak<T>>`
    pub fn is_weak_optional(&self) -> bool {
        matches!(self, Type::Optional(inner) if matches!(**inner, Type::Weak(_)))
    }

    /// Replaces generic parameters by name. Parameters not in `subst` are
    /// left alone.
    pub fn substitute(&self, subst: &HashMap<String, Type>) -> Type {
        match self {
            Type::Param(name) => subst.get(name).cloned().unwrap_or_else(|| self.clone()),
            Type::Adt { def, name, args } => Type::Adt {
                def: *def,
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(subst)).collect(),
            },
            Type::Optional(t) => Type::Optional(Box::new(t.substitute(subst))),
            Type::Weak(t) => Type::Weak(Box::new(t.substitute(subst))),
            Type::RawPtr(t) => Type::RawPtr(Box::new(t.substitute(subst))),
            Type::Array(t) => Type::Array(Box::new(t.substitute(subst))),
            Type::Unknown | Type::Void | Type::Bool | Type::Int(_) | Type::Float(_) | Type::Str => {
                self.clone()
            }
        }
    }

    /// True if any generic parameter remains.
    pub fn has_params(&self) -> bool {
        match self {
            Type::Param(_) => true,
            Type::Adt { args, .. } => args.iter().any(Type::has_params),
            Type::Optional(t) | Type::Weak(t) | Type::RawPtr(t) | Type::Array(t) => t.has_params(),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => f.write_str("<unknown>"),
            Type::Void => f.write_str("void"),
            Type::Bool => f.write_str("bool"),
            Type::Int(t) => write!(f, "{t}"),
            Type::Float(t) => write!(f, "{t}"),
            Type::Str => f.write_str("String"),
            Type::Param(p) => f.write_str(p),
            Type::Adt { name, args, .. } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    let args_s = args.iter().map(Type::to_string).collect::<Vec<_>>().join(", ");
                    write!(f, "<{args_s}>")?;
                }
                Ok(())
            }
            Type::Optional(t) => write!(f, "Optional<{t}>"),
            Type::Weak(t) => write!(f, "Weak<{t}>"),
            Type::RawPtr(t) => write!(f, "RawPtr<{t}>"),
            Type::Array(t) => write!(f, "Array<{t}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_sized_names_are_64_bit() {
        assert_eq!(Type::scalar("usize"), Some(Type::Int(IntType::U64)));
        assert_eq!(Type::scalar("isize"), Some(Type::Int(IntType::I64)));
        assert_eq!(Type::scalar("Widget"), None);
    }

    #[test]
    fn substitution_reaches_nested_wrappers() {
        let t = Type::optional(Type::Array(Box::new(Type::Param("T".into()))));
        let subst = HashMap::from([("T".to_string(), Type::Bool)]);
        assert_eq!(t.substitute(&subst).to_string(), "Optional<Array<bool>>");
        assert!(t.has_params());
        assert!(!t.substitute(&subst).has_params());
    }
}
