#![forbid(unsafe_code)]

//! Generic instantiation by structural substitution, memoised per unit.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SemanticError;
use crate::registry::{FieldDef, MethodSig, PayloadDef, TypeDefKind, TypeRegistry, VariantDef};
use crate::types::{Type, TypeId};

/// A definition with every generic parameter replaced by a concrete argument.
#[derive(Clone, Debug, PartialEq)]
pub struct ConcreteType {
    pub def: TypeId,
    /// Display name, e.g. `Pair<i32, bool>`.
    pub name: String,
    pub args: Vec<Type>,
    pub shape: TypeDefKind,
}

impl ConcreteType {
    pub fn fields(&self) -> &[FieldDef] {
        match &self.shape {
            TypeDefKind::Struct { fields } | TypeDefKind::Class { fields, .. } => fields,
            TypeDefKind::Enum { .. } => &[],
        }
    }

    pub fn variants(&self) -> &[VariantDef] {
        match &self.shape {
            TypeDefKind::Enum { variants, .. } => variants,
            _ => &[],
        }
    }

    pub fn variant(&self, name: &str) -> Option<&VariantDef> {
        self.variants().iter().find(|v| v.name == name)
    }
}

pub struct Instantiator<'r> {
    registry: &'r TypeRegistry,
    cache: HashMap<(TypeId, Vec<Type>), Arc<ConcreteType>>,
}

impl<'r> Instantiator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            cache: HashMap::new(),
        }
    }

    /// Repeated calls with the same definition and arguments return the same
    /// shared instance.
    pub fn instantiate(&mut self, def: TypeId, args: &[Type]) -> Result<Arc<ConcreteType>, SemanticError> {
        let key = (def, args.to_vec());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(hit));
        }

        let td = self.registry.get(def);
        if td.generics.len() != args.len() {
            return Err(SemanticError::GenericArity {
                name: td.qualified_name(),
                expected: td.generics.len(),
                found: args.len(),
                span: td.span,
            });
        }

        let subst: HashMap<String, Type> = td.generics.iter().cloned().zip(args.iter().cloned()).collect();
        let shape = substitute_kind(&td.kind, &subst);
        let name = Type::Adt {
            def,
            name: td.qualified_name(),
            args: args.to_vec(),
        }
        .to_string();

        let concrete = Arc::new(ConcreteType {
            def,
            name,
            args: args.to_vec(),
            shape,
        });
        self.cache.insert(key, Arc::clone(&concrete));
        Ok(concrete)
    }

    /// Instantiates the definition behind an ADT type, if `ty` is one.
    pub fn instantiate_type(&mut self, ty: &Type) -> Option<Arc<ConcreteType>> {
        let (def, args) = ty.adt()?;
        self.instantiate(def, args).ok()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

fn substitute_fields(fields: &[FieldDef], subst: &HashMap<String, Type>) -> Vec<FieldDef> {
    fields
        .iter()
        .map(|f| FieldDef {
            ty: f.ty.substitute(subst),
            ..f.clone()
        })
        .collect()
}

fn substitute_kind(kind: &TypeDefKind, subst: &HashMap<String, Type>) -> TypeDefKind {
    match kind {
        TypeDefKind::Struct { fields } => TypeDefKind::Struct {
            fields: substitute_fields(fields, subst),
        },
        TypeDefKind::Class { fields, methods } => TypeDefKind::Class {
            fields: substitute_fields(fields, subst),
            methods: methods
                .iter()
                .map(|m| {
                    // A method's own parameters shadow the class's.
                    let mut inner = subst.clone();
                    for g in &m.generics {
                        inner.remove(g);
                    }
                    MethodSig {
                        params: m.params.iter().map(|p| p.substitute(&inner)).collect(),
                        ret: m.ret.substitute(&inner),
                        ..m.clone()
                    }
                })
                .collect(),
        },
        TypeDefKind::Enum { underlying, variants } => TypeDefKind::Enum {
            underlying: *underlying,
            variants: variants
                .iter()
                .map(|v| VariantDef {
                    payload: match &v.payload {
                        PayloadDef::Unit => PayloadDef::Unit,
                        PayloadDef::Single(t) => PayloadDef::Single(t.substitute(subst)),
                        PayloadDef::Fields(fields) => PayloadDef::Fields(substitute_fields(fields, subst)),
                    },
                    ..v.clone()
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use tern_ast::build::*;
    use tern_rt::IntType;

    fn registry() -> TypeRegistry {
        let p = program(vec![
            enum_def(
                "MyOptional",
                &["T"],
                None,
                vec![unit_variant("None"), single_variant("Some", ty("T"))],
            ),
            struct_def("Pair", &["A", "B"], vec![field_def("a", ty("A")), field_def("b", ty("B"))]),
        ]);
        let mut reg = TypeRegistry::new();
        reg.declare_program(&p, &mut Diagnostics::new());
        reg.close();
        reg
    }

    #[test]
    fn identical_instantiations_share_one_instance() {
        let reg = registry();
        let opt = reg.lookup(&[], "MyOptional").unwrap();
        let mut inst = Instantiator::new(&reg);
        let a = inst.instantiate(opt, &[Type::Int(IntType::I32)]).unwrap();
        let b = inst.instantiate(opt, &[Type::Int(IntType::I32)]).unwrap();
        let c = inst.instantiate(opt, &[Type::Bool]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(inst.cached(), 2);
    }

    #[test]
    fn payloads_and_fields_are_substituted() {
        let reg = registry();
        let mut inst = Instantiator::new(&reg);
        let opt = inst
            .instantiate(reg.lookup(&[], "MyOptional").unwrap(), &[Type::Str])
            .unwrap();
        assert_eq!(opt.name, "MyOptional<String>");
        assert_eq!(opt.variant("Some").unwrap().payload, PayloadDef::Single(Type::Str));

        let pair = inst
            .instantiate(reg.lookup(&[], "Pair").unwrap(), &[Type::Bool, Type::Str])
            .unwrap();
        let tys: Vec<_> = pair.fields().iter().map(|f| f.ty.clone()).collect();
        assert_eq!(tys, vec![Type::Bool, Type::Str]);
    }

    #[test]
    fn wrong_argument_count_is_an_arity_error() {
        let reg = registry();
        let mut inst = Instantiator::new(&reg);
        let err = inst
            .instantiate(reg.lookup(&[], "Pair").unwrap(), &[Type::Bool])
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::GenericArity);
    }
}
