#![forbid(unsafe_code)]

//! Type Registry: the single owner of struct, class and enum definitions.
//!
//! Registration is a phase. [`TypeRegistry::declare_program`] registers every
//! declaration first and fills in members second, so definitions may refer
//! to each other regardless of order. After [`TypeRegistry::close`] the
//! registry is read-only and can be shared across threads.

use std::collections::{HashMap, HashSet};

use tern_ast::{Decl, EnumDef, Program, Span, TypeRef, VariantPayload};
use tern_rt::IntType;

use crate::diagnostics::Diagnostics;
use crate::error::SemanticError;
use crate::types::{BUILTIN_WRAPPERS, Type, TypeId};

#[derive(Clone, Debug, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub namespace: Vec<String>,
    pub span: Span,
    pub generics: Vec<String>,
    pub kind: TypeDefKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeDefKind {
    Struct {
        fields: Vec<FieldDef>,
    },
    Class {
        fields: Vec<FieldDef>,
        methods: Vec<MethodSig>,
    },
    Enum {
        underlying: Option<IntType>,
        variants: Vec<VariantDef>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub generics: Vec<String>,
    pub params: Vec<Type>,
    pub ret: Type,
    pub throws: bool,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariantDef {
    pub name: String,
    pub span: Span,
    /// `= literal` as written.
    pub explicit: Option<i128>,
    /// Integral value; set for enums with an underlying type.
    pub discriminant: Option<i128>,
    pub payload: PayloadDef,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PayloadDef {
    Unit,
    Single(Type),
    Fields(Vec<FieldDef>),
}

impl PayloadDef {
    pub fn types(&self) -> Vec<&Type> {
        match self {
            PayloadDef::Unit => vec![],
            PayloadDef::Single(t) => vec![t],
            PayloadDef::Fields(fields) => fields.iter().map(|f| &f.ty).collect(),
        }
    }
}

impl TypeDef {
    pub fn qualified_name(&self) -> String {
        let mut out = String::new();
        for seg in &self.namespace {
            out.push_str(seg);
            out.push_str("::");
        }
        out.push_str(&self.name);
        out
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeDefKind::Class { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeDefKind::Enum { .. })
    }

    pub fn fields(&self) -> &[FieldDef] {
        match &self.kind {
            TypeDefKind::Struct { fields } | TypeDefKind::Class { fields, .. } => fields,
            TypeDefKind::Enum { .. } => &[],
        }
    }

    pub fn variants(&self) -> &[VariantDef] {
        match &self.kind {
            TypeDefKind::Enum { variants, .. } => variants,
            _ => &[],
        }
    }

    pub fn variant(&self, name: &str) -> Option<&VariantDef> {
        self.variants().iter().find(|v| v.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSig> {
        match &self.kind {
            TypeDefKind::Class { methods, .. } => methods.iter().find(|m| m.name == name),
            _ => None,
        }
    }

    /// Shell used while members are still unresolved.
    fn shell(name: String, namespace: Vec<String>, span: Span, generics: Vec<String>, kind: TypeDefKind) -> Self {
        Self {
            name,
            namespace,
            span,
            generics,
            kind,
        }
    }
}

/// Where a type reference is being resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeScope {
    pub namespace: Vec<String>,
    pub generics: Vec<String>,
}

impl TypeScope {
    pub fn new(namespace: Vec<String>, generics: Vec<String>) -> Self {
        Self {
            namespace,
            generics,
        }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn with_generics(&self, extra: &[String]) -> Self {
        let mut generics = self.generics.clone();
        generics.extend(extra.iter().cloned());
        Self {
            namespace: self.namespace.clone(),
            generics,
        }
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    defs: Vec<TypeDef>,
    by_name: HashMap<(Vec<String>, String), TypeId>,
    closed: bool,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition as given. Fails if the name already exists in the
    /// same namespace or the registry is closed.
    pub fn register(&mut self, def: TypeDef) -> Result<TypeId, SemanticError> {
        if self.closed {
            return Err(SemanticError::RegistryClosed {
                name: def.qualified_name(),
                span: def.span,
            });
        }
        let key = (def.namespace.clone(), def.name.clone());
        if let Some(prev) = self.by_name.get(&key) {
            return Err(SemanticError::DuplicateType {
                name: def.name.clone(),
                span: def.span,
                previous: self.defs[prev.index()].span,
            });
        }
        let id = TypeId(self.defs.len() as u32);
        self.defs.push(def);
        self.by_name.insert(key, id);
        Ok(id)
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get(&self, id: TypeId) -> &TypeDef {
        &self.defs[id.index()]
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDef)> {
        self.defs.iter().enumerate().map(|(i, d)| (TypeId(i as u32), d))
    }

    pub fn lookup(&self, namespace: &[String], name: &str) -> Option<TypeId> {
        self.by_name.get(&(namespace.to_vec(), name.to_string())).copied()
    }

    /// Unqualified names search the current namespace, then each enclosing
    /// one up to the root. Qualified names are looked up exactly.
    fn find(&self, tr: &TypeRef, scope: &TypeScope) -> Option<TypeId> {
        if !tr.path.is_empty() {
            let path: Vec<String> = tr.path.iter().map(|p| p.node.clone()).collect();
            return self.lookup(&path, &tr.name.node);
        }
        let mut ns = scope.namespace.clone();
        loop {
            if let Some(id) = self.lookup(&ns, &tr.name.node) {
                return Some(id);
            }
            if ns.pop().is_none() {
                return None;
            }
        }
    }

    /// Resolves a reference to a registered definition, checking the number
    /// of type arguments.
    pub fn resolve_id(&self, tr: &TypeRef, scope: &TypeScope) -> Result<TypeId, SemanticError> {
        let id = self.find(tr, scope).ok_or_else(|| SemanticError::UnknownType {
            name: tr.display(),
            span: tr.span,
        })?;
        let def = self.get(id);
        if def.generics.len() != tr.args.len() {
            return Err(SemanticError::GenericArity {
                name: def.qualified_name(),
                expected: def.generics.len(),
                found: tr.args.len(),
                span: tr.span,
            });
        }
        Ok(id)
    }

    pub fn resolve(&self, tr: &TypeRef, scope: &TypeScope) -> Result<&TypeDef, SemanticError> {
        self.resolve_id(tr, scope).map(|id| self.get(id))
    }

    /// Resolves any type reference: generic parameters in scope, builtins,
    /// then registered definitions, recursing into arguments.
    pub fn resolve_type(&self, tr: &TypeRef, scope: &TypeScope) -> Result<Type, SemanticError> {
        let arity = |expected: usize| SemanticError::GenericArity {
            name: tr.display(),
            expected,
            found: tr.args.len(),
            span: tr.span,
        };

        if tr.path.is_empty() {
            let name = tr.name.node.as_str();
            if scope.generics.iter().any(|g| g == name) {
                if !tr.args.is_empty() {
                    return Err(arity(0));
                }
                return Ok(Type::Param(name.to_string()));
            }
            if let Some(t) = Type::scalar(name) {
                if !tr.args.is_empty() {
                    return Err(arity(0));
                }
                return Ok(t);
            }
            if BUILTIN_WRAPPERS.contains(&name) {
                if tr.args.len() != 1 {
                    return Err(arity(1));
                }
                let inner = self.resolve_type(&tr.args[0], scope)?;
                return Type::wrapper(name, inner).ok_or_else(|| arity(1));
            }
        }

        let id = self.resolve_id(tr, scope)?;
        let args = tr
            .args
            .iter()
            .map(|a| self.resolve_type(a, scope))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Type::Adt {
            def: id,
            name: self.get(id).qualified_name(),
            args,
        })
    }

    /// Registers every struct, class and enum in `program`, then resolves
    /// their members. Problems are reported and registration carries on.
    pub fn declare_program(&mut self, program: &Program, diags: &mut Diagnostics) {
        let mut pending = Vec::new();
        self.declare_shells(&program.decls, &mut Vec::new(), &mut pending, diags);
        for (id, decl, namespace) in pending {
            let kind = self.resolve_members(decl, &namespace, diags);
            self.defs[id.index()].kind = kind;
        }
    }

    fn declare_shells<'p>(
        &mut self,
        decls: &'p [Decl],
        namespace: &mut Vec<String>,
        pending: &mut Vec<(TypeId, &'p Decl, Vec<String>)>,
        diags: &mut Diagnostics,
    ) {
        for decl in decls {
            let shell = match decl {
                Decl::Namespace(ns) => {
                    namespace.push(ns.name.node.clone());
                    self.declare_shells(&ns.decls, namespace, pending, diags);
                    namespace.pop();
                    continue;
                }
                Decl::Function(_) => continue,
                Decl::Struct(s) => TypeDef::shell(
                    s.name.node.clone(),
                    namespace.clone(),
                    s.name.span,
                    s.params.iter().map(|p| p.name.node.clone()).collect(),
                    TypeDefKind::Struct { fields: vec![] },
                ),
                Decl::Class(c) => TypeDef::shell(
                    c.name.node.clone(),
                    namespace.clone(),
                    c.name.span,
                    c.params.iter().map(|p| p.name.node.clone()).collect(),
                    TypeDefKind::Class {
                        fields: vec![],
                        methods: vec![],
                    },
                ),
                Decl::Enum(e) => TypeDef::shell(
                    e.name.node.clone(),
                    namespace.clone(),
                    e.name.span,
                    e.params.iter().map(|p| p.name.node.clone()).collect(),
                    TypeDefKind::Enum {
                        underlying: None,
                        variants: vec![],
                    },
                ),
            };
            if let Some(id) = diags.report(self.register(shell)) {
                pending.push((id, decl, namespace.clone()));
            }
        }
    }

    fn resolve_or_unknown(&self, tr: &TypeRef, scope: &TypeScope, diags: &mut Diagnostics) -> Type {
        diags.report(self.resolve_type(tr, scope)).unwrap_or(Type::Unknown)
    }

    fn resolve_fields(
        &self,
        fields: &[tern_ast::FieldDef],
        scope: &TypeScope,
        diags: &mut Diagnostics,
    ) -> Vec<FieldDef> {
        fields
            .iter()
            .map(|f| FieldDef {
                name: f.name.node.clone(),
                ty: self.resolve_or_unknown(&f.ty, scope, diags),
                span: f.span,
            })
            .collect()
    }

    fn resolve_members(&self, decl: &Decl, namespace: &[String], diags: &mut Diagnostics) -> TypeDefKind {
        let generics_of = |params: &[tern_ast::TypeParam]| -> Vec<String> {
            params.iter().map(|p| p.name.node.clone()).collect()
        };
        match decl {
            Decl::Struct(s) => {
                let scope = TypeScope::new(namespace.to_vec(), generics_of(&s.params));
                TypeDefKind::Struct {
                    fields: self.resolve_fields(&s.fields, &scope, diags),
                }
            }
            Decl::Class(c) => {
                let scope = TypeScope::new(namespace.to_vec(), generics_of(&c.params));
                let fields = self.resolve_fields(&c.fields, &scope, diags);
                let methods = c
                    .methods
                    .iter()
                    .map(|m| {
                        let generics: Vec<String> = generics_of(&m.generics);
                        let scope = scope.with_generics(&generics);
                        MethodSig {
                            name: m.name.node.clone(),
                            generics,
                            params: m
                                .params
                                .iter()
                                .map(|p| self.resolve_or_unknown(&p.ty, &scope, diags))
                                .collect(),
                            ret: m
                                .ret
                                .as_ref()
                                .map(|r| self.resolve_or_unknown(r, &scope, diags))
                                .unwrap_or(Type::Void),
                            throws: m.throws,
                            span: m.name.span,
                        }
                    })
                    .collect();
                TypeDefKind::Class { fields, methods }
            }
            Decl::Enum(e) => self.resolve_enum(e, namespace, diags),
            Decl::Namespace(_) | Decl::Function(_) => TypeDefKind::Struct { fields: vec![] },
        }
    }

    fn resolve_enum(&self, e: &EnumDef, namespace: &[String], diags: &mut Diagnostics) -> TypeDefKind {
        let scope = TypeScope::new(
            namespace.to_vec(),
            e.params.iter().map(|p| p.name.node.clone()).collect(),
        );

        let underlying = match &e.underlying {
            None => None,
            Some(tr) => match self.resolve_or_unknown(tr, &scope, diags) {
                Type::Int(t) => Some(t),
                Type::Unknown => None,
                other => {
                    diags.push(SemanticError::invalid_enum(
                        format!("underlying type of '{}' must be an integer type, found {other}", e.name.node),
                        tr.span,
                    ));
                    None
                }
            },
        };

        let mut seen = HashSet::new();
        let mut variants = Vec::with_capacity(e.variants.len());
        for v in &e.variants {
            if !seen.insert(v.name.node.as_str()) {
                diags.push(SemanticError::invalid_enum(
                    format!("variant '{}' is declared twice in '{}'", v.name.node, e.name.node),
                    v.name.span,
                ));
                continue;
            }
            let payload = match &v.payload {
                VariantPayload::Unit => PayloadDef::Unit,
                VariantPayload::Single(t) => PayloadDef::Single(self.resolve_or_unknown(t, &scope, diags)),
                VariantPayload::Fields(fields) => PayloadDef::Fields(self.resolve_fields(fields, &scope, diags)),
            };
            if e.underlying.is_some() && payload != PayloadDef::Unit {
                diags.push(SemanticError::invalid_enum(
                    format!(
                        "variant '{}' carries a payload, but '{}' has an underlying integer type",
                        v.name.node, e.name.node
                    ),
                    v.span,
                ));
            }
            if e.underlying.is_none() {
                if let Some(value) = &v.value {
                    diags.push(SemanticError::invalid_enum(
                        format!(
                            "variant '{}' has an explicit value, but '{}' has no underlying integer type",
                            v.name.node, e.name.node
                        ),
                        value.span,
                    ));
                }
            }
            variants.push(VariantDef {
                name: v.name.node.clone(),
                span: v.name.span,
                explicit: v.value.as_ref().map(|s| s.node),
                discriminant: None,
                payload,
            });
        }

        if let Some(ty) = underlying {
            for err in assign_enum_values(ty, &mut variants) {
                diags.push(err);
            }
        }
        TypeDefKind::Enum { underlying, variants }
    }
}

/// Fills in discriminants: an explicit literal wins, otherwise one more than
/// the previous variant, starting from 0. Repeated values are allowed.
/// Values that do not fit `ty` are reported and left unset.
pub fn assign_enum_values(ty: IntType, variants: &mut [VariantDef]) -> Vec<SemanticError> {
    let mut errors = Vec::new();
    let mut next: Option<i128> = Some(0);
    for v in variants.iter_mut() {
        let value = match (v.explicit, next) {
            (Some(x), _) => x,
            (None, Some(n)) => n,
            // The previous variant was out of range; that error already names it.
            (None, None) => {
                v.discriminant = None;
                continue;
            }
        };
        if ty.contains(value) {
            v.discriminant = Some(value);
            next = Some(value + 1);
        } else {
            let how = if v.explicit.is_some() { "explicit" } else { "implicit" };
            errors.push(SemanticError::invalid_enum(
                format!("{how} value {value} of variant '{}' does not fit {ty}", v.name),
                v.span,
            ));
            v.discriminant = None;
            next = None;
        }
    }
    errors
}
