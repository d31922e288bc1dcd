#![forbid(unsafe_code)]

//! Ownership Classifier.
//!
//! Every type gets one of four ownership kinds. The pass then walks each
//! body and records the reference-counting work the kinds imply: retains on
//! copies out of places, releases at scope ends and overwrites, weak-link
//! stores and liveness checks on weak reads. Weak references that escape
//! `Optional` and raw-pointer operations outside `unsafe` are rejected.

use std::collections::{HashMap, HashSet};

use tern_ast::visit::{Visitor, walk_block, walk_expr, walk_stmt};
use tern_ast::{
    Block, CtorPayload, Expr, ExprKind, Ident, MatchExpr, Pattern, PatternBindings, Span, Stmt, TryStmt, span_end,
};

use crate::annotate::{Annotations, BindingId, Obligation};
use crate::body::Body;
use crate::diagnostics::Diagnostics;
use crate::error::SemanticError;
use crate::registry::{PayloadDef, TypeDefKind, TypeRegistry};
use crate::resolve::TypeTable;
use crate::signatures::SignatureTable;
use crate::types::{Type, TypeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnershipKind {
    /// Copied wholesale; no count.
    Value,
    /// Counted; copying retains.
    SharedRef,
    /// Observes a counted object without keeping it alive.
    WeakRef,
    /// Unmanaged; only inside `unsafe`.
    RawPointer,
}

/// Per-definition classification, computed once after registration.
#[derive(Clone, Debug, Default)]
pub struct OwnershipTable {
    kinds: Vec<OwnershipKind>,
}

impl OwnershipTable {
    pub fn classify_all(registry: &TypeRegistry) -> Self {
        let kinds = registry
            .iter()
            .map(|(_, def)| match def.kind {
                TypeDefKind::Class { .. } => OwnershipKind::SharedRef,
                TypeDefKind::Struct { .. } | TypeDefKind::Enum { .. } => OwnershipKind::Value,
            })
            .collect();
        Self { kinds }
    }

    pub fn of_def(&self, id: TypeId) -> OwnershipKind {
        self.kinds.get(id.index()).copied().unwrap_or(OwnershipKind::Value)
    }

    /// Generic parameters and unresolved types count as `Value`.
    pub fn kind_of(&self, ty: &Type) -> OwnershipKind {
        match ty {
            Type::Adt { def, .. } => self.of_def(*def),
            Type::Array(_) => OwnershipKind::SharedRef,
            Type::Optional(inner) => match inner.as_ref() {
                Type::Weak(_) => OwnershipKind::WeakRef,
                other => self.kind_of(other),
            },
            Type::Weak(_) => OwnershipKind::WeakRef,
            Type::RawPtr(_) => OwnershipKind::RawPointer,
            Type::Unknown
            | Type::Void
            | Type::Bool
            | Type::Int(_)
            | Type::Float(_)
            | Type::Str
            | Type::Param(_) => OwnershipKind::Value,
        }
    }
}

/// `Weak<T>` must sit directly inside `Optional` and `T` must be a class.
pub fn check_weak_wrapping(registry: &TypeRegistry, ty: &Type, span: Span) -> Vec<SemanticError> {
    let mut out = Vec::new();
    weak_wrapping(registry, ty, false, span, &mut out);
    out
}

fn weak_wrapping(registry: &TypeRegistry, ty: &Type, in_optional: bool, span: Span, out: &mut Vec<SemanticError>) {
    match ty {
        Type::Weak(inner) => {
            if !in_optional {
                out.push(SemanticError::ownership(
                    format!("`{ty}` must be wrapped in `Optional`"),
                    span,
                ));
            }
            match inner.as_ref() {
                Type::Adt { def, .. } if registry.get(*def).is_class() => {}
                Type::Param(_) | Type::Unknown => {}
                other => out.push(SemanticError::ownership(
                    format!("weak references can only observe classes, not `{other}`"),
                    span,
                )),
            }
            weak_wrapping(registry, inner, false, span, out);
        }
        Type::Optional(inner) => weak_wrapping(registry, inner, true, span, out),
        Type::Array(inner) | Type::RawPtr(inner) => weak_wrapping(registry, inner, false, span, out),
        Type::Adt { args, .. } => {
            for a in args {
                weak_wrapping(registry, a, false, span, out);
            }
        }
        _ => {}
    }
}

/// Weak-wrapping checks over every declared member and signature.
pub fn check_declarations(registry: &TypeRegistry, sigs: &SignatureTable) -> Vec<SemanticError> {
    let mut out = Vec::new();
    for (_, def) in registry.iter() {
        match &def.kind {
            TypeDefKind::Struct { fields } => {
                for f in fields {
                    weak_wrapping(registry, &f.ty, false, f.span, &mut out);
                }
            }
            TypeDefKind::Class { fields, methods } => {
                for f in fields {
                    weak_wrapping(registry, &f.ty, false, f.span, &mut out);
                }
                for m in methods {
                    for p in m.params.iter().chain(std::iter::once(&m.ret)) {
                        weak_wrapping(registry, p, false, m.span, &mut out);
                    }
                }
            }
            TypeDefKind::Enum { variants, .. } => {
                for v in variants {
                    for t in v.payload.types() {
                        weak_wrapping(registry, t, false, v.span, &mut out);
                    }
                }
            }
        }
    }
    let mut fns: Vec<_> = sigs.iter().collect();
    fns.sort_by(|a, b| a.name.cmp(&b.name));
    for sig in fns {
        for p in sig.params.iter().chain(std::iter::once(&sig.ret)) {
            weak_wrapping(registry, p, false, sig.span, &mut out);
        }
    }
    out
}

/// Field paths inside a value type that hold counted references, memoised
/// per type.
pub struct CountedPaths<'a> {
    registry: &'a TypeRegistry,
    table: &'a OwnershipTable,
    cache: HashMap<Type, Vec<Vec<String>>>,
}

impl<'a> CountedPaths<'a> {
    pub fn new(registry: &'a TypeRegistry, table: &'a OwnershipTable) -> Self {
        Self {
            registry,
            table,
            cache: HashMap::new(),
        }
    }

    /// For a struct: one path per counted field, descending through nested
    /// struct fields. For any other value type that holds counted references
    /// (an enum payload, an optional struct): the empty path, the value
    /// as a whole.
    pub fn retained_paths(&mut self, ty: &Type) -> Vec<Vec<String>> {
        if let Some(hit) = self.cache.get(ty) {
            return hit.clone();
        }
        let paths = self.compute(ty, &mut HashSet::new());
        self.cache.insert(ty.clone(), paths.clone());
        paths
    }

    fn substituted_fields(&self, def: TypeId, args: &[Type]) -> Vec<(String, Type)> {
        let td = self.registry.get(def);
        let subst: HashMap<String, Type> = td.generics.iter().cloned().zip(args.iter().cloned()).collect();
        td.fields()
            .iter()
            .map(|f| (f.name.clone(), f.ty.substitute(&subst)))
            .collect()
    }

    fn compute(&self, ty: &Type, visiting: &mut HashSet<TypeId>) -> Vec<Vec<String>> {
        match self.table.kind_of(ty) {
            OwnershipKind::SharedRef => vec![vec![]],
            OwnershipKind::WeakRef | OwnershipKind::RawPointer => vec![],
            OwnershipKind::Value => {
                if let Type::Adt { def, args, .. } = ty {
                    if matches!(self.registry.get(*def).kind, TypeDefKind::Struct { .. }) {
                        if !visiting.insert(*def) {
                            return vec![];
                        }
                        let mut out = Vec::new();
                        for (name, fty) in self.substituted_fields(*def, args) {
                            for mut p in self.compute(&fty, visiting) {
                                p.insert(0, name.clone());
                                out.push(p);
                            }
                        }
                        visiting.remove(def);
                        return out;
                    }
                }
                if self.holds_counted(ty, visiting) {
                    vec![vec![]]
                } else {
                    vec![]
                }
            }
        }
    }

    fn holds_counted(&self, ty: &Type, visiting: &mut HashSet<TypeId>) -> bool {
        match self.table.kind_of(ty) {
            OwnershipKind::SharedRef => return true,
            OwnershipKind::WeakRef | OwnershipKind::RawPointer => return false,
            OwnershipKind::Value => {}
        }
        match ty {
            Type::Optional(inner) => self.holds_counted(inner, visiting),
            Type::Adt { def, args, .. } => {
                if !visiting.insert(*def) {
                    return false;
                }
                let td = self.registry.get(*def);
                let subst: HashMap<String, Type> =
                    td.generics.iter().cloned().zip(args.iter().cloned()).collect();
                let inner: Vec<Type> = match &td.kind {
                    TypeDefKind::Enum { variants, .. } => variants
                        .iter()
                        .flat_map(|v| v.payload.types())
                        .map(|t| t.substitute(&subst))
                        .collect(),
                    _ => td.fields().iter().map(|f| f.ty.substitute(&subst)).collect(),
                };
                let found = inner.iter().any(|t| self.holds_counted(t, visiting));
                visiting.remove(def);
                found
            }
            _ => false,
        }
    }
}

struct Local {
    decl: BindingId,
    name: String,
    ty: Type,
    /// A `catch` binder: owns the failure value, whose type is not tracked.
    failure: bool,
}

pub struct OwnershipPass<'a, 'r> {
    registry: &'r TypeRegistry,
    table: &'r OwnershipTable,
    sigs: &'r SignatureTable,
    types: &'a TypeTable,
    paths: &'a mut CountedPaths<'r>,
    annotations: &'a mut Annotations,
    diags: &'a mut Diagnostics,
    namespace: Vec<String>,
    ret: Type,
    scopes: Vec<Vec<Local>>,
    unsafe_depth: u32,
}

impl<'a, 'r> OwnershipPass<'a, 'r> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: &'r TypeRegistry,
        table: &'r OwnershipTable,
        sigs: &'r SignatureTable,
        types: &'a TypeTable,
        paths: &'a mut CountedPaths<'r>,
        annotations: &'a mut Annotations,
        diags: &'a mut Diagnostics,
    ) -> Self {
        Self {
            registry,
            table,
            sigs,
            types,
            paths,
            annotations,
            diags,
            namespace: Vec::new(),
            ret: Type::Void,
            scopes: Vec::new(),
            unsafe_depth: 0,
        }
    }

    pub fn run(&mut self, body: &Body<'_>) {
        let Some(block) = &body.func.body else {
            return;
        };
        let scope = body.scope();
        let registry = self.registry;
        let resolve = |tr: &tern_ast::TypeRef| -> Type {
            registry.resolve_type(tr, &scope).unwrap_or(Type::Unknown)
        };
        let params: Vec<(&Ident, Type)> = body.func.params.iter().map(|p| (&p.name, resolve(&p.ty))).collect();
        self.ret = body.func.ret.as_ref().map(resolve).unwrap_or(Type::Void);
        self.namespace = body.namespace.clone();
        self.unsafe_depth = 0;

        // Parameters share the body's scope and are released at its end.
        self.scopes.push(Vec::new());
        for (name, ty) in params {
            self.declare(name, ty);
        }
        walk_block(self, block);
        self.pop_scope(block.span);
    }

    fn kind(&self, ty: &Type) -> OwnershipKind {
        self.table.kind_of(ty)
    }

    fn declare(&mut self, name: &Ident, ty: Type) -> BindingId {
        self.push_local(name, ty, false)
    }

    fn push_local(&mut self, name: &Ident, ty: Type, failure: bool) -> BindingId {
        let decl = self.annotations.declare_binding(&name.node, name.span);
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(Local {
                decl,
                name: name.node.clone(),
                ty,
                failure,
            });
        }
        decl
    }

    fn pop_scope(&mut self, span: Span) {
        let Some(bindings) = self.scopes.pop() else {
            return;
        };
        let scope_end = span_end(span);
        for local in bindings.into_iter().rev() {
            let paths = if local.failure {
                vec![vec![]]
            } else {
                self.counted_paths(&local.ty)
            };
            for p in paths {
                self.annotations.oblige(Obligation::Release {
                    binding: local.name.clone(),
                    decl: local.decl,
                    path: (!p.is_empty()).then_some(p),
                    scope_end,
                });
            }
        }
    }

    /// What a copy of a `ty` value retains; the empty path is the value
    /// itself.
    fn counted_paths(&mut self, ty: &Type) -> Vec<Vec<String>> {
        match self.kind(ty) {
            OwnershipKind::SharedRef => vec![vec![]],
            OwnershipKind::Value => self.paths.retained_paths(ty),
            OwnershipKind::WeakRef | OwnershipKind::RawPointer => vec![],
        }
    }

    fn is_counted(&mut self, ty: &Type) -> bool {
        !self.counted_paths(ty).is_empty()
    }

    /// Moves or copies the value of `expr` into a destination of type `dest`.
    fn transfer(&mut self, expr: &Expr, dest: &Type) {
        let src = self.types.expr(expr);
        if src.is_unknown() {
            return;
        }
        match self.kind(src) {
            OwnershipKind::WeakRef => {
                if dest.is_weak_optional() || dest.is_unknown() {
                    return;
                }
                match dest {
                    Type::Optional(_) | Type::Param(_) => {
                        if expr.is_place() {
                            self.annotations.oblige(Obligation::WeakRead { node: expr.id });
                        }
                    }
                    _ => self.diags.push(SemanticError::ownership(
                        format!("weak reference `{src}` can only be read into an optional, not `{dest}`"),
                        expr.span,
                    )),
                }
            }
            OwnershipKind::SharedRef => {
                if dest.is_weak_optional() {
                    self.annotations.oblige(Obligation::WeakStore { node: expr.id });
                } else if expr.is_place() {
                    self.annotations.oblige(Obligation::Retain { node: expr.id });
                }
            }
            OwnershipKind::Value => {
                if expr.is_place() {
                    let retained_paths = self.paths.retained_paths(src);
                    if !retained_paths.is_empty() {
                        self.annotations.oblige(Obligation::DeepCopy {
                            node: expr.id,
                            retained_paths,
                        });
                    }
                }
            }
            OwnershipKind::RawPointer => {}
        }
    }

    fn read_through(&mut self, base: &Expr) {
        if self.kind(self.types.expr(base)) == OwnershipKind::WeakRef {
            self.annotations.oblige(Obligation::WeakRead { node: base.id });
        }
    }

    fn require_unsafe(&mut self, what: &'static str, span: Span) {
        if self.unsafe_depth == 0 {
            self.diags.push(SemanticError::UnsafeContext { what, span });
        }
    }

    fn substitution(&self, ty: &Type) -> Option<(TypeId, HashMap<String, Type>)> {
        let (def, args) = ty.adt()?;
        let td = self.registry.get(def);
        Some((def, td.generics.iter().cloned().zip(args.iter().cloned()).collect()))
    }

    fn transfer_args(&mut self, args: &[Expr], params: &[Type]) {
        for (i, arg) in args.iter().enumerate() {
            let dest = params.get(i).cloned().unwrap_or_else(|| self.types.expr(arg).clone());
            self.transfer(arg, &dest);
        }
    }

    fn transfer_construct(&mut self, expr: &Expr, fields: &[(tern_ast::Ident, Expr)]) {
        let ty = self.types.expr(expr).clone();
        let Some((def, subst)) = self.substitution(&ty) else {
            return;
        };
        let td = self.registry.get(def);
        for (name, value) in fields {
            let dest = td
                .fields()
                .iter()
                .find(|f| f.name == name.node)
                .map(|f| f.ty.substitute(&subst))
                .unwrap_or_else(|| self.types.expr(value).clone());
            self.transfer(value, &dest);
        }
    }

    fn transfer_payload(&mut self, expr: &Expr, variant: &str, payload: &CtorPayload) {
        let ty = self.types.expr(expr).clone();
        let Some((def, subst)) = self.substitution(&ty) else {
            return;
        };
        let Some(v) = self.registry.get(def).variant(variant) else {
            return;
        };
        match (payload, &v.payload) {
            (CtorPayload::Positional(args), PayloadDef::Single(t)) => {
                let dest = t.substitute(&subst);
                for a in args {
                    self.transfer(a, &dest);
                }
            }
            (CtorPayload::Named(args), PayloadDef::Fields(fields)) => {
                for (name, value) in args {
                    let dest = fields
                        .iter()
                        .find(|f| f.name == name.node)
                        .map(|f| f.ty.substitute(&subst))
                        .unwrap_or(Type::Unknown);
                    self.transfer(value, &dest);
                }
            }
            _ => {}
        }
    }

    /// Type bound by one binder of `variant`: the single payload when
    /// `field` is `None`, else the named payload field.
    fn binder_type(&self, scrutinee: &Type, variant: &str, field: Option<&str>) -> Type {
        if let Type::Optional(inner) = scrutinee {
            return match (variant, field) {
                ("Some", None) => inner.as_ref().clone(),
                _ => Type::Unknown,
            };
        }
        let Some((def, subst)) = self.substitution(scrutinee) else {
            return Type::Unknown;
        };
        let Some(v) = self.registry.get(def).variant(variant) else {
            return Type::Unknown;
        };
        match (&v.payload, field) {
            (PayloadDef::Single(t), None) => t.substitute(&subst),
            (PayloadDef::Fields(fields), Some(name)) => fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.ty.substitute(&subst))
                .unwrap_or(Type::Unknown),
            _ => Type::Unknown,
        }
    }

    fn arm_binders<'p>(&self, scrutinee: &Type, pattern: &'p Pattern) -> Vec<(&'p Ident, Type)> {
        let Pattern::Variants { alts, .. } = pattern else {
            return vec![];
        };
        let mut out: Vec<(&Ident, Type)> = Vec::new();
        for alt in alts {
            let binders: Vec<(&Ident, Type)> = match &alt.bindings {
                PatternBindings::None => vec![],
                PatternBindings::Positional(names) => names
                    .iter()
                    .map(|n| (n, self.binder_type(scrutinee, &alt.name.node, None)))
                    .collect(),
                PatternBindings::Named(fields) => fields
                    .iter()
                    .map(|f| {
                        let ty = self.binder_type(scrutinee, &alt.name.node, Some(&f.field.node));
                        (&f.binder, ty)
                    })
                    .collect(),
            };
            // Alternatives binding one name share the binder.
            for (name, ty) in binders {
                if !out.iter().any(|(n, _)| n.node == name.node) {
                    out.push((name, ty));
                }
            }
        }
        out
    }

    /// Arm binders live in the arm's block. A copy out of a place retains
    /// the payload; a fresh scrutinee hands its payload over.
    fn match_arms(&mut self, m: &MatchExpr) {
        self.visit_expr(&m.scrutinee);
        let scrutinee = self.types.expr(&m.scrutinee).clone();
        let from_place = m.scrutinee.is_place();
        for arm in &m.arms {
            self.scopes.push(Vec::new());
            for (name, ty) in self.arm_binders(&scrutinee, &arm.pattern) {
                let retained_paths = self.counted_paths(&ty);
                let decl = self.declare(name, ty);
                if from_place && !retained_paths.is_empty() {
                    self.annotations.oblige(Obligation::RetainBinder { decl, retained_paths });
                }
            }
            walk_block(self, &arm.body);
            self.pop_scope(arm.body.span);
        }
    }

    fn try_catch(&mut self, t: &TryStmt) {
        self.visit_block(&t.body);
        self.scopes.push(Vec::new());
        if let Some(binder) = &t.catch.binder {
            self.push_local(binder, Type::Unknown, true);
        }
        walk_block(self, &t.catch.body);
        self.pop_scope(t.catch.body.span);
    }
}

impl Visitor for OwnershipPass<'_, '_> {
    fn visit_block(&mut self, block: &Block) {
        self.scopes.push(Vec::new());
        walk_block(self, block);
        self.pop_scope(block.span);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(l) => {
                let ty = self.types.binding(&l.init).clone();
                for err in check_weak_wrapping(self.registry, &ty, l.ty.span) {
                    self.diags.push(err);
                }
                self.visit_expr(&l.init);
                self.transfer(&l.init, &ty);
                self.declare(&l.name, ty);
            }
            Stmt::Assign(a) => {
                self.visit_expr(&a.target);
                self.visit_expr(&a.value);
                let dest = self.types.expr(&a.target).clone();
                if !dest.is_weak_optional() && self.is_counted(&dest) {
                    self.annotations
                        .oblige(Obligation::ReleaseOverwritten { node: a.target.id });
                }
                self.transfer(&a.value, &dest);
            }
            Stmt::Return(r) => {
                if let Some(v) = &r.value {
                    self.visit_expr(v);
                    let ret = self.ret.clone();
                    self.transfer(v, &ret);
                }
            }
            Stmt::Throw(t) => {
                self.visit_expr(&t.value);
                let ty = self.types.expr(&t.value).clone();
                self.transfer(&t.value, &ty);
            }
            Stmt::Unsafe(u) => {
                self.unsafe_depth += 1;
                self.visit_block(&u.body);
                self.unsafe_depth -= 1;
            }
            Stmt::Try(t) => self.try_catch(t),
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::Match(m) = &expr.kind {
            self.match_arms(m);
            return;
        }
        walk_expr(self, expr);
        match &expr.kind {
            ExprKind::AddressOf(_) => self.require_unsafe("taking a raw pointer", expr.span),
            ExprKind::Deref(inner) => {
                if matches!(self.types.expr(inner), Type::RawPtr(_)) {
                    self.require_unsafe("dereferencing a raw pointer", expr.span);
                }
            }
            ExprKind::Call { path, callee, args } => {
                let params = self
                    .sigs
                    .lookup_call(path, &callee.node, &self.namespace)
                    .map(|s| s.params.clone())
                    .unwrap_or_default();
                self.transfer_args(args, &params);
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                self.read_through(receiver);
                let recv_ty = self.types.expr(receiver).clone();
                let params = self
                    .sigs
                    .method(self.registry, &recv_ty, &method.node)
                    .map(|s| s.params)
                    .unwrap_or_default();
                self.transfer_args(args, &params);
            }
            ExprKind::Field { base, .. } => self.read_through(base),
            ExprKind::Construct { fields, .. } => self.transfer_construct(expr, fields),
            ExprKind::EnumCtor {
                variant, payload, ..
            } => self.transfer_payload(expr, &variant.node, payload),
            ExprKind::ArrayLit(items) => {
                let elem = match self.types.expr(expr) {
                    Type::Array(t) => t.as_ref().clone(),
                    _ => Type::Unknown,
                };
                for item in items {
                    self.transfer(item, &elem);
                }
            }
            ExprKind::Some(inner) => {
                let dest = match self.types.expr(expr) {
                    Type::Optional(t) => t.as_ref().clone(),
                    _ => Type::Unknown,
                };
                self.transfer(inner, &dest);
            }
            _ => {}
        }
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
            class_def("Node", &[], vec![], vec![]),
            struct_def(
                "Link",
                &[],
                vec![
                    field_def("target", ty("Node")),
                    field_def("back", weak_opt(ty("Node"))),
                    field_def("id", ty("i32")),
                ],
            ),
            struct_def(
                "Path",
                &[],
                vec![field_def("first", ty("Link")), field_def("rest", array(ty("Link")))],
            ),
            enum_def(
                "Slot",
                &[],
                None,
                vec![unit_variant("Empty"), single_variant("Full", ty("Node"))],
            ),
        ]);
        let mut reg = TypeRegistry::new();
        reg.declare_program(&p, &mut Diagnostics::new());
        reg
    }

    fn adt(reg: &TypeRegistry, name: &str) -> Type {
        let id = reg.lookup(&[], name).unwrap();
        Type::Adt {
            def: id,
            name: name.into(),
            args: vec![],
        }
    }

    #[test]
    fn kinds_follow_declaration_and_wrappers() {
        let reg = registry();
        let table = OwnershipTable::classify_all(&reg);
        let node = adt(&reg, "Node");
        assert_eq!(table.kind_of(&node), OwnershipKind::SharedRef);
        assert_eq!(table.kind_of(&adt(&reg, "Link")), OwnershipKind::Value);
        assert_eq!(table.kind_of(&adt(&reg, "Slot")), OwnershipKind::Value);
        assert_eq!(
            table.kind_of(&Type::optional(Type::Weak(Box::new(node.clone())))),
            OwnershipKind::WeakRef
        );
        assert_eq!(table.kind_of(&Type::optional(node)), OwnershipKind::SharedRef);
        assert_eq!(
            table.kind_of(&Type::Array(Box::new(Type::Int(IntType::U8)))),
            OwnershipKind::SharedRef
        );
        assert_eq!(
            table.kind_of(&Type::RawPtr(Box::new(Type::Bool))),
            OwnershipKind::RawPointer
        );
    }

    #[test]
    fn retained_paths_descend_into_nested_structs() {
        let reg = registry();
        let table = OwnershipTable::classify_all(&reg);
        let mut paths = CountedPaths::new(&reg, &table);
        assert_eq!(paths.retained_paths(&adt(&reg, "Link")), vec![vec!["target".to_string()]]);
        assert_eq!(
            paths.retained_paths(&adt(&reg, "Path")),
            vec![
                vec!["first".to_string(), "target".to_string()],
                vec!["rest".to_string()]
            ]
        );
        assert_eq!(paths.retained_paths(&adt(&reg, "Slot")), vec![Vec::<String>::new()]);
        assert!(paths.retained_paths(&Type::Int(IntType::I32)).is_empty());
    }

    #[test]
    fn bare_weak_and_weak_to_non_class_are_rejected() {
        let reg = registry();
        let node = adt(&reg, "Node");
        let sp = tern_ast::span(0, 0);
        assert_eq!(check_weak_wrapping(&reg, &Type::Weak(Box::new(node.clone())), sp).len(), 1);
        assert!(check_weak_wrapping(&reg, &Type::optional(Type::Weak(Box::new(node))), sp).is_empty());
        let to_struct = Type::optional(Type::Weak(Box::new(adt(&reg, "Link"))));
        assert_eq!(check_weak_wrapping(&reg, &to_struct, sp).len(), 1);
    }
}
