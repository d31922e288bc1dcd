#![forbid(unsafe_code)]

//! Resolves the type annotations carried by a body's tree.
//!
//! Written type references (binding types, cast targets, constructed types)
//! are reported when they fail. Expression types come from the front end and
//! degrade to `Type::Unknown` silently; the written form already reported.

use std::collections::HashMap;

use tern_ast::visit::{Visitor, walk_expr, walk_stmt};
use tern_ast::{Expr, ExprKind, NodeId, Stmt, TypeRef};

use crate::annotate::Annotations;
use crate::body::Body;
use crate::diagnostics::Diagnostics;
use crate::instantiate::Instantiator;
use crate::registry::{TypeRegistry, TypeScope};
use crate::types::Type;

static UNKNOWN: Type = Type::Unknown;

#[derive(Debug, Default)]
pub struct TypeTable {
    exprs: HashMap<NodeId, Type>,
    /// Declared binding type, keyed by the initializer's node.
    lets: HashMap<NodeId, Type>,
    /// Target type, keyed by the cast node.
    casts: HashMap<NodeId, Type>,
}

impl TypeTable {
    pub fn expr(&self, e: &Expr) -> &Type {
        self.exprs.get(&e.id).unwrap_or(&UNKNOWN)
    }

    pub fn binding(&self, init: &Expr) -> &Type {
        self.lets.get(&init.id).unwrap_or_else(|| self.expr(init))
    }

    pub fn cast_target(&self, cast: &Expr) -> &Type {
        self.casts.get(&cast.id).unwrap_or(&UNKNOWN)
    }
}

pub struct ResolvePass<'a, 'r> {
    registry: &'r TypeRegistry,
    instantiator: &'a mut Instantiator<'r>,
    scope: TypeScope,
    table: &'a mut TypeTable,
    annotations: &'a mut Annotations,
    diags: &'a mut Diagnostics,
}

impl<'a, 'r> ResolvePass<'a, 'r> {
    pub fn new(
        registry: &'r TypeRegistry,
        instantiator: &'a mut Instantiator<'r>,
        table: &'a mut TypeTable,
        annotations: &'a mut Annotations,
        diags: &'a mut Diagnostics,
    ) -> Self {
        Self {
            registry,
            instantiator,
            scope: TypeScope::root(),
            table,
            annotations,
            diags,
        }
    }

    pub fn run(&mut self, body: &Body<'_>) {
        self.scope = body.scope();
        self.visit_function(body.func);
    }

    fn written(&mut self, tr: &TypeRef) -> Type {
        self.diags
            .report(self.registry.resolve_type(tr, &self.scope))
            .unwrap_or(Type::Unknown)
    }
}

impl Visitor for ResolvePass<'_, '_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Let(l) = stmt {
            let ty = self.written(&l.ty);
            self.table.lets.insert(l.init.id, ty);
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        let ty = self
            .registry
            .resolve_type(&expr.ty, &self.scope)
            .unwrap_or(Type::Unknown);
        if matches!(&ty, Type::Adt { args, .. } if !args.is_empty()) && !ty.has_params() {
            if let Some(concrete) = self.instantiator.instantiate_type(&ty) {
                self.annotations.instances.insert(expr.id, concrete);
            }
        }
        self.table.exprs.insert(expr.id, ty);

        match &expr.kind {
            ExprKind::Cast { target, .. } => {
                let t = self.written(target);
                self.table.casts.insert(expr.id, t);
            }
            ExprKind::Construct { ty, .. } | ExprKind::EnumCtor { ty, .. } => {
                self.written(ty);
            }
            _ => {}
        }
        walk_expr(self, expr);
    }
}
