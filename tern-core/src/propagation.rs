#![forbid(unsafe_code)]

//! Propagation Analyzer.
//!
//! A call to a `throws` function (or a `throw`) must sit inside a `try` body
//! or inside a function that is itself `throws`. Failures raised in a
//! `catch` handler belong to the enclosing context, not to its `try`.

use tern_ast::visit::{Visitor, walk_expr, walk_stmt};
use tern_ast::{Expr, ExprKind, NodeId, Span, Stmt};

use crate::annotate::{Annotations, CallRoute};
use crate::body::Body;
use crate::diagnostics::Diagnostics;
use crate::error::SemanticError;
use crate::registry::TypeRegistry;
use crate::resolve::TypeTable;
use crate::signatures::SignatureTable;

pub struct PropagationPass<'a> {
    registry: &'a TypeRegistry,
    sigs: &'a SignatureTable,
    types: &'a TypeTable,
    annotations: &'a mut Annotations,
    diags: &'a mut Diagnostics,
    namespace: Vec<String>,
    function: String,
    throws: bool,
    try_depth: u32,
}

impl<'a> PropagationPass<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        sigs: &'a SignatureTable,
        types: &'a TypeTable,
        annotations: &'a mut Annotations,
        diags: &'a mut Diagnostics,
    ) -> Self {
        Self {
            registry,
            sigs,
            types,
            annotations,
            diags,
            namespace: Vec::new(),
            function: String::new(),
            throws: false,
            try_depth: 0,
        }
    }

    pub fn run(&mut self, body: &Body<'_>) {
        self.namespace = body.namespace.clone();
        self.function = body.name();
        self.throws = body.func.throws;
        self.try_depth = 0;
        self.visit_function(body.func);
    }

    fn route(&mut self, node: NodeId, callee: &str, span: Span) {
        let route = if self.try_depth > 0 {
            CallRoute::Catch
        } else if self.throws {
            CallRoute::Propagate
        } else {
            self.diags.push(SemanticError::Propagation {
                callee: callee.to_string(),
                function: self.function.clone(),
                span,
            });
            return;
        };
        self.annotations.call_routes.insert(node, route);
    }
}

impl Visitor for PropagationPass<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Try(t) => {
                self.try_depth += 1;
                self.visit_block(&t.body);
                self.try_depth -= 1;
                self.visit_block(&t.catch.body);
            }
            Stmt::Throw(t) => {
                walk_stmt(self, stmt);
                self.route(t.value.id, "throw", t.span);
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
        let failing = match &expr.kind {
            ExprKind::Call { path, callee, .. } => self
                .sigs
                .lookup_call(path, &callee.node, &self.namespace)
                .filter(|sig| sig.throws)
                .map(|sig| sig.name.clone()),
            ExprKind::MethodCall { receiver, method, .. } => self
                .sigs
                .method(self.registry, self.types.expr(receiver), &method.node)
                .filter(|sig| sig.throws)
                .map(|sig| sig.name),
            _ => None,
        };
        if let Some(callee) = failing {
            self.route(expr.id, &callee, expr.span);
        }
    }
}
