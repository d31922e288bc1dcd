//! Read-only traversal of the tree.
//!
//! Each `visit_*` method defaults to the matching `walk_*` function, so an
//! analysis pass overrides only the nodes it cares about and calls `walk_*`
//! itself when it still wants the children visited.

use crate::{
    Block, ClassDef, CtorPayload, Decl, EnumDef, Expr, ExprKind, FunctionDef, MatchArm,
    NamespaceDef, Program, Stmt, StructDef,
};

pub trait Visitor: Sized {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_namespace(&mut self, ns: &NamespaceDef) {
        walk_namespace(self, ns);
    }

    fn visit_struct(&mut self, _def: &StructDef) {}

    fn visit_class(&mut self, class: &ClassDef) {
        walk_class(self, class);
    }

    fn visit_enum(&mut self, _def: &EnumDef) {}

    fn visit_function(&mut self, func: &FunctionDef) {
        walk_function(self, func);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_match_arm(&mut self, arm: &MatchArm) {
        walk_match_arm(self, arm);
    }
}

pub fn walk_program<V: Visitor>(v: &mut V, program: &Program) {
    for decl in &program.decls {
        v.visit_decl(decl);
    }
}

pub fn walk_decl<V: Visitor>(v: &mut V, decl: &Decl) {
    match decl {
        Decl::Namespace(ns) => v.visit_namespace(ns),
        Decl::Struct(s) => v.visit_struct(s),
        Decl::Class(c) => v.visit_class(c),
        Decl::Enum(e) => v.visit_enum(e),
        Decl::Function(f) => v.visit_function(f),
    }
}

pub fn walk_namespace<V: Visitor>(v: &mut V, ns: &NamespaceDef) {
    for decl in &ns.decls {
        v.visit_decl(decl);
    }
}

pub fn walk_class<V: Visitor>(v: &mut V, class: &ClassDef) {
    for method in &class.methods {
        v.visit_function(method);
    }
}

pub fn walk_function<V: Visitor>(v: &mut V, func: &FunctionDef) {
    if let Some(body) = &func.body {
        v.visit_block(body);
    }
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Let(l) => v.visit_expr(&l.init),
        Stmt::Assign(a) => {
            v.visit_expr(&a.target);
            v.visit_expr(&a.value);
        }
        Stmt::Expr(e) => v.visit_expr(e),
        Stmt::Return(r) => {
            if let Some(e) = &r.value {
                v.visit_expr(e);
            }
        }
        Stmt::If(i) => {
            v.visit_expr(&i.cond);
            v.visit_block(&i.then_block);
            if let Some(b) = &i.else_block {
                v.visit_block(b);
            }
        }
        Stmt::While(w) => {
            v.visit_expr(&w.cond);
            v.visit_block(&w.body);
        }
        Stmt::Block(b) => v.visit_block(b),
        Stmt::Unsafe(u) => v.visit_block(&u.body),
        Stmt::Try(t) => {
            v.visit_block(&t.body);
            v.visit_block(&t.catch.body);
        }
        Stmt::Throw(t) => v.visit_expr(&t.value),
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Ident(_)
        | ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::BoolLit(_)
        | ExprKind::StringLit(_)
        | ExprKind::NoneLit => {}
        ExprKind::Some(e)
        | ExprKind::Unary { expr: e, .. }
        | ExprKind::AddressOf(e)
        | ExprKind::Deref(e)
        | ExprKind::Cast { expr: e, .. } => v.visit_expr(e),
        ExprKind::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Call { args, .. } => {
            for a in args {
                v.visit_expr(a);
            }
        }
        ExprKind::MethodCall { receiver, args, .. } => {
            v.visit_expr(receiver);
            for a in args {
                v.visit_expr(a);
            }
        }
        ExprKind::Field { base, .. } => v.visit_expr(base),
        ExprKind::Index { base, index } => {
            v.visit_expr(base);
            v.visit_expr(index);
        }
        ExprKind::Construct { fields, .. } => {
            for (_, e) in fields {
                v.visit_expr(e);
            }
        }
        ExprKind::EnumCtor { payload, .. } => match payload {
            CtorPayload::Unit => {}
            CtorPayload::Positional(args) => {
                for a in args {
                    v.visit_expr(a);
                }
            }
            CtorPayload::Named(fields) => {
                for (_, e) in fields {
                    v.visit_expr(e);
                }
            }
        },
        ExprKind::ArrayLit(items) => {
            for e in items {
                v.visit_expr(e);
            }
        }
        ExprKind::Match(m) => {
            v.visit_expr(&m.scrutinee);
            for arm in &m.arms {
                v.visit_match_arm(arm);
            }
        }
    }
}

pub fn walk_match_arm<V: Visitor>(v: &mut V, arm: &MatchArm) {
    v.visit_block(&arm.body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::*;

    #[derive(Default)]
    struct CountCalls {
        calls: usize,
    }

    impl Visitor for CountCalls {
        fn visit_expr(&mut self, expr: &Expr) {
            if matches!(expr.kind, ExprKind::Call { .. }) {
                self.calls += 1;
            }
            walk_expr(self, expr);
        }
    }

    #[test]
    fn walks_nested_calls_inside_try_and_match_arms() {
        let inner = call("g", vec![], ty("i32"));
        let program = program(vec![function(
            "f",
            vec![],
            None,
            false,
            vec![try_catch(
                vec![expr_stmt(call("h", vec![inner], ty("i32")))],
                None,
                vec![expr_stmt(call("log", vec![], ty("void")))],
            )],
        )]);

        let mut v = CountCalls::default();
        v.visit_program(&program);
        assert_eq!(v.calls, 3);
    }
}
