//! Terse constructors for trees.
//!
//! The parser that normally produces these trees lives outside this
//! workspace; tests and embedders assemble them with these helpers. All nodes
//! get an empty span and a fresh [`NodeId`].

use crate::{
    ArithMode, AssignStmt, BinOp, Block, CastKind, CatchClause, ClassDef, CtorPayload, Decl,
    EnumDef, Expr, ExprKind, FieldBinding, FieldDef, FunctionDef, Ident, IfStmt, LetStmt,
    MatchArm, MatchExpr, NamespaceDef, NodeId, Param, Pattern, PatternBindings, Program,
    ReturnStmt, Span, Spanned, Stmt, StructDef, ThrowStmt, TryStmt, TypeParam, TypeRef,
    UnaryOp, UnsafeBlock, VariantDef, VariantPayload, VariantPattern, WhileStmt, span,
};

fn sp() -> Span {
    span(0, 0)
}

pub fn name(s: &str) -> Ident {
    Spanned::new(sp(), s.to_string())
}

// ---- types ----

pub fn ty(s: &str) -> TypeRef {
    ty_args(s, vec![])
}

pub fn ty_args(s: &str, args: Vec<TypeRef>) -> TypeRef {
    TypeRef {
        span: sp(),
        path: vec![],
        name: name(s),
        args,
    }
}

pub fn ty_path(path: &[&str], s: &str, args: Vec<TypeRef>) -> TypeRef {
    TypeRef {
        span: sp(),
        path: path.iter().map(|p| name(p)).collect(),
        name: name(s),
        args,
    }
}

pub fn optional(inner: TypeRef) -> TypeRef {
    ty_args("Optional", vec![inner])
}

pub fn weak(inner: TypeRef) -> TypeRef {
    ty_args("Weak", vec![inner])
}

/// `Optional<Weak<T>>`, the only legal spelling of a weak reference.
pub fn weak_opt(inner: TypeRef) -> TypeRef {
    optional(weak(inner))
}

pub fn raw_ptr(inner: TypeRef) -> TypeRef {
    ty_args("RawPtr", vec![inner])
}

pub fn array(inner: TypeRef) -> TypeRef {
    ty_args("Array", vec![inner])
}

// ---- expressions ----

pub fn expr(kind: ExprKind, ty: TypeRef) -> Expr {
    Expr {
        id: NodeId::fresh(),
        span: sp(),
        ty,
        kind,
    }
}

pub fn var(n: &str, t: TypeRef) -> Expr {
    expr(ExprKind::Ident(name(n)), t)
}

pub fn int(value: i128, t: &str) -> Expr {
    expr(ExprKind::IntLit(value), ty(t))
}

pub fn float(value: f64, t: &str) -> Expr {
    expr(ExprKind::FloatLit(value), ty(t))
}

pub fn boolean(value: bool) -> Expr {
    expr(ExprKind::BoolLit(value), ty("bool"))
}

pub fn string(value: &str) -> Expr {
    expr(ExprKind::StringLit(value.to_string()), ty("String"))
}

pub fn none(t: TypeRef) -> Expr {
    expr(ExprKind::NoneLit, t)
}

pub fn some(e: Expr) -> Expr {
    let t = optional(e.ty.clone());
    expr(ExprKind::Some(Box::new(e)), t)
}

fn binary_with(left: Expr, op: BinOp, mode: ArithMode, right: Expr) -> Expr {
    let t = if op.is_arithmetic() {
        left.ty.clone()
    } else {
        ty("bool")
    };
    expr(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            mode,
            right: Box::new(right),
        },
        t,
    )
}

pub fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    binary_with(left, op, ArithMode::Checked, right)
}

pub fn wrapping(left: Expr, op: BinOp, right: Expr) -> Expr {
    binary_with(left, op, ArithMode::Wrapping, right)
}

pub fn neg(e: Expr) -> Expr {
    let t = e.ty.clone();
    expr(
        ExprKind::Unary {
            op: UnaryOp::Neg,
            mode: ArithMode::Checked,
            expr: Box::new(e),
        },
        t,
    )
}

pub fn call(callee: &str, args: Vec<Expr>, ret: TypeRef) -> Expr {
    call_in(&[], callee, args, ret)
}

pub fn call_in(path: &[&str], callee: &str, args: Vec<Expr>, ret: TypeRef) -> Expr {
    expr(
        ExprKind::Call {
            path: path.iter().map(|p| name(p)).collect(),
            callee: name(callee),
            args,
        },
        ret,
    )
}

pub fn method_call(receiver: Expr, method: &str, args: Vec<Expr>, ret: TypeRef) -> Expr {
    expr(
        ExprKind::MethodCall {
            receiver: Box::new(receiver),
            method: name(method),
            args,
        },
        ret,
    )
}

pub fn field(base: Expr, f: &str, t: TypeRef) -> Expr {
    expr(
        ExprKind::Field {
            base: Box::new(base),
            field: name(f),
        },
        t,
    )
}

pub fn index(base: Expr, idx: Expr, t: TypeRef) -> Expr {
    expr(
        ExprKind::Index {
            base: Box::new(base),
            index: Box::new(idx),
        },
        t,
    )
}

pub fn cast(e: Expr, kind: CastKind, target: TypeRef) -> Expr {
    let t = match kind {
        CastKind::Fallible => optional(target.clone()),
        _ => target.clone(),
    };
    expr(
        ExprKind::Cast {
            expr: Box::new(e),
            kind,
            target,
        },
        t,
    )
}

pub fn construct(t: TypeRef, fields: Vec<(&str, Expr)>) -> Expr {
    expr(
        ExprKind::Construct {
            ty: t.clone(),
            fields: fields.into_iter().map(|(n, e)| (name(n), e)).collect(),
        },
        t,
    )
}

pub fn enum_ctor(t: TypeRef, variant: &str, payload: CtorPayload) -> Expr {
    expr(
        ExprKind::EnumCtor {
            ty: t.clone(),
            variant: name(variant),
            payload,
        },
        t,
    )
}

pub fn array_lit(items: Vec<Expr>, elem: TypeRef) -> Expr {
    expr(ExprKind::ArrayLit(items), array(elem))
}

pub fn address_of(e: Expr) -> Expr {
    let t = raw_ptr(e.ty.clone());
    expr(ExprKind::AddressOf(Box::new(e)), t)
}

pub fn deref(e: Expr, t: TypeRef) -> Expr {
    expr(ExprKind::Deref(Box::new(e)), t)
}

pub fn match_expr(scrutinee: Expr, arms: Vec<MatchArm>, t: TypeRef) -> Expr {
    expr(
        ExprKind::Match(Box::new(MatchExpr {
            span: sp(),
            scrutinee,
            arms,
        })),
        t,
    )
}

// ---- patterns ----

pub fn arm(pattern: Pattern, stmts: Vec<Stmt>) -> MatchArm {
    MatchArm {
        span: sp(),
        pattern,
        body: block(stmts),
    }
}

pub fn catch_all() -> Pattern {
    Pattern::CatchAll { span: sp() }
}

pub fn pat(v: VariantPattern) -> Pattern {
    alts(vec![v])
}

pub fn alts(alts: Vec<VariantPattern>) -> Pattern {
    Pattern::Variants { span: sp(), alts }
}

pub fn variant(n: &str) -> VariantPattern {
    VariantPattern {
        span: sp(),
        name: name(n),
        bindings: PatternBindings::None,
    }
}

pub fn variant_pos(n: &str, binders: &[&str]) -> VariantPattern {
    VariantPattern {
        span: sp(),
        name: name(n),
        bindings: PatternBindings::Positional(binders.iter().map(|b| name(b)).collect()),
    }
}

pub fn variant_named(n: &str, binders: &[(&str, &str)]) -> VariantPattern {
    VariantPattern {
        span: sp(),
        name: name(n),
        bindings: PatternBindings::Named(
            binders
                .iter()
                .map(|(f, b)| FieldBinding {
                    field: name(f),
                    binder: name(b),
                })
                .collect(),
        ),
    }
}

// ---- statements ----

pub fn block(stmts: Vec<Stmt>) -> Block {
    Block { span: sp(), stmts }
}

pub fn let_stmt(n: &str, t: TypeRef, init: Expr) -> Stmt {
    Stmt::Let(LetStmt {
        span: sp(),
        name: name(n),
        mutable: false,
        ty: t,
        init,
    })
}

pub fn let_mut(n: &str, t: TypeRef, init: Expr) -> Stmt {
    Stmt::Let(LetStmt {
        span: sp(),
        name: name(n),
        mutable: true,
        ty: t,
        init,
    })
}

pub fn assign(target: Expr, value: Expr) -> Stmt {
    Stmt::Assign(AssignStmt {
        span: sp(),
        target,
        value,
    })
}

pub fn expr_stmt(e: Expr) -> Stmt {
    Stmt::Expr(e)
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::Return(ReturnStmt { span: sp(), value })
}

pub fn if_stmt(cond: Expr, then_stmts: Vec<Stmt>, else_stmts: Option<Vec<Stmt>>) -> Stmt {
    Stmt::If(IfStmt {
        span: sp(),
        cond,
        then_block: block(then_stmts),
        else_block: else_stmts.map(block),
    })
}

pub fn while_stmt(cond: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While(WhileStmt {
        span: sp(),
        cond,
        body: block(body),
    })
}

pub fn unsafe_block(stmts: Vec<Stmt>) -> Stmt {
    Stmt::Unsafe(UnsafeBlock {
        span: sp(),
        body: block(stmts),
    })
}

pub fn try_catch(body: Vec<Stmt>, binder: Option<&str>, handler: Vec<Stmt>) -> Stmt {
    Stmt::Try(TryStmt {
        span: sp(),
        body: block(body),
        catch: CatchClause {
            span: sp(),
            binder: binder.map(name),
            body: block(handler),
        },
    })
}

pub fn throw(value: Expr) -> Stmt {
    Stmt::Throw(ThrowStmt { span: sp(), value })
}

// ---- declarations ----

pub fn program(decls: Vec<Decl>) -> Program {
    Program { decls }
}

pub fn param(n: &str, t: TypeRef) -> Param {
    Param {
        span: sp(),
        name: name(n),
        ty: t,
    }
}

fn type_params(generics: &[&str]) -> Vec<TypeParam> {
    generics
        .iter()
        .map(|g| TypeParam {
            span: sp(),
            name: name(g),
        })
        .collect()
}

pub fn function_def(
    n: &str,
    params: Vec<Param>,
    ret: Option<TypeRef>,
    throws: bool,
    body: Vec<Stmt>,
) -> FunctionDef {
    FunctionDef {
        span: sp(),
        name: name(n),
        generics: vec![],
        params,
        ret,
        throws,
        body: Some(block(body)),
    }
}

pub fn function(
    n: &str,
    params: Vec<Param>,
    ret: Option<TypeRef>,
    throws: bool,
    body: Vec<Stmt>,
) -> Decl {
    Decl::Function(function_def(n, params, ret, throws, body))
}

pub fn generic_function(
    n: &str,
    generics: &[&str],
    params: Vec<Param>,
    ret: Option<TypeRef>,
    throws: bool,
    body: Vec<Stmt>,
) -> Decl {
    let mut f = function_def(n, params, ret, throws, body);
    f.generics = type_params(generics);
    Decl::Function(f)
}

pub fn extern_function(n: &str, params: Vec<Param>, ret: Option<TypeRef>, throws: bool) -> Decl {
    let mut f = function_def(n, params, ret, throws, vec![]);
    f.body = None;
    Decl::Function(f)
}

pub fn field_def(n: &str, t: TypeRef) -> FieldDef {
    FieldDef {
        span: sp(),
        name: name(n),
        ty: t,
    }
}

pub fn struct_def(n: &str, generics: &[&str], fields: Vec<FieldDef>) -> Decl {
    Decl::Struct(StructDef {
        span: sp(),
        name: name(n),
        params: type_params(generics),
        fields,
    })
}

pub fn class_def(
    n: &str,
    generics: &[&str],
    fields: Vec<FieldDef>,
    methods: Vec<FunctionDef>,
) -> Decl {
    Decl::Class(ClassDef {
        span: sp(),
        name: name(n),
        params: type_params(generics),
        fields,
        methods,
    })
}

pub fn enum_def(
    n: &str,
    generics: &[&str],
    underlying: Option<TypeRef>,
    variants: Vec<VariantDef>,
) -> Decl {
    Decl::Enum(EnumDef {
        span: sp(),
        name: name(n),
        params: type_params(generics),
        underlying,
        variants,
    })
}

pub fn unit_variant(n: &str) -> VariantDef {
    VariantDef {
        span: sp(),
        name: name(n),
        value: None,
        payload: VariantPayload::Unit,
    }
}

pub fn valued_variant(n: &str, value: i128) -> VariantDef {
    VariantDef {
        span: sp(),
        name: name(n),
        value: Some(Spanned::new(sp(), value)),
        payload: VariantPayload::Unit,
    }
}

pub fn single_variant(n: &str, t: TypeRef) -> VariantDef {
    VariantDef {
        span: sp(),
        name: name(n),
        value: None,
        payload: VariantPayload::Single(t),
    }
}

pub fn fields_variant(n: &str, fields: Vec<FieldDef>) -> VariantDef {
    VariantDef {
        span: sp(),
        name: name(n),
        value: None,
        payload: VariantPayload::Fields(fields),
    }
}

pub fn namespace(n: &str, decls: Vec<Decl>) -> Decl {
    Decl::Namespace(NamespaceDef {
        span: sp(),
        name: name(n),
        decls,
    })
}
