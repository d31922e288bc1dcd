#![forbid(unsafe_code)]

//! Fully name-resolved, typed tree handed to the safety core by the front end.
//!
//! Every expression carries the type the front end inferred for it (as a
//! [`TypeRef`]) and a [`NodeId`] that annotations are keyed by.

pub mod build;
pub mod visit;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use miette::SourceSpan;

pub type Span = SourceSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(span: Span, node: T) -> Self {
        Self { span, node }
    }
}

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

/// Zero-length span sitting just past the end of `s`.
pub fn span_end(s: Span) -> Span {
    span(s.offset() + s.len(), 0)
}

pub type Ident = Spanned<String>;

/// Identity of an expression node; stable for the lifetime of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

impl NodeId {
    /// Allocates a process-unique id. Front ends that number nodes themselves
    /// can construct `NodeId` directly instead.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Namespace(NamespaceDef),
    Struct(StructDef),
    Class(ClassDef),
    Enum(EnumDef),
    Function(FunctionDef),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NamespaceDef {
    pub span: Span,
    pub name: Ident,
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeParam {
    pub span: Span,
    pub name: Ident,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub span: Span,
    pub name: Ident,
    pub ty: TypeRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructDef {
    pub span: Span,
    pub name: Ident,
    pub params: Vec<TypeParam>,
    pub fields: Vec<FieldDef>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub span: Span,
    pub name: Ident,
    pub params: Vec<TypeParam>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<FunctionDef>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDef {
    pub span: Span,
    pub name: Ident,
    pub params: Vec<TypeParam>,
    /// `enum E: i32 { ... }`
    pub underlying: Option<TypeRef>,
    pub variants: Vec<VariantDef>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariantDef {
    pub span: Span,
    pub name: Ident,
    /// Explicit `= literal`.
    pub value: Option<Spanned<i128>>,
    pub payload: VariantPayload,
}

#[derive(Clone, Debug, PartialEq)]
pub enum VariantPayload {
    Unit,
    /// `Some(T)`
    Single(TypeRef),
    /// `Node(left: T, right: T)`
    Fields(Vec<FieldDef>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub span: Span,
    pub name: Ident,
    pub generics: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub ret: Option<TypeRef>,
    pub throws: bool,
    /// `None` for extern declarations.
    pub body: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub span: Span,
    pub name: Ident,
    pub ty: TypeRef,
}

/// Syntactic type reference, e.g. `a::b::Map<K, Optional<V>>`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    pub span: Span,
    pub path: Vec<Ident>,
    pub name: Ident,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn display(&self) -> String {
        let mut out = String::new();
        for seg in &self.path {
            out.push_str(&seg.node);
            out.push_str("::");
        }
        out.push_str(&self.name.node);
        if !self.args.is_empty() {
            let args = self
                .args
                .iter()
                .map(|a| a.display())
                .collect::<Vec<_>>()
                .join(", ");
            out.push('<');
            out.push_str(&args);
            out.push('>');
        }
        out
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.path.is_empty() && self.name.node == name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Let(LetStmt),
    Assign(AssignStmt),
    Expr(Expr),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    Block(Block),
    Unsafe(UnsafeBlock),
    Try(TryStmt),
    Throw(ThrowStmt),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LetStmt {
    pub span: Span,
    pub name: Ident,
    pub mutable: bool,
    pub ty: TypeRef,
    pub init: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssignStmt {
    pub span: Span,
    /// A place expression: identifier, field access, or index.
    pub target: Expr,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStmt {
    pub span: Span,
    pub value: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfStmt {
    pub span: Span,
    pub cond: Expr,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhileStmt {
    pub span: Span,
    pub cond: Expr,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnsafeBlock {
    pub span: Span,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TryStmt {
    pub span: Span,
    pub body: Block,
    pub catch: CatchClause,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    pub span: Span,
    /// `catch err { ... }` binds the failure; `catch { ... }` discards it.
    pub binder: Option<Ident>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThrowStmt {
    pub span: Span,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub ty: TypeRef,
    pub kind: ExprKind,
}

impl Expr {
    /// Identifiers, field accesses and element accesses name storage that
    /// outlives the expression; everything else produces a fresh value.
    pub fn is_place(&self) -> bool {
        match &self.kind {
            ExprKind::Ident(_) | ExprKind::Field { .. } | ExprKind::Index { .. } => true,
            ExprKind::Deref(_) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Ident(Ident),
    IntLit(i128),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(String),
    /// Absent optional.
    NoneLit,
    /// Present optional.
    Some(Box<Expr>),
    Unary {
        op: UnaryOp,
        mode: ArithMode,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        mode: ArithMode,
        right: Box<Expr>,
    },
    Call {
        path: Vec<Ident>,
        callee: Ident,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
    },
    Field {
        base: Box<Expr>,
        field: Ident,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Cast {
        expr: Box<Expr>,
        kind: CastKind,
        target: TypeRef,
    },
    /// `TypeName(field: value, ...)` for structs and classes.
    Construct {
        ty: TypeRef,
        fields: Vec<(Ident, Expr)>,
    },
    /// `Enum::Variant(...)`
    EnumCtor {
        ty: TypeRef,
        variant: Ident,
        payload: CtorPayload,
    },
    ArrayLit(Vec<Expr>),
    /// `&raw place`
    AddressOf(Box<Expr>),
    /// `*ptr`
    Deref(Box<Expr>),
    Match(Box<MatchExpr>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CtorPayload {
    Unit,
    Positional(Vec<Expr>),
    Named(Vec<(Ident, Expr)>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchExpr {
    pub span: Span,
    pub scrutinee: Expr,
    pub arms: Vec<MatchArm>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchArm {
    pub span: Span,
    pub pattern: Pattern,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    /// `else` / `_`
    CatchAll { span: Span },
    /// `A | B(x) | C(name: n)`
    Variants { span: Span, alts: Vec<VariantPattern> },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::CatchAll { span } | Pattern::Variants { span, .. } => *span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariantPattern {
    pub span: Span,
    pub name: Ident,
    pub bindings: PatternBindings,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PatternBindings {
    /// No parentheses: payload, if any, is ignored.
    None,
    Positional(Vec<Ident>),
    Named(Vec<FieldBinding>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldBinding {
    pub field: Ident,
    pub binder: Ident,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    And,
    Or,
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// Default operators are overflow-checked; the wrapping form has to be
/// requested by name (`a.wrapping_add(b)` in source).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArithMode {
    #[default]
    Checked,
    Wrapping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastKind {
    /// `as?`: absent on failure.
    Fallible,
    /// `as!`: program fault on failure.
    Asserting,
    /// `as truncated`
    Truncating,
    /// `as saturated`
    Saturating,
}

impl CastKind {
    pub fn keyword(self) -> &'static str {
        match self {
            CastKind::Fallible => "as?",
            CastKind::Asserting => "as!",
            CastKind::Truncating => "as truncated",
            CastKind::Saturating => "as saturated",
        }
    }
}
