#![forbid(unsafe_code)]

//! Overflow & Cast Enforcer.
//!
//! Marks every fixed-width integer operation for a runtime overflow check
//! (or wrapping, when requested), validates cast forms, and marks element
//! accesses for bounds checks. Literal-only expressions are evaluated here
//! with the runtime's own arithmetic when folding is enabled.

use std::collections::HashMap;

use tern_ast::visit::{Visitor, walk_expr};
use tern_ast::{ArithMode, BinOp, CastKind, Expr, ExprKind, NodeId, UnaryOp};
use tern_rt::{
    IntOp, IntType, NumericType, Scalar, asserting_cast, checked_binary, fallible_cast, saturating_cast,
    truncating_cast, wrapping_binary,
};

use crate::annotate::{Annotations, CastCheck, CheckMarker};
use crate::config::CheckConfig;
use crate::diagnostics::Diagnostics;
use crate::error::SemanticError;
use crate::resolve::TypeTable;
use crate::types::Type;

fn int_op(op: BinOp) -> Option<IntOp> {
    match op {
        BinOp::Add => Some(IntOp::Add),
        BinOp::Sub => Some(IntOp::Sub),
        BinOp::Mul => Some(IntOp::Mul),
        BinOp::Div => Some(IntOp::Div),
        BinOp::Rem => Some(IntOp::Rem),
        _ => None,
    }
}

/// Runtime check needed by `as?`/`as!` from `from` to `to`.
pub fn cast_check(from: NumericType, to: NumericType, elide: bool) -> CastCheck {
    use tern_rt::FloatType::{F32, F64};
    let exact = match (from, to) {
        (NumericType::Int(a), NumericType::Int(b)) => {
            if b.contains_range_of(a) {
                true
            } else {
                return CastCheck::Range;
            }
        }
        // f64 holds every integer up to 53 bits exactly, f32 up to 24.
        (NumericType::Int(a), NumericType::Float(F64)) => a.bits() <= 32,
        (NumericType::Int(a), NumericType::Float(F32)) => a.bits() <= 16,
        (NumericType::Float(_), NumericType::Int(_)) => false,
        (NumericType::Float(F32), NumericType::Float(_)) => true,
        (NumericType::Float(F64), NumericType::Float(F64)) => true,
        (NumericType::Float(F64), NumericType::Float(F32)) => false,
    };
    match (exact && elide, from, to) {
        (true, _, _) => CastCheck::None,
        (false, NumericType::Int(_), NumericType::Int(_)) => CastCheck::Range,
        (false, _, _) => CastCheck::Convert,
    }
}

pub struct ArithPass<'a> {
    config: &'a CheckConfig,
    types: &'a TypeTable,
    annotations: &'a mut Annotations,
    diags: &'a mut Diagnostics,
    /// Compile-time values of literal-only integer expressions.
    consts: HashMap<NodeId, i128>,
}

impl<'a> ArithPass<'a> {
    pub fn new(
        config: &'a CheckConfig,
        types: &'a TypeTable,
        annotations: &'a mut Annotations,
        diags: &'a mut Diagnostics,
    ) -> Self {
        Self {
            config,
            types,
            annotations,
            diags,
            consts: HashMap::new(),
        }
    }

    fn constant(&self, e: &Expr) -> Option<i128> {
        if self.config.fold_constants {
            self.consts.get(&e.id).copied()
        } else {
            None
        }
    }

    fn fold(&mut self, expr: &Expr, ty: IntType, result: Result<i128, tern_rt::Fault>) {
        match result {
            Ok(value) => {
                self.consts.insert(expr.id, value);
                self.annotations.mark(CheckMarker::Folded { node: expr.id, value });
            }
            Err(fault) => self.diags.push(SemanticError::ConstantOverflow {
                message: format!("{fault} (in {ty} constant)"),
                span: expr.span,
            }),
        }
    }

    fn arith(&mut self, expr: &Expr, op: IntOp, mode: ArithMode, ty: IntType, operands: (&Expr, Option<&Expr>)) {
        let (lhs, rhs) = operands;
        let lhs_c = self.constant(lhs);
        let rhs_c = match rhs {
            Some(r) => self.constant(r),
            None => Some(0),
        };
        if let (Some(a), Some(b)) = (lhs_c, rhs_c) {
            let result = match mode {
                ArithMode::Checked => checked_binary(op, ty, a, b),
                ArithMode::Wrapping => wrapping_binary(op, ty, a, b),
            };
            self.fold(expr, ty, result);
            return;
        }
        let marker = match mode {
            ArithMode::Checked => CheckMarker::Overflow {
                node: expr.id,
                op,
                ty,
                divide_by_zero: op.can_divide_by_zero(),
            },
            ArithMode::Wrapping => CheckMarker::Wrapping { node: expr.id, op, ty },
        };
        self.annotations.mark(marker);
    }

    fn cast(&mut self, expr: &Expr, inner: &Expr, kind: CastKind) {
        let from = self.types.expr(inner).clone();
        let to = self.types.cast_target(expr).clone();
        if from.is_unknown() || to.is_unknown() {
            return;
        }
        let invalid = |reason: &'static str| SemanticError::InvalidCast {
            from: from.to_string(),
            to: to.to_string(),
            keyword: kind.keyword(),
            reason,
            span: expr.span,
        };

        let check = match (kind, from.numeric(), to.numeric()) {
            (CastKind::Truncating | CastKind::Saturating, Some(_), Some(_)) => CastCheck::None,
            (CastKind::Truncating | CastKind::Saturating, _, _) => {
                self.diags.push(invalid("only numeric values can be truncated or saturated"));
                return;
            }
            (CastKind::Fallible | CastKind::Asserting, Some(a), Some(b)) => {
                cast_check(a, b, self.config.elide_infallible_casts)
            }
            (CastKind::Fallible | CastKind::Asserting, _, _) if from == to => CastCheck::None,
            (CastKind::Fallible | CastKind::Asserting, _, _) => {
                self.diags.push(invalid("types are neither both numeric nor identical"));
                return;
            }
        };

        if let (Some(v), Some(target)) = (self.constant(inner), to.numeric()) {
            self.fold_cast(expr, kind, v, target);
            return;
        }

        self.annotations.mark(CheckMarker::Cast {
            node: expr.id,
            kind,
            from,
            to,
            check,
        });
    }

    /// Casts of a known integer are decided here; the marker carries the
    /// result so no runtime conversion is emitted.
    fn fold_cast(&mut self, expr: &Expr, kind: CastKind, value: i128, target: NumericType) {
        let v = Scalar::Int(value);
        let result = match kind {
            CastKind::Fallible => fallible_cast(v, target),
            CastKind::Asserting => match asserting_cast(v, target) {
                Ok(r) => Some(r),
                Err(fault) => {
                    self.diags.push(SemanticError::ConstantOverflow {
                        message: fault.to_string(),
                        span: expr.span,
                    });
                    return;
                }
            },
            CastKind::Truncating => Some(truncating_cast(v, target)),
            CastKind::Saturating => Some(saturating_cast(v, target)),
        };
        // `as?` that succeeds yields an optional, not a foldable integer.
        if kind != CastKind::Fallible {
            if let Some(Scalar::Int(i)) = result {
                self.consts.insert(expr.id, i);
            }
        }
        self.annotations.mark(CheckMarker::FoldedCast {
            node: expr.id,
            kind,
            value: result,
        });
    }

    fn literal(&mut self, expr: &Expr, value: i128, ty: IntType) {
        if ty.contains(value) {
            self.consts.insert(expr.id, value);
        } else {
            self.diags.push(SemanticError::ConstantOverflow {
                message: format!(
                    "literal {value} does not fit {ty} [{}, {}]",
                    ty.min_value(),
                    ty.max_value()
                ),
                span: expr.span,
            });
        }
    }

    fn index(&mut self, expr: &Expr, base: &Expr, index: &Expr) {
        let idx_ty = self.types.expr(index);
        match idx_ty {
            Type::Int(_) | Type::Unknown => {}
            other => {
                self.diags.push(SemanticError::InvalidIndex {
                    message: format!("index must be an integer, found `{other}`"),
                    span: index.span,
                });
                return;
            }
        }
        // Literal values are known even with folding off.
        if let Some(&v) = self.consts.get(&index.id) {
            if v < 0 {
                self.diags.push(SemanticError::InvalidIndex {
                    message: format!("negative index {v} can never be in bounds"),
                    span: index.span,
                });
                return;
            }
        }
        if matches!(self.types.expr(base), Type::Array(_)) {
            self.annotations.mark(CheckMarker::Bounds { node: expr.id });
        }
    }
}

impl Visitor for ArithPass<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        // `-128` is one literal: its magnitude alone may not fit the type.
        if let ExprKind::Unary {
            op: UnaryOp::Neg,
            expr: inner,
            ..
        } = &expr.kind
        {
            if let (ExprKind::IntLit(v), Some(t)) = (&inner.kind, self.types.expr(expr).int()) {
                self.literal(expr, v.saturating_neg(), t);
                return;
            }
        }
        walk_expr(self, expr);
        let ty = self.types.expr(expr).int();
        match &expr.kind {
            ExprKind::IntLit(v) => {
                if let Some(t) = ty {
                    self.literal(expr, *v, t);
                }
            }
            ExprKind::Binary {
                left,
                op,
                mode,
                right,
            } => {
                if let (Some(t), Some(iop)) = (ty, int_op(*op)) {
                    self.arith(expr, iop, *mode, t, (left, Some(right)));
                }
            }
            ExprKind::Unary {
                op: UnaryOp::Neg,
                mode,
                expr: inner,
            } => {
                if let Some(t) = ty {
                    self.arith(expr, IntOp::Neg, *mode, t, (inner, None));
                }
            }
            ExprKind::Cast { expr: inner, kind, .. } => self.cast(expr, inner, *kind),
            ExprKind::Index { base, index } => self.index(expr, base, index),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_rt::FloatType;

    const I32: NumericType = NumericType::Int(IntType::I32);
    const I64: NumericType = NumericType::Int(IntType::I64);
    const U8: NumericType = NumericType::Int(IntType::U8);

    #[test]
    fn widening_integer_casts_need_no_check() {
        assert_eq!(cast_check(I32, I64, true), CastCheck::None);
        assert_eq!(cast_check(I32, I64, false), CastCheck::Range);
        assert_eq!(cast_check(I64, I32, true), CastCheck::Range);
        assert_eq!(cast_check(U8, I32, true), CastCheck::None);
    }

    #[test]
    fn float_casts_need_conversion_checks() {
        let f64_ = NumericType::Float(FloatType::F64);
        let f32_ = NumericType::Float(FloatType::F32);
        assert_eq!(cast_check(f64_, I32, true), CastCheck::Convert);
        assert_eq!(cast_check(I64, f64_, true), CastCheck::Convert);
        assert_eq!(cast_check(I32, f64_, true), CastCheck::None);
        assert_eq!(cast_check(f64_, f32_, true), CastCheck::Convert);
        assert_eq!(cast_check(f32_, f64_, true), CastCheck::None);
    }
}
