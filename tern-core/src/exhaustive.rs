#![forbid(unsafe_code)]

//! Exhaustiveness Checker.
//!
//! Arms are taken in source order. Each variant is handled by the first arm
//! that names it; a catch-all takes whatever is left.

use std::collections::HashSet;

use tern_ast::visit::{Visitor, walk_expr};
use tern_ast::{Expr, ExprKind, MatchArm, MatchExpr, Pattern, PatternBindings, Span, VariantPattern};

use crate::annotate::{Annotations, MatchPlan};
use crate::diagnostics::Diagnostics;
use crate::error::SemanticError;
use crate::instantiate::Instantiator;
use crate::registry::{PayloadDef, TypeRegistry, VariantDef};
use crate::resolve::TypeTable;
use crate::types::Type;

/// Outcome of checking one match against a concrete enum.
#[derive(Debug, Default)]
pub struct MatchCoverage {
    pub errors: Vec<SemanticError>,
    /// Variant names each arm handles at runtime, in arm order.
    pub arms: Vec<Vec<String>>,
}

pub fn check_match(enum_name: &str, variants: &[VariantDef], arms: &[MatchArm], span: Span) -> MatchCoverage {
    let mut out = MatchCoverage::default();
    let mut covered: HashSet<&str> = HashSet::new();
    let mut catch_all = false;

    for arm in arms {
        let mut handled = Vec::new();
        match &arm.pattern {
            Pattern::CatchAll { span } => {
                if catch_all || covered.len() == variants.len() {
                    out.errors.push(SemanticError::UnreachableArm {
                        covered: "every variant".to_string(),
                        span: *span,
                    });
                }
                for v in variants {
                    if covered.insert(v.name.as_str()) {
                        handled.push(v.name.clone());
                    }
                }
                catch_all = true;
            }
            Pattern::Variants { alts, .. } => {
                for alt in alts {
                    let Some(v) = variants.iter().find(|v| v.name == alt.name.node) else {
                        out.errors.push(SemanticError::pattern_shape(
                            format!("'{enum_name}' has no variant '{}'", alt.name.node),
                            alt.span,
                        ));
                        continue;
                    };
                    if let Some(err) = check_bindings(v, alt) {
                        out.errors.push(err);
                    }
                    if covered.insert(v.name.as_str()) {
                        handled.push(v.name.clone());
                    } else {
                        out.errors.push(SemanticError::UnreachableArm {
                            covered: format!("variant '{}'", v.name),
                            span: alt.span,
                        });
                    }
                }
            }
        }
        out.arms.push(handled);
    }

    if !catch_all {
        let missing: Vec<String> = variants
            .iter()
            .filter(|v| !covered.contains(v.name.as_str()))
            .map(|v| v.name.clone())
            .collect();
        if !missing.is_empty() {
            out.errors.push(SemanticError::NonExhaustiveMatch {
                enum_name: enum_name.to_string(),
                missing,
                span,
            });
        }
    }
    out
}

fn check_bindings(v: &VariantDef, p: &VariantPattern) -> Option<SemanticError> {
    let name = &v.name;
    let message = match (&p.bindings, &v.payload) {
        (PatternBindings::None, _) => return None,
        (PatternBindings::Positional(b), PayloadDef::Unit) if b.is_empty() => return None,
        (PatternBindings::Named(b), PayloadDef::Unit) if b.is_empty() => return None,
        (PatternBindings::Positional(b), PayloadDef::Single(_)) if b.len() == 1 => return None,
        (PatternBindings::Positional(_) | PatternBindings::Named(_), PayloadDef::Unit) => {
            format!("'{name}' carries no payload")
        }
        (PatternBindings::Positional(b), PayloadDef::Single(_)) => {
            format!("'{name}' binds exactly one value by position, found {}", b.len())
        }
        (PatternBindings::Named(_), PayloadDef::Single(_)) => {
            format!("'{name}' carries a single value; bind it by position")
        }
        (PatternBindings::Positional(_), PayloadDef::Fields(_)) => {
            format!("'{name}' has named fields; bind them by name")
        }
        (PatternBindings::Named(bindings), PayloadDef::Fields(fields)) => {
            let mut seen = HashSet::new();
            for b in bindings {
                let field = b.field.node.as_str();
                if !fields.iter().any(|f| f.name == field) {
                    return Some(SemanticError::pattern_shape(
                        format!("'{name}' has no field '{field}'"),
                        b.field.span,
                    ));
                }
                if !seen.insert(field) {
                    return Some(SemanticError::pattern_shape(
                        format!("field '{field}' of '{name}' is bound twice"),
                        b.field.span,
                    ));
                }
            }
            return None;
        }
    };
    Some(SemanticError::pattern_shape(message, p.span))
}

/// `None`/`Some(T)` for the builtin optional.
fn optional_variants(inner: &Type, span: Span) -> Vec<VariantDef> {
    let variant = |name: &str, payload| VariantDef {
        name: name.to_string(),
        span,
        explicit: None,
        discriminant: None,
        payload,
    };
    vec![
        variant("None", PayloadDef::Unit),
        variant("Some", PayloadDef::Single(inner.clone())),
    ]
}

pub struct ExhaustivePass<'a, 'r> {
    registry: &'r TypeRegistry,
    instantiator: &'a mut Instantiator<'r>,
    types: &'a TypeTable,
    annotations: &'a mut Annotations,
    diags: &'a mut Diagnostics,
}

impl<'a, 'r> ExhaustivePass<'a, 'r> {
    pub fn new(
        registry: &'r TypeRegistry,
        instantiator: &'a mut Instantiator<'r>,
        types: &'a TypeTable,
        annotations: &'a mut Annotations,
        diags: &'a mut Diagnostics,
    ) -> Self {
        Self {
            registry,
            instantiator,
            types,
            annotations,
            diags,
        }
    }

    fn check(&mut self, expr: &Expr, m: &MatchExpr) {
        let scrutinee = self.types.expr(&m.scrutinee);
        let coverage = match scrutinee {
            Type::Unknown => return,
            Type::Optional(inner) => {
                let variants = optional_variants(inner, m.span);
                check_match(&scrutinee.to_string(), &variants, &m.arms, m.span)
            }
            Type::Adt { def, .. } if self.registry.get(*def).is_enum() => {
                let Some(concrete) = self.instantiator.instantiate_type(scrutinee) else {
                    return;
                };
                check_match(&concrete.name, concrete.variants(), &m.arms, m.span)
            }
            other => {
                for arm in &m.arms {
                    if let Pattern::Variants { span, .. } = &arm.pattern {
                        self.diags.push(SemanticError::pattern_shape(
                            format!("'{other}' is not an enum; only a catch-all arm can match it"),
                            *span,
                        ));
                    }
                }
                return;
            }
        };
        for err in coverage.errors {
            self.diags.push(err);
        }
        self.annotations.match_plans.insert(
            expr.id,
            MatchPlan {
                node: expr.id,
                arms: coverage.arms,
            },
        );
    }
}

impl Visitor for ExhaustivePass<'_, '_> {
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
        if let ExprKind::Match(m) = &expr.kind {
            self.check(expr, m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tern_ast::build::*;
    use tern_ast::span;

    fn unit(name: &str) -> VariantDef {
        VariantDef {
            name: name.to_string(),
            span: span(0, 0),
            explicit: None,
            discriminant: None,
            payload: PayloadDef::Unit,
        }
    }

    fn colors() -> Vec<VariantDef> {
        vec![unit("Red"), unit("Green"), unit("Blue")]
    }

    fn kinds(c: &MatchCoverage) -> Vec<ErrorKind> {
        c.errors.iter().map(|e| e.kind()).collect()
    }

    #[test]
    fn missing_variants_are_listed_in_declaration_order() {
        let arms = vec![arm(pat(variant("Green")), vec![])];
        let c = check_match("Color", &colors(), &arms, span(0, 0));
        match c.errors.as_slice() {
            [SemanticError::NonExhaustiveMatch { missing, .. }] => assert_eq!(missing, &["Red", "Blue"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn catch_all_takes_the_remaining_variants() {
        let arms = vec![
            arm(alts(vec![variant("Blue"), variant("Red")]), vec![]),
            arm(catch_all(), vec![]),
        ];
        let c = check_match("Color", &colors(), &arms, span(0, 0));
        assert!(c.errors.is_empty());
        assert_eq!(c.arms, vec![vec!["Blue".to_string(), "Red".to_string()], vec!["Green".to_string()]]);
    }

    #[test]
    fn catch_all_after_full_coverage_is_unreachable() {
        let arms = vec![
            arm(alts(vec![variant("Red"), variant("Green"), variant("Blue")]), vec![]),
            arm(catch_all(), vec![]),
        ];
        let c = check_match("Color", &colors(), &arms, span(0, 0));
        assert_eq!(kinds(&c), vec![ErrorKind::UnreachableArm]);
        assert_eq!(c.arms[1], Vec::<String>::new());
    }

    #[test]
    fn repeated_variant_is_unreachable() {
        let arms = vec![
            arm(pat(variant("Red")), vec![]),
            arm(alts(vec![variant("Green"), variant("Red")]), vec![]),
            arm(pat(variant("Blue")), vec![]),
        ];
        let c = check_match("Color", &colors(), &arms, span(0, 0));
        assert_eq!(kinds(&c), vec![ErrorKind::UnreachableArm]);
        assert_eq!(c.arms[1], vec!["Green".to_string()]);
    }

    #[test]
    fn unknown_variant_is_a_shape_error() {
        let arms = vec![arm(pat(variant("Purple")), vec![]), arm(catch_all(), vec![])];
        let c = check_match("Color", &colors(), &arms, span(0, 0));
        assert_eq!(kinds(&c), vec![ErrorKind::PatternShape]);
    }

    #[test]
    fn binding_shapes_follow_the_payload() {
        let single = VariantDef {
            payload: PayloadDef::Single(Type::Bool),
            ..unit("Some")
        };
        assert!(check_bindings(&single, &variant_pos("Some", &["v"])).is_none());
        assert!(check_bindings(&single, &variant("Some")).is_none());
        assert!(check_bindings(&single, &variant_pos("Some", &["a", "b"])).is_some());
        assert!(check_bindings(&single, &variant_named("Some", &[("v", "v")])).is_some());
        assert!(check_bindings(&unit("None"), &variant_pos("None", &["x"])).is_some());
    }
}
