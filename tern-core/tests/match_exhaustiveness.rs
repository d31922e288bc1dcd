use miette::{Result, miette};
use proptest::{
    prelude::{any, prop},
    test_runner::{Config, TestCaseError, TestRunner},
};
use tern_ast::build::*;
use tern_ast::{Decl, MatchArm, Program, TypeRef};
use tern_core::{Checker, ErrorKind, PayloadDef, SemanticError, VariantDef, check_match};

fn my_optional() -> Decl {
    enum_def(
        "MyOptional",
        &["T"],
        None,
        vec![single_variant("Some", ty("T")), unit_variant("None")],
    )
}

fn match_on(scrutinee: TypeRef, arms: Vec<MatchArm>) -> Program {
    program(vec![
        my_optional(),
        function(
            "f",
            vec![param("o", scrutinee.clone())],
            None,
            false,
            vec![expr_stmt(match_expr(var("o", scrutinee), arms, ty("void")))],
        ),
    ])
}

fn my_optional_i32() -> TypeRef {
    ty_args("MyOptional", vec![ty("i32")])
}

#[test]
fn match_missing_none_is_rejected() {
    let p = match_on(
        my_optional_i32(),
        vec![arm(pat(variant_pos("Some", &["value"])), vec![])],
    );
    let diags = Checker::new()
        .check_program(&p)
        .into_result()
        .expect_err("expected sema error");
    match diags.iter().collect::<Vec<_>>().as_slice() {
        [SemanticError::NonExhaustiveMatch {
            enum_name, missing, ..
        }] => {
            assert_eq!(enum_name, "MyOptional<i32>");
            assert_eq!(missing, &["None"]);
        }
        other => panic!("unexpected diagnostics: {other:?}"),
    }
}

#[test]
fn match_covering_every_variant_is_accepted() {
    let p = match_on(
        my_optional_i32(),
        vec![
            arm(pat(variant("None")), vec![]),
            arm(pat(variant_pos("Some", &["value"])), vec![]),
        ],
    );
    let annotations = Checker::new()
        .check_program(&p)
        .into_result()
        .expect("sema");
    let plan = annotations.match_plans.values().next().expect("match plan");
    assert_eq!(plan.arms, vec![vec!["None".to_string()], vec!["Some".to_string()]]);
}

#[test]
fn catch_all_completes_partial_coverage() {
    let p = match_on(
        my_optional_i32(),
        vec![arm(pat(variant("None")), vec![]), arm(catch_all(), vec![])],
    );
    let analysis = Checker::new().check_program(&p);
    assert!(analysis.is_ok(), "{}", analysis.diagnostics.summary());
}

#[test]
fn arm_after_catch_all_is_unreachable() {
    let p = match_on(
        my_optional_i32(),
        vec![arm(catch_all(), vec![]), arm(pat(variant("None")), vec![])],
    );
    let analysis = Checker::new().check_program(&p);
    assert_eq!(analysis.diagnostics.kinds(), vec![ErrorKind::UnreachableArm]);
}

#[test]
fn alternatives_share_one_arm() {
    let p = match_on(
        my_optional_i32(),
        vec![arm(alts(vec![variant("Some"), variant("None")]), vec![])],
    );
    let annotations = Checker::new()
        .check_program(&p)
        .into_result()
        .expect("sema");
    let plan = annotations.match_plans.values().next().expect("match plan");
    assert_eq!(plan.arms, vec![vec!["Some".to_string(), "None".to_string()]]);
}

#[test]
fn struct_like_variants_bind_by_field_name() {
    let shape = enum_def(
        "Shape",
        &[],
        None,
        vec![
            fields_variant(
                "Rect",
                vec![field_def("w", ty("i32")), field_def("h", ty("i32"))],
            ),
            unit_variant("Empty"),
        ],
    );
    let body = |pattern| {
        vec![expr_stmt(match_expr(
            var("s", ty("Shape")),
            vec![arm(pattern, vec![]), arm(pat(variant("Empty")), vec![])],
            ty("void"),
        ))]
    };
    let good = program(vec![
        shape.clone(),
        function(
            "f",
            vec![param("s", ty("Shape"))],
            None,
            false,
            body(pat(variant_named("Rect", &[("w", "width"), ("h", "height")]))),
        ),
    ]);
    assert!(Checker::new().check_program(&good).is_ok());

    let bad = program(vec![
        shape,
        function(
            "f",
            vec![param("s", ty("Shape"))],
            None,
            false,
            body(pat(variant_named("Rect", &[("depth", "d")]))),
        ),
    ]);
    let analysis = Checker::new().check_program(&bad);
    assert_eq!(analysis.diagnostics.kinds(), vec![ErrorKind::PatternShape]);
}

#[test]
fn builtin_optional_has_none_and_some() {
    let p = match_on(
        optional(ty("i32")),
        vec![arm(pat(variant_pos("Some", &["v"])), vec![])],
    );
    let analysis = Checker::new().check_program(&p);
    match analysis.diagnostics.iter().next() {
        Some(SemanticError::NonExhaustiveMatch { missing, .. }) => assert_eq!(missing, &["None"]),
        other => panic!("unexpected diagnostic: {other:?}"),
    }
}

#[test]
fn variant_pattern_on_non_enum_is_a_shape_error() {
    let p = match_on(ty("i32"), vec![arm(pat(variant("Some")), vec![])]);
    let analysis = Checker::new().check_program(&p);
    assert_eq!(analysis.diagnostics.kinds(), vec![ErrorKind::PatternShape]);
}

#[test]
fn variants_of_another_enum_do_not_resolve() {
    let p = match_on(
        my_optional_i32(),
        vec![arm(pat(variant("Red")), vec![]), arm(catch_all(), vec![])],
    );
    let analysis = Checker::new().check_program(&p);
    assert_eq!(analysis.diagnostics.kinds(), vec![ErrorKind::PatternShape]);
}

fn unit_variants(n: usize) -> Vec<VariantDef> {
    (0..n)
        .map(|i| VariantDef {
            name: format!("V{i}"),
            span: tern_ast::span(0, 0),
            explicit: None,
            discriminant: None,
            payload: PayloadDef::Unit,
        })
        .collect()
}

#[test]
fn missing_variants_are_exactly_the_uncovered_ones() -> Result<()> {
    let strat = (
        1usize..10,
        prop::collection::vec(any::<u8>(), 0..12),
        any::<bool>(),
    );
    let mut runner = TestRunner::new(Config {
        cases: 256,
        ..Config::default()
    });
    runner
        .run(&strat, |(n, picks, with_catch_all)| {
            let variants = unit_variants(n);
            let mut arms: Vec<MatchArm> = picks
                .iter()
                .map(|p| arm(pat(variant(&format!("V{}", *p as usize % n))), vec![]))
                .collect();
            if with_catch_all {
                arms.push(arm(catch_all(), vec![]));
            }

            let coverage = check_match("E", &variants, &arms, tern_ast::span(0, 0));

            let covered: Vec<&str> = picks
                .iter()
                .map(|p| variants[*p as usize % n].name.as_str())
                .collect();
            let expected: Vec<String> = if with_catch_all {
                vec![]
            } else {
                variants
                    .iter()
                    .filter(|v| !covered.contains(&v.name.as_str()))
                    .map(|v| v.name.clone())
                    .collect()
            };
            let reported: Vec<String> = coverage
                .errors
                .iter()
                .filter_map(|e| match e {
                    SemanticError::NonExhaustiveMatch { missing, .. } => Some(missing.clone()),
                    _ => None,
                })
                .flatten()
                .collect();
            if reported != expected {
                return Err(TestCaseError::fail(format!(
                    "{n} variants, arms {picks:?}, catch-all {with_catch_all}: missing {reported:?}, expected {expected:?}"
                )));
            }

            // Every covered variant is handled by exactly one arm.
            let mut handled: Vec<String> = coverage.arms.concat();
            handled.sort();
            let mut want: Vec<String> = variants
                .iter()
                .map(|v| v.name.clone())
                .filter(|name| !expected.contains(name))
                .collect();
            want.sort();
            if handled != want {
                return Err(TestCaseError::fail(format!(
                    "arms {picks:?}: handled {handled:?}, expected {want:?}"
                )));
            }
            Ok(())
        })
        .map_err(|e| miette!("{e}"))
}
