use std::sync::Arc;

use tern_ast::build::*;
use tern_ast::Program;
use tern_core::{Checker, ErrorKind};

fn shared_types() -> Program {
    program(vec![
        struct_def("Boxed", &["T"], vec![field_def("value", ty("T"))]),
        extern_function("fetch", vec![], Some(ty("i32")), true),
    ])
}

fn unit(name: &str, throws: bool) -> (Program, tern_ast::NodeId) {
    let read = var("b", ty_args("Boxed", vec![ty("i64")]));
    let id = read.id;
    let p = program(vec![function(
        name,
        vec![param("b", ty_args("Boxed", vec![ty("i64")]))],
        None,
        throws,
        vec![
            expr_stmt(read),
            expr_stmt(call("fetch", vec![], ty("i32"))),
        ],
    )]);
    (p, id)
}

#[test]
fn units_check_in_parallel_against_one_registry() {
    let mut checker = Checker::new();
    assert!(checker.register_program(&shared_types()).is_empty());
    assert!(checker.close().is_empty());

    let units: Vec<(Program, tern_ast::NodeId)> = (0..8)
        .map(|i| unit(&format!("worker{i}"), i % 2 == 0))
        .collect();
    let programs: Vec<Program> = units.iter().map(|(p, _)| p.clone()).collect();

    let results = checker.check_units(&programs);
    assert_eq!(results.len(), 8);
    for (i, analysis) in results.iter().enumerate() {
        if i % 2 == 0 {
            assert!(analysis.is_ok(), "unit {i}: {}", analysis.diagnostics.summary());
        } else {
            assert_eq!(analysis.diagnostics.kinds(), vec![ErrorKind::Propagation]);
        }
    }

    // Each unit instantiates on its own; equal shapes are not shared across units.
    let first = &results[0].annotations.instances[&units[0].1];
    let second = &results[2].annotations.instances[&units[2].1];
    assert_eq!(first.name, second.name);
    assert!(!Arc::ptr_eq(first, second));
}
