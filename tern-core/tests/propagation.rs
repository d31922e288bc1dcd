use tern_ast::build::*;
use tern_core::{CallRoute, Checker, ErrorKind, SemanticError};

#[test]
fn throws_chain_is_accepted() {
    let p = program(vec![
        extern_function("g", vec![], None, true),
        function("f", vec![], None, true, vec![expr_stmt(call("g", vec![], ty("void")))]),
        function("h", vec![], None, true, vec![expr_stmt(call("f", vec![], ty("void")))]),
    ]);
    let annotations = Checker::new()
        .check_program(&p)
        .into_result()
        .expect("sema");
    assert_eq!(annotations.call_routes.len(), 2);
    assert!(annotations.call_routes.values().all(|r| *r == CallRoute::Propagate));
}

#[test]
fn failing_call_in_plain_function_is_rejected() {
    let p = program(vec![
        extern_function("g", vec![], None, true),
        function("k", vec![], None, false, vec![expr_stmt(call("g", vec![], ty("void")))]),
    ]);
    let diags = Checker::new()
        .check_program(&p)
        .into_result()
        .expect_err("expected sema error");
    match diags.iter().next() {
        Some(SemanticError::Propagation { callee, function, .. }) => {
            assert_eq!(callee, "g");
            assert_eq!(function, "k");
        }
        other => panic!("unexpected diagnostic: {other:?}"),
    }
}

#[test]
fn try_catch_stops_propagation() {
    let failing = call("g", vec![], ty("void"));
    let site = failing.id;
    let p = program(vec![
        extern_function("g", vec![], None, true),
        function(
            "k",
            vec![],
            None,
            false,
            vec![try_catch(vec![expr_stmt(failing)], Some("err"), vec![])],
        ),
    ]);
    let annotations = Checker::new()
        .check_program(&p)
        .into_result()
        .expect("sema");
    assert_eq!(annotations.call_routes.get(&site), Some(&CallRoute::Catch));
}

#[test]
fn non_failing_calls_need_no_route() {
    let p = program(vec![
        extern_function("pure", vec![], Some(ty("i32")), false),
        function(
            "k",
            vec![],
            None,
            false,
            vec![let_stmt("x", ty("i32"), call("pure", vec![], ty("i32")))],
        ),
    ]);
    let annotations = Checker::new()
        .check_program(&p)
        .into_result()
        .expect("sema");
    assert!(annotations.call_routes.is_empty());
}

#[test]
fn failing_methods_are_keyed_by_class() {
    let conn = class_def(
        "Conn",
        &[],
        vec![],
        vec![function_def("send", vec![], None, true, vec![])],
    );
    let p = program(vec![
        conn,
        function(
            "post",
            vec![param("c", ty("Conn"))],
            None,
            false,
            vec![expr_stmt(method_call(var("c", ty("Conn")), "send", vec![], ty("void")))],
        ),
    ]);
    let analysis = Checker::new().check_program(&p);
    match analysis.diagnostics.iter().next() {
        Some(SemanticError::Propagation { callee, function, .. }) => {
            assert_eq!(callee, "Conn.send");
            assert_eq!(function, "post");
        }
        other => panic!("unexpected diagnostic: {other:?}"),
    }
}

#[test]
fn qualified_calls_resolve_through_namespaces() {
    let p = program(vec![
        namespace("net", vec![extern_function("open", vec![], None, true)]),
        function(
            "connect",
            vec![],
            None,
            true,
            vec![expr_stmt(call_in(&["net"], "open", vec![], ty("void")))],
        ),
        function(
            "ping",
            vec![],
            None,
            false,
            vec![expr_stmt(call_in(&["net"], "open", vec![], ty("void")))],
        ),
    ]);
    let analysis = Checker::new().check_program(&p);
    assert_eq!(analysis.diagnostics.kinds(), vec![ErrorKind::Propagation]);
    assert_eq!(analysis.annotations.call_routes.len(), 1);
}

#[test]
fn throw_inside_throws_function_propagates() {
    let p = program(vec![function(
        "fail",
        vec![],
        None,
        true,
        vec![throw(string("boom"))],
    )]);
    let annotations = Checker::new()
        .check_program(&p)
        .into_result()
        .expect("sema");
    assert_eq!(
        annotations.call_routes.values().copied().collect::<Vec<_>>(),
        vec![CallRoute::Propagate]
    );
}
