//! Integration tests for rendering and Go code generation.

mod common;

use common::{execute, port, Fixture, Recording, COMPS};
use fgc::codegen::{Binding, Operand};
use fgc::{
    compile_graph, compile_graph_with_config, CancellationToken, Direction, EmitterConfig,
    Function, Graph, GraphConfig, GraphError, TypeDescriptor,
};
use serde_json::Value;

#[test]
fn renders_in_dependency_order() {
    let f = Fixture::wired();
    let mut rec = Recording::default();
    let out = f.graph.render(&mut rec, &CancellationToken::new()).unwrap();

    assert_eq!(
        out,
        "[Test Comp A Label][Test Comp D Label][Test Comp B Label][Test Comp C Label][Test Comp E Label]"
    );
    assert_eq!(
        rec.call_names(),
        vec!["CompA", "CompD", "CompB", "CompC", "CompE"]
    );
}

#[test]
fn call_statements_use_adopted_names() {
    let f = Fixture::wired();
    let mut rec = Recording::default();
    f.graph.render(&mut rec, &CancellationToken::new()).unwrap();
    let calls = rec.calls();

    let a_out = f.a.ports()[2].name().to_string();
    let b_out = f.b.ports()[2].name().to_string();
    let c_out = f.c.ports()[3].name().to_string();

    let c = calls.iter().find(|c| c.name == "CompC").unwrap();
    assert_eq!(
        c.args,
        vec![
            Operand::Var("ctx".into()),
            Operand::Var(a_out),
            Operand::Var(b_out),
        ]
    );
    assert_eq!(c.targets, vec![Binding::Var(c_out), Binding::Error]);

    let d = calls.iter().find(|c| c.name == "CompD").unwrap();
    assert!(d.args.is_empty());
    assert_eq!(d.targets.len(), 1);

    let e = calls.iter().find(|c| c.name == "CompE").unwrap();
    assert!(e.targets.is_empty());
    assert_eq!(e.qualifier, COMPS);
}

#[test]
fn header_names_connected_parameters_only() {
    let f = Fixture::new();
    let gid = f.graph.id();
    f.graph
        .connect(gid, f.input, f.b.id(), port(&f.b, 0))
        .unwrap();

    let mut rec = Recording::default();
    f.graph.render(&mut rec, &CancellationToken::new()).unwrap();
    let header = rec.header.unwrap();
    let names: Vec<_> = header.params.iter().map(|p| p.name.clone()).collect();
    assert_eq!(names, vec![None, Some("in".to_string())]);
    assert_eq!(
        header.returns,
        vec![TypeDescriptor::int(), TypeDescriptor::error()]
    );
}

#[test]
fn round_trip_executes_through_symbol_table() {
    let f = Fixture::wired();
    let mut rec = Recording::default();
    f.graph.render(&mut rec, &CancellationToken::new()).unwrap();
    let symbols = f.graph.symbols();

    let out = execute(&rec, &symbols, &[Value::Null, Value::from(2)]);
    assert_eq!(out, vec![Value::from(15), Value::Null]);
}

#[test]
fn round_trip_forwards_component_errors() {
    let f = Fixture::wired();
    let mut rec = Recording::default();
    f.graph.render(&mut rec, &CancellationToken::new()).unwrap();

    let out = execute(&rec, &f.graph.symbols(), &[Value::Null, Value::from(-5)]);
    assert_eq!(
        out,
        vec![Value::from(0), Value::from("f1 is less than zero")]
    );
}

#[test]
fn go_output_matches_generated_text_contract() {
    let f = Fixture::wired();
    let code = compile_graph(&f.graph).unwrap();

    let a_out = f.a.ports()[2].name();
    let b_out = f.b.ports()[2].name();
    let c_out = f.c.ports()[3].name();
    let d_out = f.d.ports()[0].name();

    assert!(code.starts_with("// Code generated by fgc. DO NOT EDIT.\n\n"));
    assert!(code.contains("// Package flows holds generated test flows.\npackage flows\n"));
    assert!(code.contains("import (\n\tcontext \"context\"\n\tcomps \"example.com/comps\"\n)\n"));
    assert!(code.contains("// TestSync Test Flo Description\n"));
    assert!(code.contains("func TestSync(ctx context.Context, in int) (int, error) {\n"));

    let expected_body = format!(
        "\t// Test Comp A Description\n\
         \t{a} := comps.CompA(ctx, in)\n\
         \n\
         \t// Test Comp D Description\n\
         \t{d} := comps.CompD()\n\
         \n\
         \t// Test Comp B Description\n\
         \t{b}, err := comps.CompB(in, {d})\n\
         \tif err != nil {{\n\
         \t\treturn 0, err\n\
         \t}}\n\
         \n\
         \t// Test Comp C Description\n\
         \t{c}, err := comps.CompC(ctx, {a}, {b})\n\
         \tif err != nil {{\n\
         \t\treturn 0, err\n\
         \t}}\n\
         \n\
         \t// Test Comp E Description\n\
         \tcomps.CompE()\n\
         \n\
         \treturn {c}, nil\n\
         }}\n",
        a = a_out,
        b = b_out,
        c = c_out,
        d = d_out,
    );
    assert!(code.ends_with(&expected_body), "unexpected body:\n{}", code);
}

#[test]
fn rendering_is_deterministic() {
    let f = Fixture::wired();
    let first = compile_graph(&f.graph).unwrap();
    let second = compile_graph(&f.graph).unwrap();
    assert_eq!(first, second);
}

#[test]
fn orphans_render_in_insertion_order() {
    common::init_tracing();
    let graph = Graph::new(GraphConfig::new("Orphans", "Orphans", "Only orphans")).unwrap();
    for name in ["Zeta", "Alpha", "Mid"] {
        let c = graph
            .new_component(name, COMPS, name, "", common::comp_e())
            .unwrap();
        graph.add_component(c).unwrap();
    }

    let mut rec = Recording::default();
    graph.render(&mut rec, &CancellationToken::new()).unwrap();
    assert_eq!(rec.call_names(), vec!["Zeta", "Alpha", "Mid"]);
}

#[test]
fn unconnected_inputs_receive_zero_values() {
    common::init_tracing();
    let graph = Graph::new(GraphConfig::new("Zeroes", "Zeroes", "Zero args")).unwrap();
    let f = Function::new(
        vec![TypeDescriptor::int(), TypeDescriptor::string()],
        vec![],
        |_| Vec::new(),
    );
    graph
        .add_component(graph.new_component("Take", COMPS, "Take", "", f).unwrap())
        .unwrap();

    let code = compile_graph(&graph).unwrap();
    assert!(code.contains("\tcomps.Take(0, \"\")\n"), "{}", code);
    assert!(code.contains("package zeroes\n"));
    assert!(code.contains("func Zeroes() {\n"));
}

#[test]
fn unconnected_outputs_return_zero_or_nil() {
    common::init_tracing();
    let graph = Graph::new(GraphConfig::new("Empty", "Empty", "Nothing wired")).unwrap();
    graph
        .add_ports([
            graph.new_port("flag", Direction::In, TypeDescriptor::bool()).unwrap(),
            graph.new_port("ok", Direction::Out, TypeDescriptor::bool()).unwrap(),
            graph.new_port("err", Direction::Out, TypeDescriptor::error()).unwrap(),
        ])
        .unwrap();

    let code = compile_graph(&graph).unwrap();
    assert!(code.contains("func Empty(_ bool) (bool, error) {\n\treturn false, nil\n}\n"), "{}", code);
}

#[test]
fn repeated_callable_renders_distinct_variables() {
    common::init_tracing();
    let graph = Graph::new(GraphConfig::new("Twice", "Twice", "Increments twice")).unwrap();
    let ids = graph
        .add_ports([
            graph.new_port("in", Direction::In, TypeDescriptor::int()).unwrap(),
            graph.new_port("out", Direction::Out, TypeDescriptor::int()).unwrap(),
        ])
        .unwrap();
    let inc = || {
        Function::new(vec![TypeDescriptor::int()], vec![TypeDescriptor::int()], |args| {
            vec![Value::from(args[0].as_i64().unwrap_or(0) + 1)]
        })
    };
    let first = graph
        .add_component(graph.new_component("Inc", COMPS, "Inc", "", inc()).unwrap())
        .unwrap();
    let second = graph
        .add_component(graph.new_component("Inc", COMPS, "Inc", "", inc()).unwrap())
        .unwrap();
    let first = graph.component(first).unwrap();
    let second = graph.component(second).unwrap();
    let v1 = first.ports()[1].name().to_string();
    let v2 = second.ports()[1].name().to_string();
    assert_ne!(v1, v2);

    let gid = graph.id();
    graph.connect(gid, ids[0], first.id(), port(&first, 0)).unwrap();
    graph
        .connect(first.id(), port(&first, 1), second.id(), port(&second, 0))
        .unwrap();
    graph.connect(second.id(), port(&second, 1), gid, ids[1]).unwrap();

    let code = compile_graph(&graph).unwrap();
    assert!(code.contains(&format!("\t{} := comps.Inc(in)\n", v1)), "{}", code);
    assert!(code.contains(&format!("\t{} := comps.Inc({})\n", v2, v1)), "{}", code);
    assert!(code.contains(&format!("\treturn {}\n", v2)), "{}", code);

    let mut rec = Recording::default();
    graph.render(&mut rec, &CancellationToken::new()).unwrap();
    let out = execute(&rec, &graph.symbols(), &[Value::from(3)]);
    assert_eq!(out, vec![Value::from(5)]);
}

#[test]
fn cancelled_render_fails() {
    let f = Fixture::wired();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = compile_graph_with_config(&f.graph, EmitterConfig::default(), &cancel).unwrap_err();
    assert!(matches!(err, GraphError::Cancelled));
}

#[test]
fn emitter_config_changes_spelling() {
    let f = Fixture::wired();
    let config = EmitterConfig {
        generator: "flowgen".to_string(),
        error_binding: "e".to_string(),
        ..EmitterConfig::default()
    };
    let code = compile_graph_with_config(&f.graph, config, &CancellationToken::new()).unwrap();
    assert!(code.starts_with("// Code generated by flowgen. DO NOT EDIT.\n"));
    assert!(code.contains("\tif e != nil {\n\t\treturn 0, e\n\t}\n"));
}
