//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;

use fgc::codegen::{Binding, CallStatement, FunctionHeader, Operand};
use fgc::{
    CodeEmitter, Component, Direction, Function, Graph, GraphConfig, PortId, Result, SymbolTable,
    TypeDescriptor,
};
use serde_json::Value;

pub const COMPS: &str = "example.com/comps";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn port(component: &Component, index: usize) -> PortId {
    component.ports()[index].id()
}

fn int(v: &Value) -> i64 {
    v.as_i64().unwrap_or_default()
}

/// Adds a fixed value to its input.
pub fn comp_a(val: i64) -> Function {
    Function::new(
        vec![TypeDescriptor::context(), TypeDescriptor::int()],
        vec![TypeDescriptor::int()],
        move |args| vec![Value::from(val + int(&args[1]))],
    )
}

pub fn comp_b() -> Function {
    Function::new(
        vec![TypeDescriptor::int(), TypeDescriptor::bool()],
        vec![TypeDescriptor::int(), TypeDescriptor::error()],
        |args| {
            let f1 = int(&args[0]);
            if f1 < 0 {
                return vec![Value::from(0), Value::from("f1 is less than zero")];
            }
            vec![Value::from(f1 + 1), Value::Null]
        },
    )
}

pub fn comp_c() -> Function {
    Function::new(
        vec![
            TypeDescriptor::context(),
            TypeDescriptor::int(),
            TypeDescriptor::int(),
        ],
        vec![TypeDescriptor::int(), TypeDescriptor::error()],
        |args| {
            let (a1, b1) = (int(&args[1]), int(&args[2]));
            if a1 < 0 || b1 < 0 {
                return vec![Value::from(0), Value::from("a1 or b1 is less than zero")];
            }
            vec![Value::from(a1 + b1), Value::Null]
        },
    )
}

pub fn comp_d() -> Function {
    Function::new(vec![], vec![TypeDescriptor::bool()], |_| vec![Value::Bool(true)])
}

pub fn comp_e() -> Function {
    Function::new(vec![], vec![], |_| Vec::new())
}

/// Graph with boundary ports `ctx`, `in`, `result`, `err` and five
/// unwired components.
pub struct Fixture {
    pub graph: Graph,
    pub ctx: PortId,
    pub input: PortId,
    pub result: PortId,
    pub err: PortId,
    pub a: Component,
    pub b: Component,
    pub c: Component,
    pub d: Component,
    pub e: Component,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();

        let graph = Graph::new(
            GraphConfig::new("TestSync", "Test Flo Label", "Test Flo Description")
                .with_package("flows", "Package flows holds generated test flows."),
        )
        .unwrap();

        let ids = graph
            .add_ports([
                graph
                    .new_port("ctx", Direction::In, TypeDescriptor::context())
                    .unwrap(),
                graph
                    .new_port("in", Direction::In, TypeDescriptor::int())
                    .unwrap(),
                graph
                    .new_port("result", Direction::Out, TypeDescriptor::int())
                    .unwrap(),
                graph
                    .new_port("err", Direction::Out, TypeDescriptor::error())
                    .unwrap(),
            ])
            .unwrap();

        let make = |name: &str, letter: &str, f: Function| {
            let c = graph
                .new_component(
                    name,
                    COMPS,
                    format!("Test Comp {} Label", letter),
                    format!("Test Comp {} Description", letter),
                    f,
                )
                .unwrap();
            graph.add_component(c.clone()).unwrap();
            c
        };

        let a = make("CompA", "A", comp_a(10));
        let b = make("CompB", "B", comp_b());
        let c = make("CompC", "C", comp_c());
        let d = make("CompD", "D", comp_d());
        let e = make("CompE", "E", comp_e());

        Fixture {
            graph,
            ctx: ids[0],
            input: ids[1],
            result: ids[2],
            err: ids[3],
            a,
            b,
            c,
            d,
            e,
        }
    }

    /// Fixture with the reference wiring applied.
    pub fn wired() -> Self {
        let f = Self::new();
        f.wire();
        f
    }

    pub fn wire(&self) {
        let g = &self.graph;
        let gid = g.id();
        g.connect(gid, self.ctx, self.c.id(), port(&self.c, 0)).unwrap();
        g.connect(gid, self.ctx, self.a.id(), port(&self.a, 0)).unwrap();
        g.connect(gid, self.input, self.a.id(), port(&self.a, 1)).unwrap();
        g.connect(gid, self.input, self.b.id(), port(&self.b, 0)).unwrap();
        g.connect(self.d.id(), port(&self.d, 0), self.b.id(), port(&self.b, 1))
            .unwrap();
        g.connect(self.a.id(), port(&self.a, 2), self.c.id(), port(&self.c, 1))
            .unwrap();
        g.connect(self.b.id(), port(&self.b, 2), self.c.id(), port(&self.c, 2))
            .unwrap();
        g.connect(self.c.id(), port(&self.c, 3), gid, self.result).unwrap();
    }
}

#[derive(Debug, Clone)]
pub enum Step {
    Call(CallStatement),
    Guard(Vec<Operand>),
    Return(Vec<Operand>),
}

/// Emitter that records instructions; `finish` yields the bracketed labels
/// of the emitted calls.
#[derive(Debug, Default)]
pub struct Recording {
    pub header: Option<FunctionHeader>,
    pub steps: Vec<Step>,
}

impl Recording {
    pub fn call_names(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                Step::Call(c) => Some(c.name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<&CallStatement> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                Step::Call(c) => Some(c),
                _ => None,
            })
            .collect()
    }
}

impl CodeEmitter for Recording {
    fn begin_function(&mut self, header: &FunctionHeader) -> Result<()> {
        self.header = Some(header.clone());
        Ok(())
    }

    fn emit_call(&mut self, call: &CallStatement) -> Result<()> {
        self.steps.push(Step::Call(call.clone()));
        Ok(())
    }

    fn emit_error_guard(&mut self, returns: &[Operand]) -> Result<()> {
        self.steps.push(Step::Guard(returns.to_vec()));
        Ok(())
    }

    fn emit_return(&mut self, values: &[Operand]) -> Result<()> {
        self.steps.push(Step::Return(values.to_vec()));
        Ok(())
    }

    fn finish(&mut self) -> Result<String> {
        Ok(self
            .calls()
            .iter()
            .map(|c| format!("[{}]", c.label))
            .collect())
    }
}

fn eval(op: &Operand, env: &HashMap<String, Value>, err: &Value) -> Value {
    match op {
        Operand::Var(name) => env.get(name).cloned().unwrap_or(Value::Null),
        Operand::Error => err.clone(),
        Operand::Nil => Value::Null,
        Operand::Zero(ty) => ty.zero_value(),
    }
}

/// Run a recorded wrapper function, resolving calls through `symbols`.
pub fn execute(recording: &Recording, symbols: &SymbolTable, args: &[Value]) -> Vec<Value> {
    let header = recording.header.as_ref().expect("function was not begun");
    let mut env: HashMap<String, Value> = HashMap::new();
    let mut err = Value::Null;

    for (param, arg) in header.params.iter().zip(args) {
        if let Some(name) = &param.name {
            env.insert(name.clone(), arg.clone());
        }
    }

    for step in &recording.steps {
        match step {
            Step::Call(call) => {
                let function = symbols[&call.qualifier][&call.name]
                    .as_function()
                    .expect("symbol is not a function");
                let args: Vec<Value> = call.args.iter().map(|a| eval(a, &env, &err)).collect();
                let outs = function.call(&args);
                for (target, value) in call.targets.iter().zip(outs) {
                    match target {
                        Binding::Var(name) => {
                            env.insert(name.clone(), value);
                        }
                        Binding::Error => err = value,
                        Binding::Discard => {}
                    }
                }
            }
            Step::Guard(returns) => {
                if !err.is_null() {
                    return returns.iter().map(|r| eval(r, &env, &err)).collect();
                }
            }
            Step::Return(values) => {
                return values.iter().map(|v| eval(v, &env, &err)).collect();
            }
        }
    }

    panic!("function ended without return");
}
