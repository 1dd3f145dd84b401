//! # Flow Graph Compiler (FGC)
//!
//! Compiler for typed component dataflow graphs. Callables are wrapped as
//! components, wired together through typed ports, and rendered as a single
//! wrapper function that calls every component in dependency order and
//! returns the graph's declared outputs.
//!
//! FGC provides:
//! - A transactional graph model with validated connect/disconnect
//! - Cycle rejection at connect time
//! - Deterministic dependency-first rendering, orphans last
//! - Go code generation with aliased imports and error guards
//! - A symbol table binding generated call sites back to callables
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fgc::{compile_graph, Direction, Function, Graph, GraphConfig, TypeDescriptor};
//! use serde_json::Value;
//!
//! let graph = Graph::new(GraphConfig::new("Double", "Double", "Doubles its input"))?;
//! let input = graph.add_port(graph.new_port("in", Direction::In, TypeDescriptor::int())?)?;
//! let output = graph.add_port(graph.new_port("out", Direction::Out, TypeDescriptor::int())?)?;
//!
//! let double = Function::new(vec![TypeDescriptor::int()], vec![TypeDescriptor::int()], |args| {
//!     vec![Value::from(args[0].as_i64().unwrap_or(0) * 2)]
//! });
//! let component = graph.new_component("Double", "example.com/math", "Double", "Double it", double)?;
//! let (arg, result) = (component.ports()[0].id(), component.ports()[1].id());
//! let id = graph.add_component(component)?;
//!
//! graph.connect(graph.id(), input, id, arg)?;
//! graph.connect(id, result, graph.id(), output)?;
//!
//! let code = compile_graph(&graph)?;
//! std::fs::write("double.go", code)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! FGC follows a multi-phase compilation pipeline:
//!
//! 1. **Introspection** - Derive component ports from callable signatures
//! 2. **Wiring** - Validate and apply connections under the graph lock
//! 3. **Consistency** - Check ports against the connection index
//! 4. **Rendering** - Walk the graph dependency-first and emit instructions
//! 5. **Code Generation** - Spell the instructions as Go source

pub mod codegen;
pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod ids;
pub mod introspect;

// Re-export the main compilation API
pub use compiler::{compile_graph, compile_graph_with_config};

pub use codegen::{CodeEmitter, GoEmitter};
pub use config::{EmitterConfig, GraphConfig};
pub use error::{GraphError, Result};
pub use graph::{Component, Connection, Direction, Endpoint, Graph, Port, SymbolTable};
pub use ids::{ComponentId, ConnectionId, PortId};
pub use introspect::{
    Callable, DeclaredIntrospector, Function, IntrospectionError, Signature,
    SignatureIntrospector, TypeDescriptor, TypeKind,
};

// Re-export the cancellation token used by rendering
pub use tokio_util::sync::CancellationToken;
