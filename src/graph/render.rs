//! # Rendering
//!
//! Dependency-first traversal that drives a [`CodeEmitter`]. Components fed by
//! the graph's boundary inputs are rendered first, each after all of its
//! upstream producers; components unreachable from the boundary follow in
//! insertion order.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use super::{port, Component, Connection, Graph, GraphState, Port};
use crate::codegen::{Binding, CallStatement, CodeEmitter, FunctionHeader, Operand, Parameter};
use crate::error::{GraphError, Result};
use crate::ids::{ComponentId, ConnectionId};

impl Graph {
    /// Render the wrapper function through `emitter`.
    ///
    /// The graph stays locked for the whole render. `cancel` is polled before
    /// each component is emitted.
    pub fn render<E>(&self, emitter: &mut E, cancel: &CancellationToken) -> Result<String>
    where
        E: CodeEmitter + ?Sized,
    {
        let state = self.state.lock();
        let (inputs, outputs) = port::partition(&state.ports);

        tracing::debug!(
            "[RENDER] Rendering {} ({} inputs, {} outputs, {} components)",
            self.config.name,
            inputs.len(),
            outputs.len(),
            state.components.len()
        );

        emitter.begin_function(&FunctionHeader {
            name: self.config.name.clone(),
            label: self.config.label.clone(),
            description: self.config.description.clone(),
            package_name: self.config.package_name.clone(),
            package_description: self.config.package_description.clone(),
            params: inputs
                .iter()
                .map(|p| Parameter {
                    name: p.is_connected().then(|| p.name().to_string()),
                    ty: p.ty().clone(),
                })
                .collect(),
            returns: outputs.iter().map(|p| p.ty().clone()).collect(),
        })?;

        let mut renderer = Renderer {
            graph_id: self.id,
            state: &*state,
            emitter: &mut *emitter,
            cancel,
            outputs: &outputs,
            rendered: HashSet::with_capacity(state.components.len()),
            visiting: HashSet::new(),
        };

        // Start at the graph's inputs.
        for input in &inputs {
            for conn_id in input.connections() {
                let conn = renderer.connection(input, *conn_id)?;
                let consumer = conn.input().component;
                if consumer == self.id {
                    continue;
                }
                let component = state.components.get(&consumer).ok_or(
                    GraphError::DanglingConnection {
                        connection: conn.id(),
                        role: "ingoing",
                        component: consumer,
                    },
                )?;
                renderer.render_component(component)?;
            }
        }

        // Orphans, in insertion order.
        for id in &state.order {
            if renderer.rendered.contains(id) {
                continue;
            }
            let component = state
                .components
                .get(id)
                .ok_or(GraphError::ComponentNotFound(*id))?;
            tracing::debug!("[RENDER] Orphaned component {}.{}", component.qualifier(), component.name());
            renderer.render_component(component)?;
        }

        let returns: Vec<Operand> = outputs
            .iter()
            .map(|out| {
                if out.is_connected() {
                    Operand::Var(out.name().to_string())
                } else if out.is_error() {
                    Operand::Nil
                } else {
                    Operand::Zero(out.ty().clone())
                }
            })
            .collect();
        emitter.emit_return(&returns)?;

        emitter.finish()
    }
}

struct Renderer<'g, E: CodeEmitter + ?Sized> {
    graph_id: ComponentId,
    state: &'g GraphState,
    emitter: &'g mut E,
    cancel: &'g CancellationToken,
    outputs: &'g [&'g Port],
    rendered: HashSet<ComponentId>,
    /// Components whose dependencies are being rendered right now.
    visiting: HashSet<ComponentId>,
}

impl<'g, E: CodeEmitter + ?Sized> Renderer<'g, E> {
    fn connection(&self, port: &Port, id: ConnectionId) -> Result<Connection> {
        self.state.connections.get(&id).copied().ok_or_else(|| {
            GraphError::Inconsistent(format!(
                "port {} references unknown connection {}",
                port.id(),
                id
            ))
        })
    }

    fn render_component(&mut self, component: &'g Component) -> Result<()> {
        let id = component.id();
        if self.rendered.contains(&id) {
            return Ok(());
        }
        if !self.visiting.insert(id) {
            return Err(GraphError::CycleDetected { from: id, to: id });
        }

        // Producers first.
        let state = self.state;
        for input in component.inputs() {
            for conn_id in input.connections() {
                let conn = self.connection(input, *conn_id)?;
                let producer = conn.out().component;
                if producer == self.graph_id || self.rendered.contains(&producer) {
                    continue;
                }
                let upstream = state.components.get(&producer).ok_or(
                    GraphError::DanglingConnection {
                        connection: conn.id(),
                        role: "outgoing",
                        component: producer,
                    },
                )?;
                self.render_component(upstream)?;
            }
        }

        if self.cancel.is_cancelled() {
            tracing::debug!("[RENDER] Cancelled before {}.{}", component.qualifier(), component.name());
            return Err(GraphError::Cancelled);
        }

        let mut has_error = false;
        let targets = component
            .outputs()
            .map(|out| {
                if out.is_connected() {
                    Binding::Var(out.name().to_string())
                } else if out.is_error() {
                    has_error = true;
                    Binding::Error
                } else {
                    Binding::Discard
                }
            })
            .collect();
        let args = component
            .inputs()
            .map(|input| {
                if input.is_connected() {
                    Operand::Var(input.name().to_string())
                } else {
                    Operand::Zero(input.ty().clone())
                }
            })
            .collect();

        tracing::debug!("[RENDER] Emitting {}.{}", component.qualifier(), component.name());
        self.emitter.emit_call(&CallStatement {
            component: id,
            label: component.label().to_string(),
            description: component.description().to_string(),
            targets,
            qualifier: component.qualifier().to_string(),
            name: component.name().to_string(),
            args,
        })?;

        if has_error {
            let returns: Vec<Operand> = self
                .outputs
                .iter()
                .map(|out| {
                    if out.is_error() {
                        Operand::Error
                    } else {
                        Operand::Zero(out.ty().clone())
                    }
                })
                .collect();
            self.emitter.emit_error_guard(&returns)?;
        }

        self.visiting.remove(&id);
        self.rendered.insert(id);
        Ok(())
    }
}
