//! # Flow Graph
//!
//! The graph owns its boundary ports, its components and the connection
//! index. Every public operation takes the graph lock for its whole duration
//! and validates completely before mutating, so callers only ever observe
//! whole transactions.
//!
//! Connection rules:
//! 1. graph and component: IN(graph) -> IN(component) and OUT(component) -> OUT(graph).
//! 2. component and component: OUT(component) -> IN(component).

mod component;
mod connection;
mod port;
mod render;
mod validate;

pub use component::Component;
pub use connection::{Connection, Endpoint};
pub use port::{to_camel_case, Direction, Port};

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::ids::{ComponentId, ConnectionId, PortId};
use crate::introspect::{Callable, DeclaredIntrospector, SignatureIntrospector, TypeDescriptor};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Qualifier -> component name -> callable.
pub type SymbolTable = BTreeMap<String, BTreeMap<String, Callable>>;

/// A bidirectional graph of components, rendered as one wrapper function.
///
/// Boundary ports are the wrapper's parameters (IN) and results (OUT);
/// components are the calls made inside it.
pub struct Graph {
    id: ComponentId,
    config: GraphConfig,
    introspector: Arc<dyn SignatureIntrospector>,
    state: Mutex<GraphState>,
}

#[derive(Debug, Default)]
pub(crate) struct GraphState {
    pub(crate) ports: Vec<Port>,
    pub(crate) components: HashMap<ComponentId, Component>,
    /// Component insertion order, used for orphan rendering.
    pub(crate) order: Vec<ComponentId>,
    pub(crate) connections: HashMap<ConnectionId, Connection>,
}

impl GraphState {
    /// Ports owned by `owner`: the boundary ports when `owner` is the graph.
    pub(crate) fn owner_ports(&self, graph_id: ComponentId, owner: ComponentId) -> Option<&[Port]> {
        if owner == graph_id {
            Some(&self.ports)
        } else {
            self.components.get(&owner).map(Component::ports)
        }
    }

    pub(crate) fn port(&self, graph_id: ComponentId, owner: ComponentId, id: PortId) -> Option<&Port> {
        self.owner_ports(graph_id, owner)
            .and_then(|ports| port::find(ports, id))
    }

    fn port_mut(&mut self, graph_id: ComponentId, owner: ComponentId, id: PortId) -> Option<&mut Port> {
        if owner == graph_id {
            port::find_mut(&mut self.ports, id)
        } else {
            self.components.get_mut(&owner)?.port_mut(id)
        }
    }

    /// Whether `target` is downstream of `from` through component edges.
    fn reaches(&self, from: ComponentId, target: ComponentId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            let Some(component) = self.components.get(&current) else {
                continue;
            };
            for out in component.outputs() {
                for conn_id in out.connections() {
                    if let Some(conn) = self.connections.get(conn_id) {
                        stack.push(conn.input().component);
                    }
                }
            }
        }

        false
    }
}

impl Graph {
    /// Create a graph using the [`DeclaredIntrospector`].
    pub fn new(config: GraphConfig) -> Result<Self> {
        Self::with_introspector(config, Arc::new(DeclaredIntrospector))
    }

    pub fn with_introspector(
        config: GraphConfig,
        introspector: Arc<dyn SignatureIntrospector>,
    ) -> Result<Self> {
        config.validate()?;

        let graph = Self {
            id: ComponentId::new(),
            config,
            introspector,
            state: Mutex::new(GraphState::default()),
        };
        tracing::debug!("[GRAPH] Created graph {} ({})", graph.config.name, graph.id);
        Ok(graph)
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn description(&self) -> &str {
        &self.config.description
    }

    pub fn package_name(&self) -> &str {
        &self.config.package_name
    }

    pub fn package_description(&self) -> &str {
        &self.config.package_description
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn introspector(&self) -> &dyn SignatureIntrospector {
        self.introspector.as_ref()
    }

    /// Build a boundary port owned by this graph. It still has to be added.
    pub fn new_port(&self, name: &str, direction: Direction, ty: TypeDescriptor) -> Result<Port> {
        Port::new(name, direction, ty, self.id, self.introspector.as_ref())
    }

    /// Build a component using this graph's introspector. It still has to be added.
    pub fn new_component(
        &self,
        name: impl Into<String>,
        qualifier: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        callable: impl Into<Callable>,
    ) -> Result<Component> {
        Component::new(
            name,
            qualifier,
            label,
            description,
            callable,
            self.introspector.as_ref(),
        )
    }

    // ---- boundary ports ----

    /// Append a boundary port. Insertion order is the emitted parameter and
    /// return order.
    pub fn add_port(&self, port: Port) -> Result<PortId> {
        let mut state = self.state.lock();
        Self::check_new_port(&state.ports, &port)?;
        Ok(self.push_port(&mut state, port))
    }

    /// Append several boundary ports; nothing is added if any is rejected.
    pub fn add_ports(&self, ports: impl IntoIterator<Item = Port>) -> Result<Vec<PortId>> {
        let ports: Vec<Port> = ports.into_iter().collect();
        let mut state = self.state.lock();

        for (i, port) in ports.iter().enumerate() {
            Self::check_new_port(&state.ports, port)?;
            Self::check_new_port(&ports[..i], port)?;
        }

        Ok(ports
            .into_iter()
            .map(|port| self.push_port(&mut state, port))
            .collect())
    }

    fn check_new_port(existing: &[Port], port: &Port) -> Result<()> {
        if port.is_connected() {
            return Err(GraphError::CarriesConnections {
                kind: "port",
                id: port.id().to_string(),
            });
        }
        if existing
            .iter()
            .any(|p| p.name() == port.name() && p.direction() == port.direction())
        {
            tracing::debug!(
                "[GRAPH] Rejected duplicate port {:?} ({})",
                port.name(),
                port.direction()
            );
            return Err(GraphError::DuplicatePort {
                name: port.name().to_string(),
                direction: port.direction(),
            });
        }
        if existing.iter().any(|p| p.id() == port.id()) {
            return Err(GraphError::Inconsistent(format!(
                "port id {} is already registered",
                port.id()
            )));
        }
        Ok(())
    }

    fn push_port(&self, state: &mut GraphState, mut port: Port) -> PortId {
        port.set_parent(self.id);
        let id = port.id();
        tracing::debug!(
            "[GRAPH] Added {} port {:?} ({})",
            port.direction(),
            port.name(),
            port.ty()
        );
        state.ports.push(port);
        id
    }

    pub fn remove_port(&self, id: PortId) -> Result<()> {
        if id.is_nil() {
            return Err(GraphError::InvalidId("port"));
        }

        let mut state = self.state.lock();
        let index = state
            .ports
            .iter()
            .position(|p| p.id() == id)
            .ok_or(GraphError::PortNotFound {
                port: id,
                owner: self.id,
            })?;
        if state.ports[index].is_connected() {
            return Err(GraphError::HasConnections {
                kind: "graph port",
                id: id.to_string(),
            });
        }

        state.ports.remove(index);
        tracing::debug!("[GRAPH] Removed port {}", id);
        Ok(())
    }

    /// Snapshot of the boundary ports in insertion order.
    pub fn ports(&self) -> Vec<Port> {
        self.state.lock().ports.clone()
    }

    pub fn port(&self, id: PortId) -> Option<Port> {
        port::find(&self.state.lock().ports, id).cloned()
    }

    // ---- components ----

    /// Register a component. Existing entries are never overwritten.
    ///
    /// Components may share a qualifier and name; a later instance whose OUT
    /// variable names are already taken gets fresh ones.
    pub fn add_component(&self, mut component: Component) -> Result<ComponentId> {
        let mut state = self.state.lock();
        let id = component.id();

        if id == self.id || state.components.contains_key(&id) {
            return Err(GraphError::DuplicateComponent(id));
        }
        if component.has_connections() {
            return Err(GraphError::CarriesConnections {
                kind: "component",
                id: id.to_string(),
            });
        }

        let instance = {
            let taken: HashSet<&str> = state
                .components
                .values()
                .flat_map(Component::outputs)
                .map(Port::name)
                .collect();
            (0..)
                .find(|n| {
                    component
                        .output_names(*n)
                        .iter()
                        .all(|name| !taken.contains(name.as_str()))
                })
                .unwrap_or_default()
        };
        if instance > 0 {
            let names = component.output_names(instance);
            component.rename_outputs(names);
        }

        tracing::debug!(
            "[GRAPH] Added component {}.{} #{} ({})",
            component.qualifier(),
            component.name(),
            instance,
            id
        );
        state.components.insert(id, component);
        state.order.push(id);
        Ok(id)
    }

    /// Remove a component; refused while any of its ports is connected.
    pub fn remove_component(&self, id: ComponentId) -> Result<()> {
        if id.is_nil() {
            return Err(GraphError::InvalidId("component"));
        }

        let mut state = self.state.lock();
        let component = state
            .components
            .get(&id)
            .ok_or(GraphError::ComponentNotFound(id))?;
        if component.has_connections() {
            return Err(GraphError::HasConnections {
                kind: "component",
                id: id.to_string(),
            });
        }

        state.components.remove(&id);
        state.order.retain(|c| *c != id);
        tracing::debug!("[GRAPH] Removed component {}", id);
        Ok(())
    }

    pub fn component(&self, id: ComponentId) -> Option<Component> {
        self.state.lock().components.get(&id).cloned()
    }

    /// Snapshot of all components in insertion order.
    pub fn components(&self) -> Vec<Component> {
        let state = self.state.lock();
        state
            .order
            .iter()
            .filter_map(|id| state.components.get(id).cloned())
            .collect()
    }

    pub fn component_count(&self) -> usize {
        self.state.lock().components.len()
    }

    // ---- connections ----

    /// Connect an OUT-side port to an IN-side port.
    ///
    /// Passing the graph's own id on either side addresses its boundary
    /// ports, whose direction check is inverted. On success the IN-side port
    /// adopts the OUT-side port's name.
    pub fn connect(
        &self,
        out_component: ComponentId,
        out_port: PortId,
        in_component: ComponentId,
        in_port: PortId,
    ) -> Result<ConnectionId> {
        connection::check_ids(out_component, out_port, in_component, in_port)?;

        let mut state = self.state.lock();
        let out_is_graph = out_component == self.id;
        let in_is_graph = in_component == self.id;

        let out = self.resolve(&state, "out", out_component, out_port)?;
        let expected = if out_is_graph { Direction::In } else { Direction::Out };
        if out.direction() != expected {
            return Err(GraphError::WrongDirection {
                side: "out",
                owner_kind: owner_kind(out_is_graph),
                port: out_port,
                expected,
            });
        }

        let inp = self.resolve(&state, "in", in_component, in_port)?;
        let expected = if in_is_graph { Direction::Out } else { Direction::In };
        if inp.direction() != expected {
            return Err(GraphError::WrongDirection {
                side: "in",
                owner_kind: owner_kind(in_is_graph),
                port: in_port,
                expected,
            });
        }

        if out_component == in_component {
            return Err(GraphError::SelfConnection(out_component));
        }

        if out.name().is_empty() {
            return Err(GraphError::UnnamedSource(out_port));
        }

        if inp.is_connected() {
            return Err(GraphError::AlreadyConnected(in_port));
        }

        let source_direction = out.direction();
        let duplicate = state
            .owner_ports(self.id, out_component)
            .unwrap_or_default()
            .iter()
            .filter(|p| p.direction() == source_direction)
            .flat_map(|p| p.connections())
            .filter_map(|c| state.connections.get(c))
            .any(|c| c.input().port == in_port);
        if duplicate {
            return Err(GraphError::DuplicateConnection {
                out_component,
                in_port,
            });
        }

        if !self.introspector.assignable(out.ty(), inp.ty()) {
            return Err(GraphError::NotAssignable {
                out_port,
                out_type: out.ty().to_string(),
                in_port,
                in_type: inp.ty().to_string(),
            });
        }

        if !out_is_graph && !in_is_graph && state.reaches(in_component, out_component) {
            return Err(GraphError::CycleDetected {
                from: out_component,
                to: in_component,
            });
        }

        let adopted = out.name().to_string();
        let conn = Connection::new(out_component, out_port, in_component, in_port)?;
        let conn_id = conn.id();

        if let Some(port) = state.port_mut(self.id, out_component, out_port) {
            port.push_connection(conn_id);
        }
        if let Some(port) = state.port_mut(self.id, in_component, in_port) {
            port.push_connection(conn_id);
            port.set_name(adopted.clone());
        }
        state.connections.insert(conn_id, conn);

        tracing::debug!(
            "[GRAPH] Connected {}:{} -> {}:{} as {:?}",
            out_component,
            out_port,
            in_component,
            in_port,
            adopted
        );
        Ok(conn_id)
    }

    fn resolve<'s>(
        &self,
        state: &'s GraphState,
        side: &'static str,
        component: ComponentId,
        port: PortId,
    ) -> Result<&'s Port> {
        let ports = state
            .owner_ports(self.id, component)
            .ok_or(GraphError::ComponentNotFound(component))?;
        port::find(ports, port).ok_or_else(|| {
            tracing::debug!("[GRAPH] No {} port {} on {}", side, port, component);
            GraphError::PortNotFound {
                port,
                owner: component,
            }
        })
    }

    /// Remove a connection from both endpoints and the index, undoing the
    /// IN-side name adoption.
    pub fn disconnect(&self, connection_id: ConnectionId) -> Result<()> {
        if connection_id.is_nil() {
            return Err(GraphError::InvalidId("connection"));
        }

        let mut state = self.state.lock();
        let conn = *state
            .connections
            .get(&connection_id)
            .ok_or(GraphError::ConnectionNotFound(connection_id))?;
        let (out, inp) = (conn.out(), conn.input());

        if state.port(self.id, out.component, out.port).is_none() {
            return Err(GraphError::DanglingConnection {
                connection: connection_id,
                role: "outgoing",
                component: out.component,
            });
        }
        if state.port(self.id, inp.component, inp.port).is_none() {
            return Err(GraphError::DanglingConnection {
                connection: connection_id,
                role: "ingoing",
                component: inp.component,
            });
        }

        if let Some(port) = state.port_mut(self.id, out.component, out.port) {
            port.remove_connection(connection_id);
        }
        if let Some(port) = state.port_mut(self.id, inp.component, inp.port) {
            port.clear_connections();
            port.set_name("");
        }
        state.connections.remove(&connection_id);

        tracing::debug!("[GRAPH] Disconnected {}", connection_id);
        Ok(())
    }

    pub fn connection(&self, id: ConnectionId) -> Option<Connection> {
        self.state.lock().connections.get(&id).copied()
    }

    /// Snapshot of every connection, in no particular order.
    pub fn connections(&self) -> Vec<Connection> {
        self.state.lock().connections.values().copied().collect()
    }

    pub fn connection_count(&self) -> usize {
        self.state.lock().connections.len()
    }

    /// Verify that ports and the connection index agree with each other.
    pub fn check_consistency(&self) -> Result<()> {
        let state = self.state.lock();
        validate::check_consistency(self.id, &state)
    }

    /// Binding table for executing the rendered text: qualifier -> name -> callable.
    ///
    /// Components without a name or qualifier are skipped. When several
    /// components share a qualifier and name, the earliest added one is bound.
    pub fn symbols(&self) -> SymbolTable {
        let state = self.state.lock();
        let mut symbols = SymbolTable::new();

        for component in state.order.iter().filter_map(|id| state.components.get(id)) {
            if component.name().is_empty() || component.qualifier().is_empty() {
                continue;
            }
            symbols
                .entry(component.qualifier().to_string())
                .or_default()
                .entry(component.name().to_string())
                .or_insert_with(|| component.callable().clone());
        }

        symbols
    }
}

fn owner_kind(is_graph: bool) -> &'static str {
    if is_graph {
        "graph"
    } else {
        "component"
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
