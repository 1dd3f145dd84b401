//! Ports: typed, directional connection points on components and graphs.

use crate::error::{GraphError, Result};
use crate::ids::{ComponentId, ConnectionId, PortId};
use crate::introspect::{SignatureIntrospector, TypeDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a port.
///
/// On a component, IN ports are parameters and OUT ports are results. On a
/// graph the roles invert inside the generated body: a boundary IN port is a
/// data source and a boundary OUT port is a data sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("IN"),
            Direction::Out => f.write_str("OUT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    id: PortId,
    name: String,
    direction: Direction,
    ty: TypeDescriptor,
    is_error: bool,
    parent: ComponentId,
    connections: Vec<ConnectionId>,
}

impl Port {
    /// Create a port owned by `parent`.
    ///
    /// A non-empty name is coerced to lower camel case. The error flag is
    /// decided by the introspector.
    pub fn new(
        name: &str,
        direction: Direction,
        ty: TypeDescriptor,
        parent: ComponentId,
        introspector: &dyn SignatureIntrospector,
    ) -> Result<Self> {
        let is_error = introspector.is_error(&ty);
        Self::with_error_flag(name, direction, ty, is_error, parent)
    }

    pub(crate) fn with_error_flag(
        name: &str,
        direction: Direction,
        ty: TypeDescriptor,
        is_error: bool,
        parent: ComponentId,
    ) -> Result<Self> {
        if parent.is_nil() {
            return Err(GraphError::InvalidId("parent"));
        }

        Ok(Self {
            id: PortId::new(),
            name: to_camel_case(name),
            direction,
            ty,
            is_error,
            parent,
            connections: Vec::new(),
        })
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    /// Variable name this port binds to; empty for an unconnected IN port.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_in(&self) -> bool {
        self.direction == Direction::In
    }

    pub fn is_out(&self) -> bool {
        self.direction == Direction::Out
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn parent(&self) -> ComponentId {
        self.parent
    }

    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    pub(crate) fn set_parent(&mut self, parent: ComponentId) {
        self.parent = parent;
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn push_connection(&mut self, id: ConnectionId) {
        self.connections.push(id);
    }

    pub(crate) fn remove_connection(&mut self, id: ConnectionId) {
        self.connections.retain(|c| *c != id);
    }

    pub(crate) fn clear_connections(&mut self) {
        self.connections.clear();
    }
}

/// Find a port by id.
pub(crate) fn find(ports: &[Port], id: PortId) -> Option<&Port> {
    ports.iter().find(|p| p.id == id)
}

pub(crate) fn find_mut(ports: &mut [Port], id: PortId) -> Option<&mut Port> {
    ports.iter_mut().find(|p| p.id == id)
}

/// Split ports into INs and OUTs, keeping their relative order.
pub(crate) fn partition(ports: &[Port]) -> (Vec<&Port>, Vec<&Port>) {
    ports.iter().partition(|p| p.is_in())
}

pub(crate) fn any_connected(ports: &[Port]) -> bool {
    ports.iter().any(Port::is_connected)
}

/// Lower camel case: `"my_value"` and `"My Value"` become `"myValue"`.
pub fn to_camel_case(input: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in input.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut out = String::with_capacity(input.len());
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
