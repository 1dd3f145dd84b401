//! Connections: directed edges from an OUT-side port to an IN-side port.

use crate::error::{GraphError, Result};
use crate::ids::{ComponentId, ConnectionId, PortId};

/// One end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub component: ComponentId,
    pub port: PortId,
}

/// An immutable edge. Disconnecting removes it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    id: ConnectionId,
    out: Endpoint,
    inp: Endpoint,
}

impl Connection {
    pub(crate) fn new(
        out_component: ComponentId,
        out_port: PortId,
        in_component: ComponentId,
        in_port: PortId,
    ) -> Result<Self> {
        check_ids(out_component, out_port, in_component, in_port)?;

        Ok(Self {
            id: ConnectionId::new(),
            out: Endpoint {
                component: out_component,
                port: out_port,
            },
            inp: Endpoint {
                component: in_component,
                port: in_port,
            },
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Producing side.
    pub fn out(&self) -> Endpoint {
        self.out
    }

    /// Consuming side.
    pub fn input(&self) -> Endpoint {
        self.inp
    }
}

pub(crate) fn check_ids(
    out_component: ComponentId,
    out_port: PortId,
    in_component: ComponentId,
    in_port: PortId,
) -> Result<()> {
    if out_component.is_nil() {
        return Err(GraphError::InvalidId("out component"));
    }
    if out_port.is_nil() {
        return Err(GraphError::InvalidId("out port"));
    }
    if in_component.is_nil() {
        return Err(GraphError::InvalidId("in component"));
    }
    if in_port.is_nil() {
        return Err(GraphError::InvalidId("in port"));
    }
    Ok(())
}
