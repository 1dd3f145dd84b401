//! Graph consistency checks.

use std::collections::HashSet;

use crate::error::{GraphError, Result};
use crate::graph::{GraphState, Port};
use crate::ids::{ComponentId, ConnectionId};

/// Check that every connection referenced by a port is indexed, that every
/// indexed connection is referenced by both of its endpoint ports, and that
/// consuming ports hold at most one connection.
pub(crate) fn check_consistency(graph_id: ComponentId, state: &GraphState) -> Result<()> {
    let mut referenced: HashSet<ConnectionId> = HashSet::new();

    let boundary = state.ports.iter().map(|p| (graph_id, p));
    let owned = state
        .order
        .iter()
        .filter_map(|id| state.components.get(id))
        .flat_map(|c| c.ports().iter().map(move |p| (c.id(), p)));

    for (owner, port) in boundary.chain(owned) {
        check_port(graph_id, owner, port, state)?;
        referenced.extend(port.connections().iter().copied());
    }

    if state.order.len() != state.components.len() {
        return Err(GraphError::Inconsistent(format!(
            "{} components registered but {} ordered",
            state.components.len(),
            state.order.len()
        )));
    }

    for (id, conn) in &state.connections {
        if !referenced.contains(id) {
            return Err(GraphError::Inconsistent(format!(
                "connection {} is indexed but no port references it",
                id
            )));
        }

        for (role, end) in [("outgoing", conn.out()), ("ingoing", conn.input())] {
            let port = state
                .port(graph_id, end.component, end.port)
                .ok_or(GraphError::DanglingConnection {
                    connection: *id,
                    role,
                    component: end.component,
                })?;
            if !port.connections().contains(id) {
                return Err(GraphError::Inconsistent(format!(
                    "{} port {} does not reference connection {}",
                    role, end.port, id
                )));
            }
        }
    }

    Ok(())
}

fn check_port(graph_id: ComponentId, owner: ComponentId, port: &Port, state: &GraphState) -> Result<()> {
    if port.parent() != owner {
        return Err(GraphError::Inconsistent(format!(
            "port {} belongs to {} but is owned by {}",
            port.id(),
            port.parent(),
            owner
        )));
    }

    // Boundary OUT ports and component IN ports consume data.
    let consumes = port.is_in() != (owner == graph_id);
    if consumes && port.connections().len() > 1 {
        return Err(GraphError::Inconsistent(format!(
            "consuming port {} holds {} connections",
            port.id(),
            port.connections().len()
        )));
    }

    for conn_id in port.connections() {
        if !state.connections.contains_key(conn_id) {
            return Err(GraphError::Inconsistent(format!(
                "port {} references unknown connection {}",
                port.id(),
                conn_id
            )));
        }
    }

    Ok(())
}
