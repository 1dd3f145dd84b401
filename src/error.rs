//! # Errors
//!
//! Every failure the compiler can report. Validation variants are returned
//! before any mutation is applied; consistency variants mean the graph itself
//! is corrupted.

use crate::graph::Direction;
use crate::ids::{ComponentId, ConnectionId, PortId};
use crate::introspect::IntrospectionError;
use thiserror::Error;

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid {0} id")]
    InvalidId(&'static str),

    #[error("port with same name {name:?} and direction {direction} already exists")]
    DuplicatePort { name: String, direction: Direction },

    #[error("component id {0} already exists")]
    DuplicateComponent(ComponentId),

    #[error("{kind} id {id} already lists connections")]
    CarriesConnections { kind: &'static str, id: String },

    #[error("no component id {0} found in graph")]
    ComponentNotFound(ComponentId),

    #[error("no port id {port} found on {owner}")]
    PortNotFound { port: PortId, owner: ComponentId },

    #[error("unknown connection id {0}")]
    ConnectionNotFound(ConnectionId),

    #[error("{side} {owner_kind} port {port} is not of direction {expected}")]
    WrongDirection {
        side: &'static str,
        owner_kind: &'static str,
        port: PortId,
        expected: Direction,
    },

    #[error("component id {0} cannot connect to itself")]
    SelfConnection(ComponentId),

    #[error("out port {0} has no name for its consumer to adopt")]
    UnnamedSource(PortId),

    #[error("in port {0} already has a connection")]
    AlreadyConnected(PortId),

    #[error("in port {in_port} already has a connection from component {out_component}")]
    DuplicateConnection {
        out_component: ComponentId,
        in_port: PortId,
    },

    #[error("out port {out_port} of type {out_type} cannot be assigned to in port {in_port} of type {in_type}")]
    NotAssignable {
        out_port: PortId,
        out_type: String,
        in_port: PortId,
        in_type: String,
    },

    #[error("connecting component {from} to {to} would create a cycle")]
    CycleDetected { from: ComponentId, to: ComponentId },

    #[error("{kind} id {id} has connections")]
    HasConnections { kind: &'static str, id: String },

    #[error("misconfigured connection id {connection}: missing {role} component {component}")]
    DanglingConnection {
        connection: ConnectionId,
        role: &'static str,
        component: ComponentId,
    },

    #[error("inconsistent graph: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Introspection(#[from] IntrospectionError),

    #[error("rendering cancelled")]
    Cancelled,

    #[error("code generation failed: {0}")]
    CodeGeneration(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<std::fmt::Error> for GraphError {
    fn from(err: std::fmt::Error) -> Self {
        GraphError::CodeGeneration(err.to_string())
    }
}
