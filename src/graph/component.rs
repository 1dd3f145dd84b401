//! Components: named units wrapping an external callable.

use crate::error::{GraphError, Result};
use crate::graph::port::{self, Direction, Port};
use crate::ids::{ComponentId, PortId};
use crate::introspect::{Callable, SignatureIntrospector};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct Component {
    id: ComponentId,
    name: String,
    qualifier: String,
    label: String,
    description: String,
    callable: Callable,
    ports: Vec<Port>,
}

impl Component {
    /// Wrap `callable`, deriving its ports from the introspector's report.
    ///
    /// IN ports follow parameter order and start unnamed; they adopt a name
    /// when connected. OUT ports follow return order and get a stable
    /// variable name derived from qualifier, name and position.
    pub fn new(
        name: impl Into<String>,
        qualifier: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        callable: impl Into<Callable>,
        introspector: &dyn SignatureIntrospector,
    ) -> Result<Self> {
        let name = name.into();
        let qualifier = qualifier.into();
        if name.is_empty() {
            return Err(GraphError::MissingField("name"));
        }
        if qualifier.is_empty() {
            return Err(GraphError::MissingField("qualifier"));
        }

        let id = ComponentId::new();
        let callable = callable.into();
        let signature = introspector.signature(&callable)?;

        let mut ports = Vec::with_capacity(signature.inputs.len() + signature.outputs.len());
        for ty in signature.inputs {
            ports.push(Port::with_error_flag("", Direction::In, ty, false, id)?);
        }
        for (i, output) in signature.outputs.into_iter().enumerate() {
            let var = output_variable(&qualifier, &name, i, 0);
            ports.push(Port::with_error_flag(
                &var,
                Direction::Out,
                output.ty,
                output.is_error,
                id,
            )?);
        }

        tracing::debug!(
            "[GRAPH] Created component {}.{} ({} ports)",
            qualifier,
            name,
            ports.len()
        );

        Ok(Self {
            id,
            name,
            qualifier,
            label: label.into(),
            description: description.into(),
            callable,
            ports,
        })
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package path used for imports and symbol lookup.
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        port::find(&self.ports, id)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_in())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_out())
    }

    pub fn has_connections(&self) -> bool {
        port::any_connected(&self.ports)
    }

    pub(crate) fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        port::find_mut(&mut self.ports, id)
    }

    /// OUT variable names for the `instance`-th component bound to the same
    /// qualifier and name. Instance 0 yields the names given at construction.
    pub(crate) fn output_names(&self, instance: usize) -> Vec<String> {
        (0..self.outputs().count())
            .map(|i| output_variable(&self.qualifier, &self.name, i, instance))
            .collect()
    }

    pub(crate) fn rename_outputs(&mut self, names: Vec<String>) {
        let outputs = self.ports.iter_mut().filter(|p| p.is_out());
        for (port, name) in outputs.zip(names) {
            port.set_name(name);
        }
    }
}

/// `io` followed by the first 8 bytes of SHA-256 over `qualifier-name-index`,
/// with `-instance` appended for every instance after the first.
fn output_variable(qualifier: &str, name: &str, index: usize, instance: usize) -> String {
    let seed = if instance == 0 {
        format!("{}-{}-{}", qualifier, name, index)
    } else {
        format!("{}-{}-{}-{}", qualifier, name, index, instance)
    };
    let digest = Sha256::digest(seed.as_bytes());
    let mut var = String::from("io");
    for byte in &digest[..8] {
        let _ = write!(var, "{:02x}", byte);
    }
    var
}
