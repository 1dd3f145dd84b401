//! # Emission Instructions
//!
//! The renderer decides *what* the wrapper function does; a [`CodeEmitter`]
//! decides how it is spelled in the target language.

use crate::error::Result;
use crate::ids::ComponentId;
use crate::introspect::TypeDescriptor;

/// A wrapper function parameter. `None` names a parameter nothing reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: Option<String>,
    pub ty: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionHeader {
    pub name: String,
    pub label: String,
    pub description: String,
    pub package_name: String,
    pub package_description: String,
    pub params: Vec<Parameter>,
    pub returns: Vec<TypeDescriptor>,
}

/// Left-hand target of a call result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// The variable a connected OUT port adopted.
    Var(String),
    /// The shared error binding.
    Error,
    /// Result nobody reads.
    Discard,
}

/// A value used as call argument or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Var(String),
    /// The shared error binding.
    Error,
    Nil,
    Zero(TypeDescriptor),
}

/// One component invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStatement {
    pub component: ComponentId,
    pub label: String,
    pub description: String,
    pub targets: Vec<Binding>,
    pub qualifier: String,
    pub name: String,
    pub args: Vec<Operand>,
}

/// Turns emission instructions into source text.
///
/// Calls arrive in the order: `begin_function`, then any number of
/// `emit_call` each optionally followed by `emit_error_guard`, then
/// `emit_return`, then `finish`.
pub trait CodeEmitter {
    fn begin_function(&mut self, header: &FunctionHeader) -> Result<()>;

    fn emit_call(&mut self, call: &CallStatement) -> Result<()>;

    /// Return early with `returns` when the error binding is set.
    fn emit_error_guard(&mut self, returns: &[Operand]) -> Result<()>;

    fn emit_return(&mut self, values: &[Operand]) -> Result<()>;

    /// Assemble the complete source text.
    fn finish(&mut self) -> Result<String>;
}
