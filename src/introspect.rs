//! # Signature Introspection
//!
//! Components wrap opaque callables. The graph never looks inside them itself;
//! it asks a [`SignatureIntrospector`] for the ordered parameter and return
//! types, whether a type is error-like, and whether one type may be assigned to
//! another.
//!
//! [`DeclaredIntrospector`] is the shipped implementation: callables are
//! [`Function`] values that carry their signature next to an invocation
//! closure over `serde_json` values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Qualified name of the builtin error interface.
pub const ERROR_TYPE: &str = "error";

/// Name of the interface every type satisfies.
pub const ANY_TYPE: &str = "any";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntrospectionError {
    #[error("value of type {type_name} is not a function")]
    NotCallable { type_name: &'static str },

    #[error("unexpected error for {position}: {reason}")]
    InvalidType { position: String, reason: String },
}

/// Broad shape of a type, enough to pick a zero value and decide
/// interface satisfaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Bool,
    Int,
    Float,
    String,
    Struct,
    Interface,
}

/// Describes a parameter or return type.
///
/// Two descriptors denote the same type when package and name match. The
/// `implements` list holds qualified names of interfaces the type satisfies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    #[serde(default)]
    pub package: String,
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub implements: Vec<String>,
}

impl TypeDescriptor {
    pub fn new(package: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            kind,
            implements: Vec::new(),
        }
    }

    pub fn builtin(name: impl Into<String>, kind: TypeKind) -> Self {
        Self::new("", name, kind)
    }

    pub fn bool() -> Self {
        Self::builtin("bool", TypeKind::Bool)
    }

    pub fn int() -> Self {
        Self::builtin("int", TypeKind::Int)
    }

    pub fn float() -> Self {
        Self::builtin("float64", TypeKind::Float)
    }

    pub fn string() -> Self {
        Self::builtin("string", TypeKind::String)
    }

    pub fn error() -> Self {
        Self::builtin(ERROR_TYPE, TypeKind::Interface)
    }

    pub fn any() -> Self {
        Self::builtin(ANY_TYPE, TypeKind::Interface)
    }

    pub fn context() -> Self {
        Self::new("context", "Context", TypeKind::Interface)
    }

    /// Declare that this type satisfies the interface `qualified`.
    pub fn implementing(mut self, qualified: impl Into<String>) -> Self {
        let qualified = qualified.into();
        if !self.implements.contains(&qualified) {
            self.implements.push(qualified);
        }
        self
    }

    pub fn is_builtin(&self) -> bool {
        self.package.is_empty()
    }

    /// `package.Name`, or just `Name` for builtins.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    pub fn same_type(&self, other: &TypeDescriptor) -> bool {
        self.package == other.package && self.name == other.name
    }

    /// Runtime zero value used when a slot has no producer.
    pub fn zero_value(&self) -> Value {
        match self.kind {
            TypeKind::Bool => Value::Bool(false),
            TypeKind::Int => Value::from(0),
            TypeKind::Float => Value::from(0.0),
            TypeKind::String => Value::String(String::new()),
            TypeKind::Struct => Value::Object(Default::default()),
            TypeKind::Interface => Value::Null,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// One return slot of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    pub ty: TypeDescriptor,
    pub is_error: bool,
}

/// Ordered parameter and return types of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub inputs: Vec<TypeDescriptor>,
    pub outputs: Vec<OutputDescriptor>,
}

/// Opaque, cheaply cloneable reference to a component's callable.
#[derive(Clone)]
pub struct Callable {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Callable {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// The wrapped [`Function`], when this callable is one.
    pub fn as_function(&self) -> Option<&Function> {
        self.downcast_ref::<Function>()
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl From<Function> for Callable {
    fn from(function: Function) -> Self {
        Callable::new(function)
    }
}

type Invoke = dyn Fn(&[Value]) -> Vec<Value> + Send + Sync;

/// A callable with a declared signature.
///
/// Error-like outputs carry `null` for "no error" and a string message
/// otherwise.
#[derive(Clone)]
pub struct Function {
    inputs: Vec<TypeDescriptor>,
    outputs: Vec<TypeDescriptor>,
    invoke: Arc<Invoke>,
}

impl Function {
    pub fn new<F>(inputs: Vec<TypeDescriptor>, outputs: Vec<TypeDescriptor>, invoke: F) -> Self
    where
        F: Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
    {
        Self {
            inputs,
            outputs,
            invoke: Arc::new(invoke),
        }
    }

    pub fn inputs(&self) -> &[TypeDescriptor] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TypeDescriptor] {
        &self.outputs
    }

    pub fn call(&self, args: &[Value]) -> Vec<Value> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Reports callable signatures and answers type questions for the graph.
pub trait SignatureIntrospector: Send + Sync {
    fn signature(&self, callable: &Callable) -> Result<Signature, IntrospectionError>;

    fn is_error(&self, ty: &TypeDescriptor) -> bool;

    /// Whether a value of type `from` may flow into a slot of type `to`.
    fn assignable(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> bool;
}

/// Introspector for [`Function`] callables.
///
/// Assignability: identical types, or `to` is an interface that `from`
/// implements (or the `any` interface).
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredIntrospector;

impl DeclaredIntrospector {
    pub fn new() -> Self {
        Self
    }

    fn check_type(position: String, ty: &TypeDescriptor) -> Result<(), IntrospectionError> {
        if ty.name.trim().is_empty() {
            return Err(IntrospectionError::InvalidType {
                position,
                reason: "type has no name".to_string(),
            });
        }
        Ok(())
    }
}

impl SignatureIntrospector for DeclaredIntrospector {
    fn signature(&self, callable: &Callable) -> Result<Signature, IntrospectionError> {
        let function = callable
            .as_function()
            .ok_or(IntrospectionError::NotCallable {
                type_name: callable.type_name(),
            })?;

        for (i, ty) in function.inputs().iter().enumerate() {
            Self::check_type(format!("argument {}", i + 1), ty)?;
        }
        for (i, ty) in function.outputs().iter().enumerate() {
            Self::check_type(format!("return value {}", i + 1), ty)?;
        }

        Ok(Signature {
            inputs: function.inputs().to_vec(),
            outputs: function
                .outputs()
                .iter()
                .map(|ty| OutputDescriptor {
                    ty: ty.clone(),
                    is_error: self.is_error(ty),
                })
                .collect(),
        })
    }

    fn is_error(&self, ty: &TypeDescriptor) -> bool {
        (ty.is_builtin() && ty.name == ERROR_TYPE) || ty.implements.iter().any(|i| i == ERROR_TYPE)
    }

    fn assignable(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
        if from.same_type(to) {
            return true;
        }
        if to.kind != TypeKind::Interface {
            return false;
        }
        (to.is_builtin() && to.name == ANY_TYPE)
            || from.implements.iter().any(|i| *i == to.qualified_name())
    }
}
