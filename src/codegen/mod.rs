//! # Code Generation
//!
//! Emission instructions and the Go source generator.

mod emitter;
mod go_codegen;

pub use emitter::*;
pub use go_codegen::*;
