//! # Go Code Generator
//!
//! Spells the wrapper function as a Go source file: generated-code header,
//! package doc and clause, an aliased import block sorted by path, and one
//! exported function.

use super::emitter::{Binding, CallStatement, CodeEmitter, FunctionHeader, Operand};
use crate::config::EmitterConfig;
use crate::error::{GraphError, Result};
use crate::introspect::{TypeDescriptor, TypeKind};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

/// [`CodeEmitter`] producing Go source.
#[derive(Debug, Default)]
pub struct GoEmitter {
    config: EmitterConfig,
    header: Option<FunctionHeader>,
    signature: String,
    /// Import path -> alias.
    imports: BTreeMap<String, String>,
    aliases: HashSet<String>,
    /// Identifiers already introduced in the function scope.
    declared: HashSet<String>,
    body: String,
}

impl GoEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Alias for `path`, registering the import on first use.
    ///
    /// Aliases are the sanitized last path segment, numbered on collision
    /// with other aliases and with identifiers of the function scope.
    fn import(&mut self, path: &str) -> String {
        if let Some(alias) = self.imports.get(path) {
            return alias.clone();
        }

        let base = package_alias(path);
        let mut alias = base.clone();
        let mut n = 2;
        while self.aliases.contains(&alias) || self.is_reserved(&alias) {
            alias = format!("{}{}", base, n);
            n += 1;
        }

        tracing::trace!("[CODEGEN] Import {} as {}", path, alias);
        self.aliases.insert(alias.clone());
        self.imports.insert(path.to_string(), alias.clone());
        alias
    }

    fn is_reserved(&self, ident: &str) -> bool {
        self.declared.contains(ident)
            || ident == self.config.error_binding
            || ident == self.config.discard
    }

    fn type_name(&mut self, ty: &TypeDescriptor) -> String {
        if ty.is_builtin() {
            return ty.name.clone();
        }
        let alias = self.import(&ty.package);
        format!("{}.{}", alias, ty.name)
    }

    fn zero_literal(&mut self, ty: &TypeDescriptor) -> String {
        match ty.kind {
            TypeKind::Bool => "false".to_string(),
            TypeKind::Int | TypeKind::Float => "0".to_string(),
            TypeKind::String => "\"\"".to_string(),
            TypeKind::Interface => "nil".to_string(),
            TypeKind::Struct => format!("{}{{}}", self.type_name(ty)),
        }
    }

    fn operand(&mut self, operand: &Operand) -> String {
        match operand {
            Operand::Var(name) => name.clone(),
            Operand::Error => self.config.error_binding.clone(),
            Operand::Nil => "nil".to_string(),
            Operand::Zero(ty) => self.zero_literal(ty),
        }
    }

    fn operands(&mut self, operands: &[Operand]) -> String {
        operands
            .iter()
            .map(|o| self.operand(o))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn return_statement(&mut self, values: &[Operand]) -> String {
        if values.is_empty() {
            "return".to_string()
        } else {
            format!("return {}", self.operands(values))
        }
    }

    fn package_name(header: &FunctionHeader) -> String {
        if !header.package_name.is_empty() {
            return header.package_name.clone();
        }
        identifier(&header.name.to_lowercase()).unwrap_or_else(|| "main".to_string())
    }
}

impl CodeEmitter for GoEmitter {
    fn begin_function(&mut self, header: &FunctionHeader) -> Result<()> {
        // Parameter names first, so no import alias shadows them.
        let names: Vec<String> = header
            .params
            .iter()
            .map(|param| match &param.name {
                Some(name) if !name.is_empty() => {
                    self.declared.insert(name.clone());
                    name.clone()
                }
                _ => self.config.discard.clone(),
            })
            .collect();

        let mut params = Vec::with_capacity(header.params.len());
        for (param, name) in header.params.iter().zip(names) {
            let ty = self.type_name(&param.ty);
            params.push(format!("{} {}", name, ty));
        }

        let returns: Vec<String> = header.returns.iter().map(|t| self.type_name(t)).collect();
        let results = match returns.len() {
            0 => String::new(),
            1 => format!(" {}", returns[0]),
            _ => format!(" ({})", returns.join(", ")),
        };

        self.signature = format!("func {}({}){} {{", header.name, params.join(", "), results);
        self.header = Some(header.clone());
        Ok(())
    }

    fn emit_call(&mut self, call: &CallStatement) -> Result<()> {
        let indent = self.config.indent.clone();
        if !self.body.is_empty() {
            self.body.push('\n');
        }
        for line in call.description.lines() {
            writeln!(self.body, "{}// {}", indent, line.trim_end())?;
        }

        let alias = self.import(&call.qualifier);
        let args = self.operands(&call.args);
        let callee = format!("{}.{}({})", alias, call.name, args);

        if call.targets.is_empty() {
            writeln!(self.body, "{}{}", indent, callee)?;
            return Ok(());
        }

        let mut introduces = false;
        let mut targets = Vec::with_capacity(call.targets.len());
        for target in &call.targets {
            let name = match target {
                Binding::Var(name) => name.clone(),
                Binding::Error => self.config.error_binding.clone(),
                Binding::Discard => {
                    targets.push(self.config.discard.clone());
                    continue;
                }
            };
            introduces |= self.declared.insert(name.clone());
            targets.push(name);
        }

        let op = if introduces { ":=" } else { "=" };
        writeln!(self.body, "{}{} {} {}", indent, targets.join(", "), op, callee)?;
        Ok(())
    }

    fn emit_error_guard(&mut self, returns: &[Operand]) -> Result<()> {
        let indent = self.config.indent.clone();
        let ret = self.return_statement(returns);
        writeln!(
            self.body,
            "{i}if {err} != nil {{\n{i}{i}{ret}\n{i}}}",
            i = indent,
            err = self.config.error_binding,
            ret = ret
        )?;
        Ok(())
    }

    fn emit_return(&mut self, values: &[Operand]) -> Result<()> {
        let indent = self.config.indent.clone();
        let ret = self.return_statement(values);
        if !self.body.is_empty() {
            self.body.push('\n');
        }
        writeln!(self.body, "{}{}", indent, ret)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<String> {
        let header = self.header.as_ref().ok_or_else(|| {
            GraphError::CodeGeneration("finish called before begin_function".to_string())
        })?;

        let mut code = String::new();
        writeln!(code, "// Code generated by {}. DO NOT EDIT.", self.config.generator)?;
        code.push('\n');

        let package_doc = if header.package_description.is_empty() {
            &header.description
        } else {
            &header.package_description
        };
        for line in package_doc.lines() {
            writeln!(code, "// {}", line.trim_end())?;
        }
        writeln!(code, "package {}", Self::package_name(header))?;
        code.push('\n');

        if !self.imports.is_empty() {
            code.push_str("import (\n");
            for (path, alias) in &self.imports {
                writeln!(code, "{}{} {:?}", self.config.indent, alias, path)?;
            }
            code.push_str(")\n\n");
        }

        let mut doc_lines = header.description.lines();
        if let Some(first) = doc_lines.next() {
            writeln!(code, "// {} {}", header.name, first.trim_end())?;
            for line in doc_lines {
                writeln!(code, "// {}", line.trim_end())?;
            }
        }
        writeln!(code, "{}", self.signature)?;
        code.push_str(&self.body);
        code.push_str("}\n");

        tracing::debug!(
            "[CODEGEN] Assembled {} ({} imports, {} bytes)",
            header.name,
            self.imports.len(),
            code.len()
        );
        Ok(code)
    }
}

/// Alias derived from the last segment of an import path.
fn package_alias(path: &str) -> String {
    let last = path.rsplit('/').next().unwrap_or(path);
    identifier(&last.to_lowercase()).unwrap_or_else(|| "pkg".to_string())
}

/// Keep identifier characters; prefix when the result would start with a digit.
fn identifier(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match cleaned.chars().next() {
        None => None,
        Some(c) if c.is_ascii_digit() => Some(format!("pkg{}", cleaned)),
        Some(_) => Some(cleaned),
    }
}
