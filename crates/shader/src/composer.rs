use crate::library::ShaderLibrary;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::str::FromStr;

/// Errors from shader composition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShaderError {
    #[error("include not found: <{0}>")]
    UnknownInclude(String),
    #[error("include cycle: {}", .0.join(" -> "))]
    IncludeCycle(Vec<String>),
    #[error("malformed include directive: {0}")]
    MalformedDirective(String),
    #[error("cannot parse define value: {0}")]
    DefineSyntax(String),
    #[error("invalid define {name}: {reason}")]
    InvalidDefine { name: String, reason: &'static str },
}

/// Compile-time value emitted as a module-scope `const`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderDef {
    Bool(bool),
    I32(i32),
    U32(u32),
    F32(f32),
}

impl ShaderDef {
    /// Whether `other` holds the same WGSL type.
    pub fn same_type(&self, other: &ShaderDef) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    fn declare(&self, name: &str) -> Result<String, ShaderError> {
        Ok(match self {
            ShaderDef::Bool(v) => format!("const {name}: bool = {v};"),
            ShaderDef::I32(v) => format!("const {name}: i32 = {v}i;"),
            ShaderDef::U32(v) => format!("const {name}: u32 = {v}u;"),
            // WGSL has no literal for inf or NaN
            ShaderDef::F32(v) if !v.is_finite() => {
                return Err(ShaderError::InvalidDefine {
                    name: name.to_string(),
                    reason: "not a finite number",
                });
            }
            ShaderDef::F32(v) => format!("const {name}: f32 = {v:?};"),
        })
    }
}

/// Parses WGSL-style literals: `true`, `3u`, `-3i`, `-3`, `0.5`, `0.5f`.
impl FromStr for ShaderDef {
    type Err = ShaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let syntax = || ShaderError::DefineSyntax(s.to_string());
        match s {
            "true" => return Ok(ShaderDef::Bool(true)),
            "false" => return Ok(ShaderDef::Bool(false)),
            _ => {}
        }
        if let Some(v) = s.strip_suffix('u') {
            return v.parse().map(ShaderDef::U32).map_err(|_| syntax());
        }
        if let Some(v) = s.strip_suffix('i') {
            return v.parse().map(ShaderDef::I32).map_err(|_| syntax());
        }
        if let Ok(v) = s.parse::<i32>() {
            return Ok(ShaderDef::I32(v));
        }
        if let Ok(v) = s.parse::<f32>() {
            return Ok(ShaderDef::F32(v));
        }
        s.strip_suffix('f')
            .and_then(|v| v.parse().ok())
            .map(ShaderDef::F32)
            .ok_or_else(syntax)
    }
}

impl From<bool> for ShaderDef {
    fn from(v: bool) -> Self {
        ShaderDef::Bool(v)
    }
}

impl From<i32> for ShaderDef {
    fn from(v: i32) -> Self {
        ShaderDef::I32(v)
    }
}

impl From<u32> for ShaderDef {
    fn from(v: u32) -> Self {
        ShaderDef::U32(v)
    }
}

impl From<f32> for ShaderDef {
    fn from(v: f32) -> Self {
        ShaderDef::F32(v)
    }
}

/// Expands `#include <name>` directives against a [`ShaderLibrary`].
///
/// Each chunk is emitted at most once per composed source, at the point of
/// its first include. Defines are emitted ahead of everything else.
#[derive(Debug, Clone, Default)]
pub struct ShaderComposer {
    library: ShaderLibrary,
    defs: BTreeMap<String, ShaderDef>,
}

impl ShaderComposer {
    pub fn new(library: ShaderLibrary) -> Self {
        Self {
            library,
            defs: BTreeMap::new(),
        }
    }

    /// Composer over [`ShaderLibrary::standard`].
    pub fn standard() -> Self {
        Self::new(ShaderLibrary::standard())
    }

    pub fn with_def(mut self, name: &str, def: impl Into<ShaderDef>) -> Self {
        self.defs.insert(name.to_string(), def.into());
        self
    }

    pub fn compose(&self, source: &str) -> Result<String, ShaderError> {
        let mut out = String::with_capacity(source.len());
        for (name, def) in &self.defs {
            out.push_str(&def.declare(name)?);
            out.push('\n');
        }

        let mut included = HashSet::new();
        let mut stack = Vec::new();
        self.expand(source, &mut included, &mut stack, &mut out)?;

        tracing::debug!(
            bytes = out.len(),
            chunks = included.len(),
            "composed shader"
        );
        Ok(out)
    }

    fn expand(
        &self,
        source: &str,
        included: &mut HashSet<String>,
        stack: &mut Vec<String>,
        out: &mut String,
    ) -> Result<(), ShaderError> {
        for line in source.lines() {
            let Some(name) = parse_include(line)? else {
                let _ = writeln!(out, "{line}");
                continue;
            };

            if stack.iter().any(|open| open == name) {
                let mut cycle = stack.clone();
                cycle.push(name.to_string());
                return Err(ShaderError::IncludeCycle(cycle));
            }
            if !included.insert(name.to_string()) {
                continue;
            }

            let chunk = self
                .library
                .get(name)
                .ok_or_else(|| ShaderError::UnknownInclude(name.to_string()))?;

            let _ = writeln!(out, "// <{name}>");
            stack.push(name.to_string());
            self.expand(chunk, included, stack, out)?;
            stack.pop();
        }
        Ok(())
    }
}

/// `Ok(Some(name))` for an include line, `Ok(None)` for anything else.
fn parse_include(line: &str) -> Result<Option<&str>, ShaderError> {
    let Some(rest) = line.trim().strip_prefix("#include") else {
        return Ok(None);
    };
    let rest = rest.trim();
    let name = rest
        .strip_prefix('<')
        .and_then(|r| r.strip_suffix('>'))
        .or_else(|| rest.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
        .map(str::trim)
        .filter(|name| !name.is_empty());
    match name {
        Some(name) => Ok(Some(name)),
        None => Err(ShaderError::MalformedDirective(line.trim().to_string())),
    }
}
