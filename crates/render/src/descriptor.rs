use crate::error::RenderError;
use glam::{Mat3, Mat4, Vec3};
use gridscape_common::FrameState;
use gridscape_mesh::Mesh;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A concrete uniform value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UniformValue {
    Float(f32),
    Vec3(Vec3),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

/// A uniform binding: fixed at construction, or recomputed every frame.
#[derive(Clone, Copy)]
pub enum Uniform {
    Constant(UniformValue),
    PerFrame(fn(&FrameState) -> UniformValue),
}

impl Uniform {
    pub fn resolve(&self, frame: &FrameState) -> UniformValue {
        match self {
            Uniform::Constant(value) => *value,
            Uniform::PerFrame(compute) => compute(frame),
        }
    }

    pub fn is_per_frame(&self) -> bool {
        matches!(self, Uniform::PerFrame(_))
    }
}

impl fmt::Debug for Uniform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uniform::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Uniform::PerFrame(_) => f.write_str("PerFrame(..)"),
        }
    }
}

/// Named uniform bindings, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct UniformTable {
    entries: BTreeMap<String, Uniform>,
}

impl UniformTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, uniform: Uniform) {
        self.entries.insert(name.into(), uniform);
    }

    pub fn get(&self, name: &str) -> Option<&Uniform> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Evaluate every binding for one frame.
    pub fn resolve(&self, frame: &FrameState) -> ResolvedUniforms {
        ResolvedUniforms {
            values: self
                .entries
                .iter()
                .map(|(name, uniform)| (name.clone(), uniform.resolve(frame)))
                .collect(),
        }
    }
}

/// Uniform values for a single frame, with typed lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedUniforms {
    values: BTreeMap<String, UniformValue>,
}

impl ResolvedUniforms {
    pub fn get(&self, name: &str) -> Result<UniformValue, RenderError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::MissingUniform(name.to_string()))
    }

    pub fn float(&self, name: &str) -> Result<f32, RenderError> {
        match self.get(name)? {
            UniformValue::Float(v) => Ok(v),
            other => Err(mismatch(name, "float", other)),
        }
    }

    pub fn vec3(&self, name: &str) -> Result<Vec3, RenderError> {
        match self.get(name)? {
            UniformValue::Vec3(v) => Ok(v),
            other => Err(mismatch(name, "vec3", other)),
        }
    }

    pub fn mat4(&self, name: &str) -> Result<Mat4, RenderError> {
        match self.get(name)? {
            UniformValue::Mat4(v) => Ok(v),
            other => Err(mismatch(name, "mat4", other)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

fn mismatch(name: &str, expected: &'static str, found: UniformValue) -> RenderError {
    RenderError::UniformType {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

/// A vertex attribute slot and its component count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub location: u32,
    pub components: u32,
}

/// Everything a backend needs for one indexed draw.
#[derive(Debug, Clone)]
pub struct DrawDescriptor {
    pub label: String,
    pub vertex_shader: String,
    pub vertex_entry: &'static str,
    pub fragment_shader: String,
    pub fragment_entry: &'static str,
    /// Positions and uvs feed the attributes; cells are the elements.
    pub mesh: Mesh,
    pub uniforms: UniformTable,
    pub light_count: u32,
    pub line_width: f32,
}

impl DrawDescriptor {
    /// Attribute layout expected by the vertex stage.
    pub const ATTRIBUTES: [VertexAttribute; 2] = [
        VertexAttribute {
            name: "position",
            location: 0,
            components: 3,
        },
        VertexAttribute {
            name: "uv",
            location: 1,
            components: 2,
        },
    ];

    pub fn elements(&self) -> &[[u32; 3]] {
        &self.mesh.cells
    }

    pub fn element_count(&self) -> u32 {
        (self.mesh.cells.len() * 3) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> UniformTable {
        let mut table = UniformTable::new();
        table.insert("time", Uniform::PerFrame(|frame| UniformValue::Float(frame.time)));
        table.insert("model", Uniform::Constant(UniformValue::Mat4(Mat4::IDENTITY)));
        table
    }

    #[test]
    fn per_frame_uniform_tracks_time() {
        let table = table();
        assert_eq!(table.resolve(&FrameState::at(1.5)).float("time").unwrap(), 1.5);
        assert_eq!(table.resolve(&FrameState::at(4.0)).float("time").unwrap(), 4.0);
    }

    #[test]
    fn constant_uniform_is_stable() {
        let table = table();
        let a = table.resolve(&FrameState::at(0.0)).mat4("model").unwrap();
        let b = table.resolve(&FrameState::at(9.0)).mat4("model").unwrap();
        assert_eq!(a, Mat4::IDENTITY);
        assert_eq!(a, b);
    }

    #[test]
    fn missing_and_mistyped_uniforms() {
        let resolved = table().resolve(&FrameState::default());
        assert!(matches!(
            resolved.vec3("light0"),
            Err(RenderError::MissingUniform(name)) if name == "light0"
        ));
        let err = resolved.vec3("time").unwrap_err();
        assert_eq!(err.to_string(), "uniform time is a float, expected vec3");
    }

    #[test]
    fn names_are_sorted() {
        let names: Vec<_> = table().names().map(str::to_owned).collect();
        assert_eq!(names, vec!["model", "time"]);
    }

    #[test]
    fn uniform_debug_hides_fn_pointer() {
        let table = table();
        assert_eq!(format!("{:?}", table.get("time").unwrap()), "PerFrame(..)");
        assert!(table.get("time").unwrap().is_per_frame());
        assert!(!table.get("model").unwrap().is_per_frame());
    }
}
