use gridscape_mesh::MeshError;
use gridscape_shader::ShaderError;

/// Errors from building or drawing a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("mesh generation failed: {0}")]
    Mesh(#[from] MeshError),
    #[error("shader composition failed: {0}")]
    Shader(#[from] ShaderError),
    #[error("uniform not bound: {0}")]
    MissingUniform(String),
    #[error("uniform {name} is a {found}, expected {expected}")]
    UniformType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("render backend error: {0}")]
    Backend(String),
}
