//! Rendering adapter: backend-agnostic draw descriptors.
//!
//! # Invariants
//! - A [`DrawDescriptor`] is handed over whole; the factory keeps nothing.
//! - The only per-frame input is [`FrameState`](gridscape_common::FrameState).
//! - Backends supply `projection`, `view` and `view_normal`; the descriptor
//!   supplies everything else.

mod context;
mod descriptor;
mod error;
mod headless;
mod terrain;

pub use context::{ContextLimits, RenderContext};
pub use descriptor::{
    DrawDescriptor, ResolvedUniforms, Uniform, UniformTable, UniformValue, VertexAttribute,
};
pub use error::RenderError;
pub use headless::{HeadlessContext, HeadlessDraw};
pub use terrain::{LIGHT_COUNT, terrain, terrain_descriptor, terrain_lights};

pub fn crate_info() -> &'static str {
    "gridscape-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
