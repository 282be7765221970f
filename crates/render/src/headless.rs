use crate::context::{ContextLimits, RenderContext};
use crate::descriptor::{DrawDescriptor, UniformValue};
use crate::error::RenderError;
use gridscape_common::FrameState;
use std::fmt::Write as _;

/// Rendering context with no GPU behind it.
///
/// Draw commands it creates produce a text dump of what a GPU draw would
/// receive. Useful for the CLI, logging, and testing the descriptor contract.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    limits: ContextLimits,
    draws_created: usize,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ContextLimits) -> Self {
        Self {
            limits,
            draws_created: 0,
        }
    }

    pub fn draws_created(&self) -> usize {
        self.draws_created
    }
}

impl RenderContext for HeadlessContext {
    type Draw = HeadlessDraw;

    fn limits(&self) -> ContextLimits {
        self.limits
    }

    fn create_draw(&mut self, descriptor: DrawDescriptor) -> Result<HeadlessDraw, RenderError> {
        if descriptor.vertex_shader.is_empty() || descriptor.fragment_shader.is_empty() {
            return Err(RenderError::Backend(format!(
                "{}: empty shader source",
                descriptor.label
            )));
        }
        self.draws_created += 1;
        Ok(HeadlessDraw { descriptor })
    }
}

/// A recorded descriptor that "draws" by describing itself.
#[derive(Debug)]
pub struct HeadlessDraw {
    descriptor: DrawDescriptor,
}

impl HeadlessDraw {
    pub fn descriptor(&self) -> &DrawDescriptor {
        &self.descriptor
    }

    /// Resolve the uniforms for `frame` and describe the draw.
    pub fn draw(&self, frame: &FrameState) -> String {
        let d = &self.descriptor;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Draw '{}' (tick={}, time={:.3}) ===",
            d.label, frame.tick, frame.time
        );
        let _ = writeln!(
            out,
            "Mesh: {} vertices, {} triangles",
            d.mesh.vertex_count(),
            d.mesh.triangle_count()
        );
        let _ = writeln!(
            out,
            "Shaders: vertex {} bytes ({}), fragment {} bytes ({})",
            d.vertex_shader.len(),
            d.vertex_entry,
            d.fragment_shader.len(),
            d.fragment_entry
        );
        let _ = writeln!(out, "Line width: {:.1}", d.line_width);

        for (name, value) in d.uniforms.resolve(frame).iter() {
            let shown = match value {
                UniformValue::Float(v) => format!("{v:.3}"),
                UniformValue::Vec3(v) => format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z),
                UniformValue::Mat3(m) => format!("mat3 det={:.2}", m.determinant()),
                UniformValue::Mat4(m) => format!("mat4 det={:.2}", m.determinant()),
            };
            let _ = writeln!(out, "  {name}: {shown}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::terrain;

    #[test]
    fn headless_draw_reports_time() {
        let mut ctx = HeadlessContext::new();
        let draw = terrain(&mut ctx).unwrap();
        let output = draw.draw(&FrameState { time: 2.5, tick: 7 });
        assert!(output.contains("tick=7"));
        assert!(output.contains("time: 2.500"));
        assert!(output.contains("63001 vertices"));
        assert!(output.contains("model: mat4 det=1.00"));
    }

    #[test]
    fn context_counts_draws() {
        let mut ctx = HeadlessContext::new();
        terrain(&mut ctx).unwrap();
        terrain(&mut ctx).unwrap();
        assert_eq!(ctx.draws_created(), 2);
    }
}
