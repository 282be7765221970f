use crate::context::{ContextLimits, RenderContext};
use crate::descriptor::{DrawDescriptor, Uniform, UniformTable, UniformValue};
use crate::error::RenderError;
use glam::{Mat4, Vec3};
use gridscape_common::{FrameState, Light};
use gridscape_mesh::terrain_grid;
use gridscape_shader::{FS_ENTRY, TerrainShaders, VS_ENTRY};

/// Number of directional lights the terrain shades with.
pub const LIGHT_COUNT: u32 = 2;

/// Warm key light from above and a dim cool fill from behind.
pub fn terrain_lights() -> [Light; LIGHT_COUNT as usize] {
    [
        Light::new(Vec3::new(0.4, 1.0, 0.2), Vec3::new(1.0, 0.95, 0.85)),
        Light::new(Vec3::new(-0.6, 0.3, -0.5), Vec3::new(0.25, 0.3, 0.45)),
    ]
}

fn elapsed(frame: &FrameState) -> UniformValue {
    UniformValue::Float(frame.time)
}

/// Build the terrain draw descriptor for a context with `limits`.
pub fn terrain_descriptor(limits: &ContextLimits) -> Result<DrawDescriptor, RenderError> {
    let mesh = terrain_grid()?;
    mesh.validate()?;
    let shaders = TerrainShaders::compose(LIGHT_COUNT)?;

    let mut uniforms = UniformTable::new();
    uniforms.insert("time", Uniform::PerFrame(elapsed));
    uniforms.insert("model", Uniform::Constant(UniformValue::Mat4(Mat4::IDENTITY)));
    for (i, light) in terrain_lights().iter().enumerate() {
        uniforms.insert(
            format!("light{i}"),
            Uniform::Constant(UniformValue::Vec3(light.direction)),
        );
        uniforms.insert(
            format!("light_color{i}"),
            Uniform::Constant(UniformValue::Vec3(light.color)),
        );
    }

    let line_width = limits.line_width();
    tracing::debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        uniforms = uniforms.len(),
        line_width,
        "built terrain descriptor"
    );

    Ok(DrawDescriptor {
        label: "terrain".into(),
        vertex_shader: shaders.vertex,
        vertex_entry: VS_ENTRY,
        fragment_shader: shaders.fragment,
        fragment_entry: FS_ENTRY,
        mesh,
        uniforms,
        light_count: shaders.light_count,
        line_width,
    })
}

/// The sketch factory: build the terrain descriptor and hand it to `ctx`.
///
/// Call once at startup; invoke the returned draw command every frame.
pub fn terrain<C: RenderContext>(ctx: &mut C) -> Result<C::Draw, RenderError> {
    let descriptor = terrain_descriptor(&ctx.limits())?;
    let draw = ctx.create_draw(descriptor)?;
    tracing::info!("terrain sketch ready");
    Ok(draw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lights_are_unit_length() {
        for light in terrain_lights() {
            assert!((light.direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn descriptor_binds_every_light() {
        let descriptor = terrain_descriptor(&ContextLimits::default()).unwrap();
        for i in 0..LIGHT_COUNT {
            assert!(descriptor.uniforms.get(&format!("light{i}")).is_some());
            assert!(descriptor.uniforms.get(&format!("light_color{i}")).is_some());
        }
        assert_eq!(descriptor.light_count, LIGHT_COUNT);
    }

    #[test]
    fn line_width_follows_limits() {
        let limits = ContextLimits {
            device_pixel_ratio: 2.0,
            line_width_range: [1.0, 3.0],
        };
        assert_eq!(terrain_descriptor(&limits).unwrap().line_width, 3.0);
    }
}
