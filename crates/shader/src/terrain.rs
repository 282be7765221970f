use crate::composer::{ShaderComposer, ShaderDef, ShaderError};

/// Vertex entry point of [`TerrainShaders::vertex`].
pub const VS_ENTRY: &str = "vs_main";
/// Fragment entry point of [`TerrainShaders::fragment`].
pub const FS_ENTRY: &str = "fs_main";

/// Displaces the ground grid into scrolling terrain.
///
/// Expects `position` (location 0) on the unit XZ square and `uv`
/// (location 1). The normal comes from finite differences of the same
/// height function.
const TERRAIN_VERTEX: &str = r#"
#include <gridscape/frame>
#include <noise/simplex3d>

const TERRAIN_OFFSET_POSITION: vec2<f32> = vec2<f32>(10.0, 10.0);
const LARGE_TERRAIN_HEIGHT: f32 = 0.3;
const LARGE_TERRAIN_SCALE: f32 = 2.0;
const SMALL_TERRAIN_HEIGHT: f32 = 0.05;
const SMALL_TERRAIN_SCALE: f32 = 7.0;
const SMALLEST_TERRAIN_HEIGHT: f32 = 0.02;
const SMALLEST_TERRAIN_SCALE: f32 = 13.0;
const EPSILON: f32 = 0.01;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) world_position: vec3<f32>,
};

fn octave(coordinate: vec2<f32>, height: f32, scale: f32) -> f32 {
    let scroll = frame.time * TERRAIN_SPEED;
    return height * coordinate.x
        * snoise3(vec3<f32>(coordinate * scale + TERRAIN_OFFSET_POSITION, scroll));
}

fn terrain(grid: vec2<f32>) -> vec3<f32> {
    var coordinate = grid;
    coordinate.y = pow(coordinate.y * 2.0, 2.0) - 3.0;
    coordinate.x = (coordinate.x - 0.5) * mix(0.5, 1.5, 1.0 - coordinate.y);

    let height = octave(coordinate, LARGE_TERRAIN_HEIGHT, LARGE_TERRAIN_SCALE)
        + octave(coordinate, SMALL_TERRAIN_HEIGHT, SMALL_TERRAIN_SCALE)
        + octave(coordinate, SMALLEST_TERRAIN_HEIGHT, SMALLEST_TERRAIN_SCALE);

    return vec3<f32>(coordinate.x, height, coordinate.y);
}

fn calculate_normal(cartesian: vec3<f32>, coordinate: vec2<f32>) -> vec3<f32> {
    let tangent = normalize(terrain(vec2<f32>(coordinate.x, coordinate.y + EPSILON)) - cartesian);
    let binormal = normalize(terrain(vec2<f32>(coordinate.x + EPSILON, coordinate.y)) - cartesian);
    return cross(tangent, binormal);
}

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let coordinate = vertex.position.xz;
    let cartesian = terrain(coordinate);

    var out: VertexOutput;
    out.clip_position = frame.projection * frame.view * frame.model * vec4<f32>(cartesian, 1.0);
    out.uv = vertex.uv;
    out.normal = calculate_normal(cartesian, coordinate);
    out.world_position = cartesian;
    return out;
}
"#;

/// Noise-perturbed diffuse lighting, valley fog and distance haze.
const TERRAIN_FRAGMENT: &str = r#"
#include <gridscape/frame>
#include <noise/simplex4d>
#include <math/rotate>
#include <color/gamma>

const FOG_COLOR: vec3<f32> = vec3<f32>(0.5, 0.5, 1.0);
const HAZE_COLOR: vec3<f32> = vec3<f32>(0.5, 0.5, 0.7);

struct FragmentInput {
    @location(0) uv: vec2<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) world_position: vec3<f32>,
};

fn perturb_normal(position: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {
    // Warp the input to the surface normal noise
    var warped = position;
    warped.x *= 0.3 * sin((position.z + position.x * 0.2 + position.y * 0.5) * 30.0);

    let offset = vec3<f32>(300.0);
    return rotate_x(0.3 * snoise4(vec4<f32>(warped * 10.0, 0.0)))
        * rotate_x(0.05 * snoise4(vec4<f32>(warped * 50.0, 0.0)))
        * rotate_x(0.05 * snoise4(vec4<f32>(warped * 100.0, 0.0)))
        * rotate_y(0.3 * snoise4(vec4<f32>(offset + warped * 10.0, 0.0)))
        * rotate_y(0.05 * snoise4(vec4<f32>(offset + warped * 50.0, 0.0)))
        * rotate_y(0.05 * snoise4(vec4<f32>(offset + warped * 100.0, 0.0)))
        * normalize(normal);
}

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let position = in.world_position;
    let normal = perturb_normal(position, in.normal);
    let base_color = vec3<f32>(in.uv, 1.0);

    var color = vec3<f32>(0.0);
    for (var i = 0u; i < LIGHT_COUNT; i++) {
        let light = frame.lights[i];
        color += base_color * light.color.rgb * max(0.0, dot(light.direction.xyz, normal));
    }

    if FOG {
        let fog_warble1 = 0.003 * sin((-position.z + position.x) * 30.0 + frame.time * 0.5);
        let fog_warble2 = 0.003 * sin((position.z * 0.5 - position.x) * 60.0 + frame.time * 0.5);
        let fog = clamp((fog_warble1 + fog_warble2 - position.y) * 40.0, 0.0, 1.0);
        color = mix(color, FOG_COLOR, mix(0.0, 0.5, fog));
    }

    // Haze
    color = mix(color, HAZE_COLOR, clamp(-position.z * 0.05, 0.0, 1.0));

    return vec4<f32>(to_gamma(color), 1.0);
}
"#;

/// Tunables both stages read as defines, with their defaults.
///
/// `TERRAIN_SPEED` scrolls the noise field per second; `FOG` toggles the
/// valley fog.
pub const TERRAIN_DEFINES: [(&str, ShaderDef); 2] = [
    ("TERRAIN_SPEED", ShaderDef::F32(0.02)),
    ("FOG", ShaderDef::Bool(true)),
];

/// The composed terrain shader pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainShaders {
    pub vertex: String,
    pub fragment: String,
    pub light_count: u32,
}

impl TerrainShaders {
    /// Compose both stages against the standard library for `light_count` lights.
    pub fn compose(light_count: u32) -> Result<Self, ShaderError> {
        Self::compose_with(light_count, &[])
    }

    /// Like [`compose`](Self::compose), replacing some [`TERRAIN_DEFINES`].
    ///
    /// An override must name a known tunable and keep its type. The light
    /// array cannot be empty, so `light_count` must be at least one.
    pub fn compose_with(
        light_count: u32,
        overrides: &[(String, ShaderDef)],
    ) -> Result<Self, ShaderError> {
        if light_count == 0 {
            return Err(ShaderError::InvalidDefine {
                name: "LIGHT_COUNT".into(),
                reason: "at least one light is required",
            });
        }

        let mut composer = ShaderComposer::standard();
        for (name, def) in TERRAIN_DEFINES {
            composer = composer.with_def(name, def);
        }
        for (name, def) in overrides {
            let Some((_, default)) = TERRAIN_DEFINES
                .iter()
                .find(|(known, _)| *known == name.as_str())
            else {
                return Err(ShaderError::InvalidDefine {
                    name: name.clone(),
                    reason: "not a terrain tunable",
                });
            };
            if !default.same_type(def) {
                return Err(ShaderError::InvalidDefine {
                    name: name.clone(),
                    reason: "type differs from the default",
                });
            }
            composer = composer.with_def(name, *def);
        }
        let composer = composer.with_def("LIGHT_COUNT", light_count);

        Ok(Self {
            vertex: composer.compose(TERRAIN_VERTEX)?,
            fragment: composer.compose(TERRAIN_FRAGMENT)?,
            light_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(label: &str, source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{label} failed to parse:\n{}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{label} failed validation: {e:?}"));
    }

    #[test]
    fn shaders_are_non_empty_and_expanded() {
        let shaders = TerrainShaders::compose(2).unwrap();
        assert!(!shaders.vertex.is_empty());
        assert!(!shaders.fragment.is_empty());
        assert!(!shaders.vertex.contains("#include"));
        assert!(!shaders.fragment.contains("#include"));
        assert!(shaders.vertex.contains("fn snoise3"));
        assert!(shaders.vertex.contains("const TERRAIN_SPEED: f32 = 0.02;"));
        assert!(shaders.fragment.contains("fn snoise4"));
        assert!(shaders.fragment.contains("fn to_gamma"));
    }

    #[test]
    fn light_count_is_defined_once() {
        let shaders = TerrainShaders::compose(3).unwrap();
        assert_eq!(shaders.fragment.matches("const LIGHT_COUNT: u32 = 3u;").count(), 1);
        assert_eq!(shaders.vertex.matches("struct Frame").count(), 1);
    }

    #[test]
    fn entry_points_present() {
        let shaders = TerrainShaders::compose(2).unwrap();
        assert!(shaders.vertex.contains(&format!("fn {VS_ENTRY}(")));
        assert!(shaders.fragment.contains(&format!("fn {FS_ENTRY}(")));
    }

    #[test]
    fn vertex_stage_is_valid_wgsl() {
        let shaders = TerrainShaders::compose(2).unwrap();
        validate("vertex", &shaders.vertex);
    }

    #[test]
    fn fragment_stage_is_valid_wgsl() {
        let shaders = TerrainShaders::compose(2).unwrap();
        validate("fragment", &shaders.fragment);
    }

    #[test]
    fn zero_lights_rejected() {
        assert_eq!(
            TerrainShaders::compose(0),
            Err(ShaderError::InvalidDefine {
                name: "LIGHT_COUNT".into(),
                reason: "at least one light is required"
            })
        );
    }

    #[test]
    fn single_light_is_valid_wgsl() {
        let shaders = TerrainShaders::compose(1).unwrap();
        validate("fragment", &shaders.fragment);
    }

    #[test]
    fn overrides_replace_defaults() {
        let overrides = [
            ("TERRAIN_SPEED".to_string(), ShaderDef::F32(0.5)),
            ("FOG".to_string(), ShaderDef::Bool(false)),
        ];
        let shaders = TerrainShaders::compose_with(2, &overrides).unwrap();
        assert!(shaders.vertex.contains("const TERRAIN_SPEED: f32 = 0.5;"));
        assert!(shaders.fragment.contains("const FOG: bool = false;"));
        validate("vertex", &shaders.vertex);
        validate("fragment", &shaders.fragment);
    }

    #[test]
    fn bad_overrides_rejected() {
        let unknown = [("LIGHT_COUNT".to_string(), ShaderDef::U32(4))];
        assert!(matches!(
            TerrainShaders::compose_with(2, &unknown),
            Err(ShaderError::InvalidDefine { reason: "not a terrain tunable", .. })
        ));
        let mistyped = [("TERRAIN_SPEED".to_string(), ShaderDef::I32(1))];
        assert!(matches!(
            TerrainShaders::compose_with(2, &mistyped),
            Err(ShaderError::InvalidDefine { reason: "type differs from the default", .. })
        ));
        let infinite = [("TERRAIN_SPEED".to_string(), ShaderDef::F32(f32::INFINITY))];
        assert!(matches!(
            TerrainShaders::compose_with(2, &infinite),
            Err(ShaderError::InvalidDefine { reason: "not a finite number", .. })
        ));
    }

    #[test]
    fn composition_is_deterministic() {
        assert_eq!(TerrainShaders::compose(2), TerrainShaders::compose(2));
    }
}
