/// Shared helpers for the simplex noise chunks.
///
/// WGSL has no overloading, so each arity gets its own suffix.
pub const NOISE_COMMON: &str = r#"
fn mod289_1(x: f32) -> f32 {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute_1(x: f32) -> f32 {
    return mod289_1(((x * 34.0) + 1.0) * x);
}

fn permute_4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt_1(r: f32) -> f32 {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn taylor_inv_sqrt_4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}
"#;

/// 3D simplex noise (Ashima Arts / Stefan Gustavson), range roughly [-1, 1].
pub const NOISE_SIMPLEX_3D: &str = r#"
#include <noise/common>

fn snoise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0 / 6.0, 1.0 / 3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    // First corner
    let i0 = floor(v + dot(v, C.yyy));
    let x0 = v - i0 + dot(i0, C.xxx);

    // Other corners
    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.xxx;
    let x2 = x0 - i2 + C.yyy;
    let x3 = x0 - D.yyy;

    // Permutations
    let i = mod289_3(i0);
    let p = permute_4(permute_4(permute_4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
        + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
        + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    // Gradients: 7x7 points over a square, mapped onto an octahedron.
    let n_ = 0.142857142857;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);
    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);
    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    let g0 = vec3<f32>(a0.xy, h.x);
    let g1 = vec3<f32>(a0.zw, h.y);
    let g2 = vec3<f32>(a1.xy, h.z);
    let g3 = vec3<f32>(a1.zw, h.w);

    // Normalise gradients
    let norm = taylor_inv_sqrt_4(vec4<f32>(dot(g0, g0), dot(g1, g1), dot(g2, g2), dot(g3, g3)));
    let n0 = g0 * norm.x;
    let n1 = g1 * norm.y;
    let n2 = g2 * norm.z;
    let n3 = g3 * norm.w;

    // Mix final noise value
    var m = max(0.6 - vec4<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m * m, vec4<f32>(dot(n0, x0), dot(n1, x1), dot(n2, x2), dot(n3, x3)));
}
"#;

/// 4D simplex noise (Ashima Arts / Stefan Gustavson), range roughly [-1, 1].
pub const NOISE_SIMPLEX_4D: &str = r#"
#include <noise/common>

const F4: f32 = 0.309016994374947451;

fn grad4(j: f32, ip: vec4<f32>) -> vec4<f32> {
    let ones = vec4<f32>(1.0, 1.0, 1.0, -1.0);
    let pxyz = floor(fract(vec3<f32>(j) * ip.xyz) * 7.0) * ip.z - 1.0;
    let pw = 1.5 - dot(abs(pxyz), ones.xyz);
    let p = vec4<f32>(pxyz, pw);
    let s = select(vec4<f32>(0.0), vec4<f32>(1.0), p < vec4<f32>(0.0));
    return vec4<f32>(p.xyz + (s.xyz * 2.0 - 1.0) * s.www, p.w);
}

fn snoise4(v: vec4<f32>) -> f32 {
    let C = vec4<f32>(0.138196601125011, 0.276393202250021, 0.414589803375032, -0.447213595499958);

    // First corner
    let i = floor(v + dot(v, vec4<f32>(F4)));
    let x0 = v - i + dot(i, C.xxxx);

    // Rank sorting decides which simplex we are in.
    let is_x = step(x0.yzw, x0.xxx);
    let is_yz = step(x0.zww, x0.yyz);
    var i0 = vec4<f32>(is_x.x + is_x.y + is_x.z, 1.0 - is_x);
    i0.y += is_yz.x + is_yz.y;
    i0.z += 1.0 - is_yz.x;
    i0.w += 1.0 - is_yz.y;
    i0.z += is_yz.z;
    i0.w += 1.0 - is_yz.z;

    let i3 = clamp(i0, vec4<f32>(0.0), vec4<f32>(1.0));
    let i2 = clamp(i0 - 1.0, vec4<f32>(0.0), vec4<f32>(1.0));
    let i1 = clamp(i0 - 2.0, vec4<f32>(0.0), vec4<f32>(1.0));

    let x1 = x0 - i1 + C.xxxx;
    let x2 = x0 - i2 + C.yyyy;
    let x3 = x0 - i3 + C.zzzz;
    let x4 = x0 + C.wwww;

    // Permutations
    let im = mod289_4(i);
    let j0 = permute_1(permute_1(permute_1(permute_1(im.w) + im.z) + im.y) + im.x);
    let j1 = permute_4(permute_4(permute_4(permute_4(
        im.w + vec4<f32>(i1.w, i2.w, i3.w, 1.0))
        + im.z + vec4<f32>(i1.z, i2.z, i3.z, 1.0))
        + im.y + vec4<f32>(i1.y, i2.y, i3.y, 1.0))
        + im.x + vec4<f32>(i1.x, i2.x, i3.x, 1.0));

    // Gradients: 7x7x6 points over a cube, mapped onto a 4-cross polytope.
    let ip = vec4<f32>(1.0 / 294.0, 1.0 / 49.0, 1.0 / 7.0, 0.0);

    let p0 = grad4(j0, ip);
    let p1 = grad4(j1.x, ip);
    let p2 = grad4(j1.y, ip);
    let p3 = grad4(j1.z, ip);
    let p4 = grad4(j1.w, ip);

    // Normalise gradients
    let norm = taylor_inv_sqrt_4(vec4<f32>(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    let n0 = p0 * norm.x;
    let n1 = p1 * norm.y;
    let n2 = p2 * norm.z;
    let n3 = p3 * norm.w;
    let n4 = p4 * taylor_inv_sqrt_1(dot(p4, p4));

    // Mix contributions from the five corners
    var m0 = max(0.6 - vec3<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2)), vec3<f32>(0.0));
    var m1 = max(0.6 - vec2<f32>(dot(x3, x3), dot(x4, x4)), vec2<f32>(0.0));
    m0 = m0 * m0;
    m1 = m1 * m1;
    return 49.0 * (dot(m0 * m0, vec3<f32>(dot(n0, x0), dot(n1, x1), dot(n2, x2)))
        + dot(m1 * m1, vec2<f32>(dot(n3, x3), dot(n4, x4))));
}
"#;

/// Rotation matrices about the principal axes, column-major.
pub const MATH_ROTATE: &str = r#"
fn rotate_x(rad: f32) -> mat3x3<f32> {
    let c = cos(rad);
    let s = sin(rad);
    return mat3x3<f32>(
        1.0, 0.0, 0.0,
        0.0, c, s,
        0.0, -s, c,
    );
}

fn rotate_y(rad: f32) -> mat3x3<f32> {
    let c = cos(rad);
    let s = sin(rad);
    return mat3x3<f32>(
        c, 0.0, -s,
        0.0, 1.0, 0.0,
        s, 0.0, c,
    );
}

fn rotate_z(rad: f32) -> mat3x3<f32> {
    let c = cos(rad);
    let s = sin(rad);
    return mat3x3<f32>(
        c, s, 0.0,
        -s, c, 0.0,
        0.0, 0.0, 1.0,
    );
}
"#;

/// Linear to display gamma.
pub const COLOR_GAMMA: &str = r#"
const GAMMA: f32 = 2.2;

fn to_gamma(v: vec3<f32>) -> vec3<f32> {
    return pow(v, vec3<f32>(1.0 / GAMMA));
}
"#;

/// Per-frame uniform block shared by both terrain stages.
///
/// Needs `LIGHT_COUNT` defined by the composer.
pub const GRIDSCAPE_FRAME: &str = r#"
struct Light {
    direction: vec4<f32>,
    color: vec4<f32>,
};

struct Frame {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    view_normal: mat3x3<f32>,
    lights: array<Light, LIGHT_COUNT>,
    time: f32,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
"#;

/// Collection of named chunks that `#include <name>` can refer to.
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    chunks: Vec<(&'static str, &'static str)>,
}

impl ShaderLibrary {
    /// Every built-in chunk.
    pub fn standard() -> Self {
        Self {
            chunks: vec![
                ("noise/common", NOISE_COMMON),
                ("noise/simplex3d", NOISE_SIMPLEX_3D),
                ("noise/simplex4d", NOISE_SIMPLEX_4D),
                ("math/rotate", MATH_ROTATE),
                ("color/gamma", COLOR_GAMMA),
                ("gridscape/frame", GRIDSCAPE_FRAME),
            ],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_chunk(mut self, name: &'static str, source: &'static str) -> Self {
        self.chunks.push((name, source));
        self
    }

    pub fn chunks(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.chunks.iter().copied()
    }

    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.chunks
            .iter()
            .rev()
            .find(|(chunk, _)| *chunk == name)
            .map(|(_, source)| *source)
    }
}
