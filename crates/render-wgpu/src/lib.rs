//! wgpu render backend for the terrain sketch.
//!
//! [`WgpuContext`] implements [`RenderContext`](gridscape_render::RenderContext):
//! it turns a draw descriptor into a [`TerrainDraw`] holding the pipeline and
//! buffers. The camera supplies projection and view each frame.
//!
//! # Invariants
//! - Mesh and shaders are uploaded once; only the uniform buffer changes per frame.
//! - Camera motion lives outside the descriptor.

mod camera;
mod gpu;

pub use camera::FlyCamera;
pub use gpu::{TerrainDraw, WgpuContext, pack_frame_uniforms};
