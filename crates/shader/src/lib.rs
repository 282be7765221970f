//! Shader authoring for the terrain sketch.
//!
//! WGSL has no module system of its own here, so shared functions live in a
//! [`ShaderLibrary`] of named chunks. Sources pull them in with
//! `#include <name>` lines, which [`ShaderComposer`] expands.
//!
//! | Chunk | Provides |
//! |-------|----------|
//! | `noise/common` | `mod289_*`, `permute_*`, `taylor_inv_sqrt_*` |
//! | `noise/simplex3d` | `snoise3` |
//! | `noise/simplex4d` | `snoise4` |
//! | `math/rotate` | `rotate_x`, `rotate_y`, `rotate_z` |
//! | `color/gamma` | `to_gamma` |
//! | `gridscape/frame` | `Frame` uniform block at group 0, binding 0 |

mod composer;
mod library;
mod terrain;

pub use composer::{ShaderComposer, ShaderDef, ShaderError};
pub use library::ShaderLibrary;
pub use terrain::{FS_ENTRY, TERRAIN_DEFINES, TerrainShaders, VS_ENTRY};

pub fn crate_info() -> &'static str {
    "gridscape-shader v0.1.0"
}
