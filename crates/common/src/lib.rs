//! Shared value types passed between the sketch, its renderers and the apps.

mod types;

pub use types::{FrameState, Light};
