use crate::descriptor::DrawDescriptor;
use crate::error::RenderError;

/// What a rendering context reports about its display and device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextLimits {
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f32,
    /// Smallest and largest rasterized line width the device supports.
    pub line_width_range: [f32; 2],
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            line_width_range: [1.0, 1.0],
        }
    }
}

impl ContextLimits {
    /// Two logical pixels, capped at the widest line the device can draw.
    pub fn line_width(&self) -> f32 {
        (2.0 * self.device_pixel_ratio).min(self.line_width_range[1])
    }
}

/// A rendering backend that turns descriptors into draw commands.
///
/// The descriptor is moved in; the context owns it from then on.
pub trait RenderContext {
    /// The per-frame draw command produced for a descriptor.
    type Draw;

    fn limits(&self) -> ContextLimits;

    fn create_draw(&mut self, descriptor: DrawDescriptor) -> Result<Self::Draw, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_width_scales_with_pixel_ratio() {
        let limits = ContextLimits {
            device_pixel_ratio: 1.5,
            line_width_range: [1.0, 8.0],
        };
        assert_eq!(limits.line_width(), 3.0);
    }

    #[test]
    fn line_width_clamped_to_device_max() {
        let limits = ContextLimits {
            device_pixel_ratio: 2.0,
            line_width_range: [1.0, 1.0],
        };
        assert_eq!(limits.line_width(), 1.0);
    }

    #[test]
    fn line_width_only_capped_from_above() {
        let limits = ContextLimits {
            device_pixel_ratio: 0.25,
            line_width_range: [1.0, 4.0],
        };
        assert_eq!(limits.line_width(), 0.5);
    }
}
