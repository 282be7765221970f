use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Per-frame state handed to a draw command.
///
/// `time` is elapsed seconds since the sketch started, already scaled and
/// paused by the caller. The sketch only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameState {
    pub time: f32,
    pub tick: u64,
}

impl FrameState {
    pub fn at(time: f32) -> Self {
        Self { time, tick: 0 }
    }

    /// Advance by `dt` seconds and count one frame.
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
        self.tick += 1;
    }
}

/// A directional light: unit direction towards the light, linear RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub direction: Vec3,
    pub color: Vec3,
}

impl Light {
    /// Build a light, normalizing the direction.
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_state_advances() {
        let mut frame = FrameState::default();
        frame.advance(0.5);
        frame.advance(0.25);
        assert_eq!(frame.time, 0.75);
        assert_eq!(frame.tick, 2);
    }

    #[test]
    fn light_direction_is_normalized() {
        let light = Light::new(Vec3::new(0.0, 3.0, 4.0), Vec3::ONE);
        assert!((light.direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(light.color, Vec3::ONE);
    }

    #[test]
    fn zero_light_direction_stays_zero() {
        let light = Light::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(light.direction, Vec3::ZERO);
    }
}
