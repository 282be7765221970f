use glam::{Mat3, Mat4, Vec3};

/// Fly camera with position, yaw, pitch, and projection parameters.
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    /// Just above the narrow end of the terrain, looking down its length.
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.25, 1.4),
            yaw: -90.0_f32.to_radians(),
            pitch: -10.0_f32.to_radians(),
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 100.0,
            speed: 0.5,
            sensitivity: 0.003,
        }
    }
}

impl FlyCamera {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Move along camera axes: `input.x` right, `input.y` world up,
    /// `input.z` forward. Diagonals are no faster than a single axis.
    pub fn fly(&mut self, input: Vec3, dt: f32) {
        let input = input.normalize_or_zero();
        let step = self.right() * input.x + Vec3::Y * input.y + self.forward() * input.z;
        self.position += step * self.speed * dt;
    }

    /// Back to the default pose, keeping the current aspect ratio.
    pub fn reset(&mut self) {
        *self = Self {
            aspect: self.aspect,
            ..Self::default()
        };
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Inverse-transpose of the view rotation, for view-space normals.
    pub fn view_normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.view_matrix()).inverse().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_the_terrain() {
        let cam = FlyCamera::default();
        assert!(cam.position.y > 0.0);
        assert!(cam.forward().z < 0.0);
        let vp = cam.projection_matrix() * cam.view_matrix();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn fly_forward_and_back() {
        let mut cam = FlyCamera::default();
        let start = cam.position;
        cam.fly(Vec3::Z, 1.0);
        assert!(((cam.position - start).length() - cam.speed).abs() < 1e-5);
        cam.fly(-Vec3::Z, 1.0);
        assert!(cam.position.abs_diff_eq(start, 1e-5));
    }

    #[test]
    fn diagonal_flight_is_not_faster() {
        let mut cam = FlyCamera::default();
        let start = cam.position;
        cam.fly(Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert!(((cam.position - start).length() - cam.speed).abs() < 1e-5);

        let still = cam.position;
        cam.fly(Vec3::ZERO, 1.0);
        assert_eq!(cam.position, still);
    }

    #[test]
    fn reset_keeps_aspect() {
        let mut cam = FlyCamera {
            aspect: 2.5,
            ..FlyCamera::default()
        };
        cam.fly(Vec3::Y, 3.0);
        cam.rotate(40.0, 10.0);
        cam.reset();
        assert_eq!(cam.aspect, 2.5);
        assert_eq!(cam.position, FlyCamera::default().position);
        assert_eq!(cam.yaw, FlyCamera::default().yaw);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FlyCamera::default();
        cam.rotate(0.0, -1.0e6);
        assert!(cam.pitch <= 89.0_f32.to_radians());
    }

    #[test]
    fn view_normal_of_rotation_is_the_rotation() {
        let cam = FlyCamera::default();
        let rotation = Mat3::from_mat4(cam.view_matrix());
        assert!(cam.view_normal_matrix().abs_diff_eq(rotation, 1e-5));
    }
}
