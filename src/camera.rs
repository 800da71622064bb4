use glam::Mat4;

/// A perspective camera attached to a scene node.
///
/// The camera only describes the lens. Where it sits and which way it looks comes
/// from the owning node's world transform: the view matrix is the inverse of that
/// transform, so the camera looks down its local -Z axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub near_z: f32,
    pub far_z: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            field_of_view: 65.0,
            near_z: 0.1,
            far_z: 100.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.field_of_view = fov_degrees;
        self
    }

    pub fn with_clip_planes(mut self, near_z: f32, far_z: f32) -> Self {
        self.near_z = near_z;
        self.far_z = far_z;
        self
    }

    /// Right-handed perspective projection mapping depth to `[0, 1]`.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.field_of_view.to_radians(),
            aspect_ratio,
            self.near_z,
            self.far_z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::Vec4;

    #[test]
    fn projection_matches_explicit_form() {
        let camera = Camera::new().with_fov(90.0).with_clip_planes(1.0, 11.0);
        let proj = camera.projection_matrix(2.0);

        let ys = 1.0 / (45.0f32).to_radians().tan();
        let xs = ys / 2.0;
        let zs = 11.0 / (1.0 - 11.0);
        let expected = Mat4::from_cols(
            Vec4::new(xs, 0.0, 0.0, 0.0),
            Vec4::new(0.0, ys, 0.0, 0.0),
            Vec4::new(0.0, 0.0, zs, -1.0),
            Vec4::new(0.0, 0.0, zs * 1.0, 0.0),
        );
        assert!(proj.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn near_and_far_planes_map_to_unit_depth() {
        let camera = Camera::default();
        let proj = camera.projection_matrix(1.0);

        let near = proj * Vec4::new(0.0, 0.0, -camera.near_z, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -camera.far_z, 1.0);
        assert_abs_diff_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }
}
