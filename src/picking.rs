//! Ray casting against the scene graph's bounding volumes.
//!
//! - [`Ray`]: origin and direction, transformable by a 4x4 matrix
//! - [`BoundingSphere`]: the model-space proxy volume every node carries
//! - [`HitResult`]: the closest intersection found by [`Node::hit_test`]
//!
//! # Example
//!
//! ```
//! use scenepick::{BoundingSphere, Mat4, Node, Ray, Scene, Vec3};
//!
//! let scene = Scene::new();
//! let ball = Node::named("ball");
//! ball.set_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
//! ball.set_bounding_sphere(BoundingSphere::new(Vec3::ZERO, 1.0));
//! scene.root_node().add_child_node(&ball);
//!
//! let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
//! let hit = scene.hit_test(&ray).expect("ball is straight ahead");
//! assert_eq!(hit.node, ball);
//! assert!((hit.parameter - 4.0).abs() < 1e-5);
//! ```
//!
//! [`Node::hit_test`]: crate::Node::hit_test

use std::cmp::Ordering;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::scene::Node;

/// A ray in 3D space.
///
/// The direction is stored exactly as given and is not normalized, so a ray keeps
/// its parameterization when it is carried into a scaled coordinate frame.
/// Every intersection routine requires a non-zero direction; a zero-length
/// direction is a precondition violation with unspecified results.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Unproject a point in view coordinates into a world-space ray.
    ///
    /// `point` is measured in pixels from the top-left corner of a viewport of
    /// `viewport_size`. The ray starts at the eye (the origin of the inverse view
    /// matrix) and has a unit-length direction through the point.
    ///
    /// # Arguments
    ///
    /// * `point` - Pointer position in viewport pixels
    /// * `viewport_size` - Viewport width and height in pixels
    /// * `view_matrix` - World-to-eye transform of the active camera
    /// * `projection_matrix` - Eye-to-clip transform of the active camera
    pub fn from_viewport_point(
        point: Vec2,
        viewport_size: Vec2,
        view_matrix: Mat4,
        projection_matrix: Mat4,
    ) -> Self {
        let clip_x = (2.0 * point.x) / viewport_size.x - 1.0;
        let clip_y = 1.0 - (2.0 * point.y) / viewport_size.y;
        let clip = Vec4::new(clip_x, clip_y, 0.0, 1.0);

        // Only the xy slope of the unprojected point matters; -Z is into the screen.
        let eye = projection_matrix.inverse() * clip;
        let eye_direction = Vec4::new(eye.x, eye.y, -1.0, 0.0);

        let inverse_view = view_matrix.inverse();
        let direction = (inverse_view * eye_direction).truncate().normalize();
        let origin = inverse_view.transform_point3(Vec3::ZERO);

        Self { origin, direction }
    }

    /// The ray expressed in another frame: origin as a point, direction as a vector.
    pub fn transformed(&self, transform: &Mat4) -> Self {
        Self {
            origin: transform.transform_point3(self.origin),
            direction: transform.transform_vector3(self.direction),
        }
    }

    /// The point at parameter `t` along the ray.
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// The parameter of `point`, assuming it lies on the ray.
    #[inline]
    pub fn parameter_of(&self, point: Vec3) -> f32 {
        (point - self.origin).length() / self.direction.length()
    }
}

impl std::ops::Mul<Ray> for Mat4 {
    type Output = Ray;

    fn mul(self, ray: Ray) -> Ray {
        ray.transformed(&self)
    }
}

/// A sphere in its owning node's model space.
///
/// The default sphere has zero radius and can never be hit, which is how nodes
/// opt out of picking.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Intersect a ray given in the sphere's own space.
    ///
    /// Returns the nearest intersection point in front of the ray origin, or the
    /// exit point when the origin is inside the sphere. Returns `None` for a
    /// zero-radius sphere, a miss, a sphere lying entirely behind the origin, or
    /// a ray with non-finite components.
    ///
    /// The direction does not need to be unit length (rays carried into a scaled
    /// node's space rarely are), but it must be non-zero.
    pub fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        debug_assert!(
            ray.direction != Vec3::ZERO,
            "ray direction must be non-zero"
        );

        let radius2 = self.radius * self.radius;
        if radius2 == 0.0 || !ray.origin.is_finite() || !ray.direction.is_finite() {
            return None;
        }

        let direction = ray.direction.normalize();
        let l = self.center - ray.origin;
        let tca = l.dot(direction);
        let d2 = l.dot(l) - tca * tca;
        // Written so that a NaN distance counts as a miss.
        if !(d2 <= radius2) {
            return None;
        }

        let thc = (radius2 - d2).sqrt();
        let (mut t0, mut t1) = (tca - thc, tca + thc);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        if t0 < 0.0 {
            t0 = t1;
            if t0 < 0.0 {
                return None;
            }
        }

        Some(ray.origin + direction * t0)
    }
}

/// The closest intersection of a ray with the scene.
#[derive(Clone, Debug)]
pub struct HitResult {
    /// The node whose bounding sphere was hit.
    pub node: Node,
    /// The world-space ray that was cast.
    pub ray: Ray,
    /// Ray parameter of the intersection.
    pub parameter: f32,
}

impl HitResult {
    /// World-space position of the hit.
    pub fn intersection_point(&self) -> Vec3 {
        self.ray.point_at(self.parameter)
    }

    /// Whether this hit lies strictly closer to the ray origin than `other`.
    ///
    /// Only meaningful for results produced by the same ray.
    pub fn is_closer_than(&self, other: &HitResult) -> bool {
        self.parameter < other.parameter
    }
}

impl PartialEq for HitResult {
    fn eq(&self, other: &Self) -> bool {
        self.parameter == other.parameter
    }
}

impl PartialOrd for HitResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.parameter.partial_cmp(&other.parameter)
    }
}
