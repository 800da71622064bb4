use crate::picking::{HitResult, Ray};
use crate::scene::Node;

/// A scene graph with a single root.
///
/// Everything reachable from [`root_node`](Self::root_node) is rendered and
/// pickable. The root starts with an identity transform and never has a parent.
#[derive(Debug)]
pub struct Scene {
    root_node: Node,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            root_node: Node::named("root"),
        }
    }

    pub fn root_node(&self) -> &Node {
        &self.root_node
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        1 + self.root_node.descendant_count()
    }

    pub fn find_node(&self, name: &str) -> Option<Node> {
        self.root_node.find_by_name(name)
    }

    /// Closest node whose bounding sphere `ray` hits, or `None` on a miss.
    ///
    /// `ray` is in world space. This is a flat walk of the whole tree.
    pub fn hit_test(&self, ray: &Ray) -> Option<HitResult> {
        self.root_node.hit_test(ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::BoundingSphere;
    use approx::assert_abs_diff_eq;
    use glam::{Mat4, Vec3};

    fn add_sphere(scene: &Scene, name: &str, position: Vec3) -> Node {
        let node = Node::named(name);
        node.set_transform(Mat4::from_translation(position));
        node.set_bounding_sphere(BoundingSphere::new(Vec3::ZERO, 1.0));
        scene.root_node().add_child_node(&node);
        node
    }

    #[test]
    fn nearest_sibling_is_picked() {
        let scene = Scene::new();
        // Farther sibling first so order cannot decide the result.
        add_sphere(&scene, "far", Vec3::new(0.0, 0.0, 10.0));
        let near = add_sphere(&scene, "near", Vec3::new(0.0, 0.0, 5.0));

        let hit = scene.hit_test(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert_eq!(hit.node, near);
        assert_abs_diff_eq!(hit.parameter, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn miss_returns_none() {
        let scene = Scene::new();
        add_sphere(&scene, "ball", Vec3::new(0.0, 0.0, 5.0));

        assert!(scene.hit_test(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).is_none());
        assert!(scene.hit_test(&Ray::new(Vec3::new(3.0, 0.0, 0.0), Vec3::Z)).is_none());
    }

    #[test]
    fn empty_scene_has_no_hits() {
        let scene = Scene::new();
        assert_eq!(scene.node_count(), 1);
        assert!(scene.hit_test(&Ray::new(Vec3::ZERO, Vec3::Z)).is_none());
    }

    #[test]
    fn root_is_unparented_identity() {
        let scene = Scene::new();
        assert!(scene.root_node().parent().is_none());
        assert!(scene.root_node().transform().abs_diff_eq(Mat4::IDENTITY, 0.0));
    }

    #[test]
    fn find_node_by_name() {
        let scene = Scene::new();
        let ball = add_sphere(&scene, "(2, 3)", Vec3::ZERO);
        assert_eq!(scene.find_node("(2, 3)"), Some(ball));
        assert_eq!(scene.node_count(), 2);
    }
}
