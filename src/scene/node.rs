use std::cell::{Ref, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use glam::Mat4;
use uuid::Uuid;

use crate::camera::Camera;
use crate::color::Color;
use crate::mesh::MeshId;
use crate::picking::{BoundingSphere, HitResult, Ray};
use crate::scene::Material;

/// A handle to a node in the scene graph.
///
/// `Node` is a cheap, clonable reference: clones share the same underlying node.
/// A node owns its children; the link back to its parent is weak, so dropping a
/// subtree's last owning reference frees it even while children still point up.
///
/// Equality and hashing use the node's identifier alone. Two handles are equal
/// exactly when they refer to the same node, whatever their attributes.
///
/// Nodes use `Rc`/`RefCell` internally and are therefore confined to the thread
/// that created them; traversal and mutation are serialized by construction.
///
/// # Example
///
/// ```
/// use scenepick::{Mat4, Node, Vec3};
///
/// let arm = Node::named("arm");
/// let hand = Node::named("hand");
/// arm.set_transform(Mat4::from_translation(Vec3::X));
/// hand.set_transform(Mat4::from_translation(Vec3::Y));
/// arm.add_child_node(&hand);
///
/// let world = hand.world_transform();
/// assert!(world.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
/// ```
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

struct NodeInner {
    identifier: Uuid,
    state: RefCell<NodeState>,
}

struct NodeState {
    name: Option<String>,
    parent: Weak<NodeInner>,
    children: Vec<Node>,
    transform: Mat4,
    bounding_sphere: BoundingSphere,
    camera: Option<Camera>,
    mesh: Option<MeshId>,
    material: Material,
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    /// Create an unnamed, unparented node with an identity transform.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(NodeInner {
                identifier: Uuid::new_v4(),
                state: RefCell::new(NodeState {
                    name: None,
                    parent: Weak::new(),
                    children: Vec::new(),
                    transform: Mat4::IDENTITY,
                    bounding_sphere: BoundingSphere::default(),
                    camera: None,
                    mesh: None,
                    material: Material::default(),
                }),
            }),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        let node = Self::new();
        node.set_name(name);
        node
    }

    fn state(&self) -> Ref<'_, NodeState> {
        self.inner.state.borrow()
    }

    pub fn identifier(&self) -> Uuid {
        self.inner.identifier
    }

    pub fn name(&self) -> Option<String> {
        self.state().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.inner.state.borrow_mut().name = Some(name.into());
    }

    /// The node this one is attached to, if any.
    pub fn parent(&self) -> Option<Node> {
        self.state().parent.upgrade().map(|inner| Node { inner })
    }

    /// Handles to the direct children, in order.
    pub fn children(&self) -> Vec<Node> {
        self.state().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.state().children.len()
    }

    /// Number of nodes in the subtree rooted here, excluding this node.
    pub fn descendant_count(&self) -> usize {
        self.state()
            .children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Depth-first, pre-order search of this subtree for a node with `name`.
    pub fn find_by_name(&self, name: &str) -> Option<Node> {
        if self.state().name.as_deref() == Some(name) {
            return Some(self.clone());
        }
        self.children()
            .iter()
            .find_map(|child| child.find_by_name(name))
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_ancestor_of(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Transform relative to the parent.
    pub fn transform(&self) -> Mat4 {
        self.state().transform
    }

    pub fn set_transform(&self, transform: Mat4) {
        self.inner.state.borrow_mut().transform = transform;
    }

    /// Transform from this node's space into the scene's top-level space.
    ///
    /// Not cached: every call walks the parent chain up to the root.
    pub fn world_transform(&self) -> Mat4 {
        match self.parent() {
            Some(parent) => parent.world_transform() * self.transform(),
            None => self.transform(),
        }
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.state().bounding_sphere
    }

    pub fn set_bounding_sphere(&self, sphere: BoundingSphere) {
        self.inner.state.borrow_mut().bounding_sphere = sphere;
    }

    pub fn camera(&self) -> Option<Camera> {
        self.state().camera
    }

    pub fn set_camera(&self, camera: Option<Camera>) {
        self.inner.state.borrow_mut().camera = camera;
    }

    pub fn mesh(&self) -> Option<MeshId> {
        self.state().mesh
    }

    pub fn set_mesh(&self, mesh: Option<MeshId>) {
        self.inner.state.borrow_mut().mesh = mesh;
    }

    pub fn material(&self) -> Material {
        self.state().material
    }

    pub fn set_material(&self, material: Material) {
        self.inner.state.borrow_mut().material = material;
    }

    pub fn set_color(&self, color: Color) {
        self.inner.state.borrow_mut().material.color = color;
    }

    pub fn is_highlighted(&self) -> bool {
        self.state().material.highlighted
    }

    pub fn set_highlighted(&self, highlighted: bool) {
        self.inner.state.borrow_mut().material.highlighted = highlighted;
    }

    /// Flip the highlight flag and return the new value.
    pub fn toggle_highlighted(&self) -> bool {
        let mut state = self.inner.state.borrow_mut();
        state.material.highlighted = !state.material.highlighted;
        state.material.highlighted
    }

    /// Attach `child` as the last child of this node.
    ///
    /// A child that already has a parent is detached from it first, so a node is
    /// never listed by two parents. Attaching an ancestor of `self` would create
    /// a cycle; that is a caller error and is only caught in debug builds.
    pub fn add_child_node(&self, child: &Node) {
        debug_assert!(
            !child.is_ancestor_of(self),
            "adding {child:?} under {self:?} would create a cycle"
        );

        child.remove_from_parent();
        child.inner.state.borrow_mut().parent = Rc::downgrade(&self.inner);
        self.inner.state.borrow_mut().children.push(child.clone());
    }

    /// Detach this node from its parent. Does nothing for an unparented node.
    pub fn remove_from_parent(&self) {
        let Some(parent) = self.parent() else {
            return;
        };

        parent
            .inner
            .state
            .borrow_mut()
            .children
            .retain(|child| child != self);
        self.inner.state.borrow_mut().parent = Weak::new();
    }

    /// Find the closest intersection of `ray` with this subtree.
    ///
    /// `ray` is in world space. Each node tests its own bounding sphere in model
    /// space, then every child is tested with the same world ray. When a node and
    /// one of its descendants are hit at exactly the same parameter the node
    /// itself wins; among equally close children the earlier one wins. A node
    /// whose world transform is singular is never hit, though its children
    /// are still tested.
    pub fn hit_test(&self, ray: &Ray) -> Option<HitResult> {
        let model_to_world = self.world_transform();

        // A collapsed transform (e.g. scaled to zero) has no model space to test in.
        let nearest = (model_to_world.determinant() != 0.0)
            .then(|| model_to_world.inverse() * *ray)
            .and_then(|local_ray| self.bounding_sphere().intersect(&local_ray))
            .map(|model_point| {
                let world_point = model_to_world.transform_point3(model_point);
                HitResult {
                    node: self.clone(),
                    ray: *ray,
                    parameter: ray.parameter_of(world_point),
                }
            });

        let mut nearest_child: Option<HitResult> = None;
        for child in self.children() {
            if let Some(child_hit) = child.hit_test(ray) {
                match &nearest_child {
                    Some(current) if !child_hit.is_closer_than(current) => {}
                    _ => nearest_child = Some(child_hit),
                }
            }
        }

        match (nearest, nearest_child) {
            (Some(own), Some(child)) if child.is_closer_than(&own) => Some(child),
            (Some(own), _) => Some(own),
            (None, child) => child,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.inner.identifier == other.inner.identifier
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.identifier.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.state.try_borrow() {
            Ok(state) => write!(f, "<Node>: {}", state.name.as_deref().unwrap_or("unnamed")),
            Err(_) => write!(f, "<Node>: {}", self.inner.identifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::{Quat, Vec3};

    fn sphere_at(name: &str, position: Vec3, radius: f32) -> Node {
        let node = Node::named(name);
        node.set_transform(Mat4::from_translation(position));
        node.set_bounding_sphere(BoundingSphere::new(Vec3::ZERO, radius));
        node
    }

    #[test]
    fn root_world_transform_is_local() {
        let node = Node::new();
        let transform = Mat4::from_rotation_y(0.7) * Mat4::from_translation(Vec3::X);
        node.set_transform(transform);
        assert!(node.world_transform().abs_diff_eq(transform, 1e-6));
    }

    #[test]
    fn world_transform_composes_with_parent() {
        let grandparent = Node::new();
        let parent = Node::new();
        let child = Node::new();
        grandparent.set_transform(Mat4::from_scale(Vec3::splat(2.0)));
        parent.set_transform(Mat4::from_quat(Quat::from_rotation_z(0.5)));
        child.set_transform(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        grandparent.add_child_node(&parent);
        parent.add_child_node(&child);

        let expected = parent.world_transform() * child.transform();
        assert!(child.world_transform().abs_diff_eq(expected, 1e-6));
        let expected = grandparent.transform() * parent.transform();
        assert!(parent.world_transform().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn world_transform_is_not_cached() {
        let parent = Node::new();
        let child = Node::new();
        parent.add_child_node(&child);
        assert!(child.world_transform().abs_diff_eq(Mat4::IDENTITY, 1e-6));

        parent.set_transform(Mat4::from_translation(Vec3::Y));
        let origin = child.world_transform().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn add_child_sets_parent() {
        let parent = Node::new();
        let child = Node::new();
        parent.add_child_node(&child);

        assert_eq!(child.parent(), Some(parent.clone()));
        assert_eq!(parent.children(), vec![child]);
    }

    #[test]
    fn reparenting_moves_child() {
        let a = Node::named("a");
        let b = Node::named("b");
        let child = Node::named("child");
        a.add_child_node(&child);
        b.add_child_node(&child);

        assert!(!a.children().contains(&child));
        assert_eq!(b.children().iter().filter(|n| **n == child).count(), 1);
        assert_eq!(child.parent(), Some(b));
    }

    #[test]
    fn readding_to_same_parent_moves_to_end() {
        let parent = Node::new();
        let first = Node::new();
        let second = Node::new();
        parent.add_child_node(&first);
        parent.add_child_node(&second);
        parent.add_child_node(&first);

        assert_eq!(parent.children(), vec![second, first]);
    }

    #[test]
    fn removing_from_parent_detaches() {
        let parent = Node::new();
        let child = Node::new();
        let sibling = Node::new();
        parent.add_child_node(&child);
        parent.add_child_node(&sibling);

        child.remove_from_parent();
        assert_eq!(parent.children(), vec![sibling]);
        assert!(child.parent().is_none());
    }

    #[test]
    fn remove_unparented_is_noop() {
        let node = Node::named("lonely");
        node.remove_from_parent();
        assert!(node.parent().is_none());
        assert_eq!(node.name().as_deref(), Some("lonely"));
    }

    #[test]
    fn equality_is_identity() {
        let a = Node::new();
        let b = Node::new();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(a.identifier(), b.identifier());
    }

    #[test]
    fn parent_link_does_not_own() {
        let child = Node::new();
        {
            let parent = Node::new();
            parent.add_child_node(&child);
            assert!(child.parent().is_some());
        }
        assert!(child.parent().is_none());
    }

    #[test]
    fn find_by_name_and_counts() {
        let root = Node::named("root");
        let a = Node::named("a");
        let b = Node::named("b");
        let c = Node::named("c");
        root.add_child_node(&a);
        root.add_child_node(&b);
        a.add_child_node(&c);

        assert_eq!(root.descendant_count(), 3);
        assert_eq!(root.child_count(), 2);
        assert_eq!(root.find_by_name("c"), Some(c));
        assert!(root.find_by_name("missing").is_none());
    }

    #[test]
    fn toggling_highlight_flips_flag() {
        let node = Node::new();
        assert!(!node.is_highlighted());
        assert!(node.toggle_highlighted());
        assert!(node.is_highlighted());
        assert!(!node.toggle_highlighted());
    }

    #[test]
    fn hit_test_respects_parent_transform() {
        let parent = Node::new();
        parent.set_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)));
        let child = sphere_at("child", Vec3::new(0.0, 0.0, 5.0), 1.0);
        parent.add_child_node(&child);

        let hit = parent.hit_test(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert_eq!(hit.node, child);
        assert_abs_diff_eq!(hit.parameter, 9.0, epsilon = 1e-4);
        assert!(hit.intersection_point().abs_diff_eq(Vec3::new(0.0, 0.0, 9.0), 1e-4));
    }

    #[test]
    fn hit_test_through_scaled_node() {
        let node = Node::new();
        node.set_transform(
            Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)) * Mat4::from_scale(Vec3::splat(2.0)),
        );
        node.set_bounding_sphere(BoundingSphere::new(Vec3::ZERO, 1.0));

        let hit = node.hit_test(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert_abs_diff_eq!(hit.parameter, 8.0, epsilon = 1e-4);
    }

    #[test]
    fn self_wins_tie_with_child() {
        let parent = sphere_at("parent", Vec3::new(0.0, 0.0, 5.0), 1.0);
        // Same world placement as the parent.
        let child = sphere_at("child", Vec3::ZERO, 1.0);
        parent.add_child_node(&child);

        let hit = parent.hit_test(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert_eq!(hit.node, parent);
    }

    #[test]
    fn earlier_sibling_wins_tie() {
        let root = Node::new();
        let first = sphere_at("first", Vec3::new(0.0, 0.0, 5.0), 1.0);
        let second = sphere_at("second", Vec3::new(0.0, 0.0, 5.0), 1.0);
        root.add_child_node(&first);
        root.add_child_node(&second);

        let hit = root.hit_test(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert_eq!(hit.node, first);
    }

    #[test]
    fn closer_child_beats_parent() {
        let parent = sphere_at("parent", Vec3::new(0.0, 0.0, 10.0), 1.0);
        let child = sphere_at("child", Vec3::new(0.0, 0.0, -5.0), 1.0);
        parent.add_child_node(&child);

        let hit = parent.hit_test(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert_eq!(hit.node, child);
        assert_abs_diff_eq!(hit.parameter, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn collapsed_node_is_never_hit() {
        let root = Node::new();
        let hidden = sphere_at("hidden", Vec3::ZERO, 1.0);
        hidden.set_transform(Mat4::from_scale(Vec3::ZERO));
        let real = sphere_at("real", Vec3::new(0.0, 0.0, 5.0), 1.0);
        root.add_child_node(&hidden);
        root.add_child_node(&real);

        let hit = root.hit_test(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert_eq!(hit.node, real);
        assert_abs_diff_eq!(hit.parameter, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn children_of_collapsed_parent_miss() {
        let parent = sphere_at("parent", Vec3::new(0.0, 0.0, 5.0), 1.0);
        parent.set_transform(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)));
        let child = sphere_at("child", Vec3::ZERO, 1.0);
        parent.add_child_node(&child);

        assert!(parent.hit_test(&Ray::new(Vec3::ZERO, Vec3::Z)).is_none());
    }

    #[test]
    fn debug_uses_name() {
        assert_eq!(format!("{:?}", Node::named("(1, 2)")), "<Node>: (1, 2)");
        assert_eq!(format!("{:?}", Node::new()), "<Node>: unnamed");
    }
}
