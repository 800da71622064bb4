//! The scene graph.
//!
//! A [`Scene`] owns a root [`Node`]; nodes own their children and carry a local
//! transform, a bounding sphere for picking, an optional camera, an optional mesh
//! and a [`Material`].
//!
//! # Example
//!
//! ```
//! use scenepick::*;
//!
//! let scene = Scene::new();
//!
//! let ball = Node::named("ball");
//! ball.set_transform(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)));
//! ball.set_bounding_sphere(BoundingSphere::new(Vec3::ZERO, 1.0));
//! ball.set_color(Color::RED);
//! scene.root_node().add_child_node(&ball);
//!
//! let eye = Node::named("eye");
//! eye.set_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 15.0)));
//! eye.set_camera(Some(Camera::new()));
//! scene.root_node().add_child_node(&eye);
//!
//! assert_eq!(scene.node_count(), 3);
//! ```

mod material;
mod node;
pub mod scene;

pub use material::Material;
pub use node::Node;
pub use scene::Scene;
