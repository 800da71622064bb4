//! # scenepick
//!
//! **A small scene graph with hierarchical ray picking and ring-buffered per-frame constants.**
//!
//! Build a tree of [`Node`]s, hang bounding spheres, meshes and a [`Camera`] on them,
//! then pick with a [`Ray`] or draw with a [`Renderer`](render::Renderer).
//!
//! ## Quick Start
//!
//! ```
//! use scenepick::*;
//!
//! let scene = Scene::new();
//!
//! let near = Node::named("near");
//! near.set_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
//! near.set_bounding_sphere(BoundingSphere::new(Vec3::ZERO, 1.0));
//! scene.root_node().add_child_node(&near);
//!
//! let far = Node::named("far");
//! far.set_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)));
//! far.set_bounding_sphere(BoundingSphere::new(Vec3::ZERO, 1.0));
//! scene.root_node().add_child_node(&far);
//!
//! let hit = scene.hit_test(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap();
//! assert_eq!(hit.node, near);
//! hit.node.toggle_highlighted();
//! ```
//!
//! ## Viewer
//!
//! [`run`] opens a window showing a grid of spheres under an orbiting camera.
//! Clicking a sphere toggles its wireframe highlight.
//!
//! ## Threading
//!
//! [`Node`] handles are `Rc`-based and stay on the thread that built them. Only
//! [`FrameToken`](render::FrameToken)s cross threads, released by the GPU's
//! completion callback.

mod app;
mod camera;
mod color;
pub mod config;
mod error;
mod gpu;
mod input;
mod mesh;
mod picking;
pub mod render;
pub mod scene;

pub use app::{run, run_with_config};
pub use camera::Camera;
pub use color::Color;
pub use config::{RendererConfig, ViewerConfig};
pub use error::{Result, SceneError};
pub use gpu::GpuContext;
pub use input::Input;
pub use mesh::{Mesh, MeshData, MeshId, MeshLibrary, Submesh, Vertex3d, VertexBufferBinding};
pub use picking::{BoundingSphere, HitResult, Ray};
pub use scene::{Material, Node, Scene};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
