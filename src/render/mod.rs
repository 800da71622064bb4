//! Frame encoding.
//!
//! - [`Renderer`] walks a [`Scene`](crate::Scene) and packs one [`InstanceConstants`]
//!   per node into the current region of a [`ConstantRing`]
//! - [`FrameThrottle`] keeps the CPU from reusing a region the GPU is still reading
//! - [`ScenePass`] drives both against a wgpu device
//!
//! The traversal only talks to a [`RenderEncoder`], so it runs without a GPU.

mod constants;
mod renderer;
mod ring;
mod scene_pass;
mod throttle;

pub use constants::InstanceConstants;
pub use renderer::{FillMode, FrameStats, RenderEncoder, Renderer};
pub use ring::ConstantRing;
pub use scene_pass::ScenePass;
pub use throttle::{FrameThrottle, FrameToken};
