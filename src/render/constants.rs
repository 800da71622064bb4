use glam::Mat4;

use crate::color::Color;

/// Per-instance data written once per visited node.
///
/// Matches the `InstanceConstants` struct in `shaders/scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceConstants {
    /// Model-view-projection matrix (object to clip space).
    pub model_view_projection: [[f32; 4]; 4],
    /// Model-view matrix, used to carry normals into eye space.
    pub normal_matrix: [[f32; 4]; 4],
    /// RGBA material color.
    pub color: [f32; 4],
}

impl InstanceConstants {
    pub const SIZE: usize = std::mem::size_of::<InstanceConstants>();

    pub fn new(world: Mat4, view: Mat4, projection: Mat4, color: Color) -> Self {
        let model_view = view * world;
        Self {
            model_view_projection: (projection * model_view).to_cols_array_2d(),
            normal_matrix: model_view.to_cols_array_2d(),
            color: color.to_array(),
        }
    }
}
