//! Configuration for the renderer and the viewer window.

use crate::color::Color;
use crate::error::{Result, SceneError};
use crate::render::InstanceConstants;

/// Sizing of the per-frame constant regions.
///
/// Each of the `frames_in_flight` regions holds `constant_buffer_length` bytes and
/// is carved into slots of `stride()` bytes, one per visited node. A frame can
/// therefore place at most `instance_capacity()` nodes.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub frames_in_flight: usize,
    pub constant_buffer_length: usize,
    pub constant_alignment: usize,
    pub clear_color: Color,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 3,
            constant_buffer_length: 65_536,
            // Also wgpu's default min_uniform_buffer_offset_alignment.
            constant_alignment: 256,
            clear_color: Color::rgb(0.05, 0.05, 0.08),
        }
    }
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_in_flight(mut self, count: usize) -> Self {
        self.frames_in_flight = count;
        self
    }

    pub fn constant_buffer_length(mut self, bytes: usize) -> Self {
        self.constant_buffer_length = bytes;
        self
    }

    pub fn constant_alignment(mut self, bytes: usize) -> Self {
        self.constant_alignment = bytes;
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Bytes between consecutive instance slots.
    pub fn stride(&self) -> usize {
        InstanceConstants::SIZE.next_multiple_of(self.constant_alignment.max(1))
    }

    /// Maximum number of nodes one frame can place.
    pub fn instance_capacity(&self) -> usize {
        self.constant_buffer_length / self.stride()
    }

    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(SceneError::InvalidConfig(
                "frames_in_flight must be at least 1".into(),
            ));
        }
        if !self.constant_alignment.is_power_of_two() {
            return Err(SceneError::InvalidConfig(format!(
                "constant_alignment {} is not a power of two",
                self.constant_alignment
            )));
        }
        if self.constant_buffer_length < self.stride() {
            return Err(SceneError::InvalidConfig(format!(
                "constant_buffer_length {} cannot hold one {}-byte instance slot",
                self.constant_buffer_length,
                self.stride()
            )));
        }
        Ok(())
    }
}

/// Window and demo-scene settings for the viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Spheres per side of the square grid.
    pub grid_side_count: u32,
    pub sphere_radius: f32,
    /// Gap between neighbouring spheres.
    pub sphere_padding: f32,
    /// Distance of the camera from the grid centre.
    pub camera_distance: f32,
    /// Camera orbit speed in radians per frame.
    pub camera_spin: f32,
    pub renderer: RendererConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "scenepick".to_string(),
            width: 1024,
            height: 768,
            grid_side_count: 5,
            sphere_radius: 1.0,
            sphere_padding: 1.0,
            camera_distance: 15.0,
            camera_spin: 0.01,
            renderer: RendererConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn grid_side_count(mut self, count: u32) -> Self {
        self.grid_side_count = count;
        self
    }

    pub fn camera_spin(mut self, radians_per_frame: f32) -> Self {
        self.camera_spin = radians_per_frame;
        self
    }

    pub fn renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }
}
