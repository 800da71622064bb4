//! Error types for scenepick.
//!
//! Only setup and the event loop can fail. Picking never errors (a miss is `None`) and per-frame
//! problems such as a lost surface skip the frame instead of surfacing here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("No suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("Failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),

    #[error("Pipeline creation failed: {0}")]
    PipelineCreation(String),

    #[error("Failed to create window: {0}")]
    CreateWindow(#[from] winit::error::OsError),

    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SceneError>;
