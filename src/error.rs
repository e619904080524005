//! Error types for backdrop.
//!
//! Failures in this crate are narrow: the graphics backend can be missing,
//! a window can fail to open, a surface can be lost mid-run, or a scene
//! file can be malformed. None of them are shown to a user; a failing
//! effect simply renders nothing.

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    #[error("Surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// Errors that prevent an effect from mounting.
///
/// A failed mount never registers listeners or schedules a frame.
#[derive(Debug, Error)]
pub enum MountError {
    /// Graphics backend setup failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// The display region (window) could not be created.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Errors raised while drawing a frame.
///
/// Transient surface conditions (outdated, timeout) are handled by the
/// canvas itself; anything that reaches the caller stops the effect.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The surface is gone and could not be reconfigured.
    #[error("Surface lost: {0}")]
    SurfaceLost(wgpu::SurfaceError),
    /// The GPU ran out of memory.
    #[error("GPU out of memory")]
    OutOfMemory,
}

/// Errors that can occur when loading a scene description.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Failed to read the scene file.
    #[error("Failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
    /// The scene file is not valid JSON for a scene.
    #[error("Invalid scene description: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when running the stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Failed to create or run the event loop.
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// No layer in the scene could be mounted.
    #[error("No layer could be mounted")]
    NothingMounted,
}

/// Error returned when a colour string is not `#rgb` or `#rrggbb` hex.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid hex colour {0:?}, expected #rgb or #rrggbb")]
pub struct ColorParseError(pub String);
