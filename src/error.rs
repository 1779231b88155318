//! Error types for the haunted winter scene
//!
//! Start-up of the window and GPU can fail; everything after start-up is
//! infallible by construction, so the variants here cover creation paths and
//! construction-time validation only.

use thiserror::Error;

/// Errors raised while configuring or starting the application
#[derive(Debug, Error)]
pub enum Error {
    /// Fall parameters that would let a particle leave the visible band
    #[error("invalid fall parameters: {0}")]
    InvalidFallParams(String),

    /// Configuration values outside their accepted range
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The winit event loop could not be created or run
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The OS refused to create a window
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// The window could not be used as a wgpu surface
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// No adapter compatible with the surface was found
    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to open a device
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// A pipeline referenced a shader that was never loaded
    #[error("shader '{0}' is not loaded")]
    MissingShader(String),

    /// Rendering was set up before the resources it depends on
    #[error("GPU resources not ready: {0}")]
    GpuNotReady(String),

    /// A pipeline name was requested that was never registered
    #[error("pipeline '{0}' is not registered")]
    MissingPipeline(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
