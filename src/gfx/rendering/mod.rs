//! Core rendering functionality
//!
//! Render pipelines, frame passes and the snow instancing buffers.

pub mod pipeline_manager;
pub mod render_engine;
pub mod snow_renderer;

// Re-export main types
pub use pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::RenderEngine;
pub use snow_renderer::SnowRenderer;
