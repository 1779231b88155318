//! Haunted Winter
//!
//! A haunted house on a snowy night, rendered with wgpu and winit. Two layers
//! of snow fall through the scene and are recycled above it when they reach
//! the ground.

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod frame;
pub mod gfx;
pub mod prelude;
pub mod simulation;
pub mod ui;
pub mod wgpu_utils;
pub mod world;

pub use app::HauntedApp;
pub use error::{Error, Result};

/// Creates the application with the default configuration
///
/// The seed is read from `HAUNTED_WINTER_SEED` when set.
pub fn default() -> Result<HauntedApp> {
    HauntedApp::new(config::AppConfig::from_env()?)
}
