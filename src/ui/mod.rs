//! # User Interface Module
//!
//! Dear ImGui overlay: the [`UiManager`] integrates ImGui with winit and
//! wgpu, and [`panel`] holds the debug panel with the light controls.
//!
//! While ImGui has the mouse, camera input is ignored.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{debug_panel, FrameInfo};
