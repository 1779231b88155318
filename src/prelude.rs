//! Commonly used types
//!
//! ```no_run
//! use haunted_winter::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = AppConfig::default().with_seed(7);
//!     HauntedApp::new(config)?.run()
//! }
//! ```

pub use crate::app::HauntedApp;
pub use crate::config::{AppConfig, CameraConfig, SnowConfig, SnowLayerConfig, WorldConfig};
pub use crate::context::AppContext;
pub use crate::error::{Error, Result};
pub use crate::frame::{FrameClock, FrameLoop, StopSignal};

pub use crate::gfx::scene::{GroupId, Scene, Transform};
pub use crate::gfx::resources::{Material, ProceduralTexture};

pub use crate::simulation::particles::{FallParams, ParticlePool, ParticleStorage};
pub use crate::simulation::{Simulation, SimulationManager, SnowSimulation};

pub use imgui::Ui;
