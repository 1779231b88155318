//! Simulation system
//!
//! The recycling particle updater, the snow layers built on it and the
//! manager that schedules them against the frame clock.

pub mod manager;
pub mod particles;
pub mod snow;
pub mod traits;

pub use manager::SimulationManager;
pub use snow::{SnowField, SnowSimulation};
pub use traits::Simulation;
