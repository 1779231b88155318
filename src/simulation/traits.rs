//! Simulation lifecycle
//!
//! Anything that animates the scene over time implements [`Simulation`] and
//! is driven by the [`SimulationManager`](super::manager::SimulationManager).

use crate::gfx::scene::Scene;
use imgui::Ui;

/// A time-stepped process attached to the scene
pub trait Simulation {
    /// Called once when the simulation is attached
    ///
    /// # Arguments
    /// * `scene` - Scene to install state into
    fn initialize(&mut self, scene: &mut Scene);

    /// Advances the simulation by one step
    ///
    /// # Arguments
    /// * `delta_time` - Step length in seconds
    /// * `scene` - Scene holding the simulated state
    fn update(&mut self, delta_time: f32, scene: &mut Scene);

    /// Draws the simulation's own controls and statistics
    fn render_ui(&mut self, ui: &Ui);

    fn name(&self) -> &str;

    fn is_running(&self) -> bool;

    fn set_running(&mut self, running: bool);

    /// Puts the simulation back into its start-up state
    fn reset(&mut self, scene: &mut Scene);

    /// Called when the simulation is detached or replaced
    fn cleanup(&mut self, _scene: &mut Scene) {}
}
