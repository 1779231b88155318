//! Simulation scheduling
//!
//! Owns the attached simulation and turns frame deltas into simulation
//! steps, optionally on a fixed timestep.

use super::traits::Simulation;
use crate::gfx::scene::Scene;
use imgui::Ui;

/// Upper bound on catch-up steps after a long frame
const MAX_STEPS_PER_FRAME: u32 = 8;

/// Runs one simulation against the scene
pub struct SimulationManager {
    simulation: Option<Box<dyn Simulation>>,
    is_paused: bool,
    time_scale: f32,
    accumulated_time: f32,
    fixed_timestep: Option<f32>,
}

impl Default for SimulationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationManager {
    pub fn new() -> Self {
        Self {
            simulation: None,
            is_paused: false,
            time_scale: 1.0,
            accumulated_time: 0.0,
            fixed_timestep: None,
        }
    }

    /// Attaches a simulation, cleaning up the previous one
    ///
    /// # Arguments
    /// * `simulation` - Boxed simulation implementing the Simulation trait
    /// * `scene` - Scene to initialize the simulation with
    pub fn attach_simulation(&mut self, mut simulation: Box<dyn Simulation>, scene: &mut Scene) {
        if let Some(mut old_sim) = self.simulation.take() {
            old_sim.cleanup(scene);
        }

        simulation.initialize(scene);
        log::info!("Attached simulation '{}'", simulation.name());
        self.simulation = Some(simulation);
        self.is_paused = false;
        self.accumulated_time = 0.0;
    }

    /// Removes the current simulation
    pub fn detach_simulation(&mut self, scene: &mut Scene) {
        if let Some(mut sim) = self.simulation.take() {
            sim.cleanup(scene);
            log::info!("Detached simulation '{}'", sim.name());
        }
    }

    /// Advances the simulation for a frame of `delta_time` seconds
    ///
    /// With a fixed timestep the scaled delta is accumulated and consumed in
    /// whole steps, so a slow frame runs several steps and a fast frame may
    /// run none.
    ///
    /// # Returns
    /// Number of simulation steps taken
    pub fn update(&mut self, delta_time: f32, scene: &mut Scene) -> u32 {
        if self.is_paused {
            return 0;
        }
        let Some(simulation) = &mut self.simulation else {
            return 0;
        };

        let scaled_delta = delta_time.max(0.0) * self.time_scale;
        let Some(fixed_dt) = self.fixed_timestep else {
            simulation.update(scaled_delta, scene);
            return 1;
        };

        self.accumulated_time += scaled_delta;
        let mut steps = 0;
        while self.accumulated_time >= fixed_dt && steps < MAX_STEPS_PER_FRAME {
            simulation.update(fixed_dt, scene);
            self.accumulated_time -= fixed_dt;
            steps += 1;
        }
        if steps == MAX_STEPS_PER_FRAME && self.accumulated_time >= fixed_dt {
            log::debug!("Simulation fell behind, dropping {:.3}s", self.accumulated_time);
            self.accumulated_time = 0.0;
        }
        steps
    }

    /// Control window plus the simulation's own panel
    pub fn render_ui(&mut self, ui: &Ui, scene: &mut Scene) {
        let display_size = ui.io().display_size;
        let panel_width = 280.0;
        let panel_x = display_size[0] - panel_width - 20.0;

        let Some(simulation) = &mut self.simulation else {
            ui.window("Simulation Control")
                .size([panel_width, 80.0], imgui::Condition::FirstUseEver)
                .position([panel_x, 20.0], imgui::Condition::FirstUseEver)
                .build(|| {
                    ui.text("No simulation attached");
                });
            return;
        };

        let mut reset_requested = false;
        ui.window("Simulation Control")
            .size([panel_width, 180.0], imgui::Condition::FirstUseEver)
            .position([panel_x, 20.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!("Simulation: {}", simulation.name()));
                ui.separator();

                if ui.button(if self.is_paused { "Play" } else { "Pause" }) {
                    self.is_paused = !self.is_paused;
                    simulation.set_running(!self.is_paused);
                }
                ui.same_line();
                if ui.button("Reset") {
                    reset_requested = true;
                }

                ui.separator();
                let mut use_fixed_timestep = self.fixed_timestep.is_some();
                if ui.checkbox("Fixed Timestep", &mut use_fixed_timestep) {
                    self.fixed_timestep = use_fixed_timestep.then_some(1.0 / 60.0);
                    self.accumulated_time = 0.0;
                }
                if let Some(fixed_dt) = self.fixed_timestep.as_mut() {
                    ui.slider("Fixed DT", 1.0 / 120.0, 1.0 / 30.0, fixed_dt);
                }
                // Once-per-frame stepping ignores the delta
                if self.fixed_timestep.is_some() {
                    ui.slider("Time Scale", 0.1, 3.0, &mut self.time_scale);
                } else {
                    ui.text_disabled("Time scale needs a fixed timestep");
                }
            });

        if reset_requested {
            simulation.reset(scene);
            self.accumulated_time = 0.0;
        }

        simulation.render_ui(ui);
    }

    pub fn current_simulation_name(&self) -> Option<&str> {
        self.simulation.as_ref().map(|s| s.name())
    }

    /// True if a simulation is attached and not paused
    pub fn is_running(&self) -> bool {
        !self.is_paused && self.simulation.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.is_paused = paused;
        if let Some(simulation) = &mut self.simulation {
            simulation.set_running(!paused);
        }
    }

    /// Sets the fixed timestep in seconds, or `None` for one step per frame
    pub fn set_fixed_timestep(&mut self, timestep: Option<f32>) {
        self.fixed_timestep = timestep.filter(|dt| *dt > 0.0);
        self.accumulated_time = 0.0;
    }

    pub fn fixed_timestep(&self) -> Option<f32> {
        self.fixed_timestep
    }

    /// Whether the time scale changes the step count
    ///
    /// Stepping once per frame always takes exactly one step, so scaling the
    /// frame delta only matters on a fixed timestep.
    pub fn time_scale_applies(&self) -> bool {
        self.fixed_timestep.is_some()
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Sets the time scale multiplier, clamped to be non-negative
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn has_simulation(&self) -> bool {
        self.simulation.is_some()
    }

    /// Restarts the attached simulation
    pub fn reset(&mut self, scene: &mut Scene) {
        if let Some(simulation) = &mut self.simulation {
            simulation.reset(scene);
        }
        self.accumulated_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use cgmath::Vector3;
    use std::{cell::Cell, rc::Rc};

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(5.0, 0.2, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        Scene::new(CameraManager::new(camera, CameraController::new(0.005, 0.1)))
    }

    struct Counter {
        steps: Rc<Cell<u32>>,
        cleaned: Rc<Cell<bool>>,
        running: bool,
    }

    impl Simulation for Counter {
        fn initialize(&mut self, _scene: &mut Scene) {}

        fn update(&mut self, _delta_time: f32, _scene: &mut Scene) {
            self.steps.set(self.steps.get() + 1);
        }

        fn render_ui(&mut self, _ui: &Ui) {}

        fn name(&self) -> &str {
            "Counter"
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn set_running(&mut self, running: bool) {
            self.running = running;
        }

        fn reset(&mut self, _scene: &mut Scene) {
            self.steps.set(0);
        }

        fn cleanup(&mut self, _scene: &mut Scene) {
            self.cleaned.set(true);
        }
    }

    fn attach_counter(
        manager: &mut SimulationManager,
        scene: &mut Scene,
    ) -> (Rc<Cell<u32>>, Rc<Cell<bool>>) {
        let steps = Rc::new(Cell::new(0));
        let cleaned = Rc::new(Cell::new(false));
        manager.attach_simulation(
            Box::new(Counter {
                steps: steps.clone(),
                cleaned: cleaned.clone(),
                running: true,
            }),
            scene,
        );
        (steps, cleaned)
    }

    #[test]
    fn test_variable_timestep_steps_once_per_frame() {
        let mut scene = test_scene();
        let mut manager = SimulationManager::new();
        let (steps, _) = attach_counter(&mut manager, &mut scene);

        assert_eq!(manager.update(0.5, &mut scene), 1);
        assert_eq!(manager.update(0.001, &mut scene), 1);
        assert_eq!(steps.get(), 2);
    }

    #[test]
    fn test_fixed_timestep_accumulates() {
        let mut scene = test_scene();
        let mut manager = SimulationManager::new();
        let (steps, _) = attach_counter(&mut manager, &mut scene);
        manager.set_fixed_timestep(Some(0.25));

        assert_eq!(manager.update(0.1, &mut scene), 0);
        assert_eq!(manager.update(0.2, &mut scene), 1);
        // A slow frame catches up with several steps
        assert_eq!(manager.update(0.5, &mut scene), 2);
        assert_eq!(steps.get(), 3);
    }

    #[test]
    fn test_catch_up_is_bounded() {
        let mut scene = test_scene();
        let mut manager = SimulationManager::new();
        let (steps, _) = attach_counter(&mut manager, &mut scene);
        manager.set_fixed_timestep(Some(0.01));

        assert_eq!(manager.update(10.0, &mut scene), MAX_STEPS_PER_FRAME);
        assert_eq!(manager.update(0.0, &mut scene), 0);
        assert_eq!(steps.get(), MAX_STEPS_PER_FRAME);
    }

    #[test]
    fn test_pause_and_time_scale() {
        let mut scene = test_scene();
        let mut manager = SimulationManager::new();
        let (steps, _) = attach_counter(&mut manager, &mut scene);
        manager.set_fixed_timestep(Some(0.1));

        manager.set_paused(true);
        assert_eq!(manager.update(1.0, &mut scene), 0);
        assert!(!manager.is_running());

        manager.set_paused(false);
        manager.set_time_scale(0.0);
        assert_eq!(manager.update(1.0, &mut scene), 0);

        manager.set_time_scale(-3.0);
        assert_eq!(manager.time_scale(), 0.0);
        assert_eq!(steps.get(), 0);
    }

    #[test]
    fn test_time_scale_only_applies_to_fixed_steps() {
        let mut scene = test_scene();
        let mut manager = SimulationManager::new();
        let (steps, _) = attach_counter(&mut manager, &mut scene);
        manager.set_time_scale(3.0);

        assert!(!manager.time_scale_applies());
        assert_eq!(manager.update(0.1, &mut scene), 1);

        manager.set_fixed_timestep(Some(0.1));
        assert!(manager.time_scale_applies());
        assert_eq!(manager.update(0.1 + 1e-4, &mut scene), 3);
        assert_eq!(steps.get(), 4);
    }

    #[test]
    fn test_replacing_cleans_up_previous() {
        let mut scene = test_scene();
        let mut manager = SimulationManager::new();
        let (_, first_cleaned) = attach_counter(&mut manager, &mut scene);
        let (_, second_cleaned) = attach_counter(&mut manager, &mut scene);
        assert!(first_cleaned.get());
        assert!(!second_cleaned.get());

        manager.detach_simulation(&mut scene);
        assert!(second_cleaned.get());
        assert!(!manager.has_simulation());
        assert_eq!(manager.update(1.0, &mut scene), 0);
    }
}
