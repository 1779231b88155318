//! Everything one frame mutates
//!
//! [`AppContext`] owns the scene and the simulations. Building it needs no
//! GPU, so the whole world plus snow can run headless.

use cgmath::{Deg, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    config::{AppConfig, CameraConfig},
    error::Result,
    gfx::{
        camera::{CameraController, CameraManager, OrbitCamera},
        scene::Scene,
    },
    simulation::{SimulationManager, SnowSimulation},
    world::{build_world, WorldLayout},
};

/// Scene plus the simulations that animate it
pub struct AppContext {
    pub scene: Scene,
    pub simulations: SimulationManager,
    pub layout: WorldLayout,
    seed: u64,
}

impl AppContext {
    /// Builds the world and attaches the snow simulation
    ///
    /// # Arguments
    /// * `config` - Validated before anything is built
    /// * `aspect` - Initial width / height of the viewport
    pub fn new(config: &AppConfig, aspect: f32) -> Result<Self> {
        config.validate()?;
        let seed = config.resolve_seed();

        let mut scene = Scene::new(camera_manager(&config.camera, aspect));
        let layout = build_world(
            &mut scene,
            &config.world,
            &mut ChaCha8Rng::seed_from_u64(seed),
        );

        let mut simulations = SimulationManager::new();
        simulations.set_fixed_timestep(config.fixed_timestep);
        simulations.attach_simulation(
            Box::new(SnowSimulation::new(config.snow, seed)?),
            &mut scene,
        );

        Ok(Self {
            scene,
            simulations,
            layout,
            seed,
        })
    }

    /// Seed every random stream was derived from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// One frame: simulation first, then camera damping and matrices
    ///
    /// # Returns
    /// Number of simulation steps taken
    pub fn advance(&mut self, delta_time: f32) -> u32 {
        let steps = self.simulations.update(delta_time, &mut self.scene);
        self.scene.update();
        steps
    }
}

fn camera_manager(config: &CameraConfig, aspect: f32) -> CameraManager {
    let mut camera = OrbitCamera::looking_at(
        Vector3::from(config.eye),
        Vector3::from(config.target),
        aspect,
    )
    .with_fov(Deg(config.fov_degrees))
    .with_clip_planes(config.znear, config.zfar);
    if let Some(factor) = config.damping {
        camera = camera.with_damping(factor);
    }
    camera.update_view_proj();

    CameraManager::new(
        camera,
        CameraController::new(config.rotate_speed, config.zoom_speed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use cgmath::InnerSpace;

    fn config() -> AppConfig {
        let mut config = AppConfig::default().with_seed(21);
        config.world.texture_size = 16;
        config
    }

    #[test]
    fn test_context_installs_world_and_snow() {
        let context = AppContext::new(&config(), 1.5).unwrap();
        let stats = context.scene.statistics();

        assert_eq!(stats.snowflakes, 300);
        assert_eq!(stats.drift_particles, 500);
        assert_eq!(context.simulations.current_simulation_name(), Some("Snow"));
        assert_eq!(context.seed(), 21);
        assert_eq!(context.scene.objects_in_group(context.layout.graves).count(), 50);
    }

    #[test]
    fn test_camera_starts_in_front_of_the_door() {
        let context = AppContext::new(&config(), 1.5).unwrap();
        let camera = &context.scene.camera_manager.camera;
        assert!((camera.eye - Vector3::new(0.0, 1.5, 8.0)).magnitude() < 1e-4);
        assert_eq!(camera.target, Vector3::new(0.0, 1.0, 2.0));
        assert_eq!(camera.aspect, 1.5);
    }

    #[test]
    fn test_advance_ticks_snow_once_per_frame() {
        let mut context = AppContext::new(&config(), 1.5).unwrap();
        for delta in [1.0 / 120.0, 1.0 / 30.0, 0.25, 1e-6] {
            assert_eq!(context.advance(delta), 1, "delta {delta}");
        }
        assert_eq!(context.scene.snow.as_ref().unwrap().flakes.ticks(), 4);
        assert_eq!(context.scene.snow.as_ref().unwrap().drift.ticks(), 4);
    }

    #[test]
    fn test_first_frame_moves_snow_at_high_refresh_rate() {
        let mut context = AppContext::new(&config(), 1.5).unwrap();
        let before = context.scene.snow.as_ref().unwrap().drift.storage().coords().to_vec();

        context.advance(1.0 / 120.0);

        let snow = context.scene.snow.as_ref().unwrap();
        assert!(snow.is_dirty());
        assert_ne!(snow.drift.storage().coords(), &before[..]);
    }

    #[test]
    fn test_fixed_timestep_is_opt_in() {
        let config = config().with_fixed_timestep(Some(1.0 / 60.0));
        let mut context = AppContext::new(&config, 1.5).unwrap();
        assert_eq!(context.advance(1.0 / 120.0), 0);
        assert_eq!(context.advance(2.0 / 60.0 + 1e-4), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = config();
        config.camera.znear = 0.0;
        assert!(matches!(AppContext::new(&config, 1.0), Err(Error::Config(_))));
    }
}
