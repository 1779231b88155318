//! Falling snow
//!
//! Two layers share the recycling updater: sphere flakes stored as one
//! struct per particle, and drift points stored as a flat coordinate buffer
//! that is uploaded to the GPU as-is.

use imgui::Ui;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{
    particles::{FallParams, InterleavedPositions, ParticlePool, Snowflakes},
    traits::Simulation,
};
use crate::{
    config::{LayerStyle, SnowConfig},
    error::Result,
    gfx::scene::Scene,
};

/// Random stream reserved for snow, so world layout and snow stay independent
const SNOW_STREAM: u64 = 1;

/// Both particle pools with their looks
#[derive(Debug, Clone)]
pub struct SnowField {
    pub flakes: ParticlePool<Snowflakes>,
    pub drift: ParticlePool<InterleavedPositions>,
    pub flake_style: LayerStyle,
    pub drift_style: LayerStyle,
}

impl SnowField {
    /// Advances both pools one tick
    ///
    /// # Returns
    /// Recycled particle counts for flakes and drift
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (usize, usize) {
        (self.flakes.tick(rng), self.drift.tick(rng))
    }

    pub fn is_dirty(&self) -> bool {
        self.flakes.is_dirty() || self.drift.is_dirty()
    }
}

/// Counters shown in the snow panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnowStats {
    pub ticks: u64,
    pub flakes_recycled: u64,
    pub drift_recycled: u64,
    pub last_flakes_recycled: usize,
    pub last_drift_recycled: usize,
}

/// Drives the snow field installed in the scene
pub struct SnowSimulation {
    config: SnowConfig,
    flake_params: FallParams,
    drift_params: FallParams,
    seed: u64,
    rng: ChaCha8Rng,
    running: bool,
    stats: SnowStats,
}

impl SnowSimulation {
    /// Validates both layers and seeds the snow stream
    pub fn new(config: SnowConfig, seed: u64) -> Result<Self> {
        Ok(Self {
            flake_params: config.flakes.fall_params()?,
            drift_params: config.drift.fall_params()?,
            config,
            seed,
            rng: snow_rng(seed),
            running: true,
            stats: SnowStats::default(),
        })
    }

    pub fn stats(&self) -> SnowStats {
        self.stats
    }

    fn spawn_field(&mut self) -> SnowField {
        SnowField {
            flakes: ParticlePool::spawn(self.config.flakes.count, self.flake_params, &mut self.rng),
            drift: ParticlePool::spawn(self.config.drift.count, self.drift_params, &mut self.rng),
            flake_style: self.config.flakes.style,
            drift_style: self.config.drift.style,
        }
    }
}

fn snow_rng(seed: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(SNOW_STREAM);
    rng
}

impl Simulation for SnowSimulation {
    fn initialize(&mut self, scene: &mut Scene) {
        let field = self.spawn_field();
        log::info!(
            "Snow initialized with {} flakes and {} drift particles",
            field.flakes.len(),
            field.drift.len()
        );
        scene.snow = Some(field);
    }

    /// One recycling tick per call, independent of `delta_time`
    fn update(&mut self, _delta_time: f32, scene: &mut Scene) {
        if !self.running {
            return;
        }
        let Some(snow) = scene.snow.as_mut() else {
            return;
        };

        let (flakes, drift) = snow.tick(&mut self.rng);
        self.stats.ticks += 1;
        self.stats.flakes_recycled += flakes as u64;
        self.stats.drift_recycled += drift as u64;
        self.stats.last_flakes_recycled = flakes;
        self.stats.last_drift_recycled = drift;
    }

    fn render_ui(&mut self, ui: &Ui) {
        let stats = self.stats;
        ui.window("Snow")
            .size([260.0, 150.0], imgui::Condition::FirstUseEver)
            .position([20.0, 300.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!(
                    "Flakes: {}  Drift: {}",
                    self.config.flakes.count, self.config.drift.count
                ));
                ui.text(format!("Ticks: {}", stats.ticks));
                ui.separator();
                ui.text(format!(
                    "Flakes recycled: {} ({} last tick)",
                    stats.flakes_recycled, stats.last_flakes_recycled
                ));
                ui.text(format!(
                    "Drift recycled: {} ({} last tick)",
                    stats.drift_recycled, stats.last_drift_recycled
                ));
            });
    }

    fn name(&self) -> &str {
        "Snow"
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Restarts the snow stream from its seed, reproducing the start-up field
    fn reset(&mut self, scene: &mut Scene) {
        self.rng = snow_rng(self.seed);
        self.stats = SnowStats::default();
        scene.snow = Some(self.spawn_field());
        log::debug!("Snow reset");
    }

    fn cleanup(&mut self, scene: &mut Scene) {
        scene.snow = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use cgmath::Vector3;

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(5.0, 0.2, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        Scene::new(CameraManager::new(camera, CameraController::new(0.005, 0.1)))
    }

    #[test]
    fn test_initialize_installs_both_layers() {
        let mut scene = test_scene();
        let mut snow = SnowSimulation::new(SnowConfig::default(), 3).unwrap();
        snow.initialize(&mut scene);

        let field = scene.snow.as_ref().unwrap();
        assert_eq!(field.flakes.len(), 300);
        assert_eq!(field.drift.len(), 500);
        assert!(field
            .flakes
            .particles()
            .iter()
            .all(|f| (5.0..=15.0).contains(&f.position[1])));
        assert!(field.drift.particles().iter().all(|p| (0.0..=5.0).contains(&p[1])));
    }

    #[test]
    fn test_update_ticks_both_pools() {
        let mut scene = test_scene();
        let mut snow = SnowSimulation::new(SnowConfig::default(), 3).unwrap();
        snow.initialize(&mut scene);
        for _ in 0..10 {
            snow.update(1.0 / 60.0, &mut scene);
        }

        let field = scene.snow.as_ref().unwrap();
        assert_eq!(field.flakes.ticks(), 10);
        assert_eq!(field.drift.ticks(), 10);
        assert!(field.is_dirty());
        assert_eq!(snow.stats().ticks, 10);
    }

    #[test]
    fn test_paused_snow_does_not_move() {
        let mut scene = test_scene();
        let mut snow = SnowSimulation::new(SnowConfig::default(), 3).unwrap();
        snow.initialize(&mut scene);
        let before = scene.snow.as_ref().unwrap().flakes.particles().to_vec();

        snow.set_running(false);
        snow.update(1.0 / 60.0, &mut scene);
        assert_eq!(scene.snow.as_ref().unwrap().flakes.particles(), &before[..]);
    }

    #[test]
    fn test_reset_reproduces_start_state() {
        let mut scene = test_scene();
        let mut snow = SnowSimulation::new(SnowConfig::default(), 11).unwrap();
        snow.initialize(&mut scene);
        let start = scene.snow.as_ref().unwrap().drift.storage().coords().to_vec();

        for _ in 0..500 {
            snow.update(1.0 / 60.0, &mut scene);
        }
        snow.reset(&mut scene);

        assert_eq!(scene.snow.as_ref().unwrap().drift.storage().coords(), &start[..]);
        assert_eq!(snow.stats(), SnowStats::default());
    }

    #[test]
    fn test_cleanup_removes_field() {
        let mut scene = test_scene();
        let mut snow = SnowSimulation::new(SnowConfig::default(), 3).unwrap();
        snow.initialize(&mut scene);
        snow.cleanup(&mut scene);
        assert!(scene.snow.is_none());
    }

    #[test]
    fn test_invalid_layer_is_rejected() {
        let mut config = SnowConfig::default();
        config.drift.fall_speed = -0.01;
        assert!(SnowSimulation::new(config, 0).is_err());
    }
}
