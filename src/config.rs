//! Application configuration
//!
//! Every value defaults to the look of the original scene; builders override
//! individual settings. The only external input is the `HAUNTED_WINTER_SEED`
//! environment variable, which pins the random stream for reproducible runs.

use crate::{
    error::{Error, Result},
    simulation::particles::FallParams,
};

/// Environment variable holding a decimal `u64` seed
pub const SEED_ENV_VAR: &str = "HAUNTED_WINTER_SEED";

/// Window settings
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Haunted Winter".to_string(),
            width: 1200,
            height: 800,
            vsync: true,
        }
    }
}

/// Initial camera pose, projection and orbit damping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Fraction of pending orbit motion applied per frame, `None` for direct control
    pub damping: Option<f32>,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 1.5, 8.0],
            target: [0.0, 1.0, 2.0],
            fov_degrees: 75.0,
            znear: 0.1,
            zfar: 100.0,
            damping: Some(0.05),
            rotate_speed: 0.005,
            zoom_speed: 0.1,
        }
    }
}

/// Look of one snow layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    pub color: [f32; 3],
    pub opacity: f32,
    /// Sphere radius for flakes, sprite width for drift points
    pub size: f32,
}

/// Motion and look of one snow layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowLayerConfig {
    pub count: usize,
    pub fall_speed: f32,
    pub lower_bound: f32,
    pub spawn_band: (f32, f32),
    /// Height band at start-up, `None` to start inside the spawn band
    pub initial_band: Option<(f32, f32)>,
    pub half_extent: f32,
    pub style: LayerStyle,
}

impl SnowLayerConfig {
    /// Validated fall parameters for this layer
    pub fn fall_params(&self) -> Result<FallParams> {
        let params = FallParams::new(
            self.fall_speed,
            self.lower_bound,
            self.spawn_band.0,
            self.spawn_band.1,
            self.half_extent,
        )?;
        match self.initial_band {
            Some((min, max)) => params.with_initial_band(min, max),
            None => Ok(params),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_fall_speed(mut self, fall_speed: f32) -> Self {
        self.fall_speed = fall_speed;
        self
    }
}

/// Both snow layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowConfig {
    /// Sphere flakes falling through the whole scene
    pub flakes: SnowLayerConfig,
    /// Point sprites drifting close to the ground
    pub drift: SnowLayerConfig,
}

impl Default for SnowConfig {
    fn default() -> Self {
        let color = crate::gfx::resources::material::hex_to_rgb(0xd0e0f0);
        Self {
            flakes: SnowLayerConfig {
                count: 300,
                fall_speed: 0.03,
                lower_bound: -1.0,
                spawn_band: (5.0, 15.0),
                initial_band: None,
                half_extent: 10.0,
                style: LayerStyle {
                    color,
                    opacity: 1.0,
                    size: 0.05,
                },
            },
            drift: SnowLayerConfig {
                count: 500,
                fall_speed: 0.01,
                lower_bound: 0.0,
                spawn_band: (5.0, 10.0),
                initial_band: Some((0.0, 5.0)),
                half_extent: 10.0,
                style: LayerStyle {
                    color,
                    opacity: 0.8,
                    size: 0.2,
                },
            },
        }
    }
}

/// Procedural world settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    pub grave_count: usize,
    /// Graves are scattered between this radius and `grave_min_radius + grave_radius_spread`
    pub grave_min_radius: f32,
    pub grave_radius_spread: f32,
    pub floor_size: f32,
    /// Edge length of the procedural colour maps
    pub texture_size: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grave_count: 50,
            grave_min_radius: 3.0,
            grave_radius_spread: 6.0,
            floor_size: 20.0,
            texture_size: 256,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub snow: SnowConfig,
    pub world: WorldConfig,
    /// Seed of every random stream, `None` to draw one at start-up
    pub seed: Option<u64>,
    /// Simulation step in seconds, `None` to step once per frame
    pub fixed_timestep: Option<f32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            snow: SnowConfig::default(),
            world: WorldConfig::default(),
            seed: None,
            fixed_timestep: None,
        }
    }
}

impl AppConfig {
    /// Default configuration with the seed taken from `HAUNTED_WINTER_SEED`
    ///
    /// A malformed value is an error rather than silently random.
    pub fn from_env() -> Result<Self> {
        let seed = match std::env::var(SEED_ENV_VAR) {
            Ok(value) => Some(parse_seed(&value)?),
            Err(_) => None,
        };
        Ok(Self {
            seed,
            ..Self::default()
        })
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_snow(mut self, snow: SnowConfig) -> Self {
        self.snow = snow;
        self
    }

    pub fn with_world(mut self, world: WorldConfig) -> Self {
        self.world = world;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_fixed_timestep(mut self, timestep: Option<f32>) -> Self {
        self.fixed_timestep = timestep;
        self
    }

    /// Checks every value that would otherwise fail deep inside start-up
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(Error::Config(format!(
                "field of view must be inside (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.znear > 0.0 && camera.zfar > camera.znear) {
            return Err(Error::Config(format!(
                "clip planes must satisfy 0 < near < far, got {} and {}",
                camera.znear, camera.zfar
            )));
        }
        if let Some(factor) = camera.damping {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(Error::Config(format!(
                    "damping factor must be inside (0, 1], got {factor}"
                )));
            }
        }
        if let Some(step) = self.fixed_timestep {
            if !(step > 0.0 && step.is_finite()) {
                return Err(Error::Config(format!(
                    "fixed timestep must be positive, got {step}"
                )));
            }
        }
        if self.world.texture_size < 16 {
            return Err(Error::Config(format!(
                "texture size must be at least 16, got {}",
                self.world.texture_size
            )));
        }
        self.snow.flakes.fall_params()?;
        self.snow.drift.fall_params()?;
        Ok(())
    }

    /// The configured seed, or a fresh one from OS entropy
    ///
    /// A drawn seed is logged so the run can be repeated through
    /// `HAUNTED_WINTER_SEED`.
    pub fn resolve_seed(&self) -> u64 {
        match self.seed {
            Some(seed) => {
                log::info!("Using seed {seed}");
                seed
            }
            None => {
                let seed = rand::random::<u64>();
                log::info!("Using random seed {seed} (set {SEED_ENV_VAR} to repeat this run)");
                seed
            }
        }
    }
}

fn parse_seed(value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{SEED_ENV_VAR} must be a u64, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.snow.flakes.count, 300);
        assert_eq!(config.snow.drift.count, 500);
        assert_eq!(config.world.grave_count, 50);
    }

    #[test]
    fn test_drift_starts_below_its_spawn_band() {
        let params = SnowConfig::default().drift.fall_params().unwrap();
        assert_eq!(params.initial_band(), (0.0, 5.0));
        assert_eq!(params.spawn_band(), (5.0, 10.0));

        let flakes = SnowConfig::default().flakes.fall_params().unwrap();
        assert_eq!(flakes.initial_band(), flakes.spawn_band());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.window.width = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.camera.damping = Some(1.5);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default().with_fixed_timestep(Some(0.0));
        assert!(config.validate().is_err());
        config.fixed_timestep = None;
        assert!(config.validate().is_ok());

        let mut snow = SnowConfig::default();
        snow.flakes.spawn_band = (15.0, 5.0);
        let config = AppConfig::default().with_snow(snow);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidFallParams(_))
        ));
    }

    #[test]
    fn test_seed_parsing() {
        assert_eq!(parse_seed(" 42 ").unwrap(), 42);
        assert!(parse_seed("forty-two").is_err());
        assert_eq!(AppConfig::default().with_seed(9).resolve_seed(), 9);
    }
}
