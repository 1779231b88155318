//! # Particle Recycling
//!
//! Fixed-size pools of falling points. Every tick each particle drops by the
//! fall speed; a particle that crosses the lower bound is moved back up to a
//! random height inside the spawn band and a random horizontal position.
//!
//! The same algorithm runs over two storage shapes:
//!
//! - [`Snowflakes`] - one [`Snowflake`] struct per particle
//! - [`InterleavedPositions`] - a flat `[x0, y0, z0, x1, y1, z1, ...]` buffer
//!
//! Both implement [`ParticleStorage`], so [`ParticlePool`] and [`advance`]
//! are written once.
//!
//! ```
//! use haunted_winter::simulation::particles::{FallParams, ParticlePool, Snowflakes};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let params = FallParams::new(0.03, -1.0, 5.0, 15.0, 10.0).unwrap();
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let mut pool = ParticlePool::<Snowflakes>::spawn(300, params, &mut rng);
//! pool.tick(&mut rng);
//! assert!(pool.is_dirty());
//! ```

use rand::Rng;

use crate::error::{Error, Result};

/// Per-pool motion constants
///
/// Immutable once built; [`FallParams::new`] rejects combinations that would
/// let a recycled particle land outside `[lower_bound, spawn_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallParams {
    fall_speed: f32,
    lower_bound: f32,
    spawn_min: f32,
    spawn_max: f32,
    half_extent: f32,
    initial_min: f32,
    initial_max: f32,
}

impl FallParams {
    /// Creates fall parameters
    ///
    /// # Arguments
    /// * `fall_speed` - Distance a particle drops per tick
    /// * `lower_bound` - Height below which a particle is recycled
    /// * `spawn_min` / `spawn_max` - Height band recycled particles are placed in
    /// * `half_extent` - Recycled x and z are drawn from `[-half_extent, half_extent]`
    ///
    /// The initial band used by [`ParticlePool::spawn`] defaults to the spawn band.
    pub fn new(
        fall_speed: f32,
        lower_bound: f32,
        spawn_min: f32,
        spawn_max: f32,
        half_extent: f32,
    ) -> Result<Self> {
        let values = [fall_speed, lower_bound, spawn_min, spawn_max, half_extent];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidFallParams(format!(
                "all values must be finite, got {values:?}"
            )));
        }
        if fall_speed < 0.0 {
            return Err(Error::InvalidFallParams(format!(
                "fall speed must not be negative, got {fall_speed}"
            )));
        }
        if spawn_min > spawn_max {
            return Err(Error::InvalidFallParams(format!(
                "spawn band is empty: [{spawn_min}, {spawn_max}]"
            )));
        }
        if spawn_min < lower_bound {
            return Err(Error::InvalidFallParams(format!(
                "spawn band [{spawn_min}, {spawn_max}] starts below the lower bound {lower_bound}"
            )));
        }
        if half_extent < 0.0 {
            return Err(Error::InvalidFallParams(format!(
                "horizontal half extent must not be negative, got {half_extent}"
            )));
        }
        // random_range panics on a span that overflows to infinity
        if !(2.0 * half_extent).is_finite() || !(spawn_max - spawn_min).is_finite() {
            return Err(Error::InvalidFallParams(format!(
                "ranges are too wide to sample: half extent {half_extent}, spawn band [{spawn_min}, {spawn_max}]"
            )));
        }

        Ok(Self {
            fall_speed,
            lower_bound,
            spawn_min,
            spawn_max,
            half_extent,
            initial_min: spawn_min,
            initial_max: spawn_max,
        })
    }

    /// Uses a different height band for the particles created at startup
    ///
    /// Lets a pool begin already spread over the visible area instead of
    /// starting as one sheet above it.
    pub fn with_initial_band(mut self, min: f32, max: f32) -> Result<Self> {
        if !(max - min).is_finite() || min > max {
            return Err(Error::InvalidFallParams(format!(
                "initial band is empty: [{min}, {max}]"
            )));
        }
        if min < self.lower_bound {
            return Err(Error::InvalidFallParams(format!(
                "initial band [{min}, {max}] starts below the lower bound {}",
                self.lower_bound
            )));
        }
        self.initial_min = min;
        self.initial_max = max;
        Ok(self)
    }

    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    pub fn lower_bound(&self) -> f32 {
        self.lower_bound
    }

    pub fn spawn_band(&self) -> (f32, f32) {
        (self.spawn_min, self.spawn_max)
    }

    pub fn initial_band(&self) -> (f32, f32) {
        (self.initial_min, self.initial_max)
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    fn random_horizontal<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.random_range(-self.half_extent..=self.half_extent)
    }

    fn random_spawn_height<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.random_range(self.spawn_min..=self.spawn_max)
    }

    fn random_initial_height<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.random_range(self.initial_min..=self.initial_max)
    }
}

/// A point that can fall and be respawned
pub trait FallingParticle {
    fn y(&self) -> f32;
    fn set_y(&mut self, y: f32);
    fn set_position(&mut self, position: [f32; 3]);
}

impl FallingParticle for [f32; 3] {
    fn y(&self) -> f32 {
        self[1]
    }

    fn set_y(&mut self, y: f32) {
        self[1] = y;
    }

    fn set_position(&mut self, position: [f32; 3]) {
        *self = position;
    }
}

/// A single snowflake drawn as its own small sphere
///
/// `#[repr(C)]` so a slice of snowflakes can be uploaded directly as an
/// instance buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Snowflake {
    pub position: [f32; 3],
}

impl FallingParticle for Snowflake {
    fn y(&self) -> f32 {
        self.position[1]
    }

    fn set_y(&mut self, y: f32) {
        self.position[1] = y;
    }

    fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }
}

/// Backing store of a particle pool
pub trait ParticleStorage {
    type Particle: FallingParticle;

    /// Builds storage holding exactly the given positions
    fn from_positions(positions: impl ExactSizeIterator<Item = [f32; 3]>) -> Self;

    fn particles(&self) -> &[Self::Particle];

    fn particles_mut(&mut self) -> &mut [Self::Particle];

    /// Raw bytes for GPU upload
    fn as_bytes(&self) -> &[u8];

    /// Allocated capacity in particles
    fn capacity(&self) -> usize;
}

/// Discrete-entity storage, one [`Snowflake`] per slot
#[derive(Debug, Clone, Default)]
pub struct Snowflakes {
    flakes: Vec<Snowflake>,
}

impl ParticleStorage for Snowflakes {
    type Particle = Snowflake;

    fn from_positions(positions: impl ExactSizeIterator<Item = [f32; 3]>) -> Self {
        let mut flakes = Vec::with_capacity(positions.len());
        flakes.extend(positions.map(|position| Snowflake { position }));
        Self { flakes }
    }

    fn particles(&self) -> &[Snowflake] {
        &self.flakes
    }

    fn particles_mut(&mut self) -> &mut [Snowflake] {
        &mut self.flakes
    }

    fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.flakes)
    }

    fn capacity(&self) -> usize {
        self.flakes.capacity()
    }
}

/// Flat coordinate buffer `[x0, y0, z0, x1, y1, z1, ...]`
///
/// The length is always a multiple of three.
#[derive(Debug, Clone, Default)]
pub struct InterleavedPositions {
    coords: Vec<f32>,
}

impl InterleavedPositions {
    /// The flat coordinate array
    pub fn coords(&self) -> &[f32] {
        &self.coords
    }
}

impl ParticleStorage for InterleavedPositions {
    type Particle = [f32; 3];

    fn from_positions(positions: impl ExactSizeIterator<Item = [f32; 3]>) -> Self {
        let mut coords = Vec::with_capacity(positions.len() * 3);
        for position in positions {
            coords.extend_from_slice(&position);
        }
        Self { coords }
    }

    fn particles(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.coords)
    }

    fn particles_mut(&mut self) -> &mut [[f32; 3]] {
        bytemuck::cast_slice_mut(&mut self.coords)
    }

    fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.coords)
    }

    fn capacity(&self) -> usize {
        self.coords.capacity() / 3
    }
}

/// Advances every particle by one tick
///
/// Each particle drops by `fall_speed`; any particle that ends below the
/// lower bound is respawned inside the spawn band. Runs in O(N) without
/// allocating. Returns the number of particles recycled by this pass.
pub fn advance<P, R>(particles: &mut [P], params: &FallParams, rng: &mut R) -> usize
where
    P: FallingParticle,
    R: Rng + ?Sized,
{
    let mut recycled = 0;

    for particle in particles.iter_mut() {
        let y = particle.y() - params.fall_speed;

        if y < params.lower_bound {
            let x = params.random_horizontal(rng);
            let y = params.random_spawn_height(rng);
            let z = params.random_horizontal(rng);
            particle.set_position([x, y, z]);
            recycled += 1;
        } else {
            particle.set_y(y);
        }
    }

    recycled
}

/// A fixed-size particle pool with its fall parameters
///
/// The pool is marked dirty by every tick. Whoever draws the pool uploads
/// [`ParticleStorage::as_bytes`] and then calls [`ParticlePool::mark_uploaded`].
#[derive(Debug, Clone)]
pub struct ParticlePool<S: ParticleStorage> {
    storage: S,
    params: FallParams,
    dirty: bool,
    ticks: u64,
    recycled_total: u64,
}

impl<S: ParticleStorage> ParticlePool<S> {
    /// Creates `count` particles spread over the initial band
    pub fn spawn<R: Rng + ?Sized>(count: usize, params: FallParams, rng: &mut R) -> Self {
        let positions = (0..count)
            .map(|_| {
                let x = params.random_horizontal(rng);
                let y = params.random_initial_height(rng);
                let z = params.random_horizontal(rng);
                [x, y, z]
            })
            .collect();
        Self::from_positions(positions, params)
    }

    /// Creates a pool from explicit starting positions
    pub fn from_positions(positions: Vec<[f32; 3]>, params: FallParams) -> Self {
        Self {
            storage: S::from_positions(positions.into_iter()),
            params,
            dirty: true,
            ticks: 0,
            recycled_total: 0,
        }
    }

    /// Advances the pool one tick and flags it for upload
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let recycled = advance(self.storage.particles_mut(), &self.params, rng);
        self.dirty = true;
        self.ticks += 1;
        self.recycled_total += recycled as u64;
        recycled
    }

    pub fn len(&self) -> usize {
        self.storage.particles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn params(&self) -> &FallParams {
        &self.params
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn particles(&self) -> &[S::Particle] {
        self.storage.particles()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag once the GPU copy is current
    pub fn mark_uploaded(&mut self) {
        self.dirty = false;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn recycled_total(&self) -> u64 {
        self.recycled_total
    }

    /// Allocated capacity of the backing store in particles
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0x5eed)
    }

    fn in_range(value: f32, min: f32, max: f32) -> bool {
        value >= min && value <= max
    }

    #[test]
    fn test_rejects_invalid_params() {
        assert!(FallParams::new(0.1, 0.0, 10.0, 5.0, 1.0).is_err());
        assert!(FallParams::new(0.1, 6.0, 5.0, 10.0, 1.0).is_err());
        assert!(FallParams::new(-0.1, 0.0, 5.0, 10.0, 1.0).is_err());
        assert!(FallParams::new(0.1, 0.0, 5.0, 10.0, -1.0).is_err());
        assert!(FallParams::new(f32::NAN, 0.0, 5.0, 10.0, 1.0).is_err());
        assert!(FallParams::new(0.1, 0.0, 5.0, 10.0, f32::MAX).is_err());
        assert!(FallParams::new(0.1, f32::MIN, f32::MIN, f32::MAX, 1.0).is_err());
        assert!(FallParams::new(0.1, 0.0, 5.0, 10.0, 1.0)
            .unwrap()
            .with_initial_band(0.0, f32::INFINITY)
            .is_err());
        assert!(FallParams::new(0.1, 0.0, 5.0, 10.0, 1.0)
            .unwrap()
            .with_initial_band(-1.0, 5.0)
            .is_err());
    }

    #[test]
    fn test_all_particles_recycle_when_crossing_bound() {
        let params = FallParams::new(1.0, 0.0, 5.0, 10.0, 10.0).unwrap();
        let mut pool =
            ParticlePool::<Snowflakes>::from_positions(vec![[0.0, 0.5, 0.0]; 5], params);
        let mut rng = rng();

        let recycled = pool.tick(&mut rng);

        assert_eq!(recycled, 5);
        for flake in pool.particles() {
            let [x, y, z] = flake.position;
            assert!(in_range(y, 5.0, 10.0), "y = {y}");
            assert!(in_range(x, -10.0, 10.0), "x = {x}");
            assert!(in_range(z, -10.0, 10.0), "z = {z}");
        }
    }

    #[test]
    fn test_single_particle_recycles_on_tenth_tick() {
        let params = FallParams::new(0.1, 0.0, 5.0, 10.0, 10.0).unwrap();
        let mut pool =
            ParticlePool::<InterleavedPositions>::from_positions(vec![[0.0, 1.0, 0.0]], params);
        let mut rng = rng();

        for _ in 0..9 {
            assert_eq!(pool.tick(&mut rng), 0);
        }
        assert!((pool.particles()[0][1] - 0.1).abs() < 1e-5);

        assert_eq!(pool.tick(&mut rng), 1);
        assert!(in_range(pool.particles()[0][1], 5.0, 10.0));
    }

    #[test]
    fn test_non_recycled_particles_fall_exactly_by_speed() {
        let params = FallParams::new(0.25, 0.0, 5.0, 10.0, 3.0).unwrap();
        let start = vec![[1.0, 4.0, -1.0], [2.0, 0.1, 2.0], [-3.0, 9.5, 0.5]];
        let mut pool = ParticlePool::<Snowflakes>::from_positions(start.clone(), params);
        let mut rng = rng();

        pool.tick(&mut rng);

        let flakes = pool.particles();
        assert_eq!(flakes[0].position, [1.0, 4.0 - 0.25, -1.0]);
        assert_eq!(flakes[2].position, [-3.0, 9.5 - 0.25, 0.5]);
        // The middle particle crossed the bound and was respawned
        let [x, y, z] = flakes[1].position;
        assert!(in_range(y, 5.0, 10.0));
        assert!(in_range(x, -3.0, 3.0));
        assert!(in_range(z, -3.0, 3.0));
    }

    #[test]
    fn test_both_storages_hold_the_band_over_many_ticks() {
        let params = FallParams::new(0.05, -1.0, 5.0, 15.0, 10.0).unwrap();
        let mut rng = rng();
        let mut flakes = ParticlePool::<Snowflakes>::spawn(300, params, &mut rng);
        let mut points = ParticlePool::<InterleavedPositions>::spawn(500, params, &mut rng);

        for _ in 0..1_000 {
            let before: Vec<[f32; 3]> = points.particles().to_vec();
            points.tick(&mut rng);
            flakes.tick(&mut rng);

            for (prev, now) in before.iter().zip(points.particles()) {
                let fell = (now[1] - (prev[1] - 0.05)).abs() < 1e-6 && now[0] == prev[0];
                let recycled = in_range(now[1], 5.0, 15.0) && prev[1] - 0.05 < -1.0;
                assert!(fell || recycled, "{prev:?} -> {now:?}");
            }
            assert!(flakes.particles().iter().all(|f| f.position[1] >= -1.0));
        }
    }

    #[test]
    fn test_pool_size_and_capacity_are_stable() {
        let params = FallParams::new(0.5, 0.0, 1.0, 2.0, 1.0).unwrap();
        let mut rng = rng();
        let mut flakes = ParticlePool::<Snowflakes>::spawn(64, params, &mut rng);
        let mut points = ParticlePool::<InterleavedPositions>::spawn(64, params, &mut rng);
        let flake_capacity = flakes.capacity();
        let point_capacity = points.capacity();

        for _ in 0..10_000 {
            flakes.tick(&mut rng);
            points.tick(&mut rng);
        }

        assert_eq!(flakes.len(), 64);
        assert_eq!(points.len(), 64);
        assert_eq!(points.storage().coords().len(), 64 * 3);
        assert_eq!(flakes.capacity(), flake_capacity);
        assert_eq!(points.capacity(), point_capacity);
        assert_eq!(flakes.ticks(), 10_000);
    }

    #[test]
    fn test_initial_band_is_used_for_spawn_only() {
        let params = FallParams::new(0.01, 0.0, 5.0, 10.0, 10.0)
            .unwrap()
            .with_initial_band(0.0, 5.0)
            .unwrap();
        let mut rng = rng();
        let pool = ParticlePool::<InterleavedPositions>::spawn(500, params, &mut rng);

        assert!(pool.particles().iter().all(|p| in_range(p[1], 0.0, 5.0)));
        assert_eq!(params.spawn_band(), (5.0, 10.0));
    }

    #[test]
    fn test_dirty_flag_follows_ticks_and_uploads() {
        let params = FallParams::new(0.1, 0.0, 1.0, 2.0, 1.0).unwrap();
        let mut rng = rng();
        let mut pool = ParticlePool::<Snowflakes>::spawn(4, params, &mut rng);
        assert!(pool.is_dirty());

        pool.mark_uploaded();
        assert!(!pool.is_dirty());

        pool.tick(&mut rng);
        assert!(pool.is_dirty());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let params = FallParams::new(0.3, 0.0, 5.0, 10.0, 10.0).unwrap();
        let run = || {
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            let mut pool = ParticlePool::<InterleavedPositions>::spawn(50, params, &mut rng);
            for _ in 0..100 {
                pool.tick(&mut rng);
            }
            pool.storage().coords().to_vec()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_byte_views_cover_every_coordinate() {
        let params = FallParams::new(0.1, 0.0, 1.0, 2.0, 1.0).unwrap();
        let mut rng = rng();
        let flakes = ParticlePool::<Snowflakes>::spawn(10, params, &mut rng);
        let points = ParticlePool::<InterleavedPositions>::spawn(10, params, &mut rng);

        assert_eq!(flakes.storage().as_bytes().len(), 10 * 12);
        assert_eq!(points.storage().as_bytes().len(), 10 * 12);
    }
}
