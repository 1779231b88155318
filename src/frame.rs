//! Frame timing and the stoppable frame loop
//!
//! The windowed app and headless runs share [`FrameLoop`]: each step reads the
//! clock, advances the [`AppContext`] and counts the frame. Stopping is a
//! shared flag, so anything holding a [`StopSignal`] can end the loop.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use crate::context::AppContext;

/// Longest delta handed to the simulation, e.g. after the window was dragged
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Elapsed and per-frame time
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    elapsed: f32,
    delta: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            elapsed: 0.0,
            delta: 0.0,
        }
    }

    /// Reads the wall clock and returns the time since the previous tick
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = (now - self.last).as_secs_f32().min(MAX_FRAME_DELTA);
        self.last = now;
        self.delta = delta;
        self.elapsed = (now - self.start).as_secs_f32();
        delta
    }

    /// Advances by a fixed amount without reading the wall clock
    pub fn advance(&mut self, delta: f32) -> f32 {
        let delta = delta.max(0.0);
        self.delta = delta;
        self.elapsed += delta;
        delta
    }

    /// Seconds since the clock started
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds covered by the last tick
    pub fn delta(&self) -> f32 {
        self.delta
    }
}

/// Shared request to stop the frame loop
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What one frame step did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Number of frames stepped so far, including this one
    pub frame: u64,
    pub delta_time: f32,
    pub elapsed: f32,
    pub simulation_steps: u32,
}

/// Drives an [`AppContext`] one frame at a time until stopped
#[derive(Debug)]
pub struct FrameLoop {
    clock: FrameClock,
    stop: StopSignal,
    frame: u64,
    max_frames: Option<u64>,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            clock: FrameClock::new(),
            stop: StopSignal::new(),
            frame: 0,
            max_frames: None,
        }
    }

    /// Stops on its own after `max_frames` steps
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// A handle that stops this loop from anywhere
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn should_stop(&self) -> bool {
        self.stop.is_stop_requested() || self.max_frames.is_some_and(|max| self.frame >= max)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Advances the context by the wall-clock time since the last step
    ///
    /// # Returns
    /// `None` once a stop was requested or the frame limit is reached
    pub fn step(&mut self, context: &mut AppContext) -> Option<FrameStep> {
        if self.should_stop() {
            return None;
        }
        let delta = self.clock.tick();
        Some(self.advance(context, delta))
    }

    /// Steps with a fixed delta until stopped
    ///
    /// Without a frame limit this only returns once another holder of the
    /// [`StopSignal`] requests a stop.
    ///
    /// # Returns
    /// Number of frames run by this call
    pub fn run_headless(&mut self, context: &mut AppContext, delta_time: f32) -> u64 {
        let first = self.frame;
        while !self.should_stop() {
            let delta = self.clock.advance(delta_time);
            self.advance(context, delta);
        }
        log::debug!("Headless run stopped after {} frames", self.frame - first);
        self.frame - first
    }

    fn advance(&mut self, context: &mut AppContext, delta_time: f32) -> FrameStep {
        let simulation_steps = context.advance(delta_time);
        self.frame += 1;
        FrameStep {
            frame: self.frame,
            delta_time,
            elapsed: self.clock.elapsed(),
            simulation_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn headless_context() -> AppContext {
        let mut config = AppConfig::default().with_seed(7);
        config.world.texture_size = 16;
        AppContext::new(&config, 1.5).unwrap()
    }

    #[test]
    fn test_clock_advance_accumulates() {
        let mut clock = FrameClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.elapsed(), 0.75);
        assert_eq!(clock.delta(), 0.25);
        assert_eq!(clock.advance(-1.0), 0.0);
    }

    #[test]
    fn test_clock_tick_is_capped() {
        let mut clock = FrameClock::new();
        let delta = clock.tick();
        assert!((0.0..=MAX_FRAME_DELTA).contains(&delta));
    }

    #[test]
    fn test_headless_run_stops_at_limit() {
        let mut context = headless_context();
        let mut frames = FrameLoop::new().with_max_frames(30);

        assert_eq!(frames.run_headless(&mut context, 1.0 / 60.0), 30);
        assert_eq!(frames.frame(), 30);
        assert!(frames.step(&mut context).is_none());

        let snow = context.scene.snow.as_ref().unwrap();
        assert_eq!(snow.flakes.ticks(), 30);
        assert_eq!(snow.drift.ticks(), 30);
    }

    #[test]
    fn test_each_frame_steps_snow_once_at_any_rate() {
        let mut context = headless_context();
        let mut frames = FrameLoop::new();

        for delta in [1.0 / 144.0, 1.0 / 30.0, MAX_FRAME_DELTA] {
            let ticks_before = context.scene.snow.as_ref().unwrap().flakes.ticks();
            let step = frames.advance(&mut context, delta);
            assert_eq!(step.simulation_steps, 1);
            let ticks_after = context.scene.snow.as_ref().unwrap().flakes.ticks();
            assert_eq!(ticks_after, ticks_before + 1);
        }
    }

    #[test]
    fn test_stop_signal_ends_the_loop() {
        let mut context = headless_context();
        let mut frames = FrameLoop::new();
        let stop = frames.stop_signal();

        let step = frames.step(&mut context).unwrap();
        assert_eq!(step.frame, 1);

        stop.request_stop();
        assert!(frames.should_stop());
        assert!(frames.step(&mut context).is_none());
        assert_eq!(frames.run_headless(&mut context, 0.1), 0);
    }

    #[test]
    fn test_stop_signal_crosses_threads() {
        let stop = StopSignal::new();
        let remote = stop.clone();
        std::thread::spawn(move || remote.request_stop())
            .join()
            .unwrap();
        assert!(stop.is_stop_requested());
    }
}
