//! # Frame Loop
//!
//! Drives a [`Scene`] frame by frame and accumulates timing:
//!
//! ```text
//! run_frames(n, tick):
//!   repeat n times
//!     tick(&scene)        systems run, mutations are deferred
//!     scene.end_frame()   commands replayed, events swapped
//!     stats.record(..)
//! ```

use crate::config::RuntimeConfig;
use crate::scene::{FrameStats, Scene};

/// Running totals over many frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameStatsAccumulator {
    /// Frames recorded.
    pub frames_recorded: u64,
    /// Sum of frame times.
    pub total_us_sum: u64,
    /// Shortest frame.
    pub min_frame_us: u64,
    /// Longest frame.
    pub max_frame_us: u64,
    /// Frames that exceeded the budget.
    pub frames_over_budget: u64,
    /// Deferred commands that changed the world.
    pub commands_applied: u64,
    /// Deferred commands that were no-ops.
    pub commands_skipped: u64,
}

impl FrameStatsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            commands_applied: 0,
            commands_skipped: 0,
        }
    }

    /// Records one frame.
    pub fn record(&mut self, stats: &FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.elapsed_us;
        self.min_frame_us = self.min_frame_us.min(stats.elapsed_us);
        self.max_frame_us = self.max_frame_us.max(stats.elapsed_us);
        self.commands_applied += stats.commands.applied as u64;
        self.commands_skipped += stats.commands.skipped as u64;
        if stats.over_budget {
            self.frames_over_budget += 1;
        }
    }

    /// Returns the average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns the average frame rate.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the share of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns a [`Scene`] and runs it.
#[derive(Debug)]
pub struct FrameLoop {
    scene: Scene,
    stats: FrameStatsAccumulator,
}

impl FrameLoop {
    /// Creates a loop over a fresh scene built from `config`.
    #[must_use]
    pub fn new(config: &RuntimeConfig) -> Self {
        Self::with_scene(Scene::new(config))
    }

    /// Creates a loop over an existing scene.
    #[must_use]
    pub fn with_scene(scene: Scene) -> Self {
        Self {
            scene,
            stats: FrameStatsAccumulator::new(),
        }
    }

    /// Runs one frame.
    pub fn run_frame<F>(&mut self, tick: F) -> FrameStats
    where
        F: FnOnce(&Scene),
    {
        tick(&self.scene);
        let stats = self.scene.end_frame();
        self.stats.record(&stats);
        stats
    }

    /// Runs `frames` frames, calling `tick` once per frame.
    ///
    /// # Returns
    ///
    /// The totals accumulated since the loop was created.
    pub fn run_frames<F>(&mut self, frames: u64, mut tick: F) -> &FrameStatsAccumulator
    where
        F: FnMut(&Scene),
    {
        for _ in 0..frames {
            self.run_frame(&mut tick);
        }
        tracing::debug!(
            frames,
            total_frames = self.stats.frames_recorded,
            avg_frame_ms = self.stats.avg_frame_ms(),
            "frame batch finished"
        );
        &self.stats
    }

    /// Returns the scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    /// Consumes the loop, returning its scene.
    #[must_use]
    pub fn into_scene(self) -> Scene {
        self.scene
    }
}
