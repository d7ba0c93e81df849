//! # Scene
//!
//! A [`World`], an [`EventBus`] and a shared [`CommandBuffer`], committed
//! together at the end of every frame:
//!
//! ```text
//! ┌─ frame N ───────────────────────────────────────────────────┐
//! │ systems: queries, component edits, send events, record cmds │
//! ├─ end_frame ─────────────────────────────────────────────────┤
//! │ 1. replay deferred commands   (structural changes land)     │
//! │ 2. bus.update()               (callbacks, then swap)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::config::{FrameConfig, RuntimeConfig};
use std::time::{Duration, Instant};
use strata_ecs::{CommandBuffer, CommandStats, World};
use strata_events::EventBus;

/// Counters and timing of one committed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number, starting at zero.
    pub frame: u64,
    /// Outcome of the deferred command replay.
    pub commands: CommandStats,
    /// Wall time since the previous frame was committed, in microseconds.
    pub elapsed_us: u64,
    /// Whether the frame exceeded the configured budget.
    pub over_budget: bool,
}

/// World, events and deferred commands of one simulation.
pub struct Scene {
    world: World,
    bus: EventBus,
    commands: CommandBuffer,
    frame: FrameConfig,
    frame_count: u64,
    frame_started: Instant,
}

impl Scene {
    /// Builds an empty scene sized by `config`.
    #[must_use]
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            world: World::with_config(&config.world),
            bus: EventBus::with_config(&config.events),
            commands: CommandBuffer::new(),
            frame: config.frame.clone(),
            frame_count: 0,
            frame_started: Instant::now(),
        }
    }

    /// Returns the ECS world.
    #[inline]
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns the event bus.
    #[inline]
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Returns the command buffer replayed by [`end_frame`](Self::end_frame).
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    /// Returns the number of committed frames.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Commits the frame: replays deferred commands, then updates the bus.
    ///
    /// No query or component reference may be alive on the calling thread.
    pub fn end_frame(&mut self) -> FrameStats {
        let commands = self.world.execute_command_buffer(&self.commands);
        self.bus.update();

        let now = Instant::now();
        let elapsed = now.duration_since(self.frame_started);
        self.frame_started = now;

        let budget = self.frame.frame_budget();
        let over_budget = budget.is_some_and(|budget| elapsed > budget);
        if over_budget && self.frame.warn_on_slow_frame {
            tracing::warn!(
                frame = self.frame_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.map_or(0.0, |b| b.as_secs_f64() * 1000.0),
                "frame exceeded budget"
            );
        }

        let stats = FrameStats {
            frame: self.frame_count,
            commands,
            elapsed_us: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            over_budget,
        };
        tracing::trace!(
            frame = stats.frame,
            applied = commands.applied,
            skipped = commands.skipped,
            elapsed_us = stats.elapsed_us,
            "frame committed"
        );

        self.frame_count += 1;
        stats
    }

    /// Returns the budget of one frame, if any.
    #[must_use]
    pub fn frame_budget(&self) -> Option<Duration> {
        self.frame.frame_budget()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(&RuntimeConfig::default())
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("world", &self.world)
            .field("bus", &self.bus)
            .field("pending_commands", &self.commands.len())
            .field("frame_count", &self.frame_count)
            .finish()
    }
}
