//! # STRATA
//!
//! Runtime facade over the two STRATA units:
//!
//! - [`strata_ecs`]: entities, per-type component buffers, cached queries
//!   and deferred commands
//! - [`strata_events`]: the double-buffered, frame-scoped event bus
//!
//! On top of them this crate adds TOML configuration, log setup and a
//! [`Scene`] that commits both units together once per frame.
//!
//! ## Example
//!
//! ```rust
//! use strata::prelude::*;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Expired(Entity);
//!
//! struct Lifetime(u32);
//!
//! let config = RuntimeConfig::default();
//! let mut frames = FrameLoop::new(&config);
//! let entity = frames.scene().world().new_entity();
//! frames.scene().world().attach_component(entity, Lifetime(0)).unwrap();
//!
//! frames.run_frame(|scene| {
//!     let writer = scene.events().get_event_writer();
//!     for element in &scene.world().get_query::<(Lifetime,)>() {
//!         if element.components().0 .0 == 0 {
//!             scene.commands().delete_entity(element.entity());
//!             writer.send(Expired(element.entity()));
//!         }
//!     }
//! });
//!
//! assert!(!frames.scene().world().is_alive(entity));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod frame;
pub mod logging;
pub mod scene;

pub use config::{ConfigError, FrameConfig, LogConfig, RuntimeConfig};
pub use frame::{FrameLoop, FrameStatsAccumulator};
pub use scene::{FrameStats, Scene};

pub use strata_ecs;
pub use strata_events;

/// Everything an application usually needs.
pub mod prelude {
    pub use crate::config::{ConfigError, RuntimeConfig};
    pub use crate::frame::FrameLoop;
    pub use crate::scene::{FrameStats, Scene};
    pub use strata_ecs::{CommandBuffer, Component, Entity, Query, World};
    pub use strata_events::{Event, EventBus, EventReader, EventWriter};
}
