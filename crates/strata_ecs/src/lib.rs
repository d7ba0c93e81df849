//! # STRATA ECS
//!
//! Entity-Component-System core built around one sorted, independently
//! locked buffer per component type.
//!
//! - Entities are plain ids issued by a counter and recycled through a
//!   free list.
//! - Each component type lives in its own [`ComponentBuffer`], ordered by
//!   entity, so every buffer can be merged against every other in a single
//!   forward pass.
//! - Queries over any combination of types are cached per combination and
//!   only recomputed after a structural change to one of their buffers.
//! - Structural changes that must wait for a query to finish go through a
//!   [`CommandBuffer`].
//!
//! ## Example
//!
//! ```rust
//! use strata_ecs::{CommandBuffer, World};
//!
//! struct Health(u32);
//! struct Poisoned;
//!
//! let world = World::new();
//! let hero = world.new_entity();
//! world.attach_component(hero, Health(10)).unwrap();
//! world.attach_component(hero, Poisoned).unwrap();
//!
//! let commands = CommandBuffer::new();
//! for element in &world.get_query::<(Health, Poisoned)>() {
//!     let (health, _) = element.components();
//!     if health.0 <= 10 {
//!         commands.detach::<Poisoned>(element.entity());
//!     }
//! }
//! world.execute_command_buffer(&commands);
//! assert!(!world.has_component::<Poisoned>(hero));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod command;
pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod register;
pub mod world;

pub use buffer::{BufferReadGuard, BufferWriteGuard, ComponentBuffer, SharedBuffer};
pub use command::{Command, CommandBuffer, CommandStats, DeferredComponent, DeferredDetach};
pub use component::{Component, ComponentMut, ComponentRef};
pub use entity::{Entity, EntityRegistry};
pub use error::{EcsError, EcsResult};
pub use query::{
    pivot_merge, ComponentSet, Query, QueryElement, QueryIter, QueryRegister, QueryRows,
    QueryStorage,
};
pub use register::ComponentRegister;
pub use world::{World, WorldConfig};
