//! # STRATA Shared
//!
//! Types that both the ECS (`strata_ecs`) and the event bus
//! (`strata_events`) need to agree on.
//!
//! The only real resident is the process-wide type registry: every Rust
//! type used as a component or an event is given a dense [`TypeIndex`] the
//! first time it is requested. Registers in both crates key their
//! type-erased storage by that index.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod types;

pub use types::{registered_type_count, type_index, type_name_of, TypeIndex};
