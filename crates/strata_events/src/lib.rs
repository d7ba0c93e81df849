//! # STRATA Events
//!
//! Double-buffered, frame-scoped event bus.
//!
//! Every event type gets its own two-half buffer. Writers append to the
//! current half; [`EventBus::update`] runs the registered callbacks and
//! then swaps every buffer, dropping the events from two frames ago.
//! Readers are independent cursors: each one sees every event exactly once
//! as long as it reads at least once per frame.
//!
//! ## Example
//!
//! ```rust
//! use strata_events::EventBus;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Damage(u32);
//!
//! let bus = EventBus::new();
//! let mut reader = bus.get_event_reader::<Damage>();
//! let writer = bus.get_event_writer();
//!
//! writer.send(Damage(3));
//! bus.update();
//! assert_eq!(reader.next_event(), Some(Damage(3)));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod bus;
pub mod callback;
pub mod reader;
pub mod register;
pub mod writer;

pub use buffer::{Event, EventBuffer, SharedEventBuffer};
pub use bus::{EventBus, EventConfig};
pub use callback::{Callback, CallbackRegister};
pub use reader::EventReader;
pub use register::EventRegister;
pub use writer::EventWriter;
