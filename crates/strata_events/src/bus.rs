//! # Event Bus
//!
//! Frame-scoped publish/subscribe.
//!
//! ```text
//!   EventWriter::send ──► EventBuffer<T>.current ──► EventReader<T>
//!                                 │
//!   update():  1. callbacks over every current half
//!              2. every buffer swaps (previous cleared)
//! ```
//!
//! An event is visible to readers during the frame it was sent in and the
//! frame after; callbacks see it exactly once, at the end of the frame it
//! was sent in.

use crate::buffer::Event;
use crate::callback::CallbackRegister;
use crate::reader::EventReader;
use crate::register::EventRegister;
use crate::writer::EventWriter;
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sizing hints for a new [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Events reserved per half of every new buffer.
    pub event_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { event_capacity: 64 }
    }
}

/// Owner of every event buffer and subscriber.
///
/// Readers and writers only hold weak references, so dropping the bus
/// disconnects all of them.
pub struct EventBus {
    register: Arc<EventRegister>,
    callbacks: CallbackRegister,
    update_count: AtomicU64,
}

impl EventBus {
    /// Creates an empty bus with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&EventConfig::default())
    }

    /// Creates an empty bus sized by `config`.
    #[must_use]
    pub fn with_config(config: &EventConfig) -> Self {
        Self {
            register: Arc::new(EventRegister::new(config.event_capacity)),
            callbacks: CallbackRegister::new(),
            update_count: AtomicU64::new(0),
        }
    }

    /// Returns a writer for any event type.
    #[must_use]
    pub fn get_event_writer(&self) -> EventWriter {
        EventWriter::new(&self.register)
    }

    /// Returns a reader for `T` positioned before every retained event.
    #[must_use]
    pub fn get_event_reader<T: Event>(&self) -> EventReader<T> {
        EventReader::new(&self.register.buffer::<T>())
    }

    /// Subscribes `callback` to every `T` sent, invoked once per event at
    /// the next [`update`](Self::update).
    pub fn add_callback<T, F>(&self, callback: F)
    where
        T: Event,
        F: FnMut(&T) + Send + 'static,
    {
        self.callbacks.add(&self.register.buffer::<T>(), callback);
    }

    /// Ends the event frame: runs every callback, then swaps every buffer.
    ///
    /// Each callback pass works on a snapshot of its type's current half.
    /// An event sent after that snapshot and before the swap, from another
    /// thread or from a callback itself, still reaches readers but is never
    /// passed to callbacks. Send from the frame-driving thread before
    /// calling `update` when callbacks must see every event.
    pub fn update(&self) {
        let invocations = self.callbacks.execute_callbacks();
        self.register.update_all();
        let frame = self.update_count.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(frame, invocations, "event bus updated");
    }

    /// Returns how many times [`update`](Self::update) has run.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::Acquire)
    }

    /// Returns the number of event types seen so far.
    #[must_use]
    pub fn event_type_count(&self) -> usize {
        self.register.type_count()
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.callback_count()
    }

    /// Returns the number of events still readable across every type.
    #[must_use]
    pub fn retained_events(&self) -> usize {
        self.register.retained_events()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("update_count", &self.update_count())
            .field("event_types", &self.event_type_count())
            .field("callbacks", &self.callback_count())
            .finish()
    }
}
