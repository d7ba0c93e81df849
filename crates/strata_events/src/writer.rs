//! # Event Writer
//!
//! Untyped sending handle. One writer can send any event type; the buffer
//! for a type is created the first time it is sent.

use crate::buffer::Event;
use crate::register::EventRegister;
use std::sync::{Arc, Weak};

/// Sends events into an [`EventBus`](crate::EventBus).
///
/// Cheap to clone. Holds a weak reference, so a writer that outlives its
/// bus only logs and reports failure.
#[derive(Clone)]
pub struct EventWriter {
    register: Weak<EventRegister>,
}

impl EventWriter {
    pub(crate) fn new(register: &Arc<EventRegister>) -> Self {
        Self {
            register: Arc::downgrade(register),
        }
    }

    /// Appends `event` to the current half of `T`'s buffer.
    ///
    /// # Returns
    ///
    /// `false` if the bus no longer exists.
    pub fn send<T: Event>(&self, event: T) -> bool {
        let Some(register) = self.upgrade::<T>() else {
            return false;
        };
        register.buffer::<T>().write().append(event);
        true
    }

    /// Appends every event of `events` under one buffer lock.
    ///
    /// # Returns
    ///
    /// The number of events sent; zero if the bus no longer exists.
    pub fn send_batch<T, I>(&self, events: I) -> usize
    where
        T: Event,
        I: IntoIterator<Item = T>,
    {
        let Some(register) = self.upgrade::<T>() else {
            return 0;
        };
        let buffer = register.buffer::<T>();
        let mut buffer = buffer.write();
        let mut sent = 0;
        for event in events {
            buffer.append(event);
            sent += 1;
        }
        sent
    }

    /// Checks whether the bus still exists.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.register.strong_count() > 0
    }

    fn upgrade<T: Event>(&self) -> Option<Arc<EventRegister>> {
        let register = self.register.upgrade();
        if register.is_none() {
            tracing::error!(
                event = std::any::type_name::<T>(),
                "event writer used after its bus was dropped"
            );
        }
        register
    }
}

impl std::fmt::Debug for EventWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventWriter")
            .field("connected", &self.is_connected())
            .finish()
    }
}
