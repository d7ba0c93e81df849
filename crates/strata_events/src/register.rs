//! # Event Register
//!
//! Type-erased map from [`TypeIndex`] to each event type's
//! [`EventBuffer`]. The map lock is only held for lookup and creation;
//! every buffer has its own lock.

use crate::buffer::{Event, EventBuffer, SharedEventBuffer};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use strata_shared::{type_index, TypeIndex};

trait ErasedEventBuffer: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn update(&self);
    fn len(&self) -> usize;
}

impl<T: Event> ErasedEventBuffer for SharedEventBuffer<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn update(&self) {
        self.write().update();
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

/// Owns one [`EventBuffer`] per event type.
pub struct EventRegister {
    buffers: RwLock<HashMap<TypeIndex, Arc<dyn ErasedEventBuffer>>>,
    /// Per-half capacity of newly created buffers.
    event_capacity: usize,
}

impl EventRegister {
    /// Creates an empty register whose buffers reserve `event_capacity`
    /// events per half.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        Self {
            buffers: RwLock::new(HashMap::new()),
            event_capacity,
        }
    }

    /// Returns the buffer for `T`, creating it on first use.
    #[must_use]
    pub fn buffer<T: Event>(&self) -> SharedEventBuffer<T> {
        let index = type_index::<T>();

        if let Some(buffer) = self.buffers.read().get(&index) {
            return Self::downcast::<T>(buffer.as_ref());
        }

        let mut buffers = self.buffers.write();
        let erased = buffers.entry(index).or_insert_with(|| {
            tracing::debug!(
                event = std::any::type_name::<T>(),
                type_index = %index,
                "creating event buffer"
            );
            let buffer: SharedEventBuffer<T> =
                Arc::new(RwLock::new(EventBuffer::with_capacity(self.event_capacity)));
            Arc::new(buffer)
        });
        Self::downcast::<T>(erased.as_ref())
    }

    /// Swaps every buffer.
    ///
    /// Handles are cloned out first so the map is free while buffers swap.
    pub fn update_all(&self) {
        let handles: Vec<Arc<dyn ErasedEventBuffer>> =
            self.buffers.read().values().cloned().collect();
        for buffer in &handles {
            buffer.update();
        }
    }

    /// Returns the number of event types seen so far.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.buffers.read().len()
    }

    /// Returns the number of retained events across every type.
    #[must_use]
    pub fn retained_events(&self) -> usize {
        self.buffers.read().values().map(|buffer| buffer.len()).sum()
    }

    fn downcast<T: Event>(erased: &dyn ErasedEventBuffer) -> SharedEventBuffer<T> {
        match erased.as_any().downcast_ref::<SharedEventBuffer<T>>() {
            Some(buffer) => Arc::clone(buffer),
            None => unreachable!(
                "event buffer registered under the index of {} has another type",
                std::any::type_name::<T>()
            ),
        }
    }
}

impl Default for EventRegister {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Ping;

    #[derive(Clone)]
    struct Pong(u8);

    #[test]
    fn test_update_all_swaps_every_type() {
        let register = EventRegister::new(4);
        register.buffer::<Ping>().write().append(Ping);
        register.buffer::<Pong>().write().append(Pong(1));
        assert_eq!(register.type_count(), 2);
        assert_eq!(register.retained_events(), 2);

        register.update_all();
        assert_eq!(register.buffer::<Ping>().read().update_count(), 1);
        assert_eq!(register.buffer::<Pong>().read().previous().len(), 1);

        register.update_all();
        assert_eq!(register.retained_events(), 0);
    }
}
