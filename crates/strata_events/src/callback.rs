//! # Callback Register
//!
//! Per event type, a list of subscribers and a weak reference to that
//! type's buffer. Before each swap the bus runs every subscriber over every
//! event in the current half.

use crate::buffer::{Event, EventBuffer, SharedEventBuffer};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use strata_shared::{type_index, TypeIndex};

/// Boxed subscriber for events of type `T`.
pub type Callback<T> = Box<dyn FnMut(&T) + Send>;

trait ErasedCallbacks: Send {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn execute(&mut self) -> usize;
    fn len(&self) -> usize;
}

struct CallbackList<T: Event> {
    buffer: Weak<RwLock<EventBuffer<T>>>,
    callbacks: Vec<Callback<T>>,
}

impl<T: Event> ErasedCallbacks for CallbackList<T> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn execute(&mut self) -> usize {
        let Some(buffer) = self.buffer.upgrade() else {
            tracing::error!(
                event = std::any::type_name::<T>(),
                "callbacks registered for a dropped event buffer"
            );
            return 0;
        };

        // Snapshot so subscribers may send events without deadlocking.
        let events: Vec<T> = buffer.read().current().to_vec();
        for event in &events {
            for callback in &mut self.callbacks {
                callback(event);
            }
        }
        events.len() * self.callbacks.len()
    }

    fn len(&self) -> usize {
        self.callbacks.len()
    }
}

/// Subscribers of every event type, keyed by [`TypeIndex`].
#[derive(Default)]
pub struct CallbackRegister {
    lists: Mutex<HashMap<TypeIndex, Box<dyn ErasedCallbacks>>>,
}

impl CallbackRegister {
    /// Creates an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `callback` to the events held in `buffer`.
    pub fn add<T, F>(&self, buffer: &SharedEventBuffer<T>, callback: F)
    where
        T: Event,
        F: FnMut(&T) + Send + 'static,
    {
        let mut lists = self.lists.lock();
        let list = lists.entry(type_index::<T>()).or_insert_with(|| {
            Box::new(CallbackList::<T> {
                buffer: Arc::downgrade(buffer),
                callbacks: Vec::new(),
            })
        });
        match list.as_any_mut().downcast_mut::<CallbackList<T>>() {
            Some(list) => list.callbacks.push(Box::new(callback)),
            None => unreachable!(
                "callback list registered under the index of {} has another type",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Runs every subscriber over the current half of its buffer.
    ///
    /// Subscribers must not register further callbacks while running.
    ///
    /// # Returns
    ///
    /// The number of subscriber invocations.
    pub fn execute_callbacks(&self) -> usize {
        let mut lists = self.lists.lock();
        lists.values_mut().map(|list| list.execute()).sum()
    }

    /// Returns the number of registered subscribers across every type.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.lists.lock().values().map(|list| list.len()).sum()
    }
}
