//! # Event Reader
//!
//! A cursor over one event type's buffer. The reader remembers the update
//! count it last saw and how far it got into each half; on every call it
//! reconciles that against the buffer:
//!
//! ```text
//! buffer.update_count - last_update
//!   0   → keep both offsets
//!   1   → current offset becomes previous offset, current restarts at 0
//!   2+  → both offsets restart at 0 (anything older is gone)
//! ```
//!
//! Events are yielded previous half first, then current half, in send
//! order. The reader holds a weak reference: once the bus is dropped it
//! reports nothing.

use crate::buffer::{Event, EventBuffer, SharedEventBuffer};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// Cursor state, reconciled against a buffer's update count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Cursor {
    last_update: u64,
    previous_offset: usize,
    current_offset: usize,
}

impl Cursor {
    fn reconciled(self, update_count: u64) -> Self {
        match update_count.wrapping_sub(self.last_update) {
            0 => self,
            1 => Self {
                last_update: update_count,
                previous_offset: self.current_offset,
                current_offset: 0,
            },
            _ => Self {
                last_update: update_count,
                previous_offset: 0,
                current_offset: 0,
            },
        }
    }

    fn pending<T>(self, buffer: &EventBuffer<T>) -> usize {
        buffer.previous().len().saturating_sub(self.previous_offset)
            + buffer.current().len().saturating_sub(self.current_offset)
    }
}

/// Reads events of type `T` sent through an [`EventBus`](crate::EventBus).
pub struct EventReader<T: Event> {
    buffer: Weak<RwLock<EventBuffer<T>>>,
    cursor: Cursor,
}

impl<T: Event> EventReader<T> {
    /// Creates a reader positioned before every retained event.
    pub(crate) fn new(buffer: &SharedEventBuffer<T>) -> Self {
        let last_update = buffer.read().update_count();
        Self {
            buffer: Arc::downgrade(buffer),
            cursor: Cursor {
                last_update,
                ..Cursor::default()
            },
        }
    }

    /// Returns the next unread event, or `None` when caught up or when the
    /// bus no longer exists.
    pub fn next_event(&mut self) -> Option<T> {
        let buffer = self.upgrade()?;
        let buffer = buffer.read();
        self.cursor = self.cursor.reconciled(buffer.update_count());

        if let Some(event) = buffer.previous().get(self.cursor.previous_offset) {
            self.cursor.previous_offset += 1;
            return Some(event.clone());
        }
        if let Some(event) = buffer.current().get(self.cursor.current_offset) {
            self.cursor.current_offset += 1;
            return Some(event.clone());
        }
        None
    }

    /// Returns how many events [`next_event`](Self::next_event) would still
    /// yield, or `None` if the bus no longer exists.
    #[must_use]
    pub fn available_events(&self) -> Option<usize> {
        let buffer = self.upgrade()?;
        let buffer = buffer.read();
        Some(self.cursor.reconciled(buffer.update_count()).pending(&buffer))
    }

    /// Takes every unread event at once, in delivery order.
    pub fn read_all(&mut self) -> Vec<T> {
        let Some(buffer) = self.upgrade() else {
            return Vec::new();
        };
        let buffer = buffer.read();
        let cursor = self.cursor.reconciled(buffer.update_count());

        let previous = buffer.previous().get(cursor.previous_offset..).unwrap_or(&[]);
        let current = buffer.current().get(cursor.current_offset..).unwrap_or(&[]);
        let events: Vec<T> = previous.iter().chain(current).cloned().collect();

        self.cursor = Cursor {
            previous_offset: buffer.previous().len(),
            current_offset: buffer.current().len(),
            ..cursor
        };
        events
    }

    /// Iterates over unread events, advancing the reader as it goes.
    pub fn iter(&mut self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.next_event())
    }

    /// Checks whether the backing buffer still exists.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.buffer.strong_count() > 0
    }

    fn upgrade(&self) -> Option<SharedEventBuffer<T>> {
        let buffer = self.buffer.upgrade();
        if buffer.is_none() {
            tracing::error!(
                event = std::any::type_name::<T>(),
                "event reader used after its bus was dropped"
            );
        }
        buffer
    }
}

impl<T: Event> fmt::Debug for EventReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventReader")
            .field("event", &std::any::type_name::<T>())
            .field("cursor", &self.cursor)
            .field("connected", &self.is_connected())
            .finish()
    }
}
