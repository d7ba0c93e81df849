//! # Event Buffer
//!
//! Two halves per event type. Which half is "current" depends on the parity
//! of the update counter:
//!
//! ```text
//!  update_count │ current │ previous
//! ──────────────┼─────────┼──────────
//!       0       │  even   │   odd
//!       1       │  odd    │   even
//!       2       │  even   │   odd      ← even was cleared by update #2
//! ```
//!
//! `update()` clears the previous half, then bumps the counter, so the half
//! that was current becomes previous and the cleared half becomes current.
//! An event therefore stays readable for the frame it was sent in and the
//! frame after.

use parking_lot::RwLock;
use std::sync::Arc;

/// Marker for types that can travel over the bus.
///
/// Readers clone events out of the buffer, hence the `Clone` bound.
pub trait Event: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Event for T {}

/// Shared handle to one event type's buffer.
pub type SharedEventBuffer<T> = Arc<RwLock<EventBuffer<T>>>;

/// Double-buffered storage for one event type.
#[derive(Debug)]
pub struct EventBuffer<T> {
    even: Vec<T>,
    odd: Vec<T>,
    update_count: u64,
}

impl<T> EventBuffer<T> {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty buffer with room for `capacity` events per half.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            even: Vec::with_capacity(capacity),
            odd: Vec::with_capacity(capacity),
            update_count: 0,
        }
    }

    /// Appends `event` to the current half.
    #[inline]
    pub fn append(&mut self, event: T) {
        self.current_mut().push(event);
    }

    /// Clears the previous half and swaps roles.
    pub fn update(&mut self) {
        self.previous_mut().clear();
        self.update_count += 1;
    }

    /// Returns how many times [`update`](Self::update) has run.
    #[inline]
    #[must_use]
    pub const fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Events sent since the last update, in send order.
    #[inline]
    #[must_use]
    pub fn current(&self) -> &[T] {
        if self.update_count % 2 == 1 {
            &self.odd
        } else {
            &self.even
        }
    }

    /// Events sent during the frame before the last update, in send order.
    #[inline]
    #[must_use]
    pub fn previous(&self) -> &[T] {
        if self.update_count % 2 == 1 {
            &self.even
        } else {
            &self.odd
        }
    }

    /// Returns the number of retained events across both halves.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.even.len() + self.odd.len()
    }

    /// Checks whether both halves are empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.even.is_empty() && self.odd.is_empty()
    }

    fn current_mut(&mut self) -> &mut Vec<T> {
        if self.update_count % 2 == 1 {
            &mut self.odd
        } else {
            &mut self.even
        }
    }

    fn previous_mut(&mut self) -> &mut Vec<T> {
        if self.update_count % 2 == 1 {
            &mut self.even
        } else {
            &mut self.odd
        }
    }
}

impl<T> Default for EventBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
