//! # Component Buffer
//!
//! Ordered, identity-keyed storage for a single component type.
//!
//! The buffer is a sorted pair of parallel arrays:
//!
//! ```text
//! entities: [ 2 ][ 5 ][ 9 ][ 14 ]     ascending, unique
//! values:   [ a ][ b ][ c ][ d  ]     values[i] belongs to entities[i]
//! ```
//!
//! Lookups are binary searches. Appending a freshly issued entity (the
//! common case, ids grow) is a push; inserting below the tail shifts.
//!
//! Every structural change (attach or detach) bumps [`ComponentBuffer::version`].
//! Queries cache slot indices into these arrays and treat a version change
//! as "every cached slot may have moved".

use crate::entity::Entity;
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};
use std::sync::Arc;

/// A component buffer behind its own read/write lock, shareable between a
/// register and the queries that read it.
pub type SharedBuffer<T> = Arc<RwLock<ComponentBuffer<T>>>;

/// Owned shared guard over a [`ComponentBuffer`].
pub type BufferReadGuard<T> = ArcRwLockReadGuard<RawRwLock, ComponentBuffer<T>>;

/// Owned exclusive guard over a [`ComponentBuffer`].
pub type BufferWriteGuard<T> = ArcRwLockWriteGuard<RawRwLock, ComponentBuffer<T>>;

/// Storage for every component of type `T` in one world.
pub struct ComponentBuffer<T> {
    /// Owning entities, strictly ascending.
    entities: Vec<Entity>,
    /// Component values, parallel to `entities`.
    values: Vec<T>,
    /// Structural mutation counter.
    version: u64,
}

impl<T> ComponentBuffer<T> {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty buffer with room for `capacity` components.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            version: 0,
        }
    }

    /// Returns the number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Checks whether the buffer holds no components.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the structural mutation counter.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the owning entities in ascending order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Checks whether `entity` has a component in this buffer.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.slot_of(entity).is_some()
    }

    /// Returns the slot holding `entity`'s component.
    #[inline]
    #[must_use]
    pub fn slot_of(&self, entity: Entity) -> Option<usize> {
        self.entities.binary_search(&entity).ok()
    }

    /// Inserts `value` under `entity`.
    ///
    /// Attach is not an upsert: if `entity` already has a component the
    /// stored value is kept and `value` is handed back.
    ///
    /// # Errors
    ///
    /// Returns `Err(value)` when a component is already present.
    pub fn attach(&mut self, entity: Entity, value: T) -> Result<(), T> {
        match self.entities.binary_search(&entity) {
            Ok(_) => Err(value),
            Err(slot) => {
                self.insert_at(slot, entity, value);
                Ok(())
            }
        }
    }

    /// Inserts the value built by `make` under `entity`.
    ///
    /// `make` only runs when the entity has no component yet. Returns
    /// whether the value was inserted.
    pub fn attach_with<F>(&mut self, entity: Entity, make: F) -> bool
    where
        F: FnOnce() -> T,
    {
        match self.entities.binary_search(&entity) {
            Ok(_) => false,
            Err(slot) => {
                self.insert_at(slot, entity, make());
                true
            }
        }
    }

    /// Removes and returns `entity`'s component, if present.
    pub fn detach(&mut self, entity: Entity) -> Option<T> {
        let slot = self.slot_of(entity)?;
        self.entities.remove(slot);
        self.version += 1;
        Some(self.values.remove(slot))
    }

    /// Gets `entity`'s component.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.slot_of(entity).map(|slot| &self.values[slot])
    }

    /// Gets `entity`'s component mutably.
    ///
    /// Editing a value in place is not a structural change and does not
    /// bump the version.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.slot_of(entity).map(|slot| &mut self.values[slot])
    }

    /// Iterates `(entity, component)` pairs in ascending entity order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Returns the value stored in `slot`.
    ///
    /// Slots come from [`slot_of`](Self::slot_of) or a query row computed at
    /// the current version.
    #[inline]
    pub(crate) fn value_at(&self, slot: usize) -> &T {
        &self.values[slot]
    }

    #[inline]
    pub(crate) fn value_at_mut(&mut self, slot: usize) -> &mut T {
        &mut self.values[slot]
    }

    fn insert_at(&mut self, slot: usize, entity: Entity, value: T) {
        if slot == self.entities.len() {
            self.entities.push(entity);
            self.values.push(value);
        } else {
            self.entities.insert(slot, entity);
            self.values.insert(slot, value);
        }
        self.version += 1;
    }
}

impl<T> Default for ComponentBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
