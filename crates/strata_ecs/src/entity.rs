//! # Entity Management
//!
//! Entities are opaque 64-bit identities. The registry hands them out from a
//! monotonic counter and recycles deleted ones through a LIFO free list.
//!
//! Deletion has two steps. [`EntityRegistry::retire`] ends the entity's life
//! while keeping its id out of circulation; [`EntityRegistry::release`] then
//! makes the id reusable. The world strips components between the two, so
//! a recycled id never meets its predecessor's components.
//!
//! The raw value also defines the order in which every component buffer is
//! traversed, which is what the query merge relies on.

use crate::error::{EcsError, EcsResult};
use parking_lot::Mutex;
use std::fmt;

/// Opaque identity of a thing in the simulation.
///
/// Entities compare, order and hash by their raw value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u64);

impl Entity {
    /// Reserved sentinel that never denotes a live entity.
    pub const INVALID: Self = Self(u64::MAX);

    /// Wraps a raw identity value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identity value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Checks whether this is anything other than [`Entity::INVALID`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u64::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Entity({})", self.0)
        } else {
            f.write_str("Entity(INVALID)")
        }
    }
}

struct Allocator {
    /// Next never-issued raw value.
    next: u64,
    /// Deleted ids waiting for reuse, most recent last.
    free: Vec<Entity>,
    /// Retired ids not yet released: dead, but not reusable.
    retired: Vec<Entity>,
}

impl Allocator {
    fn is_alive(&self, entity: Entity) -> bool {
        entity.0 < self.next && !self.free.contains(&entity) && !self.retired.contains(&entity)
    }
}

/// Issues and recycles [`Entity`] values.
///
/// A single coarse lock guards the allocator; id allocation is rare next to
/// component access.
pub struct EntityRegistry {
    inner: Mutex<Allocator>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty registry whose free list is pre-sized for
    /// `capacity` recycled ids.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Allocator {
                next: 0,
                free: Vec::with_capacity(capacity),
                retired: Vec::new(),
            }),
        }
    }

    /// Issues an entity.
    ///
    /// Recycled ids come first, most recently deleted first. Otherwise the
    /// counter is post-incremented.
    pub fn new_entity(&self) -> Entity {
        let mut inner = self.inner.lock();
        if let Some(entity) = inner.free.pop() {
            return entity;
        }
        let entity = Entity(inner.next);
        inner.next += 1;
        entity
    }

    /// Returns `entity` to the registry in one step.
    ///
    /// Equivalent to [`retire`](Self::retire) followed by
    /// [`release`](Self::release).
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotAlive`] when the id is not currently issued.
    pub fn delete_entity(&self, entity: Entity) -> EcsResult<()> {
        self.retire(entity)?;
        self.release(entity);
        Ok(())
    }

    /// Marks `entity` dead without making its id reusable.
    ///
    /// Retiring an id that is out of range, free or already retired is
    /// tolerated: a warning is logged and nothing changes, since replayed
    /// command buffers routinely carry stale deletes.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotAlive`] when the id is not currently issued.
    pub fn retire(&self, entity: Entity) -> EcsResult<()> {
        let mut inner = self.inner.lock();
        if !inner.is_alive(entity) {
            drop(inner);
            tracing::warn!(%entity, "delete of an entity that is not alive");
            return Err(EcsError::EntityNotAlive(entity));
        }
        inner.retired.push(entity);
        Ok(())
    }

    /// Makes a retired id available again.
    ///
    /// Releasing the most recently issued id rolls the counter back instead
    /// of leaving a hole. Ids that were never retired are ignored.
    pub fn release(&self, entity: Entity) {
        let mut inner = self.inner.lock();
        let Some(position) = inner.retired.iter().position(|&e| e == entity) else {
            return;
        };
        inner.retired.swap_remove(position);

        if entity.0 + 1 == inner.next {
            inner.next -= 1;
        } else {
            inner.free.push(entity);
        }
    }

    /// Checks whether `entity` is currently issued and not retired.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.inner.lock().is_alive(entity)
    }

    /// Returns the number of currently issued entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        let inner = self.inner.lock();
        usize::try_from(inner.next).unwrap_or(usize::MAX) - inner.free.len() - inner.retired.len()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        assert!(!Entity::INVALID.is_valid());
        assert!(!Entity::default().is_valid());
        assert!(Entity::from_raw(0).is_valid());
        assert_eq!(Entity::INVALID.to_string(), "Entity(INVALID)");
        assert_eq!(Entity::from_raw(7).to_string(), "Entity(7)");
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        let mut entities = vec![Entity::from_raw(9), Entity::from_raw(2), Entity::from_raw(5)];
        entities.sort();
        assert_eq!(
            entities,
            vec![Entity::from_raw(2), Entity::from_raw(5), Entity::from_raw(9)]
        );
    }

    #[test]
    fn test_counter_issues_in_order() {
        let registry = EntityRegistry::new();
        assert_eq!(registry.new_entity(), Entity::from_raw(0));
        assert_eq!(registry.new_entity(), Entity::from_raw(1));
        assert_eq!(registry.new_entity(), Entity::from_raw(2));
        assert_eq!(registry.alive_count(), 3);
    }

    #[test]
    fn test_tail_delete_rolls_counter_back() {
        let registry = EntityRegistry::new();
        let _a = registry.new_entity();
        let b = registry.new_entity();

        registry.delete_entity(b).unwrap();
        assert_eq!(registry.new_entity(), b);
        assert_eq!(registry.alive_count(), 2);
    }

    #[test]
    fn test_free_list_is_lifo() {
        let registry = EntityRegistry::new();
        let a = registry.new_entity();
        let b = registry.new_entity();
        let _c = registry.new_entity();

        registry.delete_entity(a).unwrap();
        registry.delete_entity(b).unwrap();

        assert_eq!(registry.new_entity(), b);
        assert_eq!(registry.new_entity(), a);
        assert_eq!(registry.new_entity(), Entity::from_raw(3));
    }

    #[test]
    fn test_double_delete_is_rejected() {
        let registry = EntityRegistry::new();
        let a = registry.new_entity();
        let _b = registry.new_entity();

        registry.delete_entity(a).unwrap();
        assert_eq!(registry.delete_entity(a), Err(EcsError::EntityNotAlive(a)));
        assert_eq!(registry.alive_count(), 1);

        assert_eq!(registry.new_entity(), a);
        assert_ne!(registry.new_entity(), a);
    }

    #[test]
    fn test_stale_delete_at_tail_does_not_duplicate() {
        let registry = EntityRegistry::new();
        let _a = registry.new_entity();
        let b = registry.new_entity();
        let c = registry.new_entity();

        // b goes on the free list, c rolls the counter back to 2, which
        // leaves b (raw 1) at the tail.
        registry.delete_entity(b).unwrap();
        registry.delete_entity(c).unwrap();
        assert!(registry.delete_entity(b).is_err());

        let first = registry.new_entity();
        let second = registry.new_entity();
        assert_eq!(first, b);
        assert_eq!(second, c);
    }

    #[test]
    fn test_out_of_range_delete() {
        let registry = EntityRegistry::new();
        assert!(registry.delete_entity(Entity::from_raw(10)).is_err());
        assert!(registry.delete_entity(Entity::INVALID).is_err());
        assert_eq!(registry.alive_count(), 0);
    }

    #[test]
    fn test_is_alive() {
        let registry = EntityRegistry::new();
        let a = registry.new_entity();
        let b = registry.new_entity();
        assert!(registry.is_alive(a));
        registry.delete_entity(a).unwrap();
        assert!(!registry.is_alive(a));
        assert!(registry.is_alive(b));
        assert!(!registry.is_alive(Entity::from_raw(2)));
    }

    #[test]
    fn test_retired_id_is_dead_but_not_reissued() {
        let registry = EntityRegistry::new();
        let a = registry.new_entity();
        let _b = registry.new_entity();

        registry.retire(a).unwrap();
        assert!(!registry.is_alive(a));
        assert_eq!(registry.alive_count(), 1);
        assert!(registry.retire(a).is_err());
        assert!(registry.delete_entity(a).is_err());

        let c = registry.new_entity();
        assert_ne!(c, a);

        registry.release(a);
        assert_eq!(registry.new_entity(), a);
        assert_eq!(registry.alive_count(), 3);
    }

    #[test]
    fn test_release_of_retired_tail_rolls_back() {
        let registry = EntityRegistry::new();
        let _a = registry.new_entity();
        let b = registry.new_entity();

        registry.retire(b).unwrap();
        registry.release(b);
        registry.release(b);
        assert_eq!(registry.new_entity(), b);
        assert_eq!(registry.new_entity(), Entity::from_raw(2));
    }
}
