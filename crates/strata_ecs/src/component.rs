//! # Component System
//!
//! Components are plain data attached to entities. Any `Send + Sync +
//! 'static` type qualifies; there is nothing to derive or register by hand.
//! The process-wide [`TypeIndex`](strata_shared::TypeIndex) of the type is
//! assigned the first time a world touches it.
//!
//! [`ComponentRef`] and [`ComponentMut`] are the live reference bundles
//! handed out by single-entity lookups. They own a lock guard on the
//! component's buffer, so the referenced value cannot move while they are
//! alive.

use crate::buffer::{BufferReadGuard, BufferWriteGuard};
use crate::entity::Entity;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Marker trait for ECS components.
///
/// Blanket-implemented for every `Send + Sync + 'static` type.
///
/// # Example
///
/// ```rust
/// #[derive(Debug, PartialEq)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
///
/// fn assert_component<T: strata_ecs::Component>() {}
/// assert_component::<Position>();
/// ```
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Shared reference to one entity's component.
///
/// Holds a shared lock on the component's buffer until dropped.
pub struct ComponentRef<T: Component> {
    guard: BufferReadGuard<T>,
    slot: usize,
    entity: Entity,
}

impl<T: Component> ComponentRef<T> {
    pub(crate) fn new(guard: BufferReadGuard<T>, slot: usize, entity: Entity) -> Self {
        Self {
            guard,
            slot,
            entity,
        }
    }

    /// Returns the entity owning the component.
    #[inline]
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }
}

impl<T: Component> Deref for ComponentRef<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.guard.value_at(self.slot)
    }
}

impl<T: Component + fmt::Debug> fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef")
            .field(&self.entity)
            .field(&**self)
            .finish()
    }
}

/// Exclusive reference to one entity's component.
///
/// Holds the buffer's exclusive lock until dropped. Editing through it does
/// not count as a structural change, so cached queries stay valid.
pub struct ComponentMut<T: Component> {
    guard: BufferWriteGuard<T>,
    slot: usize,
    entity: Entity,
}

impl<T: Component> ComponentMut<T> {
    pub(crate) fn new(guard: BufferWriteGuard<T>, slot: usize, entity: Entity) -> Self {
        Self {
            guard,
            slot,
            entity,
        }
    }

    /// Returns the entity owning the component.
    #[inline]
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }
}

impl<T: Component> Deref for ComponentMut<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.guard.value_at(self.slot)
    }
}

impl<T: Component> DerefMut for ComponentMut<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.guard.value_at_mut(self.slot)
    }
}

impl<T: Component + fmt::Debug> fmt::Debug for ComponentMut<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentMut")
            .field(&self.entity)
            .field(&**self)
            .finish()
    }
}
