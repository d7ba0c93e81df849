//! # Component Register
//!
//! Type-erased map from [`TypeIndex`] to the world's [`ComponentBuffer`] of
//! that type.
//!
//! Buffers are created lazily on the first attach, detach, lookup or query
//! that names their type, and are never removed afterwards. The register's
//! own lock only guards the map; every buffer carries its own lock.
//!
//! The map lock is never held while a buffer lock is taken. Handles are
//! cloned out first, so a writer blocked on a buffer cannot pin the map and
//! stall a later lookup behind a queued buffer creation.

use crate::buffer::{ComponentBuffer, SharedBuffer};
use crate::component::Component;
use crate::entity::Entity;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use strata_shared::{type_index, TypeIndex};

/// Operations every buffer supports regardless of its component type.
trait ErasedBuffer: Send + Sync {
    /// Upcast used for the checked downcast back to the typed buffer.
    fn as_any(&self) -> &dyn Any;

    /// Removes `entity`'s component, returning whether one was present.
    fn remove_entity(&self, entity: Entity) -> bool;

    /// Current structural version.
    fn version(&self) -> u64;

    /// Number of stored components.
    fn len(&self) -> usize;
}

impl<T: Component> ErasedBuffer for SharedBuffer<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn remove_entity(&self, entity: Entity) -> bool {
        self.write().detach(entity).is_some()
    }

    fn version(&self) -> u64 {
        self.read_recursive().version()
    }

    fn len(&self) -> usize {
        self.read_recursive().len()
    }
}

/// Owns one [`ComponentBuffer`] per component type used in a world.
pub struct ComponentRegister {
    buffers: RwLock<HashMap<TypeIndex, Arc<dyn ErasedBuffer>>>,
    /// Initial capacity given to newly created buffers.
    component_capacity: usize,
}

impl ComponentRegister {
    /// Creates an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty register whose buffers start with room for
    /// `component_capacity` components each.
    #[must_use]
    pub fn with_capacity(component_capacity: usize) -> Self {
        Self {
            buffers: RwLock::new(HashMap::new()),
            component_capacity,
        }
    }

    /// Returns the buffer for `T`, creating it on first use.
    ///
    /// Creation is idempotent: the map is checked under the shared lock and
    /// re-checked after the exclusive lock is taken.
    #[must_use]
    pub fn buffer<T: Component>(&self) -> SharedBuffer<T> {
        let index = type_index::<T>();

        if let Some(buffer) = self.buffers.read().get(&index) {
            return Self::downcast::<T>(buffer.as_ref());
        }

        let mut buffers = self.buffers.write();
        let erased = buffers.entry(index).or_insert_with(|| {
            tracing::debug!(
                component = std::any::type_name::<T>(),
                type_index = %index,
                "creating component buffer"
            );
            let buffer: SharedBuffer<T> = Arc::new(RwLock::new(ComponentBuffer::with_capacity(
                self.component_capacity,
            )));
            Arc::new(buffer)
        });
        Self::downcast::<T>(erased.as_ref())
    }

    /// Returns the buffer for `T` if one was ever created.
    #[must_use]
    pub fn existing_buffer<T: Component>(&self) -> Option<SharedBuffer<T>> {
        let index = type_index::<T>();
        self.buffers
            .read()
            .get(&index)
            .map(|buffer| Self::downcast::<T>(buffer.as_ref()))
    }

    /// Returns the structural version of `T`'s buffer, or zero if it does
    /// not exist yet.
    #[must_use]
    pub fn version_of<T: Component>(&self) -> u64 {
        self.erased(type_index::<T>()).map_or(0, |buffer| buffer.version())
    }

    /// Returns how many components of type `T` are stored.
    #[must_use]
    pub fn count_of<T: Component>(&self) -> usize {
        self.erased(type_index::<T>()).map_or(0, |buffer| buffer.len())
    }

    /// Removes every component `entity` owns, returning how many were
    /// removed.
    ///
    /// Takes each buffer's exclusive lock in turn, after the map lock has
    /// been released. Buffers created meanwhile are not visited.
    pub fn remove_entity(&self, entity: Entity) -> usize {
        let handles: Vec<Arc<dyn ErasedBuffer>> = self.buffers.read().values().cloned().collect();
        handles
            .iter()
            .filter(|buffer| buffer.remove_entity(entity))
            .count()
    }

    /// Returns the number of buffers created so far.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.read().len()
    }

    fn erased(&self, index: TypeIndex) -> Option<Arc<dyn ErasedBuffer>> {
        self.buffers.read().get(&index).cloned()
    }

    fn downcast<T: Component>(erased: &dyn ErasedBuffer) -> SharedBuffer<T> {
        match erased.as_any().downcast_ref::<SharedBuffer<T>>() {
            Some(buffer) => Arc::clone(buffer),
            // Keys are derived from the same type the buffer was built
            // for, so a mismatch means the type registry itself is broken.
            None => unreachable!(
                "component buffer registered under the index of {} has another type",
                std::any::type_name::<T>()
            ),
        }
    }
}

impl Default for ComponentRegister {
    fn default() -> Self {
        Self::new()
    }
}
