//! # World
//!
//! The entry point of the ECS: an [`EntityRegistry`], a [`ComponentRegister`]
//! and a [`QueryRegister`] behind one shareable handle.
//!
//! Every operation takes `&self`. Concurrency is handled by the registers'
//! own locks, so a `World` can be shared across threads behind an `Arc` or a
//! scoped borrow.
//!
//! ```text
//! ┌──────────────────────────── World ────────────────────────────┐
//! │ EntityRegistry      ComponentRegister        QueryRegister    │
//! │ counter+free list   TypeIndex → buffer<T>    key → storage    │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use crate::command::{self, CommandBuffer, CommandStats};
use crate::component::{Component, ComponentMut, ComponentRef};
use crate::entity::{Entity, EntityRegistry};
use crate::error::{EcsError, EcsResult};
use crate::query::{ComponentSet, Query, QueryRegister};
use crate::register::ComponentRegister;
use serde::Deserialize;

/// Sizing hints for a new [`World`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Free-list capacity reserved up front.
    pub entity_capacity: usize,
    /// Initial capacity of every component buffer.
    pub component_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            component_capacity: 256,
        }
    }
}

/// Container of entities, their components and the query caches over them.
pub struct World {
    entities: EntityRegistry,
    components: ComponentRegister,
    queries: QueryRegister,
}

impl World {
    /// Creates an empty world with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&WorldConfig::default())
    }

    /// Creates an empty world sized by `config`.
    #[must_use]
    pub fn with_config(config: &WorldConfig) -> Self {
        tracing::debug!(
            entity_capacity = config.entity_capacity,
            component_capacity = config.component_capacity,
            "creating world"
        );
        Self {
            entities: EntityRegistry::with_capacity(config.entity_capacity),
            components: ComponentRegister::with_capacity(config.component_capacity),
            queries: QueryRegister::new(),
        }
    }

    // =========================================================================
    // ENTITIES
    // =========================================================================

    /// Allocates an entity, recycling the most recently freed id first.
    #[inline]
    pub fn new_entity(&self) -> Entity {
        self.entities.new_entity()
    }

    /// Deletes `entity` and every component attached to it.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotAlive`] if `entity` is not alive. The
    /// world is left untouched in that case.
    pub fn delete_entity(&self, entity: Entity) -> EcsResult<()> {
        // Retired ids reject attaches but are not reissued until stripped.
        self.entities.retire(entity)?;
        let removed = self.components.remove_entity(entity);
        self.entities.release(entity);
        tracing::trace!(%entity, removed, "entity deleted");
        Ok(())
    }

    /// Checks whether `entity` is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns the number of alive entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    // =========================================================================
    // COMPONENTS
    // =========================================================================

    /// Attaches `component` to `entity`.
    ///
    /// Attaching never overwrites: use [`get_component_mut`](Self::get_component_mut)
    /// to change an existing value.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityNotAlive`] if `entity` is not alive.
    /// - [`EcsError::ComponentAlreadyPresent`] if `entity` already has a `T`;
    ///   the stored value is kept and `component` is dropped.
    pub fn attach_component<T: Component>(&self, entity: Entity, component: T) -> EcsResult<()> {
        let shared = self.components.buffer::<T>();
        let mut buffer = shared.write();
        self.ensure_alive::<T>(entity)?;
        let attached = buffer.attach(entity, component).is_ok();
        drop(buffer);
        Self::attach_outcome::<T>(entity, attached)
    }

    /// Attaches the component built by `make` to `entity`.
    ///
    /// `make` only runs if the attach is accepted.
    ///
    /// # Errors
    ///
    /// Same as [`attach_component`](Self::attach_component).
    pub fn attach_component_with<T, F>(&self, entity: Entity, make: F) -> EcsResult<()>
    where
        T: Component,
        F: FnOnce() -> T,
    {
        let shared = self.components.buffer::<T>();
        let mut buffer = shared.write();
        self.ensure_alive::<T>(entity)?;
        let attached = buffer.attach_with(entity, make);
        drop(buffer);
        Self::attach_outcome::<T>(entity, attached)
    }

    /// Detaches and drops `entity`'s `T`, returning whether one was present.
    pub fn detach_component<T: Component>(&self, entity: Entity) -> bool {
        self.components.buffer::<T>().write().detach(entity).is_some()
    }

    /// Returns a shared reference to `entity`'s `T`.
    ///
    /// The reference keeps `T`'s buffer read-locked until dropped.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<ComponentRef<T>> {
        let guard = self.components.buffer::<T>().read_arc_recursive();
        let slot = guard.slot_of(entity)?;
        Some(ComponentRef::new(guard, slot, entity))
    }

    /// Returns an exclusive reference to `entity`'s `T`.
    ///
    /// The reference keeps `T`'s buffer write-locked until dropped. Mutating
    /// a value is not a structural change and leaves query caches valid.
    #[must_use]
    pub fn get_component_mut<T: Component>(&self, entity: Entity) -> Option<ComponentMut<T>> {
        let guard = self.components.buffer::<T>().write_arc();
        let slot = guard.slot_of(entity)?;
        Some(ComponentMut::new(guard, slot, entity))
    }

    /// Checks whether `entity` has a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.components
            .existing_buffer::<T>()
            .is_some_and(|buffer| buffer.read_recursive().contains(entity))
    }

    /// Returns how many entities have a `T`.
    #[must_use]
    pub fn component_count<T: Component>(&self) -> usize {
        self.components.count_of::<T>()
    }

    // =========================================================================
    // QUERIES AND COMMANDS
    // =========================================================================

    /// Returns every entity that has all components of `S`.
    ///
    /// The query read-locks each participating buffer until it is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_ecs::World;
    ///
    /// struct Position(f32);
    /// struct Velocity(f32);
    ///
    /// let world = World::new();
    /// let moving = world.new_entity();
    /// let still = world.new_entity();
    /// world.attach_component(moving, Position(0.0)).unwrap();
    /// world.attach_component(moving, Velocity(2.0)).unwrap();
    /// world.attach_component(still, Position(1.0)).unwrap();
    ///
    /// let query = world.get_query::<(Position, Velocity)>();
    /// assert_eq!(query.entities(), &[moving]);
    /// ```
    #[must_use]
    pub fn get_query<S: ComponentSet>(&self) -> Query<S> {
        Query::new(&self.components, &self.queries)
    }

    /// Replays and empties `commands` in recorded order.
    ///
    /// Must not be called while the calling thread holds a query or a
    /// component reference on a type the commands touch.
    pub fn execute_command_buffer(&self, commands: &CommandBuffer) -> CommandStats {
        let mut stats = CommandStats::default();
        for pending in commands.drain() {
            if command::apply(self, pending) {
                stats.applied += 1;
            } else {
                stats.skipped += 1;
            }
        }
        if stats.total() > 0 {
            tracing::debug!(
                applied = stats.applied,
                skipped = stats.skipped,
                "command buffer executed"
            );
        }
        stats
    }

    /// Returns the component register.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &ComponentRegister {
        &self.components
    }

    /// Returns the query cache register.
    #[inline]
    #[must_use]
    pub fn queries(&self) -> &QueryRegister {
        &self.queries
    }

    /// Liveness check for attaches. Callers hold `T`'s write lock, so a
    /// concurrent delete either sees the new component when it strips `T`
    /// or has already retired `entity`.
    fn ensure_alive<T: Component>(&self, entity: Entity) -> EcsResult<()> {
        if self.entities.is_alive(entity) {
            return Ok(());
        }
        tracing::warn!(
            %entity,
            component = std::any::type_name::<T>(),
            "attach to an entity that is not alive"
        );
        Err(EcsError::EntityNotAlive(entity))
    }

    fn attach_outcome<T: Component>(entity: Entity, attached: bool) -> EcsResult<()> {
        if attached {
            return Ok(());
        }
        let component = std::any::type_name::<T>();
        tracing::warn!(%entity, component, "component already attached");
        Err(EcsError::ComponentAlreadyPresent { entity, component })
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.alive_count())
            .field("component_types", &self.components.buffer_count())
            .field("cached_queries", &self.queries.storage_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(i32);

    #[derive(Debug, PartialEq)]
    struct Velocity(i32);

    #[test]
    fn test_attach_get_detach() {
        let world = World::new();
        let entity = world.new_entity();

        world.attach_component(entity, Position(3)).unwrap();
        assert!(world.has_component::<Position>(entity));
        assert_eq!(*world.get_component::<Position>(entity).unwrap(), Position(3));

        assert!(world.detach_component::<Position>(entity));
        assert!(!world.detach_component::<Position>(entity));
        assert!(world.get_component::<Position>(entity).is_none());
    }

    #[test]
    fn test_duplicate_attach_keeps_original() {
        let world = World::new();
        let entity = world.new_entity();

        world.attach_component(entity, Position(1)).unwrap();
        let err = world.attach_component(entity, Position(2)).unwrap_err();
        assert!(matches!(err, EcsError::ComponentAlreadyPresent { .. }));
        assert_eq!(*world.get_component::<Position>(entity).unwrap(), Position(1));
    }

    #[test]
    fn test_attach_with_is_lazy() {
        let world = World::new();
        let entity = world.new_entity();
        world.attach_component(entity, Position(1)).unwrap();

        let mut called = false;
        let result = world.attach_component_with(entity, || {
            called = true;
            Position(9)
        });
        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn test_attach_to_dead_entity_is_rejected() {
        let world = World::new();
        let entity = world.new_entity();
        world.delete_entity(entity).unwrap();

        let err = world.attach_component(entity, Position(0)).unwrap_err();
        assert_eq!(err, EcsError::EntityNotAlive(entity));
        assert_eq!(world.component_count::<Position>(), 0);
    }

    #[test]
    fn test_delete_strips_components() {
        let world = World::new();
        let entity = world.new_entity();
        world.attach_component(entity, Position(1)).unwrap();
        world.attach_component(entity, Velocity(1)).unwrap();

        world.delete_entity(entity).unwrap();
        assert_eq!(world.component_count::<Position>(), 0);
        assert_eq!(world.component_count::<Velocity>(), 0);

        // The recycled id starts clean.
        let recycled = world.new_entity();
        assert_eq!(recycled, entity);
        assert!(!world.has_component::<Position>(recycled));
    }

    #[test]
    fn test_mutation_through_component_mut() {
        let world = World::new();
        let entity = world.new_entity();
        world.attach_component(entity, Velocity(1)).unwrap();

        if let Some(mut velocity) = world.get_component_mut::<Velocity>(entity) {
            velocity.0 = 7;
        }
        assert_eq!(*world.get_component::<Velocity>(entity).unwrap(), Velocity(7));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        use serde::de::value::{Error, MapDeserializer};

        let entries = std::iter::once(("entity_capacity", 8usize));
        let config = WorldConfig::deserialize(MapDeserializer::<_, Error>::new(entries)).unwrap();
        assert_eq!(config.entity_capacity, 8);
        assert_eq!(config.component_capacity, WorldConfig::default().component_capacity);
    }
}
