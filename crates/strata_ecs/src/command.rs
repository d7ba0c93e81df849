//! # Command Buffer
//!
//! Deferred structural mutations.
//!
//! While a [`Query`](crate::Query) is alive it holds shared locks on its
//! buffers, so attaching or detaching one of its component types from the
//! same thread would deadlock. Systems record those mutations here instead
//! and the world replays them at a safe point, usually the end of the frame.
//!
//! ```text
//! ┌──────────┐ record ┌───────────────┐  execute_command_buffer  ┌───────┐
//! │ System A │───────>│               │─────────────────────────>│       │
//! │ System B │───────>│ CommandBuffer │  (recorded order, then   │ World │
//! │ System C │───────>│               │   the buffer is empty)   │       │
//! └──────────┘        └───────────────┘                          └───────┘
//! ```
//!
//! Recording only needs `&self`: the queue is a lock-free channel, so any
//! number of threads may record into one buffer concurrently.

use crate::component::Component;
use crate::entity::Entity;
use crate::error::EcsResult;
use crate::world::World;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;

/// A deferred mutation.
pub enum Command {
    /// Delete an entity and every component it owns.
    DeleteEntity(Entity),

    /// Attach a component to an entity.
    AttachComponent {
        /// Target entity.
        entity: Entity,
        /// Type-erased component value or constructor.
        component: DeferredComponent,
    },

    /// Detach a component type from an entity.
    DetachComponent {
        /// Target entity.
        entity: Entity,
        /// Type-erased detach for the component type.
        detach: DeferredDetach,
    },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteEntity(entity) => f.debug_tuple("DeleteEntity").field(entity).finish(),
            Self::AttachComponent { entity, component } => f
                .debug_struct("AttachComponent")
                .field("entity", entity)
                .field("component", &component.component_name())
                .finish(),
            Self::DetachComponent { entity, detach } => f
                .debug_struct("DetachComponent")
                .field("entity", entity)
                .field("component", &detach.component_name())
                .finish(),
        }
    }
}

/// Something that can attach itself to an entity once replayed.
trait PendingAttach: Send {
    fn apply(self: Box<Self>, world: &World, entity: Entity) -> EcsResult<()>;
}

struct AttachValue<T>(T);

impl<T: Component> PendingAttach for AttachValue<T> {
    fn apply(self: Box<Self>, world: &World, entity: Entity) -> EcsResult<()> {
        world.attach_component(entity, self.0)
    }
}

struct AttachWith<T, F> {
    make: F,
    _component: std::marker::PhantomData<fn() -> T>,
}

impl<T, F> PendingAttach for AttachWith<T, F>
where
    T: Component,
    F: FnOnce() -> T + Send + 'static,
{
    fn apply(self: Box<Self>, world: &World, entity: Entity) -> EcsResult<()> {
        world.attach_component_with(entity, self.make)
    }
}

/// Type-erased component payload of [`Command::AttachComponent`].
pub struct DeferredComponent {
    pending: Box<dyn PendingAttach>,
    name: &'static str,
}

impl DeferredComponent {
    /// Wraps a component value.
    #[must_use]
    pub fn value<T: Component>(component: T) -> Self {
        Self {
            pending: Box::new(AttachValue(component)),
            name: std::any::type_name::<T>(),
        }
    }

    /// Wraps a constructor that runs only if the attach is accepted.
    #[must_use]
    pub fn with<T, F>(make: F) -> Self
    where
        T: Component,
        F: FnOnce() -> T + Send + 'static,
    {
        Self {
            pending: Box::new(AttachWith {
                make,
                _component: std::marker::PhantomData,
            }),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the Rust type name of the component.
    #[must_use]
    pub fn component_name(&self) -> &'static str {
        self.name
    }

    fn apply(self, world: &World, entity: Entity) -> EcsResult<()> {
        self.pending.apply(world, entity)
    }
}

/// Type-erased detach of [`Command::DetachComponent`].
#[derive(Clone, Copy)]
pub struct DeferredDetach {
    detach: fn(&World, Entity) -> bool,
    name: &'static str,
}

impl DeferredDetach {
    /// Builds the detach for component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            detach: |world, entity| world.detach_component::<T>(entity),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the Rust type name of the component.
    #[must_use]
    pub fn component_name(&self) -> &'static str {
        self.name
    }

    fn apply(self, world: &World, entity: Entity) -> bool {
        (self.detach)(world, entity)
    }
}

/// Outcome of replaying a command buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandStats {
    /// Commands that changed the world.
    pub applied: usize,
    /// Commands that were no-ops (rejected attach, stale delete, absent
    /// detach).
    pub skipped: usize,
}

impl CommandStats {
    /// Returns the total number of replayed commands.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> usize {
        self.applied + self.skipped
    }
}

impl std::ops::AddAssign for CommandStats {
    fn add_assign(&mut self, other: Self) {
        self.applied += other.applied;
        self.skipped += other.skipped;
    }
}

/// Queue of deferred mutations, replayed in recorded order.
pub struct CommandBuffer {
    sender: Sender<Command>,
    receiver: Receiver<Command>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Records an arbitrary command.
    pub fn push(&self, command: Command) {
        // The receiver lives in `self`, so the channel cannot be
        // disconnected here.
        let _ = self.sender.send(command);
    }

    /// Records the deletion of `entity`.
    pub fn delete_entity(&self, entity: Entity) {
        self.push(Command::DeleteEntity(entity));
    }

    /// Records attaching `component` to `entity`.
    pub fn attach<T: Component>(&self, entity: Entity, component: T) {
        self.push(Command::AttachComponent {
            entity,
            component: DeferredComponent::value(component),
        });
    }

    /// Records attaching the component built by `make` to `entity`.
    ///
    /// `make` runs during replay, and only if the attach is accepted.
    pub fn attach_with<T, F>(&self, entity: Entity, make: F)
    where
        T: Component,
        F: FnOnce() -> T + Send + 'static,
    {
        self.push(Command::AttachComponent {
            entity,
            component: DeferredComponent::with(make),
        });
    }

    /// Records detaching component type `T` from `entity`.
    pub fn detach<T: Component>(&self, entity: Entity) {
        self.push(Command::DetachComponent {
            entity,
            detach: DeferredDetach::of::<T>(),
        });
    }

    /// Returns the number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Checks whether no commands are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Discards every recorded command.
    pub fn clear(&self) {
        for _ in self.receiver.try_iter() {}
    }

    /// Replays every recorded command against `world`, leaving the buffer
    /// empty.
    pub fn run(&self, world: &World) -> CommandStats {
        world.execute_command_buffer(self)
    }

    /// Removes and returns every recorded command in recorded order.
    pub(crate) fn drain(&self) -> Vec<Command> {
        self.receiver.try_iter().collect()
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("pending", &self.len())
            .finish()
    }
}

/// Applies one command to `world`, returning whether it changed anything.
pub(crate) fn apply(world: &World, command: Command) -> bool {
    match command {
        Command::DeleteEntity(entity) => world.delete_entity(entity).is_ok(),
        Command::AttachComponent { entity, component } => component.apply(world, entity).is_ok(),
        Command::DetachComponent { entity, detach } => detach.apply(world, entity),
    }
}
