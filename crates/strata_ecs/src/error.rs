//! # ECS Error Types
//!
//! Structural misuse of the world. None of these are fatal: the world logs
//! a warning, leaves its state untouched and hands the error back so a
//! stricter caller can escalate.

use crate::entity::Entity;
use thiserror::Error;

/// Errors reported by [`World`](crate::World) mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity was never issued, or has already been deleted.
    #[error("entity {0} is not alive")]
    EntityNotAlive(Entity),

    /// Attach was called for a component type the entity already has.
    #[error("entity {entity} already has a {component} component")]
    ComponentAlreadyPresent {
        /// Entity that was targeted.
        entity: Entity,
        /// Rust type name of the rejected component.
        component: &'static str,
    },
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
