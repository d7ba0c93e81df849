//! # Type Registry
//!
//! Maps a static Rust type token ([`TypeId`]) to a dense, process-wide
//! [`TypeIndex`].
//!
//! Indices are handed out in request order starting at zero. They are stable
//! for the lifetime of the process and are never persisted: two runs of the
//! same program may number types differently.
//!
//! ```text
//! type_index::<Position>()  ──►  #0   (first request assigns)
//! type_index::<Velocity>()  ──►  #1
//! type_index::<Position>()  ──►  #0   (read-only lookup afterwards)
//! ```

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Dense identifier of a Rust type inside this process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TypeIndex(u32);

impl TypeIndex {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
struct Registry {
    indices: HashMap<TypeId, TypeIndex>,
    names: Vec<&'static str>,
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::default()));

/// Returns the [`TypeIndex`] of `T`, assigning the next free index on the
/// first request.
///
/// The common path is a shared-lock lookup. Assignment re-checks under the
/// exclusive lock, so racing first requests still agree on one index.
#[must_use]
pub fn type_index<T: ?Sized + 'static>() -> TypeIndex {
    let id = TypeId::of::<T>();

    if let Some(&index) = REGISTRY.read().indices.get(&id) {
        return index;
    }

    let mut registry = REGISTRY.write();
    if let Some(&index) = registry.indices.get(&id) {
        return index;
    }

    let raw = u32::try_from(registry.names.len()).unwrap_or(u32::MAX);
    let index = TypeIndex(raw);
    registry.indices.insert(id, index);
    registry.names.push(type_name::<T>());
    index
}

/// Returns the Rust type name registered under `index`, if any.
///
/// Only meant for diagnostics; the name is not a stable identifier.
#[must_use]
pub fn type_name_of(index: TypeIndex) -> Option<&'static str> {
    REGISTRY.read().names.get(index.0 as usize).copied()
}

/// Returns how many distinct types have been registered so far.
#[must_use]
pub fn registered_type_count() -> usize {
    REGISTRY.read().names.len()
}
