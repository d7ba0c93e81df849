//! # Query Engine
//!
//! `world.get_query::<(A, B, C)>()` returns every entity that currently has
//! all of `A`, `B` and `C`, in ascending entity order, together with
//! references to its components.
//!
//! ## Pipeline
//!
//! ```text
//! get_query::<(A, B)>()
//!   │
//!   ├─ lock      shared, owned guards on buffer A and buffer B
//!   ├─ key       ascending {TypeIndex(A), TypeIndex(B)}
//!   ├─ storage   QueryRegister → QueryStorage for that key
//!   ├─ rows      cached if version(A) + version(B) is unchanged,
//!   │            otherwise recomputed with the pivot merge
//!   └─ Query     guards + rows; elements borrow from the Query
//! ```
//!
//! ## Locking
//!
//! A [`Query`] keeps its shared guards for as long as it lives, and every
//! [`QueryElement`] borrows from the query. An attach or detach on a
//! participating type issued from another thread waits until the query is
//! dropped. Issuing one from the thread that holds the query deadlocks;
//! record it in a [`CommandBuffer`](crate::CommandBuffer) instead.
//!
//! Guards are taken recursively, so one thread can hold several overlapping
//! queries even while a writer is queued on one of their buffers.

mod merge;
mod storage;

pub use merge::{pivot_merge, QueryRows};
pub use storage::{QueryRegister, QueryStorage};

use crate::buffer::BufferReadGuard;
use crate::component::Component;
use crate::entity::Entity;
use crate::register::ComponentRegister;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;
use strata_shared::{type_index, TypeIndex};

/// A tuple of component types that can be queried together.
///
/// Implemented for tuples of one to eight [`Component`] types. The tuple
/// must not name the same type twice.
pub trait ComponentSet: 'static {
    /// Owned shared guards, one per component type.
    type Guards: 'static;

    /// Borrowed components of one entity, in declaration order.
    type Item<'a>
    where
        Self: 'a;

    /// Returns the type index of every member, in declaration order.
    fn type_indices() -> Vec<TypeIndex>;

    /// Takes a shared guard on every member's buffer, creating missing
    /// buffers.
    fn lock(register: &ComponentRegister) -> Self::Guards;

    /// Returns every member's entity column, in declaration order.
    fn columns(guards: &Self::Guards) -> Vec<&[Entity]>;

    /// Returns the sum of every member buffer's structural version.
    fn version_sum(guards: &Self::Guards) -> u64;

    /// Resolves one row to component references.
    ///
    /// `slots` is the row in cache-key order; `positions[k]` is the
    /// cache-key position of declared member `k`.
    fn fetch<'a>(guards: &'a Self::Guards, slots: &[usize], positions: &[usize]) -> Self::Item<'a>;
}

macro_rules! impl_component_set {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Guards = ($(BufferReadGuard<$name>,)+);
            type Item<'a> = ($(&'a $name,)+) where Self: 'a;

            fn type_indices() -> Vec<TypeIndex> {
                vec![$(type_index::<$name>()),+]
            }

            fn lock(register: &ComponentRegister) -> Self::Guards {
                ($(register.buffer::<$name>().read_arc_recursive(),)+)
            }

            fn columns(guards: &Self::Guards) -> Vec<&[Entity]> {
                vec![$(guards.$idx.entities()),+]
            }

            fn version_sum(guards: &Self::Guards) -> u64 {
                0 $(+ guards.$idx.version())+
            }

            fn fetch<'a>(
                guards: &'a Self::Guards,
                slots: &[usize],
                positions: &[usize],
            ) -> Self::Item<'a> {
                ($(guards.$idx.value_at(slots[positions[$idx]]),)+)
            }
        }
    };
}

impl_component_set!(A: 0);
impl_component_set!(A: 0, B: 1);
impl_component_set!(A: 0, B: 1, C: 2);
impl_component_set!(A: 0, B: 1, C: 2, D: 3);
impl_component_set!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_component_set!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_component_set!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_component_set!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

/// Read-only view over every entity that has all components of `S`.
///
/// Holds shared locks on the participating buffers until dropped.
pub struct Query<S: ComponentSet> {
    guards: S::Guards,
    rows: Arc<QueryRows>,
    /// `positions[k]`: cache-key column of declared member `k`.
    positions: Box<[usize]>,
}

impl<S: ComponentSet> Query<S> {
    pub(crate) fn new(components: &ComponentRegister, queries: &QueryRegister) -> Self {
        let types = S::type_indices();
        debug_assert!(
            (1..types.len()).all(|i| !types[..i].contains(&types[i])),
            "a query must not name the same component type twice"
        );

        // order[p]: declared member sitting at cache-key position p.
        let mut order: Vec<usize> = (0..types.len()).collect();
        order.sort_by_key(|&k| types[k]);
        let key: Vec<TypeIndex> = order.iter().map(|&k| types[k]).collect();

        let mut positions = vec![0usize; types.len()];
        for (p, &k) in order.iter().enumerate() {
            positions[k] = p;
        }

        let guards = S::lock(components);
        let rows = {
            let declared = S::columns(&guards);
            let columns: Vec<&[Entity]> = order.iter().map(|&k| declared[k]).collect();
            let version_sum = S::version_sum(&guards);
            let storage = queries.storage(&key);
            let mut storage = storage.lock();
            storage.rows(version_sum, &columns)
        };

        Self {
            guards,
            rows,
            positions: positions.into_boxed_slice(),
        }
    }

    /// Returns the number of matched entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Checks whether nothing matched.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the matched entities in ascending order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        self.rows.entities()
    }

    /// Starts a fresh traversal of the cached rows.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> QueryIter<'_, S> {
        QueryIter {
            query: self,
            row: 0,
        }
    }

    /// Looks up one matched entity.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<QueryElement<'_, S>> {
        self.rows.row_of(entity).map(|row| self.element(row))
    }

    /// Checks whether `entity` matched.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.rows.row_of(entity).is_some()
    }

    /// Checks whether both queries read the same cached rows, i.e. no
    /// recomputation happened between them.
    #[must_use]
    pub fn shares_rows_with<R: ComponentSet>(&self, other: &Query<R>) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }

    fn element(&self, row: usize) -> QueryElement<'_, S> {
        QueryElement {
            entity: self.rows.entity(row),
            components: S::fetch(&self.guards, self.rows.slots(row), &self.positions),
        }
    }
}

impl<S: ComponentSet> fmt::Debug for Query<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("entities", &self.rows.entities())
            .finish_non_exhaustive()
    }
}

impl<'a, S: ComponentSet> IntoIterator for &'a Query<S> {
    type Item = QueryElement<'a, S>;
    type IntoIter = QueryIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One matched entity and references to its components.
///
/// Two elements are equal when they refer to the same entity.
pub struct QueryElement<'a, S: ComponentSet> {
    entity: Entity,
    components: S::Item<'a>,
}

impl<'a, S: ComponentSet> QueryElement<'a, S> {
    /// Returns the matched entity.
    #[inline]
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Returns the component references, in declaration order.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &S::Item<'a> {
        &self.components
    }

    /// Splits the element into its entity and component references.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Entity, S::Item<'a>) {
        (self.entity, self.components)
    }
}

impl<S: ComponentSet> PartialEq for QueryElement<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl<S: ComponentSet> Eq for QueryElement<'_, S> {}

impl<'a, S: ComponentSet> fmt::Debug for QueryElement<'a, S>
where
    S::Item<'a>: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryElement")
            .field("entity", &self.entity)
            .field("components", &self.components)
            .finish()
    }
}

/// Forward iterator over a [`Query`].
pub struct QueryIter<'a, S: ComponentSet> {
    query: &'a Query<S>,
    row: usize,
}

impl<'a, S: ComponentSet> Iterator for QueryIter<'a, S> {
    type Item = QueryElement<'a, S>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row >= self.query.len() {
            return None;
        }
        let element = self.query.element(self.row);
        self.row += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.query.len() - self.row;
        (remaining, Some(remaining))
    }
}

impl<S: ComponentSet> ExactSizeIterator for QueryIter<'_, S> {}

impl<S: ComponentSet> FusedIterator for QueryIter<'_, S> {}
