//! # Pivot Merge
//!
//! Sorted multi-way intersection of component buffers.
//!
//! ```text
//! pivot  (col 0): [ 1 ][ 3 ][ 4 ][ 8 ][ 9 ]
//!         col 1 : [ 2 ][ 3 ][ 8 ][ 9 ]
//!         col 2 : [ 3 ][ 5 ][ 8 ]
//!                    │          │
//! rows:            ( 3 )      ( 8 )        col 2 runs out, merge stops
//! ```
//!
//! Every column must be strictly ascending. Each cursor only ever moves
//! forward, so one merge costs O(total entries) rather than O(n·m).

use crate::entity::Entity;

/// Materialized result of a merge: one row per matched entity, each row
/// holding the slot of that entity in every merged column.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct QueryRows {
    /// Matched entities, ascending.
    entities: Vec<Entity>,
    /// Row-major slot table, `width` slots per row.
    slots: Vec<usize>,
    /// Number of merged columns.
    width: usize,
}

impl QueryRows {
    /// Returns the number of matched entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Checks whether nothing matched.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the number of merged columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns the matched entities in ascending order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns the entity of `row`.
    #[inline]
    #[must_use]
    pub fn entity(&self, row: usize) -> Entity {
        self.entities[row]
    }

    /// Returns the per-column slots of `row`.
    #[inline]
    #[must_use]
    pub fn slots(&self, row: usize) -> &[usize] {
        let start = row * self.width;
        &self.slots[start..start + self.width]
    }

    /// Finds the row of `entity`.
    #[inline]
    #[must_use]
    pub fn row_of(&self, entity: Entity) -> Option<usize> {
        self.entities.binary_search(&entity).ok()
    }
}

/// Intersects ascending entity columns, using column 0 as the pivot.
///
/// Returns an empty result for zero columns or when any column is empty.
#[must_use]
pub fn pivot_merge(columns: &[&[Entity]]) -> QueryRows {
    let width = columns.len();
    let mut rows = QueryRows {
        entities: Vec::new(),
        slots: Vec::new(),
        width,
    };

    let Some((pivot, others)) = columns.split_first() else {
        return rows;
    };

    // A single column is a plain scan.
    if others.is_empty() {
        rows.entities.extend_from_slice(pivot);
        rows.slots.extend(0..pivot.len());
        return rows;
    }

    let shortest = columns.iter().map(|c| c.len()).min().unwrap_or(0);
    rows.entities.reserve(shortest);
    rows.slots.reserve(shortest * width);

    let mut cursors = vec![0usize; width];

    'merge: while cursors[0] < pivot.len() {
        let candidate = pivot[cursors[0]];

        for (offset, column) in others.iter().enumerate() {
            let cursor = &mut cursors[offset + 1];
            while *cursor < column.len() && column[*cursor] < candidate {
                *cursor += 1;
            }
            if *cursor == column.len() {
                break 'merge;
            }
            if column[*cursor] > candidate {
                // This column has nothing at the candidate; move the pivot
                // on and restart from the first non-pivot column.
                cursors[0] += 1;
                continue 'merge;
            }
        }

        rows.entities.push(candidate);
        rows.slots.extend_from_slice(&cursors);
        for cursor in &mut cursors {
            *cursor += 1;
        }
    }

    rows
}
