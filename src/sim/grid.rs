//! Uniform spatial hash grid for ball queries over static point entities.
//!
//! Entities are bucketed once into square cells keyed by
//! `(floor(x / cell_size), floor(y / cell_size))`. A ball query visits every
//! cell within `ceil(radius / cell_size) + 1` cells (Chebyshev) of the centre
//! cell and returns their contents unfiltered: the result is a superset of the
//! true ball and callers re-check the exact distance.
//!
//! Cell size should be at least the largest query radius so a query touches a
//! small constant number of cells (5×5 at radius == cell size).

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Queries spanning more cells than this in either direction return nothing
pub const MAX_QUERY_SPAN_CELLS: i32 = 64;

/// Integer cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

impl CellKey {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance between two cells
    pub fn chebyshev(self, other: CellKey) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Buckets of entity handles keyed by cell. Cells are created lazily on
/// first insert and never removed.
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<T>>,
    len: usize,
}

impl<T: Copy> SpatialGrid<T> {
    /// `cell_size` must be positive; anything else falls back to 1.0
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("Invalid grid cell size {}, using 1.0", cell_size);
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of entities inserted
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of cells that hold at least one entity
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell coordinate for a world position
    pub fn cell_key(&self, pos: Vec2) -> CellKey {
        CellKey::new(
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Place an entity into the cell containing `pos`. Returns the key so the
    /// caller can record it; a moving entity would need it to re-bucket.
    pub fn insert(&mut self, pos: Vec2, item: T) -> CellKey {
        let key = self.cell_key(pos);
        self.cells.entry(key).or_default().push(item);
        self.len += 1;
        key
    }

    /// Entities in a single cell, in insertion order
    pub fn cell(&self, key: CellKey) -> &[T] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells in each direction a query of `radius` visits, or `None` when
    /// the radius is unusable
    pub fn radius_in_cells(&self, radius: f32) -> Option<i32> {
        if !radius.is_finite() || radius < 0.0 {
            return None;
        }
        let span = (radius / self.cell_size).ceil() + 1.0;
        if span > MAX_QUERY_SPAN_CELLS as f32 {
            log::warn!(
                "Grid query radius {} spans {} cells, refusing to scan",
                radius,
                span
            );
            return None;
        }
        Some(span as i32)
    }

    /// All entities in cells near `center` (superset of the ball of `radius`)
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<T> {
        let mut out = Vec::new();
        self.query_radius_into(center, radius, &mut out);
        out
    }

    /// Same as [`query_radius`](Self::query_radius), appending into `out`
    /// so a per-frame caller can reuse its buffer
    pub fn query_radius_into(&self, center: Vec2, radius: f32, out: &mut Vec<T>) {
        if !center.x.is_finite() || !center.y.is_finite() {
            return;
        }
        let Some(span) = self.radius_in_cells(radius) else {
            return;
        };
        let origin = self.cell_key(center);

        for dx in -span..=span {
            for dy in -span..=span {
                // Centres far enough out saturate the cell coordinate
                let (Some(x), Some(y)) = (origin.x.checked_add(dx), origin.y.checked_add(dy))
                else {
                    continue;
                };
                if let Some(items) = self.cells.get(&CellKey::new(x, y)) {
                    out.extend_from_slice(items);
                }
            }
        }
    }
}

impl<T: Copy + PartialEq> SpatialGrid<T> {
    /// Remove an entity from the cell it was inserted into. Static star
    /// fields never call this; a moving entity removes then re-inserts.
    pub fn remove(&mut self, key: CellKey, item: T) -> bool {
        let Some(items) = self.cells.get_mut(&key) else {
            return false;
        };
        match items.iter().position(|&i| i == item) {
            Some(idx) => {
                items.remove(idx);
                self.len -= 1;
                true
            }
            None => false,
        }
    }
}
