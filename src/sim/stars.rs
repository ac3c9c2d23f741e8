//! Procedural star field
//!
//! Stars are scattered uniformly over a square sandbox centred on the origin
//! and bucketed into the spatial grid once. Generation is seeded so the same
//! settings always produce the same sky.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::grid::SpatialGrid;
use super::state::{StarId, StarRecord};
use crate::consts::MAX_STARS;
use crate::settings::StarSettings;

/// Unrounded density formula: `density * (sandbox_size / 4)^2 * 4`
pub fn star_total(density: f32, sandbox_size: f32) -> f32 {
    let quarter = sandbox_size / 4.0;
    density * quarter * quarter * 4.0
}

/// Number of stars the density formula yields for a sandbox, capped at
/// `MAX_STARS`
pub fn star_count(density: f32, sandbox_size: f32) -> usize {
    let total = star_total(density, sandbox_size);
    if total.is_nan() || total <= 0.0 {
        0
    } else if total >= MAX_STARS as f32 {
        MAX_STARS
    } else {
        total as usize
    }
}

/// All stars plus the grid that indexes them
#[derive(Debug, Clone)]
pub struct StarField {
    stars: Vec<StarRecord>,
    grid: SpatialGrid<StarId>,
}

impl StarField {
    /// Empty field with the given grid cell size
    pub fn new(cell_size: f32) -> Self {
        Self {
            stars: Vec::new(),
            grid: SpatialGrid::new(cell_size),
        }
    }

    /// Scatter `star_count(density, sandbox_size)` stars over
    /// `±0.5 * view_width * sandbox_size` on both axes
    pub fn generate(cfg: &StarSettings, view_width: f32, seed: u64) -> Self {
        let count = star_count(cfg.density, cfg.sandbox_size);
        let half_extent = 0.5 * view_width * cfg.sandbox_size;
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut field = Self::new(cfg.cell_size);
        field.stars.reserve(count);

        log::debug!("Generating {} stars over ±{}", count, half_extent);
        for _ in 0..count {
            let x = (rng.random::<f32>() - 0.5) * 2.0 * half_extent;
            let y = (rng.random::<f32>() - 0.5) * 2.0 * half_extent;
            let size = rng.random_range(1.0..3.0);
            let alpha = rng.random_range(0.3..0.8);
            let phase = rng.random_range(0.0..std::f32::consts::TAU);
            field.add(Vec2::new(x, y), size, alpha, phase);
        }
        field
    }

    /// Insert one star; its cell is assigned here and never changes
    pub fn add(&mut self, position: Vec2, render_size: f32, base_alpha: f32, phase: f32) -> StarId {
        let id = self.stars.len() as StarId;
        let cell = self.grid.insert(position, id);
        self.stars.push(StarRecord::new(position, render_size, base_alpha, phase, cell));
        id
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn get(&self, id: StarId) -> Option<&StarRecord> {
        self.stars.get(id as usize)
    }

    pub fn get_mut(&mut self, id: StarId) -> Option<&mut StarRecord> {
        self.stars.get_mut(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StarRecord> {
        self.stars.iter()
    }

    pub fn grid(&self) -> &SpatialGrid<StarId> {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_star_count() {
        assert_eq!(star_count(50.0, 100.0), 125_000);
        assert_eq!(star_count(1.0, 8.0), 16);
        assert_eq!(star_count(0.0, 100.0), 0);
        assert_eq!(star_count(f32::NAN, 100.0), 0);
    }

    #[test]
    fn test_star_count_is_capped() {
        assert_eq!(star_count(1.0e30, 100.0), MAX_STARS);
        assert_eq!(star_count(f32::INFINITY, 100.0), MAX_STARS);
        assert!(star_total(1.0e30, 100.0) > MAX_STARS as f32);
    }

    #[test]
    fn test_generated_stars_stay_in_sandbox() {
        let cfg = StarSettings {
            density: 4.0,
            sandbox_size: 8.0,
            ..Default::default()
        };
        let field = StarField::generate(&cfg, 800.0, 42);
        assert_eq!(field.len(), 64);
        assert_eq!(field.grid().len(), 64);
        for star in field.iter() {
            assert!(star.position.x.abs() <= 3200.0);
            assert!(star.position.y.abs() <= 3200.0);
            assert!((1.0..3.0).contains(&star.render_size));
            assert!((0.3..0.8).contains(&star.base_alpha));
            assert_eq!(star.cell, field.grid().cell_key(star.position));
            assert!(!star.visible);
        }
    }

    #[test]
    fn test_seed_controls_layout() {
        let cfg = StarSettings {
            density: 1.0,
            sandbox_size: 8.0,
            ..Default::default()
        };
        let a = StarField::generate(&cfg, 800.0, 1);
        let b = StarField::generate(&cfg, 800.0, 1);
        let c = StarField::generate(&cfg, 800.0, 2);
        assert_eq!(a.get(0).unwrap().position, b.get(0).unwrap().position);
        assert_ne!(a.get(0).unwrap().position, c.get(0).unwrap().position);
    }
}
