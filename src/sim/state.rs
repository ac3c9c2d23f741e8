//! World state and core simulation types
//!
//! `World` is the explicit context each tick operates on: the craft, the
//! bodies, the star field and the per-frame managers. Nothing lives in
//! globals, so a world can be built deterministically from `Settings`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::grid::CellKey;
use super::stars::StarField;
use super::visibility::VisibilityManager;
use crate::heading;
use crate::settings::{BodySettings, Settings};

/// A massive body: read-only during simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub name: String,
    pub position: Vec2,
    pub radius: f32,
    /// Gravity strength fed into the falloff
    pub gravity: f32,
    /// Display colour (0xRRGGBB)
    pub color: u32,
}

impl Body {
    pub fn new(name: &str, position: Vec2, radius: f32, gravity: f32) -> Self {
        Self {
            name: name.to_string(),
            position,
            radius,
            gravity,
            color: 0xffffff,
        }
    }
}

impl From<&BodySettings> for Body {
    fn from(cfg: &BodySettings) -> Self {
        Self {
            name: cfg.name.clone(),
            position: cfg.position(),
            radius: cfg.radius,
            gravity: cfg.gravity,
            color: cfg.color,
        }
    }
}

/// The locally piloted craft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Craft {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Nose heading in degrees
    pub orientation: f32,
    pub radius: f32,
}

impl Craft {
    pub fn new(position: Vec2, orientation: f32, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            orientation,
            radius,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Unit vector the nose points along
    pub fn heading(&self) -> Vec2 {
        heading(self.orientation)
    }
}

/// Index of a star in its `StarField`
pub type StarId = u32;

/// A background star. Position and cell are fixed at generation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarRecord {
    pub position: Vec2,
    pub render_size: f32,
    pub base_alpha: f32,
    /// Twinkle phase offset (radians)
    pub phase: f32,
    pub cell: CellKey,
    /// Currently in the visible set
    pub visible: bool,
    /// A presentation handle has been created for this star
    pub has_handle: bool,
    /// Distance-faded alpha from the last visibility pass
    pub alpha: f32,
    /// `alpha` after the twinkle pass; what gets drawn
    pub display_alpha: f32,
}

impl StarRecord {
    pub fn new(
        position: Vec2,
        render_size: f32,
        base_alpha: f32,
        phase: f32,
        cell: CellKey,
    ) -> Self {
        Self {
            position,
            render_size,
            base_alpha,
            phase,
            cell,
            visible: false,
            has_handle: false,
            alpha: 0.0,
            display_alpha: 0.0,
        }
    }
}

/// Complete local simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub settings: Settings,
    pub craft: Craft,
    pub bodies: Vec<Body>,
    pub stars: StarField,
    pub visibility: VisibilityManager,
    pub camera: Camera,
    /// Ticks run so far
    pub time_ticks: u64,
    /// Accumulated `dt` in frames
    pub elapsed_frames: f32,
}

impl World {
    /// Build a world: bodies from settings, craft at the spawn point, star
    /// field generated from the seed, initial visibility computed.
    pub fn new(settings: Settings) -> Self {
        let bodies: Vec<Body> = settings.bodies.iter().map(Body::from).collect();
        let craft = Craft::new(
            settings.spawn_point(),
            settings.craft.start_orientation,
            settings.craft.radius,
        );
        let mut stars =
            StarField::generate(&settings.stars, settings.world.view_width, settings.seed);
        log::info!(
            "World built: {} bodies, {} stars in {} cells (seed {:#x})",
            bodies.len(),
            stars.len(),
            stars.grid().cell_count(),
            settings.seed
        );

        let mut visibility = VisibilityManager::new(settings.visibility_params());
        visibility.update(&mut stars, craft.position);

        let mut camera = Camera::new(
            settings.world.view_width,
            settings.world.view_height,
            settings.camera.smoothing,
        );
        camera.snap_to(craft.position);

        Self {
            settings,
            craft,
            bodies,
            stars,
            visibility,
            camera,
            time_ticks: 0,
            elapsed_frames: 0.0,
        }
    }

    /// Seconds of simulated time
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_frames / self.settings.world.ticks_per_second
    }
}
