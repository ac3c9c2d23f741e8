//! World configuration
//!
//! Every tunable the simulation reads lives here. Defaults reproduce the
//! reference sandbox; a JSON file can override any subset of keys.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::gravity::GravityParams;
use crate::sim::grid::MAX_QUERY_SPAN_CELLS;
use crate::sim::stars::star_total;
use crate::sim::tick::CraftParams;
use crate::sim::visibility::VisibilityParams;

/// Viewport and clock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub view_width: f32,
    pub view_height: f32,
    /// Frames per second that a `dt` of 1.0 represents
    pub ticks_per_second: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            view_width: VIEW_WIDTH,
            view_height: VIEW_HEIGHT,
            ticks_per_second: TICKS_PER_SECOND,
        }
    }
}

/// Player craft handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftSettings {
    /// Thrust acceleration per frame
    pub thrust: f32,
    /// Degrees per second
    pub rotation_speed: f32,
    pub radius: f32,
    /// Initial nose heading in degrees
    pub start_orientation: f32,
    /// Spawn point relative to the first body
    pub spawn_offset_x: f32,
    pub spawn_offset_y: f32,
}

impl Default for CraftSettings {
    fn default() -> Self {
        Self {
            thrust: CRAFT_THRUST,
            rotation_speed: CRAFT_ROTATION_SPEED,
            radius: CRAFT_RADIUS,
            start_orientation: CRAFT_START_ORIENTATION,
            spawn_offset_x: CRAFT_SPAWN_OFFSET.0,
            spawn_offset_y: CRAFT_SPAWN_OFFSET.1,
        }
    }
}

/// Gravity falloff and bounce
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity_scale: f32,
    pub gravity_softening: f32,
    pub gravity_distance_unit: f32,
    /// Fraction of speed kept after a bounce (0..=1)
    pub restitution: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity_scale: GRAVITY_SCALE,
            gravity_softening: GRAVITY_SOFTENING,
            gravity_distance_unit: GRAVITY_DISTANCE_UNIT,
            restitution: RESTITUTION,
        }
    }
}

/// Star field extent and culling distances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StarSettings {
    pub render_distance: f32,
    pub fade_distance: f32,
    pub cell_size: f32,
    /// Sandbox extent in viewport widths
    pub sandbox_size: f32,
    pub density: f32,
    /// Twinkle oscillation
    pub twinkle_rate: f32,
    pub twinkle_amp: f32,
    pub twinkle_bias: f32,
}

impl Default for StarSettings {
    fn default() -> Self {
        Self {
            render_distance: STAR_RENDER_DISTANCE,
            fade_distance: STAR_FADE_DISTANCE,
            cell_size: STAR_CELL_SIZE,
            sandbox_size: STAR_SANDBOX_SIZE,
            density: STAR_DENSITY,
            twinkle_rate: TWINKLE_RATE,
            twinkle_amp: TWINKLE_AMP,
            twinkle_bias: TWINKLE_BIAS,
        }
    }
}

/// Camera follow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub smoothing: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            smoothing: CAMERA_SMOOTHING,
        }
    }
}

/// Multiplayer relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetSettings {
    pub move_throttle_ms: f32,
}

impl Default for NetSettings {
    fn default() -> Self {
        Self {
            move_throttle_ms: MOVE_THROTTLE_MS,
        }
    }
}

/// A massive body as configured
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySettings {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub gravity: f32,
    /// Display colour (0xRRGGBB)
    #[serde(default = "default_body_color")]
    pub color: u32,
}

fn default_body_color() -> u32 {
    0x009900
}

impl BodySettings {
    fn new(name: &str, x: f32, y: f32, radius: f32, gravity: f32, color: u32) -> Self {
        Self {
            name: name.to_string(),
            x,
            y,
            radius,
            gravity,
            color,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Default planets, laid out around the viewport centre
pub fn default_bodies() -> Vec<BodySettings> {
    let cx = VIEW_WIDTH / 2.0;
    let cy = VIEW_HEIGHT / 2.0;
    vec![
        BodySettings::new("Earth", cx, cy, 75.0, 9.8, 0x009900),
        BodySettings::new("Mars", cx + 800.0, cy - 600.0, 55.0, 3.7, 0xff4500),
        BodySettings::new("Neptune", cx - 1200.0, cy + 900.0, 90.0, 11.2, 0x4169e1),
        BodySettings::new("Venus", cx + 1500.0, cy + 1000.0, 60.0, 8.87, 0xeccc68),
        BodySettings::new("Jupiter", cx - 2000.0, cy - 1200.0, 120.0, 24.8, 0xf7b731),
    ]
}

/// Complete sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Star-field seed; the same seed always yields the same field
    pub seed: u64,
    pub world: WorldSettings,
    pub craft: CraftSettings,
    pub physics: PhysicsSettings,
    pub stars: StarSettings,
    pub camera: CameraSettings,
    pub net: NetSettings,
    pub bodies: Vec<BodySettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: WORLD_SEED,
            world: WorldSettings::default(),
            craft: CraftSettings::default(),
            physics: PhysicsSettings::default(),
            stars: StarSettings::default(),
            camera: CameraSettings::default(),
            net: NetSettings::default(),
            bodies: default_bodies(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON, filling missing keys with defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Pretty JSON, suitable as a starting point for an override file
    pub fn to_json_pretty(&self) -> String {
        // Plain data with string keys: serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
            if !v.is_finite() {
                return Err(ConfigError::Invalid { field, reason: "must be finite" });
            }
            if v <= 0.0 {
                return Err(ConfigError::Invalid { field, reason: "must be positive" });
            }
            Ok(())
        }
        fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
            if !v.is_finite() {
                return Err(ConfigError::Invalid { field, reason: "must be finite" });
            }
            if v < 0.0 {
                return Err(ConfigError::Invalid { field, reason: "must not be negative" });
            }
            Ok(())
        }

        positive("world.view_width", self.world.view_width)?;
        positive("world.view_height", self.world.view_height)?;
        positive("world.ticks_per_second", self.world.ticks_per_second)?;

        non_negative("craft.thrust", self.craft.thrust)?;
        non_negative("craft.rotation_speed", self.craft.rotation_speed)?;
        non_negative("craft.radius", self.craft.radius)?;

        non_negative("physics.gravity_scale", self.physics.gravity_scale)?;
        non_negative("physics.gravity_softening", self.physics.gravity_softening)?;
        positive("physics.gravity_distance_unit", self.physics.gravity_distance_unit)?;
        non_negative("physics.restitution", self.physics.restitution)?;
        if self.physics.restitution > 1.0 {
            return Err(ConfigError::Invalid {
                field: "physics.restitution",
                reason: "must not exceed 1.0",
            });
        }

        positive("stars.cell_size", self.stars.cell_size)?;
        non_negative("stars.render_distance", self.stars.render_distance)?;
        non_negative("stars.fade_distance", self.stars.fade_distance)?;
        non_negative("stars.sandbox_size", self.stars.sandbox_size)?;
        non_negative("stars.density", self.stars.density)?;
        let total = star_total(self.stars.density, self.stars.sandbox_size);
        if !total.is_finite() || total > MAX_STARS as f32 {
            return Err(ConfigError::Invalid {
                field: "stars.density",
                reason: "density and sandbox size yield too many stars",
            });
        }
        let cull = self.stars.render_distance + self.stars.fade_distance;
        let span = (cull / self.stars.cell_size).ceil() + 1.0;
        if !span.is_finite() || span > MAX_QUERY_SPAN_CELLS as f32 {
            return Err(ConfigError::Invalid {
                field: "stars.cell_size",
                reason: "too small for render_distance + fade_distance",
            });
        }

        non_negative("camera.smoothing", self.camera.smoothing)?;
        positive("net.move_throttle_ms", self.net.move_throttle_ms)?;

        for body in &self.bodies {
            non_negative("bodies[].radius", body.radius)?;
            if !body.x.is_finite() || !body.y.is_finite() || !body.gravity.is_finite() {
                return Err(ConfigError::Invalid {
                    field: "bodies[]",
                    reason: "position and gravity must be finite",
                });
            }
        }

        Ok(())
    }

    pub fn gravity_params(&self) -> GravityParams {
        GravityParams {
            scale: self.physics.gravity_scale,
            softening: self.physics.gravity_softening,
            distance_unit: self.physics.gravity_distance_unit,
        }
    }

    pub fn craft_params(&self) -> CraftParams {
        CraftParams {
            thrust: self.craft.thrust,
            rotation_speed: self.craft.rotation_speed,
            ticks_per_second: self.world.ticks_per_second,
        }
    }

    pub fn visibility_params(&self) -> VisibilityParams {
        VisibilityParams {
            render_distance: self.stars.render_distance,
            fade_distance: self.stars.fade_distance,
            twinkle_rate: self.stars.twinkle_rate,
            twinkle_amp: self.stars.twinkle_amp,
            twinkle_bias: self.stars.twinkle_bias,
        }
    }

    /// Where the craft spawns: offset from the first body, or the origin
    pub fn spawn_point(&self) -> Vec2 {
        let anchor = self.bodies.first().map(|b| b.position()).unwrap_or(Vec2::ZERO);
        anchor + Vec2::new(self.craft.spawn_offset_x, self.craft.spawn_offset_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.bodies.len(), 5);
        assert_eq!(settings.spawn_point(), Vec2::new(200.0, 200.0));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{"seed": 7, "stars": {"density": 2.0}}"#).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.stars.density, 2.0);
        assert_eq!(settings.stars.cell_size, STAR_CELL_SIZE);
        assert_eq!(settings.bodies.len(), 5);
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        let err = Settings::from_json(r#"{"stars": {"cell_size": 0.0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "stars.cell_size", .. }));
    }

    #[test]
    fn test_rejects_amplifying_restitution() {
        let err = Settings::from_json(r#"{"physics": {"restitution": 1.5}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "physics.restitution", .. }));
    }

    #[test]
    fn test_rejects_unbounded_star_count() {
        let err = Settings::from_json(r#"{"stars": {"density": 1e30}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "stars.density", .. }));
        let err = Settings::from_json(r#"{"stars": {"sandbox_size": 1e20}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "stars.density", .. }));
    }

    #[test]
    fn test_rejects_cull_distance_beyond_grid_query() {
        let err = Settings::from_json(r#"{"stars": {"render_distance": 100000}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "stars.cell_size", .. }));

        // Same distances with cells large enough to cover them
        let ok = Settings::from_json(
            r#"{"stars": {"render_distance": 100000, "cell_size": 50000}}"#,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Settings::from_json("{not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_json_roundtrip_preserves_bodies() {
        let json = Settings::default().to_json_pretty();
        let back = Settings::from_json(&json).unwrap();
        assert_eq!(back.bodies[4].name, "Jupiter");
        assert_eq!(back.bodies[4].position(), Vec2::new(-1600.0, -900.0));
    }
}
