//! Orbital Sandbox - a 2D orbital-flight sandbox
//!
//! Core modules:
//! - `sim`: Simulation (gravity, integration, collisions, star culling)
//! - `net`: Position relay protocol (client roster, server roster, hub)
//! - `settings`: Data-driven world configuration
//! - `hud`: Presentation-side readouts derived from simulation state

pub mod error;
pub mod hud;
pub mod net;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, ProtocolError};
pub use settings::Settings;

use glam::Vec2;

/// Default tunables, mirrored by `Settings::default()`
pub mod consts {
    /// Frames per second the frame-based `dt` is measured against
    pub const TICKS_PER_SECOND: f32 = 60.0;

    /// Viewport dimensions
    pub const VIEW_WIDTH: f32 = 800.0;
    pub const VIEW_HEIGHT: f32 = 600.0;

    /// Craft defaults
    pub const CRAFT_THRUST: f32 = 0.1;
    pub const CRAFT_ROTATION_SPEED: f32 = 180.0; // degrees per second
    pub const CRAFT_RADIUS: f32 = 12.0;
    pub const CRAFT_START_ORIENTATION: f32 = -90.0; // nose toward screen-up
    /// Spawn offset from the first body
    pub const CRAFT_SPAWN_OFFSET: (f32, f32) = (-200.0, -100.0);

    /// Stylized gravity falloff: g = (gravity * SCALE) / (2 * ((d + SOFTENING) / DISTANCE_UNIT)^2)
    pub const GRAVITY_SCALE: f32 = 5.0;
    pub const GRAVITY_SOFTENING: f32 = 160.0;
    pub const GRAVITY_DISTANCE_UNIT: f32 = 15.0;

    /// Fraction of velocity kept after bouncing off a body
    pub const RESTITUTION: f32 = 0.5;

    /// Star field
    pub const STAR_RENDER_DISTANCE: f32 = 1200.0;
    pub const STAR_FADE_DISTANCE: f32 = 200.0;
    pub const STAR_CELL_SIZE: f32 = 800.0;
    pub const STAR_SANDBOX_SIZE: f32 = 100.0;
    pub const STAR_DENSITY: f32 = 50.0;
    /// Upper bound on generated stars, whatever the density
    pub const MAX_STARS: usize = 4_000_000;

    /// Twinkle oscillation: alpha * (sin(t * RATE + phase) * AMP + BIAS)
    pub const TWINKLE_RATE: f32 = 2.0;
    pub const TWINKLE_AMP: f32 = 0.3;
    pub const TWINKLE_BIAS: f32 = 0.7;

    pub const CAMERA_SMOOTHING: f32 = 0.1;

    /// Minimum milliseconds between outbound `move` messages
    pub const MOVE_THROTTLE_MS: f32 = 30.0;

    /// Default star-field seed
    pub const WORLD_SEED: u64 = 0x5EED;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Angle (radians) of the vector pointing from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector along `v`, or `fallback` when `v` has no usable direction
#[inline]
pub fn direction_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.length();
    if len > f32::EPSILON && len.is_finite() {
        v / len
    } else {
        fallback
    }
}

/// Heading unit vector for an orientation in degrees
#[inline]
pub fn heading(orientation_deg: f32) -> Vec2 {
    let theta = orientation_deg.to_radians();
    Vec2::new(theta.cos(), theta.sin())
}

/// True when both components are finite
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
