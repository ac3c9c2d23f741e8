//! Local simulation module
//!
//! All flight and star-field logic lives here. This module stays pure:
//! - Explicit `World` context, no globals
//! - Input sampled once per tick as a `TickInput`
//! - Seeded star generation
//! - No rendering or transport dependencies

pub mod camera;
pub mod collision;
pub mod grid;
pub mod gravity;
pub mod stars;
pub mod state;
pub mod tick;
pub mod visibility;

pub use camera::Camera;
pub use collision::{Contact, reflect_velocity, resolve};
pub use gravity::{GravityParams, acceleration_at};
pub use grid::{CellKey, MAX_QUERY_SPAN_CELLS, SpatialGrid};
pub use stars::{StarField, star_count, star_total};
pub use state::{Body, Craft, StarId, StarRecord, World};
pub use tick::{CraftParams, TickInput, TickReport, integrate, tick};
pub use visibility::{StarEvent, VisibilityManager, VisibilityParams, VisibilityStats};
