//! Stylized gravity from massive bodies
//!
//! Not Newtonian: each body contributes
//! `g = (gravity * scale) / (2 * ((d + softening) / distance_unit)^2)`
//! toward its centre. The softening offset keeps the pull finite at `d = 0`
//! and gives the strong-but-bounded near field the sandbox is tuned around.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Body;
use crate::consts::{GRAVITY_DISTANCE_UNIT, GRAVITY_SCALE, GRAVITY_SOFTENING};
use crate::{direction_or, is_finite_vec};

/// Falloff constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityParams {
    pub scale: f32,
    pub softening: f32,
    pub distance_unit: f32,
}

impl Default for GravityParams {
    fn default() -> Self {
        Self {
            scale: GRAVITY_SCALE,
            softening: GRAVITY_SOFTENING,
            distance_unit: GRAVITY_DISTANCE_UNIT,
        }
    }
}

impl GravityParams {
    /// Pull magnitude at distance `d` from a body of strength `gravity`
    #[inline]
    pub fn magnitude(&self, gravity: f32, d: f32) -> f32 {
        let scaled = (d + self.softening) / self.distance_unit;
        (gravity * self.scale) / (2.0 * scaled * scaled)
    }
}

/// Combined acceleration at `point` from every body.
///
/// A body sitting exactly on `point` pulls along +X. Bodies whose
/// contribution is not finite are skipped.
pub fn acceleration_at(point: Vec2, bodies: &[Body], params: &GravityParams) -> Vec2 {
    let mut total = Vec2::ZERO;
    for body in bodies {
        let to_body = body.position - point;
        let g = params.magnitude(body.gravity, to_body.length());
        let contribution = direction_or(to_body, Vec2::X) * g;
        if is_finite_vec(contribution) {
            total += contribution;
        }
    }
    total
}
