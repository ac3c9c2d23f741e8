//! Per-frame simulation step
//!
//! One ordered pass: integrate the craft under gravity and thrust, resolve
//! body collisions, cull the star field around the new position, twinkle,
//! then ease the camera. `dt` is in frames (1.0 == one frame at
//! `ticks_per_second`), and every velocity/acceleration product uses it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Contact, resolve};
use super::gravity::{GravityParams, acceleration_at};
use super::state::{Body, Craft, World};
use super::visibility::{StarEvent, VisibilityStats};
use crate::consts::*;
use crate::is_finite_vec;

/// Control state sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub thrust: bool,
}

/// Craft handling constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CraftParams {
    /// Thrust acceleration per frame
    pub thrust: f32,
    /// Degrees per second
    pub rotation_speed: f32,
    pub ticks_per_second: f32,
}

impl Default for CraftParams {
    fn default() -> Self {
        Self {
            thrust: CRAFT_THRUST,
            rotation_speed: CRAFT_ROTATION_SPEED,
            ticks_per_second: TICKS_PER_SECOND,
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub contacts: Vec<Contact>,
    pub stats: VisibilityStats,
    pub star_events: Vec<StarEvent>,
}

/// Advance the craft by `dt` frames using semi-implicit Euler.
///
/// Velocity is the only persistent rate: `v += a * dt; p += v * dt`.
/// If the result is not finite the craft keeps its old position and stops.
pub fn integrate(
    craft: &mut Craft,
    bodies: &[Body],
    input: &TickInput,
    dt: f32,
    params: &CraftParams,
    gravity: &GravityParams,
) {
    if !dt.is_finite() || dt <= 0.0 {
        return;
    }

    let turn = match (input.rotate_left, input.rotate_right) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    };
    if turn != 0.0 {
        let degrees = turn * params.rotation_speed * dt / params.ticks_per_second;
        craft.orientation = (craft.orientation + degrees).rem_euclid(360.0);
    }

    let mut acceleration = acceleration_at(craft.position, bodies, gravity);
    if input.thrust {
        acceleration += craft.heading() * params.thrust;
    }

    let velocity = craft.velocity + acceleration * dt;
    let position = craft.position + velocity * dt;

    if is_finite_vec(velocity) && is_finite_vec(position) {
        craft.velocity = velocity;
        craft.position = position;
    } else {
        log::warn!("Non-finite craft state after integration, halting craft");
        craft.velocity = Vec2::ZERO;
    }
}

/// Advance the world by one frame of `dt` frames
pub fn tick(world: &mut World, input: &TickInput, dt: f32) -> TickReport {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    let craft_params = world.settings.craft_params();
    let gravity = world.settings.gravity_params();
    integrate(&mut world.craft, &world.bodies, input, dt, &craft_params, &gravity);

    let contacts = resolve(
        &mut world.craft,
        &world.bodies,
        world.settings.physics.restitution,
    );
    for contact in &contacts {
        log::debug!(
            "Bounced off {} at speed {:.2}",
            world.bodies[contact.body].name,
            contact.impact_speed
        );
    }

    let stats = world.visibility.update(&mut world.stars, world.craft.position);

    world.time_ticks += 1;
    world.elapsed_frames += dt;
    let time_secs = world.elapsed_secs();
    world.visibility.animate(&mut world.stars, time_secs);

    world.camera.follow(world.craft.position);

    TickReport {
        contacts,
        stats,
        star_events: world.visibility.take_events(),
    }
}
