//! Craft-versus-body collision detection and response
//!
//! Circle-circle only. Each overlapping body pushes the craft back onto its
//! contact boundary and reflects the velocity with a lossy bounce. Bodies are
//! handled one after another in list order with no impulse accumulation, so
//! a craft wedged between two overlapping bodies can end up inside the first
//! one again. The sandbox keeps bodies far apart, which makes this acceptable.

use glam::Vec2;

use super::state::{Body, Craft};
use crate::{direction_or, is_finite_vec};

/// A resolved overlap with one body
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    /// Index into the body list
    pub body: usize,
    /// Unit normal from body centre toward the craft
    pub normal: Vec2,
    /// How far the craft had sunk past the boundary
    pub penetration: f32,
    /// Speed before the bounce
    pub impact_speed: f32,
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// True when the craft touches or overlaps the body (boundary inclusive)
#[inline]
pub fn overlaps(craft: &Craft, body: &Body) -> bool {
    (craft.position - body.position).length() <= body.radius + craft.radius
}

/// Push the craft out of every body it overlaps and bounce it.
///
/// `restitution` is clamped to `[0, 1]` so a bounce never adds energy.
/// A craft exactly at a body centre is pushed out along +X.
pub fn resolve(craft: &mut Craft, bodies: &[Body], restitution: f32) -> Vec<Contact> {
    let restitution = if restitution.is_finite() {
        restitution.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut contacts = Vec::new();

    for (index, body) in bodies.iter().enumerate() {
        let offset = craft.position - body.position;
        let distance = offset.length();
        let boundary = body.radius + craft.radius;

        if !distance.is_finite() || !boundary.is_finite() || distance > boundary {
            continue;
        }

        let normal = direction_or(offset, Vec2::X);
        let impact_speed = craft.velocity.length();

        craft.position = body.position + normal * boundary;
        let bounced = reflect_velocity(craft.velocity, normal) * restitution;
        craft.velocity = if is_finite_vec(bounced) { bounced } else { Vec2::ZERO };

        contacts.push(Contact {
            body: index,
            normal,
            penetration: boundary - distance,
            impact_speed,
        });
    }

    contacts
}
