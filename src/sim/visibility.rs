//! Star culling, distance fade and twinkle
//!
//! Each frame the manager asks the grid for stars near the craft, keeps those
//! within `render_distance + fade_distance`, and diffs the result against the
//! previous visible set. Work is proportional to the cells around the craft,
//! never to the size of the whole field.
//!
//! Presentation is told what changed through [`StarEvent`]s: a star gets a
//! handle created the first time it is seen, attached whenever it enters the
//! visible set and detached when it leaves. Records are never destroyed.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::stars::StarField;
use super::state::StarId;
use crate::consts::*;
use crate::distance;

/// Culling and twinkle tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityParams {
    pub render_distance: f32,
    pub fade_distance: f32,
    pub twinkle_rate: f32,
    pub twinkle_amp: f32,
    pub twinkle_bias: f32,
}

impl Default for VisibilityParams {
    fn default() -> Self {
        Self {
            render_distance: STAR_RENDER_DISTANCE,
            fade_distance: STAR_FADE_DISTANCE,
            twinkle_rate: TWINKLE_RATE,
            twinkle_amp: TWINKLE_AMP,
            twinkle_bias: TWINKLE_BIAS,
        }
    }
}

impl VisibilityParams {
    /// Stars at or beyond this distance are never visible
    pub fn cull_distance(&self) -> f32 {
        self.render_distance + self.fade_distance
    }

    /// Alpha for a star of `base_alpha` at distance `d` (assumes d < cull distance)
    pub fn faded_alpha(&self, base_alpha: f32, d: f32) -> f32 {
        if d <= self.render_distance || self.fade_distance <= 0.0 {
            base_alpha
        } else {
            let progress = (d - self.render_distance) / self.fade_distance;
            base_alpha * (1.0 - progress.clamp(0.0, 1.0))
        }
    }

    /// Twinkle multiplier at `time` seconds for a star with `phase`
    pub fn twinkle(&self, time: f32, phase: f32) -> f32 {
        (time * self.twinkle_rate + phase).sin() * self.twinkle_amp + self.twinkle_bias
    }
}

/// What presentation must do for a star this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarEvent {
    /// First sighting: build a drawable for this star
    Created(StarId),
    /// Entered the visible set: add its drawable to the scene
    Attached(StarId),
    /// Left the visible set: remove its drawable (keep it for reuse)
    Detached(StarId),
}

/// Counters for the HUD
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityStats {
    /// Stars currently visible
    pub visible: usize,
    /// Grid candidates distance-checked this frame
    pub checked: usize,
    /// Stars in the field
    pub total: usize,
}

/// Tracks the visible subset of a `StarField`
#[derive(Debug, Clone)]
pub struct VisibilityManager {
    params: VisibilityParams,
    visible: Vec<StarId>,
    events: Vec<StarEvent>,
    last_stats: VisibilityStats,
    // Per-frame scratch, kept to reuse allocations
    candidates: Vec<StarId>,
    next: Vec<StarId>,
    next_set: HashSet<StarId>,
}

impl VisibilityManager {
    pub fn new(params: VisibilityParams) -> Self {
        Self {
            params,
            visible: Vec::new(),
            events: Vec::new(),
            last_stats: VisibilityStats::default(),
            candidates: Vec::new(),
            next: Vec::new(),
            next_set: HashSet::new(),
        }
    }

    pub fn params(&self) -> &VisibilityParams {
        &self.params
    }

    /// Recompute the visible set around `center`
    pub fn update(&mut self, stars: &mut StarField, center: Vec2) -> VisibilityStats {
        let cull = self.params.cull_distance();

        self.candidates.clear();
        stars.grid().query_radius_into(center, cull, &mut self.candidates);

        self.next.clear();
        self.next_set.clear();

        for &id in &self.candidates {
            let Some(star) = stars.get_mut(id) else {
                continue;
            };
            let d = distance(center, star.position);
            if d.is_nan() || d >= cull {
                continue;
            }

            star.alpha = self.params.faded_alpha(star.base_alpha, d);
            star.display_alpha = star.alpha;

            if !star.visible {
                star.visible = true;
                if !star.has_handle {
                    star.has_handle = true;
                    self.events.push(StarEvent::Created(id));
                }
                self.events.push(StarEvent::Attached(id));
            }

            self.next_set.insert(id);
            self.next.push(id);
        }

        for &id in &self.visible {
            if self.next_set.contains(&id) {
                continue;
            }
            if let Some(star) = stars.get_mut(id) {
                star.visible = false;
                star.display_alpha = 0.0;
            }
            self.events.push(StarEvent::Detached(id));
        }

        std::mem::swap(&mut self.visible, &mut self.next);

        self.last_stats = VisibilityStats {
            visible: self.visible.len(),
            checked: self.candidates.len(),
            total: stars.len(),
        };
        self.last_stats
    }

    /// Twinkle the visible stars. Only `display_alpha` changes.
    pub fn animate(&self, stars: &mut StarField, time: f32) {
        for &id in &self.visible {
            if let Some(star) = stars.get_mut(id) {
                star.display_alpha = star.alpha * self.params.twinkle(time, star.phase);
            }
        }
    }

    /// Events produced since the last call
    pub fn take_events(&mut self) -> Vec<StarEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn visible_ids(&self) -> &[StarId] {
        &self.visible
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn last_stats(&self) -> VisibilityStats {
        self.last_stats
    }
}
