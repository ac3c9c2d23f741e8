//! Smoothed follow camera
//!
//! The camera stores the world offset applied to the scene: a world point
//! `p` appears on screen at `p + offset`. Following eases the offset toward
//! the value that centres the target.

use glam::Vec2;

#[derive(Debug, Clone)]
pub struct Camera {
    pub offset: Vec2,
    pub view_size: Vec2,
    /// Fraction of the remaining distance covered per frame (0..=1)
    pub smoothing: f32,
}

impl Camera {
    pub fn new(view_width: f32, view_height: f32, smoothing: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            view_size: Vec2::new(view_width, view_height),
            smoothing: smoothing.clamp(0.0, 1.0),
        }
    }

    /// Offset that puts `target` at the centre of the view
    pub fn centering_offset(&self, target: Vec2) -> Vec2 {
        self.view_size / 2.0 - target
    }

    /// Ease toward centring `target`
    pub fn follow(&mut self, target: Vec2) {
        let goal = self.centering_offset(target);
        self.offset += (goal - self.offset) * self.smoothing;
    }

    /// Jump straight to centring `target`
    pub fn snap_to(&mut self, target: Vec2) {
        self.offset = self.centering_offset(target);
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world + self.offset
    }

    /// Whether a circle is at least partly inside the view
    pub fn is_on_screen(&self, world: Vec2, radius: f32) -> bool {
        let s = self.world_to_screen(world);
        s.x > -radius
            && s.x < self.view_size.x + radius
            && s.y > -radius
            && s.y < self.view_size.y + radius
    }
}
