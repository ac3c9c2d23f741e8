//! HUD readouts derived from simulation state
//!
//! Pure functions: the presentation layer draws whatever these return.

use glam::Vec2;

use crate::angle_between;
use crate::sim::{Body, Camera, VisibilityStats};

/// Distance an edge indicator keeps from the viewport border
pub const INDICATOR_MARGIN: f32 = 30.0;

/// Speed rounded to the nearest 0.2
pub fn speed_readout(speed: f32) -> f32 {
    (speed * 5.0).round() / 5.0
}

pub fn speed_text(speed: f32) -> String {
    format!("Speed: {} m/s", speed_readout(speed))
}

/// `("Stars: visible/total", "Checked: n")`
pub fn star_texts(stats: &VisibilityStats) -> (String, String) {
    (
        format!("Stars: {}/{}", stats.visible, stats.total),
        format!("Checked: {}", stats.checked),
    )
}

/// Arrow pinned to the viewport edge pointing at an off-screen body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyIndicator {
    /// Index into the body list
    pub body: usize,
    /// Screen position
    pub position: Vec2,
    /// Radians; the arrow art points along -X, hence the extra half turn
    pub rotation: f32,
    pub color: u32,
}

/// One indicator per body that is completely off screen
pub fn body_indicators(bodies: &[Body], camera: &Camera) -> Vec<BodyIndicator> {
    let size = camera.view_size;
    let center = size / 2.0;
    let margin = INDICATOR_MARGIN;

    bodies
        .iter()
        .enumerate()
        .filter(|(_, body)| !camera.is_on_screen(body.position, body.radius))
        .filter_map(|(index, body)| {
            let screen = camera.world_to_screen(body.position);
            let n = (screen - center).try_normalize()?;

            let (x, y) = if n.x.abs() > n.y.abs() {
                let slope = n.y / n.x;
                if n.x > 0.0 {
                    (size.x - margin, center.y + slope * (center.x - margin))
                } else {
                    (margin, center.y - slope * (center.x - margin))
                }
            } else {
                let slope = n.x / n.y;
                if n.y > 0.0 {
                    (center.x + slope * (center.y - margin), size.y - margin)
                } else {
                    (center.x - slope * (center.y - margin), margin)
                }
            };

            Some(BodyIndicator {
                body: index,
                position: Vec2::new(
                    x.clamp(margin, size.x - margin),
                    y.clamp(margin, size.y - margin),
                ),
                rotation: angle_between(center, screen) + std::f32::consts::PI,
                color: body.color,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at_origin() -> Camera {
        let mut cam = Camera::new(800.0, 600.0, 0.1);
        cam.snap_to(Vec2::ZERO);
        cam
    }

    #[test]
    fn test_speed_readout_rounds_to_fifth() {
        assert_eq!(speed_readout(1.23), 1.2);
        assert_eq!(speed_readout(1.31), 1.4);
        assert_eq!(speed_text(0.0), "Speed: 0 m/s");
    }

    #[test]
    fn test_star_texts() {
        let stats = VisibilityStats {
            visible: 3,
            checked: 10,
            total: 100,
        };
        let (stars, checked) = star_texts(&stats);
        assert_eq!(stars, "Stars: 3/100");
        assert_eq!(checked, "Checked: 10");
    }

    #[test]
    fn test_on_screen_body_has_no_indicator() {
        let bodies = [Body::new("near", Vec2::new(100.0, 50.0), 20.0, 1.0)];
        assert!(body_indicators(&bodies, &camera_at_origin()).is_empty());
    }

    #[test]
    fn test_indicator_pins_to_right_edge() {
        let bodies = [Body::new("far", Vec2::new(5000.0, 0.0), 20.0, 1.0)];
        let ind = body_indicators(&bodies, &camera_at_origin());
        assert_eq!(ind.len(), 1);
        assert!((ind[0].position - Vec2::new(770.0, 300.0)).length() < 1e-3);
        assert!((ind[0].rotation - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_indicator_pins_to_top_edge_and_clamps() {
        let bodies = [Body::new("up", Vec2::new(-10.0, -4000.0), 20.0, 1.0)];
        let ind = body_indicators(&bodies, &camera_at_origin());
        assert_eq!(ind.len(), 1);
        assert_eq!(ind[0].position.y, 30.0);
        assert!(ind[0].position.x < 400.0 && ind[0].position.x >= 30.0);
    }
}
