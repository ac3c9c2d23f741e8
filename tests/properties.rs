//! Cross-module properties of the simulation and relay

use glam::Vec2;
use proptest::prelude::*;

use orbital_sandbox::net::{ClientMessage, Delta, Position, RelayServer};
use orbital_sandbox::sim::{
    Body, CellKey, Craft, GravityParams, SpatialGrid, StarField, VisibilityManager,
    VisibilityParams, acceleration_at, resolve,
};

fn coord() -> impl Strategy<Value = f32> {
    -5000.0f32..5000.0
}

fn point() -> impl Strategy<Value = Vec2> {
    (coord(), coord()).prop_map(|(x, y)| Vec2::new(x, y))
}

proptest! {
    #[test]
    fn grid_point_found_at_zero_radius(
        cell in 50.0f32..1000.0,
        points in prop::collection::vec(point(), 1..40),
    ) {
        let mut grid = SpatialGrid::new(cell);
        for (i, &p) in points.iter().enumerate() {
            grid.insert(p, i);
        }
        for (i, &p) in points.iter().enumerate() {
            prop_assert!(grid.query_radius(p, 0.0).contains(&i), "point {i} at {p} missing");
        }
    }

    #[test]
    fn grid_query_has_no_false_negatives(
        cell in 100.0f32..1000.0,
        center in point(),
        radius in 0.0f32..3000.0,
        points in prop::collection::vec(point(), 1..60),
    ) {
        let mut grid = SpatialGrid::new(cell);
        for (i, &p) in points.iter().enumerate() {
            grid.insert(p, i);
        }
        let found = grid.query_radius(center, radius);
        for (i, &p) in points.iter().enumerate() {
            if p.distance(center) <= radius {
                prop_assert!(
                    found.contains(&i),
                    "point {i} at {p} within {radius} of {center} missing"
                );
            }
        }
    }

    #[test]
    fn gravity_points_toward_body(
        body_pos in point(),
        probe in point(),
        gravity in 0.1f32..50.0,
    ) {
        prop_assume!(body_pos.distance(probe) > 0.01);
        let bodies = [Body::new("b", body_pos, 50.0, gravity)];
        let acc = acceleration_at(probe, &bodies, &GravityParams::default());
        prop_assert!(acc.dot(body_pos - probe) > 0.0);
    }

    #[test]
    fn collision_leaves_craft_on_boundary(
        body_pos in (-1000.0f32..1000.0, -1000.0f32..1000.0),
        body_radius in 10.0f32..200.0,
        craft_radius in 1.0f32..30.0,
        angle in 0.0f32..std::f32::consts::TAU,
        depth in 0.0f32..1.0,
        velocity in (-20.0f32..20.0, -20.0f32..20.0),
        restitution in 0.0f32..=1.0,
    ) {
        let center = Vec2::new(body_pos.0, body_pos.1);
        let boundary = body_radius + craft_radius;
        let start = center + Vec2::from_angle(angle) * boundary * depth;
        prop_assume!(start.distance(center) > 1e-3);

        let body = Body::new("b", center, body_radius, 1.0);
        let mut craft = Craft::new(start, 0.0, craft_radius);
        craft.velocity = Vec2::new(velocity.0, velocity.1);
        let speed_before = craft.speed();

        let contacts = resolve(&mut craft, std::slice::from_ref(&body), restitution);

        prop_assert_eq!(contacts.len(), 1);
        prop_assert!((craft.position.distance(center) - boundary).abs() < 1e-2);
        prop_assert!(craft.speed() <= speed_before * restitution * (1.0 + 1e-5) + 1e-5);
    }

    #[test]
    fn visibility_respects_render_and_cull_distance(
        center in point(),
        stars in prop::collection::vec((point(), 0.3f32..0.8), 1..60),
    ) {
        let params = VisibilityParams::default();
        let mut field = StarField::new(800.0);
        for &(p, alpha) in &stars {
            field.add(p, 1.0, alpha, 0.0);
        }
        let mut manager = VisibilityManager::new(params);
        manager.update(&mut field, center);

        for star in field.iter() {
            let d = star.position.distance(center);
            if d <= params.render_distance {
                prop_assert!(star.visible);
                prop_assert_eq!(star.alpha, star.base_alpha);
            } else if d >= params.cull_distance() {
                prop_assert!(!star.visible);
            }
        }
    }

    #[test]
    fn roster_tracks_moves_and_forgets_on_disconnect(
        start in (-1000.0f32..1000.0, -1000.0f32..1000.0),
        moves in prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0), 0..50),
    ) {
        let mut server = RelayServer::new();
        let id = server.connect();
        server.handle(id, ClientMessage::InitPosition(Position { x: start.0, y: start.1 }));

        let mut expected = Vec2::new(start.0, start.1);
        for &(dx, dy) in &moves {
            server.handle(id, ClientMessage::Move(Delta { dx, dy }));
            expected += Vec2::new(dx, dy);
        }
        prop_assert_eq!(server.position(id), Some(expected));

        server.disconnect(id);
        prop_assert!(server.position(id).is_none());
        prop_assert!(server.roster().is_empty());
    }
}

#[test]
fn grid_lookup_near_cell_corner() {
    let mut grid = SpatialGrid::new(800.0);
    let key = grid.insert(Vec2::new(1000.0, 1000.0), 7u32);
    assert_eq!(key, CellKey::new(1, 1));
    assert!(grid.query_radius(Vec2::new(950.0, 950.0), 100.0).contains(&7));
}

#[test]
fn craft_inside_body_is_pushed_to_surface_and_bounced() {
    let body = Body::new("Earth", Vec2::new(400.0, 300.0), 75.0, 9.8);
    let mut craft = Craft::new(Vec2::new(480.0, 300.0), 0.0, 12.0);
    craft.velocity = Vec2::new(5.0, 0.0);

    let contacts = resolve(&mut craft, std::slice::from_ref(&body), 0.5);

    assert_eq!(contacts.len(), 1);
    assert!((craft.position.distance(body.position) - 87.0).abs() < 1e-4);
    assert!(craft.velocity.x < 0.0 && craft.velocity.x.abs() <= 5.0);
    assert!((craft.velocity - Vec2::new(-2.5, 0.0)).length() < 1e-5);
}

#[test]
fn bodies_are_resolved_in_list_order() {
    let bodies = [
        Body::new("first", Vec2::ZERO, 50.0, 1.0),
        Body::new("second", Vec2::new(100.0, 0.0), 50.0, 1.0),
    ];
    let mut craft = Craft::new(Vec2::new(45.0, 0.0), 0.0, 10.0);
    craft.velocity = Vec2::new(1.0, 0.0);

    let contacts = resolve(&mut craft, &bodies, 0.5);

    // Pushed out of the first body into the second, then out of the second
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].body, 0);
    assert_eq!(contacts[1].body, 1);
    assert_eq!(craft.position, Vec2::new(40.0, 0.0));
    assert_eq!(craft.velocity, Vec2::new(0.25, 0.0));
    assert!((craft.position.distance(bodies[1].position) - 60.0).abs() < 1e-4);
}
