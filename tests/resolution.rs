mod common;

use avian2d::math::Vector;
use avian2d::prelude::*;
use bevy::prelude::*;

use common::*;
use ravine::kinematics::prelude::*;
use ravine::physics::obstacle_layers;
use ravine::player::{Player, PlayerConfig};

#[test]
fn unobstructed_movement_is_applied_in_full() {
    let mut app = physics_app();
    let body = spawn_body(&mut app, Vec2::new(1.0, 1.6), Vec2::ZERO);
    settle(&mut app);

    let delta = Vector::new(1.0, 0.5);
    let applied = resolve_move(&mut app, body, delta, Vector::ZERO);

    assert_eq!(applied, delta);
    let state = collision_state(&app, body);
    assert!(!state.left && !state.right && !state.above && !state.below);
    assert!((position(&app, body) - delta).length() < 1e-6);
}

#[test]
fn wall_clamps_horizontal_movement_to_the_gap() {
    let mut app = physics_app();
    // Wall's left face at x = 5; body's right face at x = 0.5.
    spawn_block(&mut app, Vec2::new(2.0, 4.0), Vec2::new(6.0, 0.0));
    let body = spawn_body(&mut app, Vec2::new(1.0, 1.6), Vec2::ZERO);
    settle(&mut app);

    let applied = resolve_move(&mut app, body, Vector::new(10.0, 0.0), Vector::ZERO);

    assert!((applied.x - 4.5).abs() < 1e-3);
    assert_eq!(applied.y, 0.0);
    let state = collision_state(&app, body);
    assert!(state.right);
    assert!(!state.left);
}

#[test]
fn standing_body_still_reports_wall_contact() {
    let mut app = physics_app();
    spawn_block(&mut app, Vec2::new(2.0, 4.0), Vec2::new(1.5, 0.0));
    // Body flush against the wall's left face at x = 0.5.
    let body = spawn_body(&mut app, Vec2::new(1.0, 1.6), Vec2::ZERO);
    settle(&mut app);

    // No horizontal motion at all; the short feeler rays must still find
    // the wall the body is facing.
    resolve_move(&mut app, body, Vector::ZERO, Vector::ZERO);

    let state = collision_state(&app, body);
    assert!(state.right);
}

#[test]
fn climbable_slope_redirects_movement_along_the_surface() {
    let mut app = physics_app();
    // Flat ground with a 45 degree ramp rising from x = 6.
    spawn_block(&mut app, Vec2::new(30.0, 2.0), Vec2::new(4.0, -1.0));
    app.world_mut().spawn((
        Collider::triangle(
            Vector::new(-2.0, -1.0),
            Vector::new(2.0, -1.0),
            Vector::new(2.0, 3.0),
        ),
        obstacle_layers(),
        Transform::from_xyz(8.0, 1.0, 0.0),
    ));
    let body = spawn_body(&mut app, Vec2::new(1.0, 1.6), Vec2::new(5.4, 0.8));
    settle(&mut app);

    // Walking right with a gravity component; the slope should win.
    let applied = resolve_move(&mut app, body, Vector::new(0.5, -0.3), Vector::ZERO);

    let state = collision_state(&app, body);
    assert!(state.climbing_slope);
    assert!(state.below);
    assert!((state.slope_angle - 45f32.to_radians()).abs() < 1e-3);
    assert!(applied.x > 0.0);
    assert!(applied.y > 0.0, "requested downward, redirected up the slope");
    assert!(applied.x < 0.5);

    // The first move ended in contact with the ramp; from here the climb is
    // a pure redirect and the displacement follows the surface exactly.
    let applied = resolve_move(&mut app, body, Vector::new(0.5, -0.3), Vector::ZERO);
    assert!(collision_state(&app, body).climbing_slope);
    assert!(
        (applied.y / applied.x - 45f32.to_radians().tan()).abs() < 1e-3,
        "displacement should follow the 45 degree surface, got {applied:?}"
    );
}

fn spawn_ledge(app: &mut App, position: Vec2) {
    app.world_mut().spawn((
        Collider::rectangle(4.0, 0.2),
        obstacle_layers(),
        OneWayPlatform,
        Transform::from_translation(position.extend(0.0)),
    ));
}

#[test]
fn one_way_platform_ignores_upward_movement() {
    let mut app = physics_app();
    // Ledge spanning y = 1.9..2.1, body top edge at y = 1.6.
    spawn_ledge(&mut app, Vec2::new(0.0, 2.0));
    let body = spawn_body(&mut app, Vec2::new(1.0, 1.6), Vec2::new(0.0, 0.8));
    settle(&mut app);

    let applied = resolve_move(&mut app, body, Vector::new(0.0, 1.0), Vector::ZERO);

    assert_eq!(applied.y, 1.0);
    assert!(!collision_state(&app, body).above);
}

#[test]
fn one_way_platform_catches_a_falling_body() {
    let mut app = physics_app();
    spawn_ledge(&mut app, Vec2::new(0.0, 2.0));
    // Body bottom edge at y = 3.2, ledge top at y = 2.1.
    let body = spawn_body(&mut app, Vec2::new(1.0, 1.6), Vec2::new(0.0, 4.0));
    settle(&mut app);

    let applied = resolve_move(&mut app, body, Vector::new(0.0, -2.0), Vector::ZERO);

    assert!((applied.y + 1.1).abs() < 1e-3);
    assert!(collision_state(&app, body).below);
}

#[test]
fn holding_down_drops_through_a_one_way_platform() {
    let mut app = physics_app();
    spawn_ledge(&mut app, Vec2::new(0.0, 2.0));
    // Resting flush on the ledge top at y = 2.1.
    let body = spawn_body(&mut app, Vec2::new(1.0, 1.6), Vec2::new(0.0, 2.9));
    settle(&mut app);

    let applied = resolve_move(&mut app, body, Vector::new(0.0, -0.2), Vector::new(0.0, -1.0));
    assert_eq!(applied.y, -0.2);
    assert!(!collision_state(&app, body).below);

    // The drop window stays open while the body passes through.
    let applied = resolve_move(&mut app, body, Vector::new(0.0, -0.2), Vector::ZERO);
    assert_eq!(applied.y, -0.2);
}

#[test]
fn player_falls_and_comes_to_rest_on_the_floor() {
    let mut app = physics_app();
    // Floor top at y = 0.
    spawn_block(&mut app, Vec2::new(20.0, 2.0), Vec2::new(0.0, -1.0));
    let player = app
        .world_mut()
        .spawn((
            Player::new(PlayerConfig::default()),
            Collider::rectangle(1.0, 1.6),
            ravine::physics::passenger_layers(),
            Transform::from_xyz(0.0, 2.0, 0.0),
        ))
        .id();

    for _ in 0..30 {
        app.update();
    }

    let state = collision_state(&app, player);
    assert!(state.below, "player should be grounded");
    let velocity = app.world().get::<Player>(player).unwrap().velocity;
    assert_eq!(velocity.y, 0.0);
    let pos = position(&app, player);
    assert!(
        (pos.y - 0.8).abs() < 1e-2,
        "player should rest flush on the floor, got y = {}",
        pos.y
    );
}
