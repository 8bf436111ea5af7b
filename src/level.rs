//! A hand-built scene exercising the whole movement kit: flat ground, walls,
//! a climbable ramp, a too-steep face, a one-way ledge, and two moving
//! platforms.

use avian2d::math::Vector;
use avian2d::prelude::*;
use bevy::prelude::*;

use crate::camera::{FollowWeight, FollowerOf};
use crate::kinematics::prelude::*;
use crate::physics::{obstacle_layers, passenger_layers};
use crate::platform::MovingPlatform;
use crate::player::{Player, load_player_config};

pub(crate) fn plugin(app: &mut App) {
    app.add_systems(Startup, setup);
}

fn block(name: &str, size: Vec2, position: Vec2, color: Color) -> impl Bundle {
    (
        Name::new(name.to_string()),
        Sprite::from_color(color, size),
        Transform::from_translation(position.extend(0.0)),
        Collider::rectangle(size.x, size.y),
        obstacle_layers(),
    )
}

fn setup(mut commands: Commands) {
    let camera = commands
        .spawn((
            Camera2d,
            Projection::Orthographic(OrthographicProjection {
                scale: 0.05,
                ..OrthographicProjection::default_2d()
            }),
        ))
        .id();

    let ground = Color::srgb(0.25, 0.28, 0.32);
    commands.spawn(block("Floor", Vec2::new(60.0, 2.0), Vec2::new(0.0, -1.0), ground));
    commands.spawn(block("Left Wall", Vec2::new(2.0, 12.0), Vec2::new(-25.0, 6.0), ground));
    commands.spawn(block("Right Wall", Vec2::new(2.0, 12.0), Vec2::new(25.0, 6.0), ground));

    // 45 degree ramp, comfortably under the default climb limit.
    commands.spawn((
        Name::new("Ramp"),
        Transform::from_xyz(8.0, 1.0, 0.0),
        Collider::triangle(
            Vector::new(-2.0, -1.0),
            Vector::new(2.0, -1.0),
            Vector::new(2.0, 3.0),
        ),
        obstacle_layers(),
    ));

    // Roughly 83 degrees, past the climb limit; bodies slide down it.
    commands.spawn((
        Name::new("Steep Face"),
        Transform::from_xyz(16.0, 4.0, 0.0),
        Collider::triangle(
            Vector::new(-0.5, -4.0),
            Vector::new(0.5, -4.0),
            Vector::new(0.5, 4.0),
        ),
        obstacle_layers(),
    ));

    commands.spawn((
        Name::new("Ledge"),
        Sprite::from_color(Color::srgb(0.5, 0.4, 0.2), Vec2::new(4.0, 0.2)),
        Transform::from_xyz(-6.0, 2.0, 0.0),
        Collider::rectangle(4.0, 0.2),
        obstacle_layers(),
        OneWayPlatform,
    ));

    commands.spawn((
        Name::new("Lift"),
        Sprite::from_color(Color::srgb(0.3, 0.5, 0.7), Vec2::new(3.0, 0.5)),
        Transform::from_xyz(-12.0, 0.25, 0.0),
        Collider::rectangle(3.0, 0.5),
        obstacle_layers(),
        MovingPlatform::new(
            vec![Vector::ZERO, Vector::new(0.0, 8.0)],
            2.0,
            0.5,
            1.0,
            false,
        ),
    ));

    commands.spawn((
        Name::new("Ferry"),
        Sprite::from_color(Color::srgb(0.3, 0.5, 0.7), Vec2::new(3.0, 0.5)),
        Transform::from_xyz(-2.0, 6.0, 0.0),
        Collider::rectangle(3.0, 0.5),
        obstacle_layers(),
        MovingPlatform::new(
            vec![
                Vector::ZERO,
                Vector::new(6.0, 0.0),
                Vector::new(6.0, 3.0),
            ],
            3.0,
            0.3,
            2.0,
            true,
        ),
    ));

    commands.spawn((
        Name::new("Player"),
        Player::new(load_player_config()),
        Sprite::from_color(Color::srgb(0.9, 0.4, 0.3), Vec2::new(1.0, 1.6)),
        Transform::from_xyz(0.0, 2.0, 0.0),
        Collider::rectangle(1.0, 1.6),
        passenger_layers(),
        FollowerOf(camera),
        FollowWeight(1),
    ));
}
