//! Headless test harness: a minimal app with the physics, kinematics, and
//! platform plugins and a fixed manual clock. The first `app.update()` has a
//! zero delta and only builds the spatial query pipeline; tests call
//! [`settle`] before asserting anything about movement.

use std::time::Duration;

use avian2d::math::{Scalar, Vector};
use avian2d::prelude::*;
use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use ravine::kinematics::prelude::*;
use ravine::physics::{obstacle_filter, obstacle_layers, passenger_layers};
use ravine::time::{AppSystems, PausableSystems, Pause};

pub const DT: Scalar = 0.1;

pub fn physics_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        TransformPlugin,
        StatesPlugin,
        AssetPlugin::default(),
        bevy::scene::ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
        DT,
    )));

    app.configure_sets(
        Update,
        (
            AppSystems::TickTimers,
            AppSystems::RecordInput,
            AppSystems::Update,
        )
            .chain(),
    );
    app.init_state::<Pause>();
    app.configure_sets(Update, PausableSystems.run_if(in_state(Pause(false))));

    app.add_plugins((
        ravine::physics::plugin,
        ravine::kinematics::plugin,
        ravine::platform::plugin,
        ravine::player::plugin,
    ));
    app.finish();
    app.cleanup();
    app
}

/// Runs enough frames for the spatial query pipeline to see everything
/// spawned so far.
pub fn settle(app: &mut App) {
    app.update();
    app.update();
}

pub fn spawn_block(app: &mut App, size: Vec2, position: Vec2) -> Entity {
    app.world_mut()
        .spawn((
            Collider::rectangle(size.x, size.y),
            obstacle_layers(),
            Transform::from_translation(position.extend(0.0)),
        ))
        .id()
}

pub fn spawn_body(app: &mut App, size: Vec2, position: Vec2) -> Entity {
    app.world_mut()
        .spawn((
            KinematicBody::default(),
            RayGeometry::default(),
            CollisionState::default(),
            Collider::rectangle(size.x, size.y),
            passenger_layers(),
            Transform::from_translation(position.extend(0.0)),
        ))
        .id()
}

/// Resolves one move for `entity` and returns the applied displacement.
pub fn resolve_move(app: &mut App, entity: Entity, delta: Vector, input: Vector) -> Vector {
    app.world_mut()
        .run_system_once(
            move |resolver: CollisionResolver,
                  mut bodies: Query<(
                &KinematicBody,
                &Collider,
                &mut Transform,
                &mut RayGeometry,
                &mut CollisionState,
            )>| {
                let (body, collider, mut transform, mut geometry, mut state) =
                    bodies.get_mut(entity).unwrap();
                let filter = obstacle_filter(entity);
                resolver.move_body(
                    body,
                    collider,
                    &mut transform,
                    &mut geometry,
                    &mut state,
                    delta,
                    input,
                    false,
                    &filter,
                )
            },
        )
        .unwrap()
}

pub fn collision_state(app: &App, entity: Entity) -> CollisionState {
    app.world().get::<CollisionState>(entity).unwrap().clone()
}

pub fn position(app: &App, entity: Entity) -> Vector {
    app.world()
        .get::<Transform>(entity)
        .unwrap()
        .translation
        .truncate()
}
