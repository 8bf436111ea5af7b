//! Development tools for the game. This plugin is only enabled in dev builds.

use crate::platform::MovingPlatform;
use crate::time::Pause;
use avian2d::prelude::PhysicsDebugPlugin;
use bevy::{dev_tools::states::log_transitions, prelude::*};
use bevy_inspector_egui::bevy_egui::EguiPlugin;

pub(super) fn plugin(app: &mut App) {
    // Log `Pause` state transitions.
    app.add_systems(Update, log_transitions::<Pause>);

    app.add_systems(Update, draw_waypoint_gizmos);

    //inspect stuff and things
    app.add_plugins((
        EguiPlugin::default(),
        bevy_inspector_egui::quick::WorldInspectorPlugin::new(),
        PhysicsDebugPlugin::default(),
    ));
}

const CROSS_SIZE: f32 = 0.3;

fn draw_waypoint_gizmos(mut gizmos: Gizmos, platforms: Query<&MovingPlatform>) {
    for platform in &platforms {
        for waypoint in platform.waypoints() {
            let center = Vec2::new(waypoint.x as f32, waypoint.y as f32);
            gizmos.line_2d(
                center - Vec2::Y * CROSS_SIZE,
                center + Vec2::Y * CROSS_SIZE,
                Color::srgb(1.0, 0.2, 0.2),
            );
            gizmos.line_2d(
                center - Vec2::X * CROSS_SIZE,
                center + Vec2::X * CROSS_SIZE,
                Color::srgb(1.0, 0.2, 0.2),
            );
        }
    }
}
