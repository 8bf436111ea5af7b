// Support configuring Bevy lints within code.
#![cfg_attr(bevy_lint, feature(register_tool), register_tool(bevy))]

pub mod camera;
#[cfg(feature = "dev")]
mod dev_tools;
pub mod input;
pub mod kinematics;
pub mod level;
pub mod physics;
pub mod platform;
pub mod player;
pub mod time;

use bevy::{asset::AssetMetaCheck, prelude::*};

use crate::time::{AppSystems, PausableSystems, Pause};

pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        // Add Bevy plugins.
        app.add_plugins(
            DefaultPlugins
                .set(AssetPlugin {
                    // Wasm builds will check for meta files (that don't exist) if this isn't set.
                    // This causes errors and even panics on web build on itch.
                    // See https://github.com/bevyengine/bevy_github_ci_template/issues/48.
                    meta_check: AssetMetaCheck::Never,
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Window {
                        title: "Ravine".to_string(),
                        fit_canvas_to_parent: true,
                        ..default()
                    }
                    .into(),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        );

        // Add other plugins.
        app.add_plugins((
            physics::plugin,
            kinematics::plugin,
            input::plugin,
            platform::plugin,
            player::plugin,
            level::plugin,
            camera::plugin,
            #[cfg(feature = "dev")]
            dev_tools::plugin,
            time::plugin,
        ));

        // Order new `AppSystems` variants by adding them here:
        app.configure_sets(
            Update,
            (
                AppSystems::TickTimers,
                AppSystems::RecordInput,
                AppSystems::Update,
            )
                .chain(),
        );

        // Set up the `Pause` state.
        app.init_state::<Pause>();
        app.configure_sets(Update, PausableSystems.run_if(in_state(Pause(false))));
    }
}
