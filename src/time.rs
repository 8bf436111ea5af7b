use bevy::{input::common_conditions::input_just_pressed, prelude::*};

/// High-level ordering of systems within the `Update` schedule.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum AppSystems {
    /// Tick timers.
    TickTimers,
    /// Record player input.
    RecordInput,
    /// Everything else: movement, platforms, game logic.
    Update,
}

/// Systems that stop while the game is paused.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PausableSystems;

/// Whether the game is paused. Pausing also stops virtual time, so waypoint
/// wait windows do not silently elapse in the background.
#[derive(States, Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Pause(pub bool);

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        toggle_pause
            .run_if(input_just_pressed(KeyCode::Escape))
            .in_set(AppSystems::TickTimers),
    );
    app.add_systems(OnEnter(Pause(true)), pause_time);
    app.add_systems(OnExit(Pause(true)), unpause_time);
}

fn toggle_pause(state: Res<State<Pause>>, mut next: ResMut<NextState<Pause>>) {
    next.set(Pause(!state.0));
}

fn pause_time(mut time: ResMut<Time<Virtual>>) {
    time.pause();
}

fn unpause_time(mut time: ResMut<Time<Virtual>>) {
    time.unpause();
}
