//! The player: a velocity state machine on top of the collision resolver.
//!
//! Gravity, jump velocities, and the wall interaction rules all live here;
//! the resolver only ever sees a displacement for this tick. Contact flags
//! from the previous resolution drive the next tick's decisions (wall slide,
//! stick timers, jump eligibility), recomputed from scratch every tick.

use avian2d::math::{Scalar, Vector};
use avian2d::prelude::*;
use bevy::prelude::*;
use leafwing_input_manager::prelude::ActionState;
use serde::Deserialize;
use std::fs::read_to_string;

use crate::input::PlayerAction;
use crate::kinematics::{prelude::*, sign};
use crate::physics::obstacle_filter;
use crate::platform::update_platforms;
use crate::time::{AppSystems, PausableSystems, Pause};

pub fn plugin(app: &mut App) {
    app.register_type::<Player>();
    app.add_systems(
        Update,
        record_input
            .run_if(resource_exists::<ActionState<PlayerAction>>)
            .in_set(AppSystems::RecordInput),
    );
    app.add_systems(
        Update,
        tick_players
            .in_set(AppSystems::Update)
            .in_set(PausableSystems)
            .after(update_platforms),
    );
    // `record_input` keeps running while paused, but `tick_players` does
    // not, so edges buffered during the pause would fire on the first
    // unpaused tick. Discard them instead.
    app.add_systems(OnExit(Pause(true)), clear_buffered_jumps);
}

/// Tunables, loadable from `assets/entities/player.ron`.
#[derive(Clone, Debug, Deserialize, Reflect)]
pub struct PlayerConfig {
    pub move_speed: Scalar,
    pub max_jump_height: Scalar,
    pub min_jump_height: Scalar,
    pub time_to_jump_apex: Scalar,
    pub accel_time_air: Scalar,
    pub accel_time_ground: Scalar,
    pub wall_jump_climb: (Scalar, Scalar),
    pub wall_jump_drop: (Scalar, Scalar),
    pub wall_jump_leap: (Scalar, Scalar),
    pub wall_slide_speed_max: Scalar,
    pub wall_stick_time: Scalar,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            max_jump_height: 4.0,
            min_jump_height: 1.0,
            time_to_jump_apex: 0.55,
            accel_time_air: 0.1,
            accel_time_ground: 0.05,
            wall_jump_climb: (7.5, 16.0),
            wall_jump_drop: (8.5, 7.0),
            wall_jump_leap: (18.0, 17.0),
            wall_slide_speed_max: 2.5,
            wall_stick_time: 0.25,
        }
    }
}

/// Loads the player tunables, falling back to defaults when the file is
/// missing or does not parse.
pub fn load_player_config() -> PlayerConfig {
    let path = "assets/entities/player.ron";
    let Ok(text) = read_to_string(path) else {
        warn!("no player config at {path}, using defaults");
        return PlayerConfig::default();
    };
    ron::de::from_str(&text)
        .map_err(|e| warn!("could not parse player config: {e}"))
        .unwrap_or_default()
}

/// Gravity and jump velocities derived from the desired jump arc: a jump
/// held to the apex reaches `max_jump_height` in `time_to_jump_apex`.
#[derive(Clone, Copy, Debug, Default, Reflect)]
pub struct JumpParams {
    pub gravity: Scalar,
    pub max_jump_velocity: Scalar,
    pub min_jump_velocity: Scalar,
}

impl JumpParams {
    pub fn derive(config: &PlayerConfig) -> Self {
        let gravity = -(2.0 * config.max_jump_height) / config.time_to_jump_apex.powi(2);
        Self {
            gravity,
            max_jump_velocity: gravity.abs() * config.time_to_jump_apex,
            min_jump_velocity: (2.0 * gravity.abs() * config.min_jump_height).sqrt(),
        }
    }
}

#[derive(Component, Debug, Reflect)]
#[reflect(Component)]
#[require(KinematicBody, RayGeometry, CollisionState)]
pub struct Player {
    pub config: PlayerConfig,
    pub jump: JumpParams,
    pub velocity: Vector,

    directional_input: Vector,
    jump_pressed: bool,
    jump_released: bool,
    velocity_x_smoothing: Scalar,
    time_to_wall_unstick: Scalar,
    wall_sliding: bool,
    wall_dir_x: Scalar,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Self {
        let jump = JumpParams::derive(&config);
        Self {
            config,
            jump,
            velocity: Vector::ZERO,
            directional_input: Vector::ZERO,
            jump_pressed: false,
            jump_released: false,
            velocity_x_smoothing: 0.0,
            time_to_wall_unstick: 0.0,
            wall_sliding: false,
            wall_dir_x: 1.0,
        }
    }

    pub fn wall_sliding(&self) -> bool {
        self.wall_sliding
    }

    pub fn set_directional_input(&mut self, input: Vector) {
        self.directional_input = input;
    }

    fn calculate_velocity(&mut self, state: &CollisionState, dt: Scalar) {
        let target_velocity_x = self.directional_input.x * self.config.move_speed;
        let smooth_time = if state.grounded() {
            self.config.accel_time_ground
        } else {
            self.config.accel_time_air
        };
        let mut smoothing = self.velocity_x_smoothing;
        self.velocity.x = smooth_damp(
            self.velocity.x,
            target_velocity_x,
            &mut smoothing,
            smooth_time,
            dt,
        );
        self.velocity_x_smoothing = smoothing;
        self.velocity.y += self.jump.gravity * dt;
    }

    fn handle_wall_sliding(&mut self, state: &CollisionState, dt: Scalar) {
        self.wall_dir_x = if state.left { -1.0 } else { 1.0 };
        self.wall_sliding = false;

        if (state.left || state.right) && !state.below {
            self.wall_sliding = true;

            if self.velocity.y < -self.config.wall_slide_speed_max {
                self.velocity.y = -self.config.wall_slide_speed_max;
            }

            if self.time_to_wall_unstick > 0.0 {
                self.velocity_x_smoothing = 0.0;
                self.velocity.x = 0.0;

                if self.directional_input.x != self.wall_dir_x && self.directional_input.x != 0.0 {
                    self.time_to_wall_unstick -= dt;
                } else {
                    self.time_to_wall_unstick = self.config.wall_stick_time;
                }
            } else {
                self.time_to_wall_unstick = self.config.wall_stick_time;
            }
        }
    }

    fn handle_jump_edges(&mut self, state: &CollisionState) {
        if self.jump_pressed {
            self.jump_pressed = false;
            self.on_jump_pressed(state);
        }
        if self.jump_released {
            self.jump_released = false;
            self.on_jump_released();
        }
    }

    pub fn on_jump_pressed(&mut self, state: &CollisionState) {
        if self.wall_sliding {
            let (x, y) = if self.directional_input.x == self.wall_dir_x {
                self.config.wall_jump_climb
            } else if self.directional_input.x == 0.0 {
                self.config.wall_jump_drop
            } else {
                self.config.wall_jump_leap
            };
            self.velocity.x = -self.wall_dir_x * x;
            self.velocity.y = y;
        }

        if state.below {
            if state.sliding_down_max_slope {
                // No jumping while pushing into the slope that is shedding us.
                if self.directional_input.x != -sign(state.slope_normal.x) {
                    self.velocity.y = self.jump.max_jump_velocity * state.slope_normal.y;
                    self.velocity.x = self.jump.max_jump_velocity * state.slope_normal.x;
                }
            } else {
                self.velocity.y = self.jump.max_jump_velocity;
            }
        }
    }

    pub fn on_jump_released(&mut self) {
        if self.velocity.y > self.jump.min_jump_velocity {
            self.velocity.y = self.jump.min_jump_velocity;
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(PlayerConfig::default())
    }
}

fn clear_buffered_jumps(mut players: Query<&mut Player>) {
    for mut player in &mut players {
        player.jump_pressed = false;
        player.jump_released = false;
    }
}

fn record_input(actions: Res<ActionState<PlayerAction>>, mut players: Query<&mut Player>) {
    for mut player in &mut players {
        player.directional_input = actions.clamped_axis_pair(&PlayerAction::Move);
        player.jump_pressed |= actions.just_pressed(&PlayerAction::Jump);
        player.jump_released |= actions.just_released(&PlayerAction::Jump);
    }
}

pub fn tick_players(
    time: Res<Time>,
    resolver: CollisionResolver,
    mut players: Query<(
        Entity,
        &mut Player,
        &KinematicBody,
        &Collider,
        &mut Transform,
        &mut RayGeometry,
        &mut CollisionState,
    )>,
) {
    let dt = time.delta_secs();

    for (entity, mut player, body, collider, mut transform, mut geometry, mut state) in &mut players
    {
        player.calculate_velocity(&state, dt);
        player.handle_wall_sliding(&state, dt);
        player.handle_jump_edges(&state);

        let delta = player.velocity * dt;
        let input = player.directional_input;
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
        );

        if state.above || state.below {
            if state.sliding_down_max_slope {
                // Feed gravity back along the slope normal so sliding does
                // not accelerate without bound.
                player.velocity.y += state.slope_normal.y * -player.jump.gravity * dt;
            } else {
                player.velocity.y = 0.0;
            }
        }
    }
}

/// Critically damped spring toward `target`, the usual game-engine
/// SmoothDamp. Never overshoots.
fn smooth_damp(
    current: Scalar,
    target: Scalar,
    velocity: &mut Scalar,
    smooth_time: Scalar,
    dt: Scalar,
) -> Scalar {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}
