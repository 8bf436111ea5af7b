//! Moving platforms: waypoint interpolation plus passenger transport.
//!
//! Platforms are not blocked by the obstacle mask; they only use their ray
//! geometry to find passenger bodies riding on or standing against them, and
//! force those bodies through the collision resolver so a carried passenger
//! still collides with the world.

use avian2d::math::{Scalar, Vector};
use avian2d::prelude::*;
use bevy::platform::collections::{HashMap, HashSet};
use bevy::prelude::*;

use crate::kinematics::prelude::*;
use crate::kinematics::{refresh_ray_spacing, sign};
use crate::physics::{obstacle_filter, passenger_filter};
use crate::time::{AppSystems, PausableSystems};

pub fn plugin(app: &mut App) {
    app.register_type::<MovingPlatform>();
    app.add_systems(
        Update,
        (initialize_waypoints, update_platforms)
            .chain()
            .in_set(AppSystems::Update)
            .in_set(PausableSystems)
            .after(refresh_ray_spacing),
    );
}

/// A platform that interpolates along a waypoint path and carries passengers.
///
/// `local_waypoints` are authored relative to the spawn position and
/// converted to world space once on spawn. Non-cyclic paths ping-pong: when
/// the index reaches the last segment the waypoint array is reversed in
/// place and traversal restarts from index zero.
#[derive(Component, Clone, Debug, Default, Reflect)]
#[reflect(Component)]
#[require(RayGeometry)]
pub struct MovingPlatform {
    pub local_waypoints: Vec<Vector>,
    /// Units per second along the current segment.
    pub speed: Scalar,
    /// Pause at each waypoint, in seconds.
    pub wait_time: Scalar,
    /// 0 is linear; larger values give a steeper symmetric S-curve.
    pub ease_amount: Scalar,
    /// Cyclic paths wrap around instead of reversing.
    pub cyclic: bool,

    waypoints: Vec<Vector>,
    from_index: usize,
    progress: Scalar,
    next_move_time: Scalar,
    #[reflect(ignore)]
    passenger_cache: HashMap<Entity, bool>,
}

impl MovingPlatform {
    pub fn new(
        local_waypoints: Vec<Vector>,
        speed: Scalar,
        wait_time: Scalar,
        ease_amount: Scalar,
        cyclic: bool,
    ) -> Self {
        Self {
            local_waypoints,
            speed,
            wait_time,
            ease_amount,
            cyclic,
            waypoints: Vec::new(),
            from_index: 0,
            progress: 0.0,
            next_move_time: 0.0,
            passenger_cache: HashMap::default(),
        }
    }

    /// World-space waypoints, empty until the platform is initialized.
    pub fn waypoints(&self) -> &[Vector] {
        &self.waypoints
    }

    fn initialize(&mut self, origin: Vector) {
        self.waypoints = self.local_waypoints.iter().map(|p| *p + origin).collect();
    }

    /// Advances the platform's progress and returns this tick's displacement.
    ///
    /// Progress is clamped to [0, 1]; reaching 1 advances the segment,
    /// schedules the waypoint pause, and reverses non-cyclic paths at the
    /// end of the array.
    pub fn compute_displacement(&mut self, position: Vector, now: Scalar, dt: Scalar) -> Vector {
        if self.waypoints.len() < 2 || now < self.next_move_time {
            return Vector::ZERO;
        }

        self.from_index %= self.waypoints.len();
        let to_index = (self.from_index + 1) % self.waypoints.len();
        let from = self.waypoints[self.from_index];
        let to = self.waypoints[to_index];
        let segment_length = from.distance(to);
        if segment_length == 0.0 {
            return Vector::ZERO;
        }

        self.progress += self.speed / segment_length * dt;
        self.progress = self.progress.clamp(0.0, 1.0);
        let eased = ease(self.progress, self.ease_amount);

        let new_position = from.lerp(to, eased);

        if self.progress >= 1.0 {
            self.progress = 0.0;
            self.from_index += 1;
            if !self.cyclic && self.from_index >= self.waypoints.len() - 1 {
                self.from_index = 0;
                self.waypoints.reverse();
            }
            self.next_move_time = now + self.wait_time;
        }

        new_position - position
    }
}

/// Symmetric S-curve easing on [0, 1]. `amount = 0` is the identity.
pub fn ease(x: Scalar, amount: Scalar) -> Scalar {
    let a = amount + 1.0;
    x.powf(a) / (x.powf(a) + (1.0 - x).powf(a))
}

/// One passenger detected this tick and the move it is forced to make.
#[derive(Clone, Copy, Debug)]
struct PassengerMovement {
    entity: Entity,
    delta: Vector,
    standing_on_platform: bool,
    move_before_platform: bool,
}

fn initialize_waypoints(
    mut platforms: Query<(&mut MovingPlatform, &Transform), Added<MovingPlatform>>,
) {
    for (mut platform, transform) in &mut platforms {
        if platform.local_waypoints.len() < 2 {
            warn!(
                "moving platform needs at least 2 waypoints, got {}; it will not move",
                platform.local_waypoints.len()
            );
            continue;
        }
        let origin = transform.translation.truncate();
        platform.initialize(origin);
    }
}

type PassengerQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static KinematicBody,
        &'static Collider,
        &'static mut Transform,
        &'static mut RayGeometry,
        &'static mut CollisionState,
    ),
    With<KinematicBody>,
>;

pub fn update_platforms(
    time: Res<Time>,
    resolver: CollisionResolver,
    mut platforms: Query<
        (
            Entity,
            &mut MovingPlatform,
            &mut Transform,
            &Collider,
            &mut RayGeometry,
        ),
        Without<KinematicBody>,
    >,
    mut passengers: PassengerQuery,
) {
    let now = time.elapsed_secs();
    let dt = time.delta_secs();

    for (entity, mut platform, mut transform, collider, mut geometry) in &mut platforms {
        let position = transform.translation.truncate();
        geometry.refresh_origins(collider, position);

        let velocity = platform.compute_displacement(position, now, dt);
        let filter = passenger_filter(entity);
        let movements = collect_passengers(&resolver, &geometry, velocity, &filter);

        move_passengers(&mut platform, &movements, true, &resolver, &mut passengers);
        transform.translation += velocity.extend(0.0);
        move_passengers(&mut platform, &movements, false, &resolver, &mut passengers);
    }
}

/// Finds every passenger this tick's platform velocity affects and the push
/// it receives. First match wins: a passenger claimed by the vertical case is
/// never reassigned by the horizontal or top-riding case.
fn collect_passengers(
    resolver: &CollisionResolver,
    geometry: &RayGeometry,
    velocity: Vector,
    filter: &SpatialQueryFilter,
) -> Vec<PassengerMovement> {
    let mut moved: HashSet<Entity> = HashSet::default();
    let mut movements = Vec::new();

    let dir_x = sign(velocity.x);
    let dir_y = sign(velocity.y);

    // Vertically moving platform pushing bodies above or below it.
    if velocity.y != 0.0 {
        let ray_length = velocity.y.abs() + SKIN_WIDTH;
        let direction = if dir_y < 0.0 { Dir2::NEG_Y } else { Dir2::Y };

        for i in 0..geometry.vertical_ray_count {
            let mut origin = if dir_y == -1.0 {
                geometry.origins.bottom_left
            } else {
                geometry.origins.top_left
            };
            origin.x += geometry.vertical_ray_spacing * i as Scalar;

            let Some(hit) = resolver
                .spatial_query
                .cast_ray(origin, direction, ray_length, true, filter)
            else {
                continue;
            };
            if hit.distance == 0.0 || !moved.insert(hit.entity) {
                continue;
            }

            let push_x = if dir_y == 1.0 { velocity.x } else { 0.0 };
            let push_y = velocity.y - (hit.distance - SKIN_WIDTH) * dir_y;
            movements.push(PassengerMovement {
                entity: hit.entity,
                delta: Vector::new(push_x, push_y),
                standing_on_platform: dir_y == 1.0,
                move_before_platform: true,
            });
        }
    }

    // Horizontally moving platform pushing bodies in its path.
    if velocity.x != 0.0 {
        let ray_length = velocity.x.abs() + SKIN_WIDTH;
        let direction = if dir_x < 0.0 { Dir2::NEG_X } else { Dir2::X };

        for i in 0..geometry.horizontal_ray_count {
            let mut origin = if dir_x == -1.0 {
                geometry.origins.bottom_left
            } else {
                geometry.origins.bottom_right
            };
            origin.y += geometry.horizontal_ray_spacing * i as Scalar;

            let Some(hit) = resolver
                .spatial_query
                .cast_ray(origin, direction, ray_length, true, filter)
            else {
                continue;
            };
            if hit.distance == 0.0 || !moved.insert(hit.entity) {
                continue;
            }

            // The tiny downward nudge keeps the pushed body's ground rays in
            // contact so it can react to the floor it is sliding along.
            movements.push(PassengerMovement {
                entity: hit.entity,
                delta: Vector::new(
                    velocity.x - (hit.distance - SKIN_WIDTH) * dir_x,
                    -SKIN_WIDTH,
                ),
                standing_on_platform: false,
                move_before_platform: true,
            });
        }
    }

    // Bodies riding on top of a descending or horizontally moving platform.
    if dir_y == -1.0 || (velocity.y == 0.0 && velocity.x != 0.0) {
        let ray_length = 2.0 * SKIN_WIDTH;

        for i in 0..geometry.vertical_ray_count {
            let origin = geometry.origins.top_left
                + Vector::X * (geometry.vertical_ray_spacing * i as Scalar);

            let Some(hit) = resolver
                .spatial_query
                .cast_ray(origin, Dir2::Y, ray_length, true, filter)
            else {
                continue;
            };
            if hit.distance == 0.0 || !moved.insert(hit.entity) {
                continue;
            }

            movements.push(PassengerMovement {
                entity: hit.entity,
                delta: velocity,
                standing_on_platform: true,
                move_before_platform: false,
            });
        }
    }

    movements
}

/// Applies the forced moves whose ordering matches `before_platform`.
///
/// Whether a handle can be transported at all is resolved once on first
/// contact and cached for the platform's lifetime; incompatible bodies are
/// logged and skipped instead of failing the tick.
fn move_passengers(
    platform: &mut MovingPlatform,
    movements: &[PassengerMovement],
    before_platform: bool,
    resolver: &CollisionResolver,
    passengers: &mut PassengerQuery,
) {
    for movement in movements {
        let transportable = *platform
            .passenger_cache
            .entry(movement.entity)
            .or_insert_with(|| {
                let ok = passengers.contains(movement.entity);
                if !ok {
                    warn!(
                        "{} touched a moving platform but has no kinematic body; not carrying it",
                        movement.entity
                    );
                }
                ok
            });
        if !transportable || movement.move_before_platform != before_platform {
            continue;
        }

        let Ok((body, collider, mut transform, mut geometry, mut state)) =
            passengers.get_mut(movement.entity)
        else {
            continue;
        };
        let filter = obstacle_filter(movement.entity);
        resolver.move_body(
            body,
            collider,
            &mut transform,
            &mut geometry,
            &mut state,
            movement.delta,
            Vector::ZERO,
            movement.standing_on_platform,
            &filter,
        );
    }
}
