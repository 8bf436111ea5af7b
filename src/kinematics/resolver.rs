//! Ray-cast collision resolution for axis-aligned kinematic bodies.
//!
//! The resolver takes a requested displacement and clamps or redirects it so
//! the body respects static geometry, reporting what happened through
//! [`CollisionState`]. Movement is resolved one axis at a time:
//!
//! 1. If the body is moving down, check whether it should follow a
//!    descendable slope (or slide down one that is too steep to stand on).
//! 2. Sweep horizontally from the leading edge. The bottom ray doubles as
//!    slope detection: a climbable surface redirects the displacement along
//!    the slope instead of clamping it.
//! 3. Sweep vertically from the leading row, offset by the resolved
//!    horizontal displacement.
//!
//! Within a sweep the ray length shrinks to each hit, so the nearest
//! obstruction wins regardless of ray order. Hits at distance zero mean the
//! body is already touching and are ignored so resolution never stalls on a
//! contact it cannot improve.

use avian2d::math::{Scalar, Vector};
use avian2d::prelude::*;
use bevy::{ecs::system::SystemParam, math::Dir2, prelude::*};

use super::geometry::{RayGeometry, SKIN_WIDTH};
use super::sign;

/// How long a drop-through request keeps one-way platforms permeable.
const DROP_THROUGH_SECS: Scalar = 0.5;

/// Slope limits for one kinematic body. Angles are radians from horizontal.
#[derive(Component, Clone, Copy, Debug, Reflect)]
#[reflect(Component, Default)]
pub struct KinematicBody {
    /// Steepest surface the body can walk up. Anything steeper is a wall.
    pub max_climb_angle: Scalar,
    /// Steepest surface the body follows downhill instead of falling off.
    pub max_descend_angle: Scalar,
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self {
            max_climb_angle: 80f32.to_radians(),
            max_descend_angle: 80f32.to_radians(),
        }
    }
}

/// Marks an obstacle that only blocks bodies falling onto it from above.
/// Bodies can jump up through it, and drop through it by holding down.
#[derive(Component, Clone, Copy, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct OneWayPlatform;

/// Contact flags and slope bookkeeping for one body, rebuilt every move.
///
/// `slope_angle_old` and `face_dir` survive the per-move reset: the previous
/// slope angle distinguishes "stepped onto a new slope" from "still on the
/// same one", and the facing direction keeps wall contact probes alive while
/// horizontal velocity is zero (wall sticking).
#[derive(Component, Clone, Debug, Reflect)]
#[reflect(Component, Default)]
pub struct CollisionState {
    pub above: bool,
    pub below: bool,
    pub left: bool,
    pub right: bool,

    pub climbing_slope: bool,
    pub descending_slope: bool,
    pub sliding_down_max_slope: bool,

    pub slope_angle: Scalar,
    pub slope_angle_old: Scalar,
    pub slope_normal: Vector,

    pub face_dir: Scalar,
    pub(crate) falling_through_until: Scalar,
    pub(crate) delta_old: Vector,
}

impl Default for CollisionState {
    fn default() -> Self {
        Self {
            above: false,
            below: false,
            left: false,
            right: false,
            climbing_slope: false,
            descending_slope: false,
            sliding_down_max_slope: false,
            slope_angle: 0.0,
            slope_angle_old: 0.0,
            slope_normal: Vector::ZERO,
            face_dir: 1.0,
            falling_through_until: 0.0,
            delta_old: Vector::ZERO,
        }
    }
}

impl CollisionState {
    fn begin(&mut self, delta: Vector) {
        self.above = false;
        self.below = false;
        self.left = false;
        self.right = false;
        self.climbing_slope = false;
        self.descending_slope = false;
        self.sliding_down_max_slope = false;
        self.slope_angle_old = self.slope_angle;
        self.slope_angle = 0.0;
        self.slope_normal = Vector::ZERO;
        self.delta_old = delta;
    }

    pub fn grounded(&self) -> bool {
        self.below
    }
}

/// A [`SystemParam`] that resolves kinematic movement against the obstacle
/// mask. Callers pick the layer mask themselves via the filter, so the same
/// resolver moves players against obstacles and passengers pushed by
/// platforms.
#[derive(SystemParam)]
pub struct CollisionResolver<'w, 's> {
    /// The spatial query interface used for all ray casts.
    pub spatial_query: SpatialQuery<'w, 's>,
    /// Membership lookup for one-way platform hits.
    pub one_way: Query<'w, 's, (), With<OneWayPlatform>>,
    /// Drives the drop-through window on one-way platforms.
    pub time: Res<'w, Time>,
}

impl CollisionResolver<'_, '_> {
    /// Moves a body by `delta`, clamped and redirected against static
    /// geometry, applying the adjusted displacement to the transform.
    ///
    /// `input` only matters for drop-through requests on one-way platforms.
    /// `standing_on_platform` forces the grounded flag, used when a moving
    /// platform carries the body.
    ///
    /// Returns the displacement that was actually applied.
    pub fn move_body(
        &self,
        body: &KinematicBody,
        collider: &Collider,
        transform: &mut Transform,
        geometry: &mut RayGeometry,
        state: &mut CollisionState,
        delta: Vector,
        input: Vector,
        standing_on_platform: bool,
        filter: &SpatialQueryFilter,
    ) -> Vector {
        let position = transform.translation.truncate();
        geometry.refresh_origins(collider, position);
        state.begin(delta);

        let mut delta = delta;
        if delta.y < 0.0 {
            self.descend_slope(body, geometry, state, &mut delta, filter);
        }
        if delta.x != 0.0 {
            state.face_dir = sign(delta.x);
        }

        self.horizontal_sweep(body, geometry, state, &mut delta, filter);
        if delta.y != 0.0 {
            self.vertical_sweep(body, geometry, state, &mut delta, input, filter);
        }
        if !state.climbing_slope && delta.y == 0.0 && delta.x != 0.0 {
            self.glue_to_slope(body, geometry, state, &mut delta, filter);
        }

        transform.translation += delta.extend(0.0);
        if standing_on_platform {
            state.below = true;
        }
        delta
    }

    fn horizontal_sweep(
        &self,
        body: &KinematicBody,
        geometry: &RayGeometry,
        state: &mut CollisionState,
        delta: &mut Vector,
        filter: &SpatialQueryFilter,
    ) {
        let dir_x = state.face_dir;
        let direction = if dir_x < 0.0 { Dir2::NEG_X } else { Dir2::X };
        let mut ray_length = delta.x.abs() + SKIN_WIDTH;
        if delta.x.abs() < SKIN_WIDTH {
            // Still feel walls while standing, for wall slide and stick.
            ray_length = 2.0 * SKIN_WIDTH;
        }

        for i in 0..geometry.horizontal_ray_count {
            let mut origin = if dir_x == -1.0 {
                geometry.origins.bottom_left
            } else {
                geometry.origins.bottom_right
            };
            origin.y += geometry.horizontal_ray_spacing * i as Scalar;

            let Some(hit) = self
                .spatial_query
                .cast_ray(origin, direction, ray_length, true, filter)
            else {
                continue;
            };
            if hit.distance == 0.0 {
                continue;
            }

            let slope_angle = angle_from_up(hit.normal);

            if i == 0 && slope_angle <= body.max_climb_angle {
                if state.descending_slope {
                    // Climbing takes over; undo the descent redirect.
                    state.descending_slope = false;
                    *delta = state.delta_old;
                }
                let mut distance_to_slope = 0.0;
                if slope_angle != state.slope_angle_old {
                    distance_to_slope = hit.distance - SKIN_WIDTH;
                    delta.x -= distance_to_slope * dir_x;
                }
                Self::climb_slope(state, delta, slope_angle, hit.normal);
                delta.x += distance_to_slope * dir_x;
            }

            if !state.climbing_slope || slope_angle > body.max_climb_angle {
                delta.x = (hit.distance - SKIN_WIDTH) * dir_x;
                ray_length = hit.distance;

                if state.climbing_slope {
                    delta.y = state.slope_angle.tan() * delta.x.abs();
                }

                state.left = dir_x == -1.0;
                state.right = dir_x == 1.0;
            }
        }
    }

    fn climb_slope(
        state: &mut CollisionState,
        delta: &mut Vector,
        slope_angle: Scalar,
        slope_normal: Vector,
    ) {
        let move_distance = delta.x.abs();
        let climb_dy = slope_angle.sin() * move_distance;

        // A jump in progress outruns the slope; let it keep its vertical.
        if delta.y <= climb_dy {
            delta.y = climb_dy;
            delta.x = slope_angle.cos() * move_distance * sign(delta.x);
            state.below = true;
            state.climbing_slope = true;
            state.slope_angle = slope_angle;
            state.slope_normal = slope_normal;
        }
    }

    fn vertical_sweep(
        &self,
        body: &KinematicBody,
        geometry: &RayGeometry,
        state: &mut CollisionState,
        delta: &mut Vector,
        input: Vector,
        filter: &SpatialQueryFilter,
    ) {
        let dir_y = sign(delta.y);
        let direction = if dir_y < 0.0 { Dir2::NEG_Y } else { Dir2::Y };
        let mut ray_length = delta.y.abs() + SKIN_WIDTH;
        let now = self.time.elapsed_secs();

        for i in 0..geometry.vertical_ray_count {
            let mut origin = if dir_y == -1.0 {
                geometry.origins.bottom_left
            } else {
                geometry.origins.top_left
            };
            origin.x += geometry.vertical_ray_spacing * i as Scalar + delta.x;

            let Some(hit) = self
                .spatial_query
                .cast_ray(origin, direction, ray_length, true, filter)
            else {
                continue;
            };
            if hit.distance == 0.0 {
                continue;
            }

            if self.one_way.contains(hit.entity) {
                if dir_y == 1.0 {
                    continue;
                }
                if now < state.falling_through_until {
                    continue;
                }
                if input.y == -1.0 {
                    state.falling_through_until = now + DROP_THROUGH_SECS;
                    continue;
                }
            }

            delta.y = (hit.distance - SKIN_WIDTH) * dir_y;
            ray_length = hit.distance;

            if state.climbing_slope {
                delta.x = delta.y / state.slope_angle.tan() * sign(delta.x);
            }

            state.below = dir_y == -1.0;
            state.above = dir_y == 1.0;
        }

        if state.climbing_slope {
            // The slope may change angle within this move; re-probe at the
            // new height so the body does not clip into the steeper section.
            let dir_x = sign(delta.x);
            let direction = if dir_x < 0.0 { Dir2::NEG_X } else { Dir2::X };
            let ray_length = delta.x.abs() + SKIN_WIDTH;
            let origin = if dir_x == -1.0 {
                geometry.origins.bottom_left
            } else {
                geometry.origins.bottom_right
            } + Vector::Y * delta.y;

            if let Some(hit) = self
                .spatial_query
                .cast_ray(origin, direction, ray_length, true, filter)
            {
                let slope_angle = angle_from_up(hit.normal);
                if slope_angle != state.slope_angle {
                    delta.x = (hit.distance - SKIN_WIDTH) * dir_x;
                    state.slope_angle = slope_angle;
                    state.slope_normal = hit.normal;
                    if slope_angle > body.max_climb_angle {
                        state.climbing_slope = false;
                        state.sliding_down_max_slope = true;
                    }
                }
            }
        }
    }

    fn descend_slope(
        &self,
        body: &KinematicBody,
        geometry: &RayGeometry,
        state: &mut CollisionState,
        delta: &mut Vector,
        filter: &SpatialQueryFilter,
    ) {
        let ray_length = delta.y.abs() + SKIN_WIDTH;
        let hit_left = self.spatial_query.cast_ray(
            geometry.origins.bottom_left,
            Dir2::NEG_Y,
            ray_length,
            true,
            filter,
        );
        let hit_right = self.spatial_query.cast_ray(
            geometry.origins.bottom_right,
            Dir2::NEG_Y,
            ray_length,
            true,
            filter,
        );

        // Exactly one corner over the surface means the body straddles the
        // top of a steep slope and may need to slide down it.
        if hit_left.is_some() != hit_right.is_some() {
            Self::slide_down_max_slope(body, state, hit_left, delta);
            Self::slide_down_max_slope(body, state, hit_right, delta);
        }

        if state.sliding_down_max_slope {
            return;
        }

        let dir_x = sign(delta.x);
        let origin = if dir_x == -1.0 {
            geometry.origins.bottom_right
        } else {
            geometry.origins.bottom_left
        };
        let Some(hit) = self
            .spatial_query
            .cast_ray(origin, Dir2::NEG_Y, Scalar::MAX, true, filter)
        else {
            return;
        };

        let slope_angle = angle_from_up(hit.normal);
        if slope_angle == 0.0 || slope_angle > body.max_descend_angle {
            return;
        }
        if sign(hit.normal.x) != dir_x {
            return;
        }
        // Close enough to the surface that this move stays on the slope.
        if hit.distance - SKIN_WIDTH > slope_angle.tan() * delta.x.abs() {
            return;
        }

        let move_distance = delta.x.abs();
        let descend_dy = slope_angle.sin() * move_distance;
        delta.x = slope_angle.cos() * move_distance * sign(delta.x);
        delta.y -= descend_dy;

        state.slope_angle = slope_angle;
        state.descending_slope = true;
        state.below = true;
        state.slope_normal = hit.normal;
    }

    fn slide_down_max_slope(
        body: &KinematicBody,
        state: &mut CollisionState,
        hit: Option<RayHitData>,
        delta: &mut Vector,
    ) {
        let Some(hit) = hit else {
            return;
        };
        let slope_angle = angle_from_up(hit.normal);
        if slope_angle > body.max_climb_angle {
            delta.x = sign(hit.normal.x) * (delta.y.abs() - hit.distance) / slope_angle.tan();
            state.slope_angle = slope_angle;
            state.sliding_down_max_slope = true;
            state.slope_normal = hit.normal;
        }
    }

    /// Keeps a body glued to a descendable slope when it moves horizontally
    /// with no vertical component, instead of stair-stepping off the surface.
    fn glue_to_slope(
        &self,
        body: &KinematicBody,
        geometry: &RayGeometry,
        state: &mut CollisionState,
        delta: &mut Vector,
        filter: &SpatialQueryFilter,
    ) {
        let dir_x = sign(delta.x);
        let origin = if dir_x == -1.0 {
            geometry.origins.bottom_left
        } else {
            geometry.origins.bottom_right
        };

        let Some(hit) =
            self.spatial_query
                .cast_ray(origin, Dir2::NEG_Y, 2.0 * SKIN_WIDTH, true, filter)
        else {
            return;
        };
        if hit.distance == 0.0 {
            return;
        }
        let slope_angle = angle_from_up(hit.normal);
        if slope_angle == 0.0 || slope_angle > body.max_descend_angle {
            return;
        }

        delta.y = -(hit.distance - SKIN_WIDTH);
        state.below = true;
        state.slope_angle = slope_angle;
        state.slope_normal = hit.normal;
    }
}

/// Unsigned angle between a surface normal and straight up, in radians.
fn angle_from_up(normal: Vector) -> Scalar {
    normal.y.clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_from_up_matches_known_surfaces() {
        assert!(angle_from_up(Vector::Y).abs() < 1e-6);
        let fortyfive = Vector::new(-1.0, 1.0).normalize();
        assert!((angle_from_up(fortyfive) - 45f32.to_radians()).abs() < 1e-5);
        assert!((angle_from_up(Vector::X) - 90f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn reset_preserves_carryover_fields() {
        let mut state = CollisionState {
            below: true,
            climbing_slope: true,
            slope_angle: 0.7,
            face_dir: -1.0,
            ..Default::default()
        };
        state.begin(Vector::new(1.0, -2.0));

        assert!(!state.below);
        assert!(!state.climbing_slope);
        assert_eq!(state.slope_angle, 0.0);
        assert_eq!(state.slope_angle_old, 0.7);
        assert_eq!(state.face_dir, -1.0);
        assert_eq!(state.delta_old, Vector::new(1.0, -2.0));
    }
}
