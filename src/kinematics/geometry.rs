//! Ray-cast origin and spacing bookkeeping shared by every kinematic body.

use avian2d::math::{Scalar, Vector};
use avian2d::prelude::*;
use bevy::prelude::*;

/// Inward inset for ray origins so rays start slightly inside the collider
/// and never report the body's own surface as a hit.
pub const SKIN_WIDTH: Scalar = 0.015;

/// Upper bound on the gap between neighboring rays, in world units.
/// Smaller bodies still get at least two rays per edge.
pub const MIN_RAY_GAP: Scalar = 0.25;

/// The four corners of a body's skin-inset bounding box, in world space.
#[derive(Clone, Copy, Debug, Default, Reflect)]
pub struct RayOrigins {
    pub bottom_left: Vector,
    pub bottom_right: Vector,
    pub top_left: Vector,
    pub top_right: Vector,
}

/// Ray counts, spacing, and current origins for one body.
///
/// Counts and spacing are stable: they are derived from the collider's size
/// by [`RayGeometry::compute_spacing`] when the body is spawned or resized.
/// Origins are ephemeral: [`RayGeometry::refresh_origins`] rebuilds them from
/// the current position at the start of every movement.
#[derive(Component, Clone, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct RayGeometry {
    pub horizontal_ray_count: u32,
    pub vertical_ray_count: u32,
    pub horizontal_ray_spacing: Scalar,
    pub vertical_ray_spacing: Scalar,
    pub origins: RayOrigins,
}

impl RayGeometry {
    /// Derives ray counts and spacing from the collider's skin-inset bounds.
    /// Degenerate bounds clamp to two rays per edge rather than zero.
    pub fn compute_spacing(&mut self, collider: &Collider, position: Vector) {
        let (min, max) = inset_bounds(collider, position);
        let size = (max - min).max(Vector::ZERO);

        self.horizontal_ray_count = ((size.y / MIN_RAY_GAP).round() as u32).max(2);
        self.vertical_ray_count = ((size.x / MIN_RAY_GAP).round() as u32).max(2);

        self.horizontal_ray_spacing = size.y / (self.horizontal_ray_count - 1) as Scalar;
        self.vertical_ray_spacing = size.x / (self.vertical_ray_count - 1) as Scalar;
    }

    /// Rebuilds the four corner origins from the collider's current bounds.
    pub fn refresh_origins(&mut self, collider: &Collider, position: Vector) {
        let (min, max) = inset_bounds(collider, position);

        self.origins.bottom_left = min;
        self.origins.bottom_right = Vector::new(max.x, min.y);
        self.origins.top_left = Vector::new(min.x, max.y);
        self.origins.top_right = max;
    }
}

fn inset_bounds(collider: &Collider, position: Vector) -> (Vector, Vector) {
    let aabb = collider.aabb(position, 0.0);
    (
        aabb.min + Vector::splat(SKIN_WIDTH),
        aabb.max - Vector::splat(SKIN_WIDTH),
    )
}
