//! Raycast-based kinematic movement: shared ray geometry and the
//! axis-separated collision resolver consumed by the player and by moving
//! platforms pushing passengers.

use avian2d::math::Scalar;
use avian2d::prelude::*;
use bevy::prelude::*;

use crate::time::{AppSystems, PausableSystems};

pub mod geometry;
pub mod resolver;

/// Re-exports common types related to kinematic movement.
pub mod prelude {
    pub use super::geometry::{MIN_RAY_GAP, RayGeometry, SKIN_WIDTH};
    pub use super::resolver::{CollisionResolver, CollisionState, KinematicBody, OneWayPlatform};
}

use prelude::*;

pub fn plugin(app: &mut App) {
    app.register_type::<RayGeometry>()
        .register_type::<CollisionState>()
        .register_type::<KinematicBody>()
        .register_type::<OneWayPlatform>();
    app.add_systems(
        Update,
        refresh_ray_spacing
            .in_set(AppSystems::Update)
            .in_set(PausableSystems),
    );
}

/// Recomputes ray counts and spacing for bodies that were just spawned or
/// whose collider changed size. Origins are refreshed separately, every move.
pub fn refresh_ray_spacing(
    mut bodies: Query<
        (&Collider, &Transform, &mut RayGeometry),
        Or<(Added<RayGeometry>, Changed<Collider>)>,
    >,
) {
    for (collider, transform, mut geometry) in &mut bodies {
        geometry.compute_spacing(collider, transform.translation.truncate());
    }
}

/// Sign convention shared by the sweeps: zero counts as positive, so a body
/// that has stopped still faces somewhere.
pub(crate) fn sign(value: Scalar) -> Scalar {
    if value >= 0.0 { 1.0 } else { -1.0 }
}
