use avian2d::prelude::*;
use bevy::prelude::*;

/// Collision layers for spatial queries. Obstacles form the static mask
/// kinematic bodies collide with; passengers are what moving platforms
/// look for when deciding who to carry or push.
#[derive(PhysicsLayer, Clone, Copy, Debug, Default)]
pub enum GameLayer {
    #[default]
    Default,
    Obstacle,
    Passenger,
}

pub fn obstacle_layers() -> CollisionLayers {
    CollisionLayers::new(GameLayer::Obstacle, LayerMask::ALL)
}

pub fn passenger_layers() -> CollisionLayers {
    CollisionLayers::new(GameLayer::Passenger, LayerMask::ALL)
}

/// Filter for resolving a body's movement against the static mask.
pub fn obstacle_filter(entity: Entity) -> SpatialQueryFilter {
    SpatialQueryFilter::from_mask(GameLayer::Obstacle).with_excluded_entities([entity])
}

/// Filter for a platform's passenger detection rays.
pub fn passenger_filter(entity: Entity) -> SpatialQueryFilter {
    SpatialQueryFilter::from_mask(GameLayer::Passenger).with_excluded_entities([entity])
}

pub fn plugin(app: &mut App) {
    app.add_plugins(PhysicsPlugins::default());
}
