use bevy::prelude::*;

#[derive(Component, Reflect)]
#[relationship(relationship_target = FollowTargets)]
pub struct FollowerOf(pub Entity);

#[derive(Component, Reflect)]
#[relationship_target(relationship = FollowerOf)]
pub struct FollowTargets(Vec<Entity>);

#[derive(Component, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct FollowWeight(pub u8);

pub(crate) fn plugin(app: &mut App) {
    app.add_systems(PostUpdate, follow_targets);
}

/// Centers the camera on the weighted average of its follow targets.
pub fn follow_targets(
    mut cam_query: Query<(Entity, &mut Transform), With<FollowTargets>>,
    follower_query: Query<&FollowTargets>,
    target_query: Query<(&Transform, &FollowWeight), Without<FollowTargets>>,
) {
    for (e, mut transform) in cam_query.iter_mut() {
        let targets = follower_query.iter_descendants(e);
        let sum: u8 = targets
            .filter_map(|e| target_query.get(e).ok())
            .map(|(_, &FollowWeight(num))| num)
            .sum();
        if sum == 0 {
            continue;
        }
        transform.translation.x = 0.0;
        transform.translation.y = 0.0;
        for e in follower_query.iter_descendants(e) {
            let Ok((xf, &FollowWeight(weight))) = target_query.get(e) else {
                continue;
            };
            let ratio = weight as f32 / sum as f32;
            transform.translation.x += xf.translation.x * ratio;
            transform.translation.y += xf.translation.y * ratio;
        }
    }
}
