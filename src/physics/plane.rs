use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::core::components::{Ball, PlaneBound};
use crate::core::config::GameConfig;
use crate::core::system::system_order::PrePhysicsSet;

/// Plugin clamping dynamic bodies to the horizontal simulation plane.
///
/// Rapier's `LockedAxes` already freezes the Y translation, but the custom
/// velocity writes (deflection, flipper strikes, gravity wells) can still
/// smuggle a Y component back in; this system re-zeroes it every tick and is
/// the authoritative enforcement of the plane invariant.
pub struct PlaneConstraintPlugin;

impl Plugin for PlaneConstraintPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PostUpdate, clamp_to_plane.in_set(PrePhysicsSet));
    }
}

pub fn clamp_to_plane(
    cfg: Res<GameConfig>,
    mut q: Query<(&mut Transform, &mut Velocity, Option<&mut Ball>), With<PlaneBound>>,
) {
    let height = cfg.arena.plane_height;
    for (mut transform, mut vel, ball) in q.iter_mut() {
        transform.translation.y = height;
        vel.linvel.y = 0.0;
        // Spin about X/Z would re-introduce out-of-plane motion through contacts.
        vel.angvel.x = 0.0;
        vel.angvel.z = 0.0;
        if let Some(mut ball) = ball {
            // Snapshot for the deflection classifier before the physics step
            // replaces this with the post-contact velocity.
            ball.last_velocity = vel.linvel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_height_and_vertical_velocity() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(GameConfig::default());
        app.add_systems(Update, clamp_to_plane);

        let e = app
            .world_mut()
            .spawn((
                PlaneBound,
                Ball::default(),
                Transform::from_xyz(1.0, 3.2, -2.0),
                Velocity {
                    linvel: Vec3::new(2.0, -9.0, 4.0),
                    angvel: Vec3::new(1.0, 0.5, -1.0),
                },
            ))
            .id();
        app.update();

        let tf = app.world().get::<Transform>(e).unwrap();
        let vel = app.world().get::<Velocity>(e).unwrap();
        let ball = app.world().get::<Ball>(e).unwrap();
        assert_eq!(tf.translation.y, 0.5);
        assert_eq!(vel.linvel.y, 0.0);
        assert_eq!(vel.angvel.x, 0.0);
        assert_eq!(vel.angvel.z, 0.0);
        // Planar components untouched; snapshot matches the clamped velocity.
        assert_eq!(vel.linvel.x, 2.0);
        assert_eq!(vel.linvel.z, 4.0);
        assert_eq!(ball.last_velocity, vel.linvel);
    }
}
