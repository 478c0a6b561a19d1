use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::core::components::Ball;
use crate::core::config::GameConfig;
use crate::core::plane::to_planar;
use crate::core::system::system_order::PrePhysicsSet;

/// Radial attractor pulling balls toward its center while they are in range.
#[derive(Component, Debug, Clone, Copy)]
pub struct GravityWell {
    pub strength: f32,
    pub max_distance: f32,
}

/// Distance below which the pull is cut off entirely (singularity guard).
const WELL_DEAD_ZONE: f32 = 0.1;

/// Plugin summing gravity-well contributions into ball velocity, applied
/// before physics (after the plane clamp, before speed clamping).
pub struct GravityWellPlugin;

impl Plugin for GravityWellPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PostUpdate,
            apply_gravity_wells
                .in_set(PrePhysicsSet)
                .after(crate::physics::plane::clamp_to_plane),
        );
    }
}

/// Falloff: strength * (1 - d/max)^2, zero beyond `max_distance` or inside the
/// dead zone.
pub fn well_force_at(well: &GravityWell, center: Vec2, pos: Vec2) -> f32 {
    let distance = center.distance(pos);
    if distance > well.max_distance || distance < WELL_DEAD_ZONE {
        return 0.0;
    }
    let normalized = distance / well.max_distance;
    well.strength * (1.0 - normalized).powi(2)
}

pub fn apply_gravity_wells(
    cfg: Res<GameConfig>,
    time: Res<Time>,
    wells: Query<(&GravityWell, &Transform), Without<Ball>>,
    mut balls: Query<(&Transform, &mut Velocity), With<Ball>>,
) {
    let dt = time.delta_secs();
    for (ball_tf, mut vel) in balls.iter_mut() {
        let pos = to_planar(ball_tf.translation);
        if ball_tf.translation.z < cfg.arena.play_area_min_z {
            continue; // draining balls coast out unaffected
        }
        let mut total = Vec2::ZERO;
        for (well, well_tf) in wells.iter() {
            let center = to_planar(well_tf.translation);
            let force = well_force_at(well, center, pos);
            if force > 0.0 {
                let dir = (center - pos).normalize_or_zero();
                total += dir * force * dt;
            }
        }
        if total.length_squared() > 1e-6 {
            vel.linvel.x += total.x;
            vel.linvel.z += total.y;
            vel.linvel.y = 0.0;
        }
    }
}
