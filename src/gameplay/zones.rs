use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::core::components::Ball;
use crate::core::config::GameConfig;
use crate::core::system::system_order::PostPhysicsAdjustSet;
use crate::gameplay::round::{BallLossCause, BallLost, GraceBonusEarned};

/// Floor region that swaps the ball's surface material while it stays inside.
#[derive(Component, Debug, Clone, Copy)]
pub struct SurfaceZone {
    pub friction: f32,
    pub restitution: f32,
}

/// Solid post that grants extra grace-window time on contact.
#[derive(Component, Debug, Clone, Copy)]
pub struct RewardZone {
    pub bonus_seconds: f32,
}

/// Sensor strip behind the drain gap; touching it loses the ball.
#[derive(Component, Debug, Default)]
pub struct OutZone;

pub struct ZonesPlugin;

impl Plugin for ZonesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PostUpdate,
            (apply_surface_zones, award_reward_contacts, detect_out_of_bounds)
                .in_set(PostPhysicsAdjustSet)
                .before(crate::gameplay::round::handle_round_events),
        );
    }
}

/// Swap the ball's friction/restitution on zone entry and restore the
/// defaults on exit. Overlapping zones resolve to whichever event arrived
/// last; the layouts here keep zones disjoint.
pub fn apply_surface_zones(
    cfg: Res<GameConfig>,
    mut collisions: EventReader<CollisionEvent>,
    zones: Query<&SurfaceZone>,
    balls: Query<(), With<Ball>>,
    mut commands: Commands,
) {
    for ev in collisions.read() {
        let (e1, e2, entered) = match ev {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2, true),
            CollisionEvent::Stopped(e1, e2, _) => (*e1, *e2, false),
        };
        let (ball_e, zone_e) = if balls.get(e1).is_ok() && zones.get(e2).is_ok() {
            (e1, e2)
        } else if balls.get(e2).is_ok() && zones.get(e1).is_ok() {
            (e2, e1)
        } else {
            continue;
        };
        let Ok(zone) = zones.get(zone_e) else {
            continue;
        };
        let Ok(mut ball_cmd) = commands.get_entity(ball_e) else {
            continue;
        };
        if entered {
            ball_cmd.insert((
                Friction::coefficient(zone.friction),
                Restitution::coefficient(zone.restitution),
            ));
        } else {
            ball_cmd.insert((
                Friction::coefficient(cfg.ball.friction),
                Restitution::coefficient(cfg.ball.restitution),
            ));
        }
    }
}

pub fn award_reward_contacts(
    mut collisions: EventReader<CollisionEvent>,
    rewards: Query<&RewardZone>,
    balls: Query<(), With<Ball>>,
    mut bonuses: EventWriter<GraceBonusEarned>,
) {
    for ev in collisions.read() {
        let CollisionEvent::Started(e1, e2, _) = ev else {
            continue;
        };
        let reward = if balls.get(*e1).is_ok() {
            rewards.get(*e2).ok()
        } else if balls.get(*e2).is_ok() {
            rewards.get(*e1).ok()
        } else {
            None
        };
        if let Some(reward) = reward {
            bonuses.write(GraceBonusEarned(reward.bonus_seconds));
        }
    }
}

pub fn detect_out_of_bounds(
    mut collisions: EventReader<CollisionEvent>,
    outs: Query<(), With<OutZone>>,
    balls: Query<(), With<Ball>>,
    mut lost: EventWriter<BallLost>,
) {
    for ev in collisions.read() {
        let CollisionEvent::Started(e1, e2, _) = ev else {
            continue;
        };
        let ball = if balls.get(*e1).is_ok() && outs.get(*e2).is_ok() {
            Some(*e1)
        } else if balls.get(*e2).is_ok() && outs.get(*e1).is_ok() {
            Some(*e2)
        } else {
            None
        };
        if let Some(ball) = ball {
            lost.write(BallLost {
                ball,
                cause: BallLossCause::OutOfBounds,
            });
        }
    }
}
