use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

use crate::core::components::{Ball, Target};
use crate::core::config::GameConfig;
use crate::core::plane::{from_planar, to_planar};
use crate::core::system::system_order::{PostPhysicsAdjustSet, PrePhysicsSet};
use crate::gameplay::deflect::{classify, deflect_direction, escalation, random_forward_dir};
use crate::gameplay::enemy::Enemy;
use crate::gameplay::flipper::Flipper;

/// A green target was struck; the hook where impact feedback (shake,
/// particles) would attach. Currently consumed only by the debug log.
#[derive(Event, Debug, Clone, Copy)]
pub struct TargetStruck {
    pub position: Vec3,
    pub impact_speed: f32,
}

pub struct BallPlugin;

impl Plugin for BallPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TargetStruck>()
            .add_systems(
                PostUpdate,
                regulate_ball_speed
                    .in_set(PrePhysicsSet)
                    .after(crate::physics::gravity::apply_gravity_wells),
            )
            .add_systems(
                PostUpdate,
                deflect_ball_contacts
                    .in_set(PostPhysicsAdjustSet)
                    .before(crate::gameplay::round::handle_round_events),
            );
    }
}

/// Direction-preserving speed clamp plus stuck-ball recovery. The lower bound
/// only applies after launch so a freshly spawned ball rests on its flipper
/// without jitter.
pub fn regulate_ball_speed(
    cfg: Res<GameConfig>,
    mut q: Query<(&Transform, &mut Velocity, &Ball)>,
) {
    let min = cfg.ball.min_speed;
    let max = cfg.ball.max_speed;
    for (tf, mut vel, ball) in q.iter_mut() {
        if tf.translation.z < cfg.arena.play_area_min_z {
            continue; // draining; let it coast into the out sensor
        }
        let planar = to_planar(vel.linvel);
        let speed = planar.length();

        if ball.launched && speed < cfg.ball.stuck_speed {
            // Stuck against something; kick it loose.
            let dir = random_forward_dir(&mut rand::thread_rng());
            vel.linvel = from_planar(dir * min, 0.0);
            continue;
        }
        if ball.launched && speed < min && speed > cfg.ball.stuck_speed {
            vel.linvel = from_planar(planar.normalize() * min, 0.0);
        } else if speed > max {
            vel.linvel = from_planar(planar.normalize() * max, 0.0);
        }
    }
}

/// Post-contact correction for wall/target hits. Vertical incidence gets the
/// forced randomized deflection; anything else keeps the engine's response
/// with the out-of-plane component re-zeroed. Flipper and enemy contacts are
/// owned by their modules and skipped here.
pub fn deflect_ball_contacts(
    cfg: Res<GameConfig>,
    mut collisions: EventReader<CollisionEvent>,
    rapier: ReadRapierContext,
    mut balls: Query<(&mut Ball, &Transform, &mut Velocity)>,
    flippers: Query<(), With<Flipper>>,
    enemies: Query<(), With<Enemy>>,
    targets: Query<(), With<Target>>,
    mut target_ev: EventWriter<TargetStruck>,
) {
    let Ok(ctx) = rapier.single() else {
        return;
    };
    let mut rng = rand::thread_rng();

    for ev in collisions.read() {
        let CollisionEvent::Started(e1, e2, flags) = ev else {
            continue;
        };
        if flags.contains(CollisionEventFlags::SENSOR) {
            continue;
        }
        let (ball_e, other_e) = if balls.get(*e1).is_ok() {
            (*e1, *e2)
        } else if balls.get(*e2).is_ok() {
            (*e2, *e1)
        } else {
            continue;
        };
        if flippers.get(other_e).is_ok() || enemies.get(other_e).is_ok() {
            continue;
        }

        let Ok((mut ball, tf, mut vel)) = balls.get_mut(ball_e) else {
            continue;
        };

        let incoming_planar = to_planar(ball.last_velocity);
        if targets.get(other_e).is_ok() {
            let impact_speed = if incoming_planar.length() > 0.1 {
                incoming_planar.length()
            } else {
                to_planar(vel.linvel).length()
            };
            target_ev.write(TargetStruck {
                position: tf.translation,
                impact_speed,
            });
        }

        // Contact normal from the narrow phase, projected to the plane.
        let Some(pair) = ctx.contact_pair(ball_e, other_e) else {
            continue;
        };
        let Some(manifold) = pair.manifold(0) else {
            continue;
        };
        let mut normal = to_planar(manifold.normal()).normalize_or_zero();
        if normal.length_squared() < 0.01 {
            continue; // degenerate normal: defer to the engine response
        }

        let incoming_dir = if incoming_planar.length() > 0.1 {
            incoming_planar.normalize()
        } else {
            // Pre-contact velocity unusable; approximate from the bounce.
            -to_planar(vel.linvel).normalize_or_zero()
        };
        if incoming_dir.length_squared() < 0.01 {
            continue;
        }
        // Orient the normal against the incoming direction regardless of
        // which collider the manifold considers first.
        if normal.dot(incoming_dir) > 0.0 {
            normal = -normal;
        }

        let incidence = classify(incoming_dir, normal);
        if incidence.vertical {
            ball.consecutive_perpendicular_hits += 1;
            let (factor, reset) = escalation(ball.consecutive_perpendicular_hits);
            if reset {
                ball.consecutive_perpendicular_hits = 0;
            }
            let magnitude = cfg.ball.deflection_angle * factor;
            let dir = deflect_direction(&mut rng, &incidence, incoming_dir, normal, magnitude);
            let speed = incoming_planar
                .length()
                .clamp(cfg.ball.min_speed, cfg.ball.max_speed);
            vel.linvel = from_planar(dir * speed, 0.0);
        } else {
            ball.consecutive_perpendicular_hits = 0;
            vel.linvel.y = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speed_app() -> App {
        let mut app = App::new();
        app.insert_resource(GameConfig::default());
        app.add_systems(Update, regulate_ball_speed);
        app
    }

    fn spawn_ball(app: &mut App, launched: bool, vel: Vec3) -> Entity {
        app.world_mut()
            .spawn((
                Ball {
                    launched,
                    ..default()
                },
                Transform::from_xyz(0.0, 0.5, 0.0),
                Velocity {
                    linvel: vel,
                    angvel: Vec3::ZERO,
                },
            ))
            .id()
    }

    #[test]
    fn launched_slow_ball_raised_to_min_speed() {
        let mut app = speed_app();
        let e = spawn_ball(&mut app, true, Vec3::new(0.0, 0.0, 1.0));
        app.update();
        let vel = app.world().get::<Velocity>(e).unwrap();
        assert!((vel.linvel.length() - 5.0).abs() < 1e-4);
        assert_eq!(vel.linvel.y, 0.0);
        // Direction preserved.
        assert!(vel.linvel.z > 0.0 && vel.linvel.x.abs() < 1e-4);
    }

    #[test]
    fn fast_ball_clamped_to_max_speed() {
        let mut app = speed_app();
        let e = spawn_ball(&mut app, true, Vec3::new(30.0, 0.0, 40.0));
        app.update();
        let vel = app.world().get::<Velocity>(e).unwrap();
        assert!((vel.linvel.length() - 15.0).abs() < 1e-3);
        // Direction preserved: 3-4-5 triangle.
        assert!((vel.linvel.x - 9.0).abs() < 1e-3);
        assert!((vel.linvel.z - 12.0).abs() < 1e-3);
    }

    #[test]
    fn resting_unlaunched_ball_left_alone() {
        let mut app = speed_app();
        let e = spawn_ball(&mut app, false, Vec3::ZERO);
        app.update();
        let vel = app.world().get::<Velocity>(e).unwrap();
        assert_eq!(vel.linvel, Vec3::ZERO);
    }

    #[test]
    fn stuck_launched_ball_gets_recovery_kick() {
        let mut app = speed_app();
        let e = spawn_ball(&mut app, true, Vec3::new(0.01, 0.0, 0.0));
        app.update();
        let vel = app.world().get::<Velocity>(e).unwrap();
        assert!((vel.linvel.length() - 5.0).abs() < 1e-3);
        assert!(vel.linvel.z > 0.0, "recovery kick is biased forward");
    }

    #[test]
    fn draining_ball_not_regulated() {
        let mut app = speed_app();
        let e = app
            .world_mut()
            .spawn((
                Ball {
                    launched: true,
                    ..default()
                },
                Transform::from_xyz(0.0, 0.5, -5.0), // past play_area_min_z
                Velocity {
                    linvel: Vec3::new(0.0, 0.0, -1.0),
                    angvel: Vec3::ZERO,
                },
            ))
            .id();
        app.update();
        let vel = app.world().get::<Velocity>(e).unwrap();
        assert_eq!(vel.linvel, Vec3::new(0.0, 0.0, -1.0));
    }
}
