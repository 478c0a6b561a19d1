use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

use crate::core::components::Ball;
use crate::core::config::config::EnemySpawnConfig;
use crate::core::config::GameConfig;
use crate::core::plane::to_planar;
use crate::core::system::system_order::{PostPhysicsAdjustSet, PrePhysicsSet};
use crate::gameplay::round::{BallLossCause, BallLost, EnemyKilled, RoundState};

/// Common enemy state. Behavior comes from a sibling `Patrol` or `Chase`
/// component; one level of specialization, dispatched by the ECS instead of a
/// class hierarchy.
#[derive(Component, Debug, Clone)]
pub struct Enemy {
    pub score_per_kill: i32,
    /// Always 1 today; kept so multi-hit enemies stay a data change.
    pub hits_to_destroy: u32,
    pub hits_taken: u32,
    /// Spawn spec carried along so the respawn timer can recreate the same enemy.
    pub spawn: EnemySpawnConfig,
}

/// Deterministic circular patrol around a fixed center.
#[derive(Component, Debug)]
pub struct Patrol {
    pub center: Vec2,
    pub radius: f32,
    pub angular_speed: f32,
    /// Radians; initialized from the spawn offset so the path has no seam.
    pub angle: f32,
}

/// Short aggressive lunge toward the nearest ball in range.
#[derive(Component, Debug)]
pub struct Chase {
    pub detect_radius: f32,
    pub speed: f32,
    /// The lunge ends after this long regardless of distance.
    pub duration: f32,
    pub timer: f32,
    pub target: Option<Entity>,
}

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PostUpdate, (move_patrol, move_chase).in_set(PrePhysicsSet))
            .add_systems(
                PostUpdate,
                route_enemy_contacts
                    .in_set(PostPhysicsAdjustSet)
                    .before(crate::gameplay::round::handle_round_events),
            );
    }
}

pub fn move_patrol(
    cfg: Res<GameConfig>,
    time: Res<Time>,
    mut q: Query<(&mut Patrol, &mut Transform)>,
) {
    let dt = time.delta_secs();
    let height = cfg.arena.plane_height;
    for (mut patrol, mut tf) in q.iter_mut() {
        patrol.angle += patrol.angular_speed * dt;
        let x = patrol.center.x + patrol.angle.cos() * patrol.radius;
        let z = patrol.center.y + patrol.angle.sin() * patrol.radius;
        tf.translation = Vec3::new(x, height, z);
    }
}

pub fn move_chase(
    cfg: Res<GameConfig>,
    time: Res<Time>,
    mut q: Query<(&mut Chase, &mut Transform), Without<Ball>>,
    balls: Query<(Entity, &Transform), With<Ball>>,
) {
    let dt = time.delta_secs();
    let height = cfg.arena.plane_height;
    for (mut chase, mut tf) in q.iter_mut() {
        let pos = to_planar(tf.translation);

        // Drop despawned targets, then try to acquire the nearest ball in range.
        if chase.target.is_some_and(|t| balls.get(t).is_err()) {
            chase.target = None;
        }
        if chase.target.is_none() {
            let mut closest: Option<(Entity, f32)> = None;
            let limit = chase.detect_radius * chase.detect_radius;
            for (ball, ball_tf) in balls.iter() {
                let d2 = to_planar(ball_tf.translation).distance_squared(pos);
                if d2 <= limit && closest.is_none_or(|(_, best)| d2 < best) {
                    closest = Some((ball, d2));
                }
            }
            chase.target = closest.map(|(e, _)| e);
        }

        let Some(target) = chase.target else {
            chase.timer = 0.0;
            continue;
        };
        chase.timer += dt;
        if let Ok((_, ball_tf)) = balls.get(target) {
            let dir = (to_planar(ball_tf.translation) - pos).normalize_or_zero();
            let next = pos + dir * chase.speed * dt;
            tf.translation = Vec3::new(next.x, height, next.y);
        }
        if chase.timer >= chase.duration {
            // Lunge over; wait for the ball to come close again.
            chase.target = None;
            chase.timer = 0.0;
        }
    }
}

/// Decide each ball-enemy contact: inside the grace window the ball damages
/// the enemy, outside the enemy eats the ball.
pub fn route_enemy_contacts(
    cfg: Res<GameConfig>,
    time: Res<Time>,
    round: Res<RoundState>,
    mut collisions: EventReader<CollisionEvent>,
    balls: Query<(), With<Ball>>,
    mut enemies: Query<&mut Enemy>,
    mut killed: EventWriter<EnemyKilled>,
    mut lost: EventWriter<BallLost>,
    mut commands: Commands,
) {
    let now = time.elapsed_secs();
    for ev in collisions.read() {
        let CollisionEvent::Started(e1, e2, flags) = ev else {
            continue;
        };
        if flags.contains(CollisionEventFlags::SENSOR) {
            continue;
        }
        let (ball_e, enemy_e) = if balls.get(*e1).is_ok() && enemies.get(*e2).is_ok() {
            (*e1, *e2)
        } else if balls.get(*e2).is_ok() && enemies.get(*e1).is_ok() {
            (*e2, *e1)
        } else {
            continue;
        };
        let Ok(mut enemy) = enemies.get_mut(enemy_e) else {
            continue;
        };

        if round.in_grace_window(now, cfg.round.enemy_hit_grace_time) {
            enemy.hits_taken += 1;
            if enemy.hits_taken >= enemy.hits_to_destroy {
                killed.write(EnemyKilled {
                    score: enemy.score_per_kill,
                    respawn: enemy.spawn.clone(),
                });
                commands.entity(enemy_e).despawn();
            }
        } else {
            lost.write(BallLost {
                ball: ball_e,
                cause: BallLossCause::Eaten,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patrol_app() -> App {
        let mut app = App::new();
        // Manual clock: deterministic deltas instead of TimePlugin's wall time.
        app.insert_resource(Time::<()>::default());
        app.insert_resource(GameConfig::default());
        app.add_systems(Update, (move_patrol, move_chase));
        app
    }

    fn advance(app: &mut App, dt: f32) {
        use std::time::Duration;
        if let Some(mut time) = app.world_mut().get_resource_mut::<Time>() {
            time.advance_by(Duration::from_secs_f32(dt));
        }
        app.update();
    }

    #[test]
    fn patrol_stays_on_circle() {
        let mut app = patrol_app();
        let e = app
            .world_mut()
            .spawn((
                Patrol {
                    center: Vec2::new(-3.0, 0.0),
                    radius: 1.5,
                    angular_speed: 1.5,
                    angle: 0.0,
                },
                Transform::from_xyz(-1.5, 0.5, 0.0),
            ))
            .id();
        for _ in 0..10 {
            advance(&mut app, 0.05);
        }
        let tf = app.world().get::<Transform>(e).unwrap();
        let dist = to_planar(tf.translation).distance(Vec2::new(-3.0, 0.0));
        assert!((dist - 1.5).abs() < 1e-4);
        assert_eq!(tf.translation.y, 0.5);
    }

    #[test]
    fn chase_acquires_and_times_out() {
        let mut app = patrol_app();
        let _ball = app
            .world_mut()
            .spawn((Ball::default(), Transform::from_xyz(1.0, 0.5, 0.0)))
            .id();
        let enemy = app
            .world_mut()
            .spawn((
                Chase {
                    detect_radius: 2.5,
                    speed: 1.8,
                    duration: 0.2,
                    timer: 0.0,
                    target: None,
                },
                Transform::from_xyz(0.0, 0.5, 0.0),
            ))
            .id();

        advance(&mut app, 0.1);
        {
            let chase = app.world().get::<Chase>(enemy).unwrap();
            assert!(chase.target.is_some(), "ball within detect radius");
        }
        let x0 = app.world().get::<Transform>(enemy).unwrap().translation.x;
        assert!(x0 > 0.0, "moved toward the ball");

        // Lunge expires even though the ball is still near.
        advance(&mut app, 0.2);
        let chase = app.world().get::<Chase>(enemy).unwrap();
        assert!(chase.target.is_none());
        assert_eq!(chase.timer, 0.0);
    }

    fn contact_app(in_grace: bool) -> App {
        let mut app = App::new();
        app.insert_resource(Time::<()>::default());
        app.insert_resource(GameConfig::default());
        let mut round = RoundState::new(3);
        if in_grace {
            // Launch at t=0 with the clock at t=0: inside the base window.
            round.on_ball_launched(0.0);
        }
        app.insert_resource(round);
        app.add_event::<CollisionEvent>();
        app.add_event::<EnemyKilled>();
        app.add_event::<BallLost>();
        app.add_systems(Update, route_enemy_contacts);
        app
    }

    fn spawn_pair(app: &mut App) -> (Entity, Entity) {
        let ball = app
            .world_mut()
            .spawn((Ball::default(), Transform::from_xyz(0.0, 0.5, 0.0)))
            .id();
        let spec = GameConfig::default().enemy_set[0].clone();
        let enemy = app
            .world_mut()
            .spawn((
                Enemy {
                    score_per_kill: spec.score_per_kill,
                    hits_to_destroy: 1,
                    hits_taken: 0,
                    spawn: spec,
                },
                Transform::from_xyz(0.3, 0.5, 0.0),
            ))
            .id();
        (ball, enemy)
    }

    fn send_contact(app: &mut App, e1: Entity, e2: Entity, flags: CollisionEventFlags) {
        app.world_mut()
            .resource_mut::<Events<CollisionEvent>>()
            .send(CollisionEvent::Started(e1, e2, flags));
    }

    #[test]
    fn contact_in_grace_kills_and_reports() {
        let mut app = contact_app(true);
        let (ball, enemy) = spawn_pair(&mut app);
        send_contact(&mut app, ball, enemy, CollisionEventFlags::empty());
        app.update();

        let killed: Vec<_> = app
            .world_mut()
            .resource_mut::<Events<EnemyKilled>>()
            .drain()
            .collect();
        assert_eq!(killed.len(), 1);
        assert_eq!(killed[0].score, 50);
        assert!(app.world().get::<Enemy>(enemy).is_none(), "enemy despawned");
        assert!(app.world().get::<Ball>(ball).is_some(), "ball survives");
    }

    #[test]
    fn contact_outside_grace_eats_the_ball() {
        let mut app = contact_app(false);
        let (ball, enemy) = spawn_pair(&mut app);
        // Entity order in the event must not matter.
        send_contact(&mut app, enemy, ball, CollisionEventFlags::empty());
        app.update();

        let lost: Vec<_> = app
            .world_mut()
            .resource_mut::<Events<BallLost>>()
            .drain()
            .collect();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].ball, ball);
        assert_eq!(lost[0].cause, BallLossCause::Eaten);
        let e = app.world().get::<Enemy>(enemy).unwrap();
        assert_eq!(e.hits_taken, 0, "enemy untouched outside the window");
    }

    #[test]
    fn sensor_contacts_are_ignored() {
        let mut app = contact_app(true);
        let (ball, enemy) = spawn_pair(&mut app);
        send_contact(&mut app, ball, enemy, CollisionEventFlags::SENSOR);
        app.update();

        assert!(app
            .world_mut()
            .resource_mut::<Events<EnemyKilled>>()
            .drain()
            .next()
            .is_none());
        assert!(app.world().get::<Enemy>(enemy).is_some());
    }

    #[test]
    fn chase_ignores_distant_ball() {
        let mut app = patrol_app();
        app.world_mut()
            .spawn((Ball::default(), Transform::from_xyz(9.0, 0.5, 0.0)));
        let enemy = app
            .world_mut()
            .spawn((
                Chase {
                    detect_radius: 2.5,
                    speed: 1.8,
                    duration: 2.0,
                    timer: 0.0,
                    target: None,
                },
                Transform::from_xyz(0.0, 0.5, 0.0),
            ))
            .id();
        advance(&mut app, 0.1);
        assert!(app.world().get::<Chase>(enemy).unwrap().target.is_none());
    }
}
