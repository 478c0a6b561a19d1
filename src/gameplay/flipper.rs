use bevy::platform::collections::{HashMap, HashSet};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

use crate::core::components::Ball;
use crate::core::config::GameConfig;
use crate::core::plane::{from_planar, reflect_planar, to_planar};
use crate::core::system::system_order::{PostPhysicsAdjustSet, PrePhysicsSet};
use crate::gameplay::round::BallLaunched;

/// Angular velocity below this (deg/s) counts as not moving.
const SWEEP_EPSILON: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipperSide {
    Left,
    Right,
}

/// A kinematic paddle rotating about a pivot at its outer edge. The angle is
/// integrated by hand each frame; the physics body only ever sees the
/// resulting transform.
#[derive(Component, Debug)]
pub struct Flipper {
    pub side: FlipperSide,
    /// World position of the rotation axis.
    pub pivot: Vec3,
    /// Body center at rest angle, in world space.
    pub rest: Vec3,
    pub half_length: f32,
    /// Current sweep angle in degrees about world Y. The left flipper sweeps
    /// negative, the right positive; both throw the tip up the table.
    pub angle: f32,
    pub prev_angle: f32,
    /// Degrees per second, derived from the frame's angle delta.
    pub angular_velocity: f32,
}

impl Flipper {
    pub fn new(side: FlipperSide, pivot: Vec3, rest: Vec3, half_length: f32) -> Self {
        Self {
            side,
            pivot,
            rest,
            half_length,
            angle: 0.0,
            prev_angle: 0.0,
            angular_velocity: 0.0,
        }
    }

    /// True while the flipper is actively sweeping toward its pressed extreme,
    /// the only phase that launches or strikes the ball.
    pub fn sweeping_toward_extreme(&self) -> bool {
        match self.side {
            FlipperSide::Left => self.angular_velocity < -SWEEP_EPSILON,
            FlipperSide::Right => self.angular_velocity > SWEEP_EPSILON,
        }
    }

    /// Linear speed of the paddle tip, m/s.
    pub fn edge_speed(&self) -> f32 {
        self.angular_velocity.abs().to_radians() * self.half_length
    }
}

/// Ball-flipper pairs currently in contact, maintained from collision events.
#[derive(Resource, Default, Debug)]
pub struct FlipperContacts(pub HashSet<(Entity, Entity)>);

/// Per-pair cooldown stamps so one physical hit does not apply the strike
/// impulse on several consecutive frames.
#[derive(Resource, Default, Debug)]
pub struct StrikeCooldowns(pub HashMap<(Entity, Entity), f32>);

pub struct FlipperPlugin;

impl Plugin for FlipperPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FlipperContacts>()
            .init_resource::<StrikeCooldowns>()
            .add_systems(
                PostUpdate,
                (drive_flippers, launch_resting_ball.after(drive_flippers))
                    .in_set(PrePhysicsSet),
            )
            .add_systems(
                PostUpdate,
                (
                    track_flipper_contacts,
                    flipper_strike.after(track_flipper_contacts),
                    escape_pinned_ball.after(flipper_strike),
                )
                    .in_set(PostPhysicsAdjustSet)
                    .before(crate::gameplay::round::handle_round_events),
            );
    }
}

/// Integrate flipper angles from input and write the kinematic transform.
/// Press sweeps at a constant rate; release eases back exponentially.
pub fn drive_flippers(
    cfg: Res<GameConfig>,
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    mut q: Query<(&mut Flipper, &mut Transform)>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    let left_pressed = keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft);
    let right_pressed = keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight);

    for (mut flipper, mut tf) in q.iter_mut() {
        let pressed = match flipper.side {
            FlipperSide::Left => left_pressed,
            FlipperSide::Right => right_pressed,
        };
        // A +Y rotation carries +X toward -Z, so the left arm (pointing +X
        // from its pivot) needs negative angles to sweep up the table.
        let sign = match flipper.side {
            FlipperSide::Left => -1.0,
            FlipperSide::Right => 1.0,
        };
        flipper.prev_angle = flipper.angle;
        if pressed {
            let next = flipper.angle + sign * cfg.flipper.sweep_speed * dt;
            flipper.angle = next.clamp(-cfg.flipper.max_angle, cfg.flipper.max_angle);
        } else {
            // Exponential return toward rest, frame-rate independent enough
            // at game timesteps.
            let t = (cfg.flipper.return_rate * dt).min(1.0);
            flipper.angle += (0.0 - flipper.angle) * t;
        }
        flipper.angular_velocity = (flipper.angle - flipper.prev_angle) / dt;

        let rotation = Quat::from_rotation_y(flipper.angle.to_radians());
        tf.translation = flipper.pivot + rotation * (flipper.rest - flipper.pivot);
        tf.rotation = rotation;
    }
}

/// A resting (never launched) ball in contact with a sweeping flipper gets
/// the fixed launch impulse, angled slightly outward.
pub fn launch_resting_ball(
    cfg: Res<GameConfig>,
    contacts: Res<FlipperContacts>,
    flippers: Query<&Flipper>,
    mut balls: Query<(Entity, &mut Ball, &mut Velocity)>,
    mut launched: EventWriter<BallLaunched>,
) {
    for (ball_e, mut ball, mut vel) in balls.iter_mut() {
        if ball.launched {
            continue;
        }
        for &(b, f) in contacts.0.iter() {
            if b != ball_e {
                continue;
            }
            let Ok(flipper) = flippers.get(f) else {
                continue;
            };
            if !flipper.sweeping_toward_extreme() {
                continue;
            }
            let lean = match flipper.side {
                FlipperSide::Left => 0.3,
                FlipperSide::Right => -0.3,
            };
            let dir = Vec3::new(lean, 0.0, 1.0).normalize();
            vel.linvel = dir * cfg.flipper.launch_force;
            ball.launched = true;
            launched.write(BallLaunched);
            break;
        }
    }
}

pub fn track_flipper_contacts(
    mut contacts: ResMut<FlipperContacts>,
    mut collisions: EventReader<CollisionEvent>,
    balls: Query<(), With<Ball>>,
    flippers: Query<(), With<Flipper>>,
) {
    for ev in collisions.read() {
        let (e1, e2, started) = match ev {
            CollisionEvent::Started(e1, e2, flags) => {
                if flags.contains(CollisionEventFlags::SENSOR) {
                    continue;
                }
                (*e1, *e2, true)
            }
            CollisionEvent::Stopped(e1, e2, _) => (*e1, *e2, false),
        };
        let pair = if balls.get(e1).is_ok() && flippers.get(e2).is_ok() {
            (e1, e2)
        } else if balls.get(e2).is_ok() && flippers.get(e1).is_ok() {
            (e2, e1)
        } else {
            continue;
        };
        if started {
            contacts.0.insert(pair);
        } else {
            contacts.0.remove(&pair);
        }
    }
}

/// Compute the outgoing velocity for a launched ball struck by a flipper.
/// Pure so the impulse math is testable without a physics world.
pub fn strike_velocity(
    incoming: Vec2,
    normal: Vec2,
    side: FlipperSide,
    edge_speed: f32,
    sweeping: bool,
    min_exit_speed: f32,
    max_speed: f32,
) -> Vec2 {
    let base = incoming.length().max(min_exit_speed);
    if incoming.length_squared() < 1e-6 {
        // Degenerate incoming direction: shove straight off the paddle face.
        return normal * base;
    }
    let reflect = reflect_planar(incoming.normalize_or_zero(), normal).normalize_or_zero();
    let mut out = reflect * base;
    if sweeping {
        // The moving paddle adds its tip velocity along the surface tangent,
        // oriented so each side throws the ball inward and up the table.
        let tangent = match side {
            FlipperSide::Right => Vec2::new(-normal.y, normal.x),
            FlipperSide::Left => Vec2::new(normal.y, -normal.x),
        };
        let combined = out + tangent * edge_speed;
        let speed = combined.length().max(base);
        out = combined.normalize_or_zero() * speed;
    }
    if out.length() > max_speed {
        out = out.normalize_or_zero() * max_speed;
    }
    out
}

/// Apply the strike response when a launched ball contacts a flipper.
pub fn flipper_strike(
    cfg: Res<GameConfig>,
    time: Res<Time>,
    rapier: ReadRapierContext,
    mut collisions: EventReader<CollisionEvent>,
    mut cooldowns: ResMut<StrikeCooldowns>,
    flippers: Query<&Flipper>,
    mut balls: Query<(&Ball, &mut Transform, &mut Velocity)>,
) {
    let Ok(ctx) = rapier.single() else {
        return;
    };
    let now = time.elapsed_secs();
    for ev in collisions.read() {
        let CollisionEvent::Started(e1, e2, flags) = ev else {
            continue;
        };
        if flags.contains(CollisionEventFlags::SENSOR) {
            continue;
        }
        let (ball_e, flipper_e) = if balls.get(*e1).is_ok() && flippers.get(*e2).is_ok() {
            (*e1, *e2)
        } else if balls.get(*e2).is_ok() && flippers.get(*e1).is_ok() {
            (*e2, *e1)
        } else {
            continue;
        };
        let key = (ball_e, flipper_e);
        if cooldowns
            .0
            .get(&key)
            .is_some_and(|&stamp| now - stamp < cfg.flipper.contact_cooldown)
        {
            continue;
        }
        let Ok(flipper) = flippers.get(flipper_e) else {
            continue;
        };
        let Ok((ball, mut tf, mut vel)) = balls.get_mut(ball_e) else {
            continue;
        };
        if !ball.launched {
            continue; // the launch system owns the resting ball
        }

        let Some(pair) = ctx.contact_pair(ball_e, flipper_e) else {
            continue;
        };
        let Some(manifold) = pair.manifold(0) else {
            continue;
        };
        let mut normal = to_planar(manifold.normal()).normalize_or_zero();
        if normal.length_squared() < 0.01 {
            continue;
        }
        let incoming = to_planar(ball.last_velocity);
        if incoming.length_squared() < 0.01 {
            continue; // no usable travel direction: engine response stands
        }
        if normal.dot(incoming) > 0.0 {
            normal = -normal;
        }

        let out = strike_velocity(
            incoming,
            normal,
            flipper.side,
            flipper.edge_speed(),
            flipper.sweeping_toward_extreme(),
            cfg.flipper.min_exit_speed,
            cfg.ball.max_speed,
        );
        vel.linvel = from_planar(out, 0.0);
        // Nudge out of the paddle so the kinematic body cannot re-tunnel it
        // next frame.
        tf.translation += from_planar(normal * cfg.flipper.push_out, 0.0);
        cooldowns.0.insert(key, now);
    }
    cooldowns
        .0
        .retain(|_, stamp| now - *stamp < cfg.flipper.contact_cooldown * 4.0);
}

/// A launched ball pinned against a flipper (near-zero speed while in
/// contact) gets pushed away so the kinematic body cannot trap it.
pub fn escape_pinned_ball(
    cfg: Res<GameConfig>,
    contacts: Res<FlipperContacts>,
    flippers: Query<&Transform, With<Flipper>>,
    mut balls: Query<(&Ball, &Transform, &mut Velocity), Without<Flipper>>,
) {
    for &(ball_e, flipper_e) in contacts.0.iter() {
        let Ok((ball, ball_tf, mut vel)) = balls.get_mut(ball_e) else {
            continue;
        };
        if !ball.launched {
            continue;
        }
        if to_planar(vel.linvel).length() >= cfg.flipper.stuck_escape_speed {
            continue;
        }
        let Ok(flipper_tf) = flippers.get(flipper_e) else {
            continue;
        };
        let away = to_planar(ball_tf.translation - flipper_tf.translation).normalize_or_zero();
        let dir = if away.length_squared() < 0.01 {
            Vec2::new(0.0, 1.0)
        } else {
            away
        };
        vel.linvel = from_planar(dir * cfg.ball.min_speed, 0.0);
    }
}
