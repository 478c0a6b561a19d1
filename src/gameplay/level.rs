//! Arena construction: ground, walls, flippers, targets, zones, enemies and
//! the ball itself. Everything is spawned from `GameConfig` so the layout is
//! data, not code.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::Rng;

use crate::core::components::{Ball, PlaneBound, Target};
use crate::core::config::config::{EnemyKindConfig, EnemySpawnConfig};
use crate::core::config::GameConfig;
use crate::gameplay::ball::TargetStruck;
use crate::gameplay::enemy::{Chase, Enemy, Patrol};
use crate::gameplay::flipper::{Flipper, FlipperSide};
use crate::gameplay::zones::{OutZone, RewardZone, SurfaceZone};
use crate::physics::gravity::GravityWell;

const WALL_RESTITUTION: f32 = 0.9;
const WALL_FRICTION: f32 = 0.1;

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_level)
            .add_systems(Update, log_target_strikes);
    }
}

fn wall_bundle(
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    center: Vec3,
    half_extents: Vec3,
) -> impl Bundle {
    (
        RigidBody::Fixed,
        Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
        Restitution::coefficient(WALL_RESTITUTION),
        Friction::coefficient(WALL_FRICTION),
        Mesh3d(meshes.add(Cuboid::new(
            half_extents.x * 2.0,
            half_extents.y * 2.0,
            half_extents.z * 2.0,
        ))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.35, 0.35, 0.4),
            ..default()
        })),
        Transform::from_translation(center),
    )
}

pub fn spawn_level(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    cfg: Res<GameConfig>,
) {
    let arena = &cfg.arena;
    let wall_y = arena.plane_height + arena.wall_height * 0.5;
    let half_t = arena.wall_thickness * 0.5;

    // Ground slab under the play plane.
    commands.spawn((
        RigidBody::Fixed,
        Collider::cuboid(arena.half_width, 0.1, arena.half_depth + 2.0),
        Friction::coefficient(WALL_FRICTION),
        Mesh3d(meshes.add(Cuboid::new(
            arena.half_width * 2.0,
            0.2,
            (arena.half_depth + 2.0) * 2.0,
        ))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.12, 0.14, 0.18),
            ..default()
        })),
        Transform::from_xyz(0.0, arena.plane_height - cfg.ball.radius - 0.1, 0.0),
    ));

    // Side walls.
    for sign in [-1.0, 1.0] {
        commands.spawn(wall_bundle(
            &mut meshes,
            &mut materials,
            Vec3::new(sign * arena.half_width, wall_y, 0.0),
            Vec3::new(half_t, arena.wall_height * 0.5, arena.half_depth),
        ));
    }
    // Far wall, solid across the top.
    commands.spawn(wall_bundle(
        &mut meshes,
        &mut materials,
        Vec3::new(0.0, wall_y, arena.half_depth),
        Vec3::new(arena.half_width, arena.wall_height * 0.5, half_t),
    ));
    // Near wall split by the drain gap.
    let segment = (arena.half_width * 2.0 - arena.drain_gap) * 0.5;
    if segment > 0.0 {
        let offset = arena.drain_gap * 0.5 + segment * 0.5;
        for sign in [-1.0, 1.0] {
            commands.spawn(wall_bundle(
                &mut meshes,
                &mut materials,
                Vec3::new(sign * offset, wall_y, -arena.half_depth),
                Vec3::new(segment * 0.5, arena.wall_height * 0.5, half_t),
            ));
        }
    }

    // Out-of-bounds sensor strip behind the drain.
    commands.spawn((
        OutZone,
        Sensor,
        Collider::cuboid(arena.half_width, arena.wall_height, 0.5),
        ActiveEvents::COLLISION_EVENTS,
        Transform::from_xyz(0.0, wall_y, arena.out_sensor_z),
    ));

    spawn_flippers(&mut commands, &mut meshes, &mut materials, &cfg);
    spawn_targets(&mut commands, &mut meshes, &mut materials, &cfg);
    spawn_zones(&mut commands, &mut meshes, &mut materials, &cfg);
    for spec in &cfg.enemy_set {
        spawn_enemy(&mut commands, &mut meshes, &mut materials, &cfg, spec);
    }
    spawn_ball(&mut commands, &mut meshes, &mut materials, &cfg);
}

fn spawn_flippers(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    cfg: &GameConfig,
) {
    let f = &cfg.flipper;
    let half_len = f.length * 0.5;
    let y = cfg.arena.plane_height;
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.85, 0.3, 0.25),
        ..default()
    });
    let mesh = meshes.add(Cuboid::new(f.length, f.thickness, f.width));

    for (side, x) in [(FlipperSide::Left, f.left_x), (FlipperSide::Right, f.right_x)] {
        // Pivot at the outer edge so the sweep opens toward the center.
        let pivot_x = match side {
            FlipperSide::Left => x - half_len,
            FlipperSide::Right => x + half_len,
        };
        let pivot = Vec3::new(pivot_x, y, f.z);
        let rest = Vec3::new(x, y, f.z);
        commands.spawn((
            Flipper::new(side, pivot, rest, half_len),
            RigidBody::KinematicPositionBased,
            Collider::cuboid(half_len, f.thickness * 0.5, f.width * 0.5),
            Friction::coefficient(WALL_FRICTION),
            ActiveEvents::COLLISION_EVENTS,
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(rest),
        ));
    }
}

fn spawn_targets(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    cfg: &GameConfig,
) {
    let t = &cfg.targets;
    let mut rng = rand::thread_rng();
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.2, 0.8, 0.3),
        ..default()
    });
    let mesh = meshes.add(Cuboid::new(0.6, 0.4, 0.2));
    let start_x = -(t.count as f32 - 1.0) * t.spacing * 0.5;
    for i in 0..t.count {
        let jitter = |rng: &mut rand::rngs::ThreadRng| {
            rng.gen_range(-t.position_jitter..=t.position_jitter)
        };
        let x = start_x + i as f32 * t.spacing + jitter(&mut rng);
        let z = t.base_z + jitter(&mut rng);
        let yaw = rng.gen_range(-t.yaw_jitter..=t.yaw_jitter);
        commands.spawn((
            Target,
            RigidBody::Fixed,
            Collider::cuboid(0.3, 0.2, 0.1),
            Restitution::coefficient(WALL_RESTITUTION),
            Friction::coefficient(WALL_FRICTION),
            ActiveEvents::COLLISION_EVENTS,
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_xyz(x, cfg.arena.plane_height + 0.1, z)
                .with_rotation(Quat::from_rotation_y(yaw.to_radians())),
        ));
    }
}

fn spawn_zones(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    cfg: &GameConfig,
) {
    let y = cfg.arena.plane_height;
    for zone in &cfg.zones.surfaces {
        // Tinted by slipperiness so the ice patch reads at a glance.
        let icy = zone.friction < 0.2;
        let color = if icy {
            Color::srgba(0.5, 0.8, 1.0, 0.4)
        } else {
            Color::srgba(0.4, 0.6, 0.4, 0.4)
        };
        commands.spawn((
            SurfaceZone {
                friction: zone.friction,
                restitution: zone.restitution,
            },
            Sensor,
            Collider::cuboid(zone.extent[0], 0.5, zone.extent[1]),
            ActiveEvents::COLLISION_EVENTS,
            Mesh3d(meshes.add(Cuboid::new(zone.extent[0] * 2.0, 0.02, zone.extent[1] * 2.0))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: color,
                alpha_mode: AlphaMode::Blend,
                ..default()
            })),
            Transform::from_xyz(zone.center[0], y - cfg.ball.radius, zone.center[1]),
        ));
    }
    for well in &cfg.zones.gravity_wells {
        commands.spawn((
            GravityWell {
                strength: well.strength,
                max_distance: well.max_distance,
            },
            Mesh3d(meshes.add(Sphere::new(0.15))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.6, 0.3, 0.9),
                emissive: LinearRgba::rgb(0.3, 0.1, 0.6),
                ..default()
            })),
            Transform::from_xyz(well.center[0], y, well.center[1]),
        ));
    }
    for post in &cfg.zones.reward_posts {
        commands.spawn((
            RewardZone {
                bonus_seconds: post.bonus_seconds,
            },
            RigidBody::Fixed,
            Collider::ball(post.radius),
            Restitution::coefficient(WALL_RESTITUTION),
            ActiveEvents::COLLISION_EVENTS,
            Mesh3d(meshes.add(Sphere::new(post.radius))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.95, 0.8, 0.2),
                emissive: LinearRgba::rgb(0.5, 0.4, 0.05),
                ..default()
            })),
            Transform::from_xyz(post.center[0], y, post.center[1]),
        ));
    }
}

/// Spawn one enemy from its config entry. Also used by the respawn queue.
pub fn spawn_enemy(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    cfg: &GameConfig,
    spec: &EnemySpawnConfig,
) {
    let y = cfg.arena.plane_height;
    let pos = Vec3::new(spec.position[0], y, spec.position[1]);
    let mut entity = commands.spawn((
        Enemy {
            score_per_kill: spec.score_per_kill,
            hits_to_destroy: spec.hits_to_destroy,
            hits_taken: 0,
            spawn: spec.clone(),
        },
        RigidBody::KinematicPositionBased,
        Collider::ball(0.25),
        ActiveEvents::COLLISION_EVENTS,
        Mesh3d(meshes.add(Sphere::new(0.25))),
        Transform::from_translation(pos),
    ));
    match &spec.kind {
        EnemyKindConfig::Patrol {
            center,
            radius,
            angular_speed,
        } => {
            let offset = Vec2::new(spec.position[0] - center[0], spec.position[1] - center[1]);
            // Start on the circle at the angle of the configured position so
            // the first frame does not teleport.
            let angle = offset.y.atan2(offset.x);
            entity.insert((
                Patrol {
                    center: Vec2::new(center[0], center[1]),
                    radius: *radius,
                    angular_speed: *angular_speed,
                    angle,
                },
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.9, 0.55, 0.1),
                    ..default()
                })),
            ));
        }
        EnemyKindConfig::Chase {
            detect_radius,
            chase_speed,
            chase_duration,
        } => {
            entity.insert((
                Chase {
                    detect_radius: *detect_radius,
                    speed: *chase_speed,
                    duration: *chase_duration,
                    timer: 0.0,
                    target: None,
                },
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.85, 0.15, 0.2),
                    ..default()
                })),
            ));
        }
    }
}

/// Spawn the ball at rest on the left flipper. Also used by the respawn queue.
pub fn spawn_ball(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    cfg: &GameConfig,
) {
    let pos = Vec3::new(
        cfg.flipper.left_x,
        cfg.arena.plane_height,
        cfg.flipper.z + cfg.flipper.width * 0.5 + cfg.ball.radius,
    );
    commands.spawn((
        Ball::default(),
        PlaneBound,
        RigidBody::Dynamic,
        Collider::ball(cfg.ball.radius),
        Restitution::coefficient(cfg.ball.restitution),
        Friction::coefficient(cfg.ball.friction),
        Velocity::zero(),
        LockedAxes::TRANSLATION_LOCKED_Y
            | LockedAxes::ROTATION_LOCKED_X
            | LockedAxes::ROTATION_LOCKED_Z,
        Ccd::enabled(),
        ActiveEvents::COLLISION_EVENTS,
        Mesh3d(meshes.add(Sphere::new(cfg.ball.radius))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.9, 0.9, 0.95),
            metallic: 0.8,
            perceptual_roughness: 0.2,
            ..default()
        })),
        Transform::from_translation(pos),
    ));
}

fn log_target_strikes(mut strikes: EventReader<TargetStruck>) {
    for ev in strikes.read() {
        debug!(
            target: "level",
            "target struck at ({:.2}, {:.2}) speed {:.1}",
            ev.position.x, ev.position.z, ev.impact_speed
        );
    }
}
