use bevy::prelude::*;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            title: "Pinball Arena".into(),
        }
    }
}

/// Table geometry. The play surface is the XZ plane at `plane_height`; the
/// drain opening sits behind the flippers at negative Z.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ArenaConfig {
    pub plane_height: f32,
    pub half_width: f32,
    pub half_depth: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    /// Width of the drain gap in the back wall, centered between the flippers.
    pub drain_gap: f32,
    /// Balls past this Z line are considered out of play (speed limits and
    /// zone forces stop applying so the drain sensor can catch them).
    pub play_area_min_z: f32,
    /// Z position of the out-of-bounds sensor.
    pub out_sensor_z: f32,
}
impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            plane_height: 0.5,
            half_width: 5.0,
            half_depth: 4.0,
            wall_height: 2.0,
            wall_thickness: 0.2,
            drain_gap: 2.4,
            play_area_min_z: -4.5,
            out_sensor_z: -5.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BallConfig {
    pub radius: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Base deflection half-range (degrees) for vertical-incidence contacts.
    pub deflection_angle: f32,
    /// Below this speed a launched ball counts as stuck and gets a random kick.
    pub stuck_speed: f32,
    pub restitution: f32,
    pub friction: f32,
}
impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: 0.15,
            min_speed: 5.0,
            max_speed: 15.0,
            deflection_angle: 50.0,
            stuck_speed: 0.1,
            restitution: 0.9,
            friction: 0.05,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FlipperConfig {
    pub length: f32,
    pub width: f32,
    pub thickness: f32,
    /// Degrees of sweep from rest to the active extreme.
    pub max_angle: f32,
    /// Sweep rate while the key is held (degrees/second).
    pub sweep_speed: f32,
    /// Exponential return rate toward rest after release (1/second).
    pub return_rate: f32,
    /// Speed given to a resting ball on launch.
    pub launch_force: f32,
    /// Minimum outgoing speed for an in-flight strike.
    pub min_exit_speed: f32,
    /// Seconds before the same (ball, flipper) contact is processed again.
    pub contact_cooldown: f32,
    /// Distance the ball is pushed off the flipper surface after a strike.
    pub push_out: f32,
    /// A launched ball resting against a flipper below this speed gets shoved free.
    pub stuck_escape_speed: f32,
    /// X positions of the two flippers and their shared Z line.
    pub left_x: f32,
    pub right_x: f32,
    pub z: f32,
}
impl Default for FlipperConfig {
    fn default() -> Self {
        Self {
            length: 1.5,
            width: 0.5,
            thickness: 0.2,
            max_angle: 45.0,
            sweep_speed: 400.0,
            return_rate: 5.0,
            launch_force: 15.0,
            min_exit_speed: 6.0,
            contact_cooldown: 0.1,
            push_out: 0.05,
            stuck_escape_speed: 2.0,
            left_x: -2.0,
            right_x: 2.0,
            z: -3.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RoundConfig {
    pub lives: i32,
    pub ball_respawn_delay: f32,
    /// Base window after a launch during which enemy contact kills the enemy.
    pub enemy_hit_grace_time: f32,
    pub enemy_respawn_delay: f32,
}
impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            lives: 3,
            ball_respawn_delay: 1.0,
            enemy_hit_grace_time: 1.5,
            enemy_respawn_delay: 3.0,
        }
    }
}

/// Behavior half of an enemy spawn entry.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum EnemyKindConfig {
    Patrol {
        center: [f32; 2],
        radius: f32,
        angular_speed: f32,
    },
    Chase {
        detect_radius: f32,
        chase_speed: f32,
        chase_duration: f32,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EnemySpawnConfig {
    pub kind: EnemyKindConfig,
    pub position: [f32; 2],
    #[serde(default = "default_score_per_kill")]
    pub score_per_kill: i32,
    #[serde(default = "default_hits_to_destroy")]
    pub hits_to_destroy: u32,
}
fn default_score_per_kill() -> i32 {
    50
}
fn default_hits_to_destroy() -> u32 {
    1
}

fn default_enemies() -> Vec<EnemySpawnConfig> {
    vec![
        EnemySpawnConfig {
            kind: EnemyKindConfig::Patrol {
                center: [-3.0, 0.0],
                radius: 1.5,
                angular_speed: 1.5,
            },
            position: [-1.5, 0.0],
            score_per_kill: 50,
            hits_to_destroy: 1,
        },
        EnemySpawnConfig {
            kind: EnemyKindConfig::Chase {
                detect_radius: 2.5,
                chase_speed: 1.8,
                chase_duration: 2.0,
            },
            position: [3.0, 1.0],
            score_per_kill: 50,
            hits_to_destroy: 1,
        },
    ]
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SurfaceZoneConfig {
    pub center: [f32; 2],
    pub extent: [f32; 2],
    pub friction: f32,
    pub restitution: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GravityWellConfig {
    pub center: [f32; 2],
    pub strength: f32,
    pub max_distance: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RewardPostConfig {
    pub center: [f32; 2],
    pub radius: f32,
    pub bonus_seconds: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ZonesConfig {
    pub surfaces: Vec<SurfaceZoneConfig>,
    pub gravity_wells: Vec<GravityWellConfig>,
    pub reward_posts: Vec<RewardPostConfig>,
}
impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            // Normal felt on the left, ice on the right.
            surfaces: vec![
                SurfaceZoneConfig {
                    center: [-3.0, 0.0],
                    extent: [2.0, 5.0],
                    friction: 0.6,
                    restitution: 0.3,
                },
                SurfaceZoneConfig {
                    center: [3.0, 0.0],
                    extent: [2.0, 5.0],
                    friction: 0.05,
                    restitution: 0.2,
                },
            ],
            gravity_wells: vec![GravityWellConfig {
                center: [0.0, 1.0],
                strength: 5.0,
                max_distance: 3.0,
            }],
            reward_posts: vec![RewardPostConfig {
                center: [0.0, -1.0],
                radius: 0.2,
                bonus_seconds: 0.7,
            }],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TargetsConfig {
    pub count: usize,
    pub base_z: f32,
    pub spacing: f32,
    pub position_jitter: f32,
    pub yaw_jitter: f32,
}
impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            count: 3,
            base_z: 2.0,
            spacing: 2.0,
            position_jitter: 0.3,
            yaw_jitter: 45.0,
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub arena: ArenaConfig,
    pub ball: BallConfig,
    pub flipper: FlipperConfig,
    pub round: RoundConfig,
    #[serde(rename = "enemies")]
    pub enemy_set: Vec<EnemySpawnConfig>,
    pub zones: ZonesConfig,
    pub targets: TargetsConfig,
    pub rapier_debug: bool,
}
impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: Default::default(),
            arena: Default::default(),
            ball: Default::default(),
            flipper: Default::default(),
            round: Default::default(),
            enemy_set: default_enemies(),
            zones: Default::default(),
            targets: Default::default(),
            rapier_debug: false,
        }
    }
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Non-fatal sanity pass; each returned string is logged as a warning.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            w.push("window dimensions must be > 0".into());
        }
        if self.ball.min_speed <= 0.0 {
            w.push("ball.min_speed must be > 0".into());
        }
        if self.ball.min_speed > self.ball.max_speed {
            w.push(format!(
                "ball.min_speed ({}) greater than max_speed ({})",
                self.ball.min_speed, self.ball.max_speed
            ));
        }
        if !(0.0..=180.0).contains(&self.ball.deflection_angle) {
            w.push(format!(
                "ball.deflection_angle {} outside 0..180",
                self.ball.deflection_angle
            ));
        }
        if self.flipper.max_angle <= 0.0 || self.flipper.max_angle > 90.0 {
            w.push(format!(
                "flipper.max_angle {} outside recommended 0..90",
                self.flipper.max_angle
            ));
        }
        if self.flipper.sweep_speed <= 0.0 {
            w.push("flipper.sweep_speed must be > 0".into());
        }
        if self.flipper.min_exit_speed > self.ball.max_speed {
            w.push(format!(
                "flipper.min_exit_speed {} exceeds ball.max_speed {}",
                self.flipper.min_exit_speed, self.ball.max_speed
            ));
        }
        if self.round.lives <= 0 {
            w.push("round.lives must be > 0; game would start over".into());
        }
        if self.round.enemy_hit_grace_time < 0.0 {
            w.push("round.enemy_hit_grace_time negative -> enemies never killable".into());
        }
        for (i, well) in self.zones.gravity_wells.iter().enumerate() {
            if well.max_distance <= 0.0 {
                w.push(format!("gravity_wells[{i}].max_distance must be > 0"));
            }
            if well.strength < 0.0 {
                w.push(format!(
                    "gravity_wells[{i}].strength negative -> repulsive well"
                ));
            }
        }
        for (i, e) in self.enemy_set.iter().enumerate() {
            if e.score_per_kill < 0 {
                w.push(format!("enemies[{i}].score_per_kill negative"));
            }
            match &e.kind {
                EnemyKindConfig::Patrol { radius, .. } if *radius <= 0.0 => {
                    w.push(format!("enemies[{i}] patrol radius must be > 0"));
                }
                EnemyKindConfig::Chase { detect_radius, .. } if *detect_radius <= 0.0 => {
                    w.push(format!("enemies[{i}] detect_radius must be > 0"));
                }
                _ => {}
            }
        }
        w
    }
}
