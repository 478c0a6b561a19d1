use bevy::prelude::*;

use crate::core::components::Ball;
use crate::core::config::config::EnemySpawnConfig;
use crate::core::config::GameConfig;
use crate::core::system::system_order::PostPhysicsAdjustSet;
use crate::gameplay::enemy::Enemy;
use crate::gameplay::level;

/// Sentinel well before any real timestamp; a fresh round has no launch and
/// no bonus window.
const TIME_SENTINEL: f32 = -999.0;

/// Lives, score and the grace-window clock. All mutation goes through the
/// methods below so the single-writer invariant survives; timing methods take
/// `now` explicitly so tests need no clock.
#[derive(Resource, Debug)]
pub struct RoundState {
    pub lives: i32,
    pub score: i32,
    pub game_over: bool,
    /// Bumped on every restart; queued respawns from a previous round compare
    /// against it at fire time and drop themselves.
    pub generation: u32,
    ball_launch_time: f32,
    bonus_grace_end: f32,
}

impl RoundState {
    pub fn new(lives: i32) -> Self {
        Self {
            lives,
            score: 0,
            game_over: false,
            generation: 0,
            ball_launch_time: TIME_SENTINEL,
            bonus_grace_end: TIME_SENTINEL,
        }
    }

    /// A flipper just struck the resting ball into play.
    pub fn on_ball_launched(&mut self, now: f32) {
        self.ball_launch_time = now;
        // Any bonus accumulated during the previous flight is forfeit.
        self.bonus_grace_end = TIME_SENTINEL;
    }

    /// Inside the window where ball contact damages enemies. The bonus window
    /// is independent of the base window, so a reward pickup re-opens
    /// killability even after the base window lapsed.
    pub fn in_grace_window(&self, now: f32, base_grace: f32) -> bool {
        let in_base = now - self.ball_launch_time <= base_grace;
        let in_bonus = now <= self.bonus_grace_end;
        in_base || in_bonus
    }

    /// Extend the bonus window additively from `max(now, current end)`.
    pub fn add_grace_bonus(&mut self, now: f32, bonus_seconds: f32) {
        if bonus_seconds <= 0.0 || self.game_over {
            return;
        }
        let start = now.max(self.bonus_grace_end);
        self.bonus_grace_end = start + bonus_seconds;
    }

    pub fn add_score(&mut self, points: i32) {
        if self.game_over {
            return;
        }
        self.score += points;
    }

    /// Decrement lives; returns true when this loss ends the game.
    /// No-op (returns false) once the game is already over.
    pub fn lose_life(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.lives -= 1;
        if self.lives <= 0 {
            self.lives = 0;
            self.game_over = true;
        }
        self.game_over
    }

    pub fn restart(&mut self, lives: i32) {
        self.lives = lives;
        self.score = 0;
        self.game_over = false;
        self.generation = self.generation.wrapping_add(1);
        self.ball_launch_time = TIME_SENTINEL;
        self.bonus_grace_end = TIME_SENTINEL;
    }
}

impl FromWorld for RoundState {
    fn from_world(world: &mut World) -> Self {
        let lives = world
            .get_resource::<GameConfig>()
            .map(|c| c.round.lives)
            .unwrap_or_else(|| GameConfig::default().round.lives);
        Self::new(lives)
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BallLaunched;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallLossCause {
    OutOfBounds,
    Eaten,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BallLost {
    pub ball: Entity,
    pub cause: BallLossCause,
}

#[derive(Event, Debug, Clone)]
pub struct EnemyKilled {
    pub score: i32,
    pub respawn: EnemySpawnConfig,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct GraceBonusEarned(pub f32);

#[derive(Debug, Clone)]
pub enum RespawnKind {
    Ball,
    Enemy(EnemySpawnConfig),
}

#[derive(Debug, Clone)]
pub struct PendingRespawn {
    pub due: f32,
    pub generation: u32,
    pub kind: RespawnKind,
}

/// Deferred one-shot spawns (ball after a lost life, enemy after a kill).
/// Entries are cancelled lazily: game-over and generation are re-checked at
/// fire time rather than on restart.
#[derive(Resource, Default, Debug)]
pub struct RespawnQueue(pub Vec<PendingRespawn>);

pub struct RoundPlugin;

impl Plugin for RoundPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BallLaunched>()
            .add_event::<BallLost>()
            .add_event::<EnemyKilled>()
            .add_event::<GraceBonusEarned>()
            .init_resource::<RoundState>()
            .init_resource::<RespawnQueue>()
            .add_systems(
                PostUpdate,
                (
                    handle_round_events,
                    drain_respawn_queue.after(handle_round_events),
                    restart_on_key,
                )
                    .in_set(PostPhysicsAdjustSet),
            );
    }
}

/// Single consumer for all round-affecting events; keeps every `RoundState`
/// write in one place.
pub fn handle_round_events(
    mut round: ResMut<RoundState>,
    mut queue: ResMut<RespawnQueue>,
    cfg: Res<GameConfig>,
    time: Res<Time>,
    mut launched: EventReader<BallLaunched>,
    mut lost: EventReader<BallLost>,
    mut killed: EventReader<EnemyKilled>,
    mut bonuses: EventReader<GraceBonusEarned>,
    balls: Query<(), With<Ball>>,
    mut commands: Commands,
) {
    let now = time.elapsed_secs();

    for _ in launched.read() {
        round.on_ball_launched(now);
    }

    for ev in bonuses.read() {
        round.add_grace_bonus(now, ev.0);
        info!(target: "round", "grace bonus +{:.2}s", ev.0);
    }

    for ev in killed.read() {
        round.add_score(ev.score);
        if !round.game_over {
            queue.0.push(PendingRespawn {
                due: now + cfg.round.enemy_respawn_delay,
                generation: round.generation,
                kind: RespawnKind::Enemy(ev.respawn.clone()),
            });
        }
        info!(target: "round", "enemy killed, score {}", round.score);
    }

    let mut booked: Vec<Entity> = Vec::new();
    for ev in lost.read() {
        // The same drain can be reported twice (sensor + eat). Across frames
        // a stale entity means the loss was already booked; within a frame
        // the despawn is still deferred, so track it locally too.
        if balls.get(ev.ball).is_err() || booked.contains(&ev.ball) {
            continue;
        }
        booked.push(ev.ball);
        if round.game_over {
            continue;
        }
        commands.entity(ev.ball).despawn();
        if round.lose_life() {
            info!(target: "round", "game over, final score {}", round.score);
        } else {
            queue.0.push(PendingRespawn {
                due: now + cfg.round.ball_respawn_delay,
                generation: round.generation,
                kind: RespawnKind::Ball,
            });
            info!(target: "round", "ball lost ({:?}), lives left {}", ev.cause, round.lives);
        }
    }
}

pub fn drain_respawn_queue(
    round: Res<RoundState>,
    mut queue: ResMut<RespawnQueue>,
    cfg: Res<GameConfig>,
    time: Res<Time>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let now = time.elapsed_secs();
    let mut due = Vec::new();
    queue.0.retain(|entry| {
        if now >= entry.due {
            due.push(entry.clone());
            false
        } else {
            true
        }
    });
    for entry in due {
        // Fire-time cancellation: a restart or game over voids old timers.
        if round.game_over || entry.generation != round.generation {
            continue;
        }
        match entry.kind {
            RespawnKind::Ball => {
                level::spawn_ball(&mut commands, &mut meshes, &mut materials, &cfg);
            }
            RespawnKind::Enemy(spec) => {
                level::spawn_enemy(&mut commands, &mut meshes, &mut materials, &cfg, &spec);
            }
        }
    }
}

pub fn restart_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    mut round: ResMut<RoundState>,
    mut queue: ResMut<RespawnQueue>,
    cfg: Res<GameConfig>,
    existing: Query<Entity, Or<(With<Ball>, With<Enemy>)>>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !keys.just_pressed(KeyCode::KeyR) || !round.game_over {
        return;
    }
    round.restart(cfg.round.lives);
    queue.0.clear();
    for e in existing.iter() {
        commands.entity(e).despawn();
    }
    for spec in &cfg.enemy_set {
        level::spawn_enemy(&mut commands, &mut meshes, &mut materials, &cfg, spec);
    }
    level::spawn_ball(&mut commands, &mut meshes, &mut materials, &cfg);
    info!(target: "round", "round restarted (generation {})", round.generation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grace_window_base_then_bonus() {
        let mut round = RoundState::new(3);
        round.on_ball_launched(0.0);
        assert!(round.in_grace_window(1.4, 1.5));
        assert!(!round.in_grace_window(1.6, 1.5));
        round.add_grace_bonus(1.6, 0.7);
        assert!(round.in_grace_window(1.6, 1.5));
        assert!(round.in_grace_window(2.25, 1.5));
        assert!(!round.in_grace_window(2.35, 1.5));
    }

    #[test]
    fn bonus_extends_from_existing_end() {
        let mut round = RoundState::new(3);
        round.on_ball_launched(0.0);
        round.add_grace_bonus(0.5, 0.7); // ends 1.2... but base still covers
        round.add_grace_bonus(0.6, 0.7); // stacks: ends 1.9
        assert!(round.in_grace_window(1.85, 0.1));
        assert!(!round.in_grace_window(1.95, 0.1));
    }

    #[test]
    fn relaunch_clears_bonus() {
        let mut round = RoundState::new(3);
        round.on_ball_launched(0.0);
        round.add_grace_bonus(0.0, 10.0);
        round.on_ball_launched(5.0);
        assert!(!round.in_grace_window(7.0, 1.5));
    }

    #[test]
    fn fresh_round_has_no_grace() {
        let round = RoundState::new(3);
        assert!(!round.in_grace_window(0.0, 1.5));
    }

    #[test]
    fn lives_hit_zero_locks_state() {
        let mut round = RoundState::new(2);
        assert!(!round.lose_life());
        assert!(round.lose_life());
        assert!(round.game_over);
        // Further losses and scoring are no-ops.
        assert!(!round.lose_life());
        assert_eq!(round.lives, 0);
        round.add_score(50);
        assert_eq!(round.score, 0);
        round.add_grace_bonus(1.0, 5.0);
        assert!(!round.in_grace_window(1.0, 0.0));
    }

    fn events_app() -> App {
        let mut app = App::new();
        app.insert_resource(Time::<()>::default());
        app.insert_resource(GameConfig::default());
        app.init_resource::<RespawnQueue>();
        app.add_event::<BallLaunched>();
        app.add_event::<BallLost>();
        app.add_event::<EnemyKilled>();
        app.add_event::<GraceBonusEarned>();
        app.add_systems(Update, handle_round_events);
        app
    }

    #[test]
    fn enemy_killed_scores_and_queues_respawn() {
        let mut app = events_app();
        app.insert_resource(RoundState::new(3));
        let spec = GameConfig::default().enemy_set[0].clone();
        app.world_mut()
            .resource_mut::<Events<EnemyKilled>>()
            .send(EnemyKilled {
                score: 50,
                respawn: spec,
            });
        app.update();

        assert_eq!(app.world().resource::<RoundState>().score, 50);
        let queue = app.world().resource::<RespawnQueue>();
        assert_eq!(queue.0.len(), 1);
        assert!(matches!(queue.0[0].kind, RespawnKind::Enemy(_)));
    }

    #[test]
    fn ball_lost_books_one_life_even_when_reported_twice() {
        let mut app = events_app();
        app.insert_resource(RoundState::new(3));
        let ball = app.world_mut().spawn(Ball::default()).id();
        // Drain sensor and an enemy eat can both fire in the same frame.
        {
            let mut events = app.world_mut().resource_mut::<Events<BallLost>>();
            events.send(BallLost {
                ball,
                cause: BallLossCause::OutOfBounds,
            });
            events.send(BallLost {
                ball,
                cause: BallLossCause::Eaten,
            });
        }
        app.update();

        let round = app.world().resource::<RoundState>();
        assert_eq!(round.lives, 2, "one loss booked, not two");
        assert!(!round.game_over);
        assert!(app.world().get::<Ball>(ball).is_none(), "ball despawned");
        let queue = app.world().resource::<RespawnQueue>();
        assert_eq!(queue.0.len(), 1);
        assert!(matches!(queue.0[0].kind, RespawnKind::Ball));
    }

    #[test]
    fn last_life_lost_ends_round_without_respawn() {
        let mut app = events_app();
        app.insert_resource(RoundState::new(1));
        let ball = app.world_mut().spawn(Ball::default()).id();
        app.world_mut()
            .resource_mut::<Events<BallLost>>()
            .send(BallLost {
                ball,
                cause: BallLossCause::OutOfBounds,
            });
        app.update();

        let round = app.world().resource::<RoundState>();
        assert!(round.game_over);
        assert_eq!(round.lives, 0);
        assert!(app.world().resource::<RespawnQueue>().0.is_empty());
    }

    #[test]
    fn restart_key_rebuilds_ball_and_enemy_set() {
        let mut app = App::new();
        app.insert_resource(GameConfig::default());
        app.init_resource::<Assets<Mesh>>();
        app.init_resource::<Assets<StandardMaterial>>();
        let mut round = RoundState::new(1);
        round.lose_life();
        app.insert_resource(round);
        let mut queue = RespawnQueue::default();
        queue.0.push(PendingRespawn {
            due: 99.0,
            generation: 0,
            kind: RespawnKind::Ball,
        });
        app.insert_resource(queue);
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::KeyR);
        app.insert_resource(keys);
        // Leftovers from the finished round.
        app.world_mut().spawn(Ball::default());
        let spec = GameConfig::default().enemy_set[0].clone();
        app.world_mut().spawn(Enemy {
            score_per_kill: spec.score_per_kill,
            hits_to_destroy: 1,
            hits_taken: 0,
            spawn: spec,
        });
        app.add_systems(Update, restart_on_key);
        app.update();

        let round = app.world().resource::<RoundState>();
        assert!(!round.game_over);
        assert_eq!(round.lives, 3);
        assert_eq!(round.score, 0);
        assert!(app.world().resource::<RespawnQueue>().0.is_empty());
        let enemy_count = app
            .world_mut()
            .query::<&Enemy>()
            .iter(app.world())
            .count();
        assert_eq!(enemy_count, GameConfig::default().enemy_set.len());
        let ball_count = app.world_mut().query::<&Ball>().iter(app.world()).count();
        assert_eq!(ball_count, 1);
    }

    fn queue_app() -> App {
        let mut app = App::new();
        app.insert_resource(Time::<()>::default());
        app.insert_resource(GameConfig::default());
        app.init_resource::<Assets<Mesh>>();
        app.init_resource::<Assets<StandardMaterial>>();
        app.init_resource::<RespawnQueue>();
        app.add_systems(Update, drain_respawn_queue);
        app
    }

    #[test]
    fn stale_generation_respawn_is_dropped() {
        let mut app = queue_app();
        app.insert_resource(RoundState::new(3));
        app.world_mut().resource_mut::<RespawnQueue>().0.push(PendingRespawn {
            due: 0.0,
            generation: 99, // from a round that no longer exists
            kind: RespawnKind::Ball,
        });
        app.update();
        assert!(app.world().resource::<RespawnQueue>().0.is_empty());
        let mut balls = app.world_mut().query::<&Ball>();
        assert_eq!(balls.iter(app.world()).count(), 0);
    }

    #[test]
    fn due_respawn_fires_for_current_generation() {
        let mut app = queue_app();
        let round = RoundState::new(3);
        let generation = round.generation;
        app.insert_resource(round);
        app.world_mut().resource_mut::<RespawnQueue>().0.push(PendingRespawn {
            due: 0.0,
            generation,
            kind: RespawnKind::Ball,
        });
        app.update();
        let mut balls = app.world_mut().query::<&Ball>();
        assert_eq!(balls.iter(app.world()).count(), 1);
    }

    #[test]
    fn future_respawn_stays_queued() {
        let mut app = queue_app();
        app.insert_resource(RoundState::new(3));
        app.world_mut().resource_mut::<RespawnQueue>().0.push(PendingRespawn {
            due: 60.0,
            generation: 0,
            kind: RespawnKind::Ball,
        });
        app.update();
        assert_eq!(app.world().resource::<RespawnQueue>().0.len(), 1);
    }

    #[test]
    fn restart_resets_and_bumps_generation() {
        let mut round = RoundState::new(1);
        round.add_score(120);
        round.lose_life();
        let gen = round.generation;
        round.restart(3);
        assert_eq!(round.lives, 3);
        assert_eq!(round.score, 0);
        assert!(!round.game_over);
        assert_eq!(round.generation, gen + 1);
    }
}
