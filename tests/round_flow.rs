//! Round lifecycle through the public `RoundState` API: grace windows, bonus
//! stacking, life loss and restart.

use pinball_arena::RoundState;

const BASE_GRACE: f32 = 1.5;

#[test]
fn launch_opens_base_window_then_closes() {
    let mut round = RoundState::new(3);
    assert!(!round.in_grace_window(0.0, BASE_GRACE), "no window before launch");
    round.on_ball_launched(10.0);
    assert!(round.in_grace_window(10.0, BASE_GRACE));
    assert!(round.in_grace_window(11.5, BASE_GRACE));
    assert!(!round.in_grace_window(11.51, BASE_GRACE));
}

#[test]
fn bonus_reopens_window_after_base_expired() {
    let mut round = RoundState::new(3);
    round.on_ball_launched(0.0);
    assert!(!round.in_grace_window(3.0, BASE_GRACE));
    round.add_grace_bonus(3.0, 0.7);
    assert!(round.in_grace_window(3.0, BASE_GRACE));
    assert!(round.in_grace_window(3.7, BASE_GRACE));
    assert!(!round.in_grace_window(3.8, BASE_GRACE));
}

#[test]
fn bonuses_stack_additively() {
    let mut round = RoundState::new(3);
    round.on_ball_launched(0.0);
    round.add_grace_bonus(2.0, 0.7); // ends 2.7
    round.add_grace_bonus(2.1, 0.7); // extends to 3.4
    assert!(round.in_grace_window(3.3, BASE_GRACE));
    assert!(!round.in_grace_window(3.5, BASE_GRACE));
}

#[test]
fn relaunch_forfeits_pending_bonus() {
    let mut round = RoundState::new(3);
    round.on_ball_launched(0.0);
    round.add_grace_bonus(0.5, 30.0);
    round.on_ball_launched(5.0);
    assert!(round.in_grace_window(6.0, BASE_GRACE), "fresh base window");
    assert!(!round.in_grace_window(8.0, BASE_GRACE), "old bonus is gone");
}

#[test]
fn scoring_stops_at_game_over_and_restart_recovers() {
    let mut round = RoundState::new(1);
    round.add_score(50);
    assert_eq!(round.score, 50);
    assert!(round.lose_life(), "single life: first loss ends the game");

    round.add_score(50);
    assert_eq!(round.score, 50, "no scoring after game over");

    let gen_before = round.generation;
    round.restart(3);
    assert_eq!(round.lives, 3);
    assert_eq!(round.score, 0);
    assert!(!round.game_over);
    assert_ne!(round.generation, gen_before);
}
