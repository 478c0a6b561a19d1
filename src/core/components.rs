use bevy::prelude::*;

/// Marker + per-ball simulation state for the pinball (holds physics body & collider).
#[derive(Component, Debug)]
pub struct Ball {
    /// Set once the ball has been struck off a flipper; gates minimum-speed
    /// enforcement and stuck recovery so a freshly spawned ball rests quietly.
    pub launched: bool,
    /// Rolling count of near-perpendicular wall hits, drives deflection escalation.
    pub consecutive_perpendicular_hits: u32,
    /// Velocity recorded just before the physics step, used as the incoming
    /// velocity for the deflection classifier (the engine has already mangled
    /// `Velocity` by the time the contact event is observed).
    pub last_velocity: Vec3,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            launched: false,
            consecutive_perpendicular_hits: 0,
            last_velocity: Vec3::ZERO,
        }
    }
}

/// Dynamic bodies carrying this marker are clamped to the simulation plane
/// each tick (fixed height, zero out-of-plane velocity).
#[derive(Component)]
pub struct PlaneBound;

/// Green scoring target; struck targets emit `TargetStruck` for impact feedback.
#[derive(Component)]
pub struct Target;
