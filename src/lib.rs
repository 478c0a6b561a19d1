//! Top-down pinball arena: a plane-constrained ball, kinematic flippers,
//! patrol/chase enemies and a lives/score round loop on top of Bevy and
//! Rapier.

pub mod app;
pub mod core;
pub mod debug;
pub mod gameplay;
pub mod physics;
pub mod rendering;
pub mod ui;

pub use app::game::GamePlugin;
pub use core::components::Ball;
pub use core::config::GameConfig;
pub use gameplay::round::RoundState;
