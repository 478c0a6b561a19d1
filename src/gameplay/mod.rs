pub mod ball;
pub mod deflect;
pub mod enemy;
pub mod flipper;
pub mod level;
pub mod round;
pub mod zones;
