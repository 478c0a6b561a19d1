pub mod gravity;
pub mod plane;
pub mod rapier;
