pub mod components;
pub mod config;
pub mod plane;
pub mod system;
