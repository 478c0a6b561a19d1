use bevy::prelude::*;

use crate::core::config::GameConfig;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera);
    }
}

/// Top-down view, tilted slightly so wall height still reads. Looking along
/// -Y with +Z up on screen, matching the table's forward direction.
fn setup_camera(mut commands: Commands, cfg: Res<GameConfig>) {
    let focus = Vec3::new(0.0, cfg.arena.plane_height, -0.5);
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 11.0, focus.z - 2.0).looking_at(focus, Vec3::Z),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 9_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, -4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
