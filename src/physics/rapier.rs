use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

pub struct PhysicsSetupPlugin; // our wrapper to configure Rapier for the table

impl Plugin for PhysicsSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((RapierPhysicsPlugin::<NoUserData>::default(),))
            .add_systems(Startup, configure_gravity);
    }
}

fn configure_gravity(mut q: Query<&mut RapierConfiguration>) {
    // Global gravity disabled: the ball lives on a horizontal plane and the
    // only attraction comes from gravity-well zones.
    for mut rapier_cfg in q.iter_mut() {
        rapier_cfg.gravity = Vect::ZERO;
    }
}
