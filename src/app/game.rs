use bevy::prelude::*;
use bevy_rapier3d::prelude::PhysicsSet;

use crate::core::system::system_order::{PostPhysicsAdjustSet, PrePhysicsSet};
use crate::debug::DebugPlugin;
use crate::gameplay::ball::BallPlugin;
use crate::gameplay::enemy::EnemyPlugin;
use crate::gameplay::flipper::FlipperPlugin;
use crate::gameplay::level::LevelPlugin;
use crate::gameplay::round::RoundPlugin;
use crate::gameplay::zones::ZonesPlugin;
use crate::physics::gravity::GravityWellPlugin;
use crate::physics::plane::PlaneConstraintPlugin;
use crate::physics::rapier::PhysicsSetupPlugin;
use crate::rendering::camera::CameraPlugin;
use crate::ui::HudPlugin;

/// Top-level composition: ordering sets first, then every subsystem plugin.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        // Rapier steps in PostUpdate; the pre set must finish before the
        // backend sync picks up transforms/velocities, and the adjust set
        // must see the same frame's contact events and manifolds.
        app.configure_sets(
            PostUpdate,
            (
                PrePhysicsSet.before(PhysicsSet::SyncBackend),
                PostPhysicsAdjustSet.after(PhysicsSet::Writeback),
            ),
        )
        .add_plugins((
            CameraPlugin,
            PhysicsSetupPlugin,
            PlaneConstraintPlugin,
            GravityWellPlugin,
            BallPlugin,
            FlipperPlugin,
            EnemyPlugin,
            ZonesPlugin,
            RoundPlugin,
            LevelPlugin,
            HudPlugin,
            DebugPlugin,
        ));
    }
}
