//! Development aids behind the `debug` feature: rapier wireframe overlay and
//! verbose round-state logging. Compiles to a no-op plugin without it.

use bevy::prelude::*;

pub struct DebugPlugin;

#[cfg(feature = "debug")]
mod enabled {
    use bevy::prelude::*;
    use bevy_rapier3d::prelude::*;

    use crate::core::config::GameConfig;
    use crate::gameplay::round::RoundState;

    pub fn build(app: &mut App) {
        app.add_plugins(RapierDebugRenderPlugin::default())
            .add_systems(Startup, apply_debug_config)
            .add_systems(Update, log_round_changes.run_if(resource_changed::<RoundState>));
    }

    fn apply_debug_config(cfg: Res<GameConfig>, mut ctx: ResMut<DebugRenderContext>) {
        ctx.enabled = cfg.rapier_debug;
    }

    fn log_round_changes(round: Res<RoundState>) {
        debug!(
            target: "debug",
            "round: lives={} score={} over={} gen={}",
            round.lives, round.score, round.game_over, round.generation
        );
    }
}

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        #[cfg(feature = "debug")]
        enabled::build(app);
        #[cfg(not(feature = "debug"))]
        let _ = app;
    }
}
