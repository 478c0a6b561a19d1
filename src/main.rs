use bevy::prelude::*;
use bevy::window::WindowResolution;

use pinball_arena::{GameConfig, GamePlugin};

const CONFIG_PATH: &str = "assets/config/game.ron";

fn main() {
    let (config, load_error) = GameConfig::load_or_default(CONFIG_PATH);

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: config.window.title.clone(),
            resolution: WindowResolution::new(config.window.width, config.window.height),
            ..default()
        }),
        ..default()
    }));

    if let Some(err) = load_error {
        warn!("config {CONFIG_PATH} not loaded ({err}); using defaults");
    }
    for problem in config.validate() {
        warn!("config: {problem}");
    }

    app.insert_resource(config).add_plugins(GamePlugin).run();
}
