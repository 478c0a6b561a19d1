//! Score/lives readout and the game-over overlay. Text refreshes only when
//! the round state actually changes.

use bevy::prelude::*;

use crate::gameplay::round::RoundState;

#[derive(Component)]
struct ScoreText;

#[derive(Component)]
struct LivesText;

#[derive(Component)]
struct GameOverOverlay;

#[derive(Component)]
struct GameOverScoreText;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_hud)
            .add_systems(Update, refresh_hud.run_if(resource_changed::<RoundState>));
    }
}

fn spawn_hud(mut commands: Commands) {
    let font = TextFont {
        font_size: 28.0,
        ..default()
    };
    commands.spawn((
        ScoreText,
        Text::new("Score: 0"),
        font.clone(),
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(16.0),
            ..default()
        },
    ));
    commands.spawn((
        LivesText,
        Text::new("Lives: 0"),
        font.clone(),
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            right: Val::Px(16.0),
            ..default()
        },
    ));

    commands
        .spawn((
            GameOverOverlay,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                display: Display::None,
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                justify_content: JustifyContent::Center,
                row_gap: Val::Px(10.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("GAME OVER"),
                TextFont {
                    font_size: 64.0,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.3, 0.25)),
            ));
            parent.spawn((
                GameOverScoreText,
                Text::new("Final score: 0"),
                font.clone(),
                TextColor(Color::WHITE),
            ));
            parent.spawn((
                Text::new("Press R to restart"),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
            ));
        });
}

fn refresh_hud(
    round: Res<RoundState>,
    mut score: Query<&mut Text, (With<ScoreText>, Without<LivesText>)>,
    mut lives: Query<&mut Text, (With<LivesText>, Without<ScoreText>)>,
    mut overlay: Query<&mut Node, With<GameOverOverlay>>,
    mut final_score: Query<
        &mut Text,
        (
            With<GameOverScoreText>,
            Without<ScoreText>,
            Without<LivesText>,
        ),
    >,
) {
    if let Ok(mut text) = score.single_mut() {
        text.0 = format!("Score: {}", round.score);
    }
    if let Ok(mut text) = lives.single_mut() {
        text.0 = format!("Lives: {}", round.lives);
    }
    if let Ok(mut node) = overlay.single_mut() {
        node.display = if round.game_over {
            Display::Flex
        } else {
            Display::None
        };
    }
    if round.game_over {
        if let Ok(mut text) = final_score.single_mut() {
            text.0 = format!("Final score: {}", round.score);
        }
    }
}
