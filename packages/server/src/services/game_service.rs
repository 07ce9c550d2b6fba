use log::info;
use std::collections::HashMap;

use crate::{
    error::ServiceError,
    models::{
        config::GameConfig,
        event_bus::Subscription,
        game::{ActionReport, Game, GamePhase, GameState, PhaseOutcome},
        player::{Player, PlayerId},
        role::Role,
        state_change::StateChange,
    },
    state::AppState,
};

/// ゲームを作成し、作成者をそのまま参加させる
pub async fn create_game(
    state: &AppState,
    player_id: PlayerId,
    config: GameConfig,
) -> Result<GameState, ServiceError> {
    let name = state.user_service.find_player_name(player_id).await?;
    let game = state.games.create(config, (state.random)()).await?;

    match game.join(player_id, name).await {
        Ok(report) => {
            info!(
                "ゲーム{}を作成しました: 作成者={}, 人数={}, 人狼={}",
                game.id(),
                player_id,
                config.player_num(),
                config.werewolf_num()
            );
            Ok(report.state)
        }
        Err(e) => {
            state.games.delete(game.id()).await;
            Err(e.into())
        }
    }
}

pub async fn join_game(
    state: &AppState,
    game_id: &str,
    player_id: PlayerId,
) -> Result<GameState, ServiceError> {
    let game = state.games.load(game_id).await?;
    let name = state.user_service.find_player_name(player_id).await?;

    let report = game.join(player_id, name).await?;

    game.notify_state_changed(StateChange::player_joined(&report, player_id))
        .await;
    notify_state_changed_if_needed(&game, &report).await;

    Ok(report.state)
}

pub async fn leave_game(
    state: &AppState,
    game_id: &str,
    player_id: PlayerId,
) -> Result<GameState, ServiceError> {
    let game = state.games.load(game_id).await?;

    let report = game.leave(player_id).await?;

    game.notify_state_changed(StateChange::player_left(&report, player_id))
        .await;
    game.unsubscribe(player_id).await;

    Ok(report.state)
}

/// 昼の投票。`None` は棄権
pub async fn vote(
    state: &AppState,
    game_id: &str,
    player_id: PlayerId,
    target_id: Option<PlayerId>,
) -> Result<(), ServiceError> {
    let game = state.games.load(game_id).await?;
    let report = game.vote(player_id, target_id).await?;
    finish_action(state, &game, &report).await;
    Ok(())
}

pub async fn kill(
    state: &AppState,
    game_id: &str,
    player_id: PlayerId,
    target_id: PlayerId,
) -> Result<(), ServiceError> {
    let game = state.games.load(game_id).await?;
    let report = game.kill(player_id, target_id).await?;
    finish_action(state, &game, &report).await;
    Ok(())
}

pub async fn next(state: &AppState, game_id: &str, player_id: PlayerId) -> Result<(), ServiceError> {
    let game = state.games.load(game_id).await?;
    let report = game.next(player_id).await?;
    finish_action(state, &game, &report).await;
    Ok(())
}

pub async fn get_roles(
    state: &AppState,
    game_id: &str,
    player_id: PlayerId,
) -> Result<HashMap<PlayerId, Role>, ServiceError> {
    let game = state.games.load(game_id).await?;
    Ok(game.get_roles(player_id).await?)
}

pub async fn get_player(
    state: &AppState,
    game_id: &str,
    player_id: PlayerId,
) -> Result<Player, ServiceError> {
    let game = state.games.load(game_id).await?;
    Ok(game.get_player(player_id).await?)
}

pub async fn get_game_state(state: &AppState, game_id: &str) -> Result<GameState, ServiceError> {
    let game = state.games.load(game_id).await?;
    Ok(game.snapshot().await)
}

/// 参加者だけが状態変化を購読できる
pub async fn observe_state(
    state: &AppState,
    game_id: &str,
    player_id: PlayerId,
) -> Result<Subscription<StateChange>, ServiceError> {
    let game = state.games.load(game_id).await?;
    game.get_player(player_id).await?;
    Ok(game.subscribe(player_id).await)
}

pub async fn unobserve_state(
    state: &AppState,
    game_id: &str,
    player_id: PlayerId,
) -> Result<(), ServiceError> {
    let game = state.games.load(game_id).await?;
    game.unsubscribe(player_id).await;
    Ok(())
}

async fn finish_action(state: &AppState, game: &Game, report: &ActionReport) {
    notify_state_changed_if_needed(game, report).await;
    delete_if_needed(state, game, report).await;
}

async fn notify_state_changed_if_needed(game: &Game, report: &ActionReport) {
    if let Some(change) = StateChange::from_outcome(report) {
        let delivered = game.notify_state_changed(change).await;
        info!(
            "ゲーム{}: {} -> {} 日目{} ({}件通知)",
            game.id(),
            report.old_phase,
            report.state.phase,
            report.state.day,
            delivered
        );
    }
}

/// 終了したゲームは購読を閉じて登録から外す
async fn delete_if_needed(state: &AppState, game: &Game, report: &ActionReport) {
    if report.state.phase != GamePhase::End {
        return;
    }

    game.dispose().await;
    state.games.delete(game.id()).await;

    if let PhaseOutcome::GameOver(winner) = report.outcome {
        info!("ゲーム{}が終了しました: 勝者={}", game.id(), winner);
    }
}
