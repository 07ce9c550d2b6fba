use thiserror::Error;

use crate::models::{game::GamePhase, player::PlayerId};
use crate::services::user_service::UserServiceError;

/// ゲーム操作の検証エラー。検証は常に変更より先に行うため、
/// エラー時のゲーム状態は操作前と同一である
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("不正な設定です: プレイヤー数={player_num}, 人狼数={werewolf_num}")]
    InvalidConfiguration {
        player_num: usize,
        werewolf_num: usize,
    },
    #[error("現在のフェーズ({0})では実行できません")]
    InvalidPhase(GamePhase),
    #[error("プレイヤー{0}は既に参加しています")]
    AlreadyJoined(PlayerId),
    #[error("プレイヤー{0}は参加していません")]
    NotJoined(PlayerId),
    #[error("プレイヤー{0}が見つかりません")]
    PlayerNotFound(PlayerId),
    #[error("プレイヤー{0}は既に投票しています")]
    AlreadyVoted(PlayerId),
    #[error("プレイヤー{0}は既に次へ進む準備ができています")]
    AlreadyAcknowledged(PlayerId),
    #[error("自分自身を対象にはできません")]
    SelfTargetForbidden(PlayerId),
    #[error("死亡したプレイヤー{0}は行動できません")]
    DeadActorForbidden(PlayerId),
    #[error("対象のプレイヤー{0}は既に死亡しています")]
    DeadTargetForbidden(PlayerId),
    #[error("プレイヤー{0}は人狼ではありません")]
    NotWerewolf(PlayerId),
}

/// 呼び出し層（サービス）のエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    User(#[from] UserServiceError),
    #[error("ゲームが見つかりません: {0}")]
    GameNotFound(String),
    #[error("ゲームIDの採番に失敗しました")]
    GameIdExhausted,
}
