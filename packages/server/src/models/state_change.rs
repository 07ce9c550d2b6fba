use serde::{Deserialize, Serialize};

use super::{
    game::{ActionReport, GameState, GamePhase, PhaseOutcome},
    player::PlayerId,
    role::Side,
};

/// 通知の種類と、種類ごとの付加情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "snake_case")]
pub enum ChangeKind {
    PlayerJoined { player_id: PlayerId },
    PlayerLeft { player_id: PlayerId },
    PhaseChanged { killed_player_id: Option<PlayerId> },
    PhaseChangedWithoutKilling,
    GameOver { winner: Side },
}

/// 購読者へ送る状態変化。変化後のスナップショットと差分を持つ
#[derive(Debug, Clone)]
pub struct StateChange {
    pub state: GameState,
    pub old_phase: GamePhase,
    pub kind: ChangeKind,
}

impl StateChange {
    pub fn player_joined(report: &ActionReport, player_id: PlayerId) -> Self {
        Self {
            state: report.state.clone(),
            old_phase: report.old_phase,
            kind: ChangeKind::PlayerJoined { player_id },
        }
    }

    pub fn player_left(report: &ActionReport, player_id: PlayerId) -> Self {
        Self {
            state: report.state.clone(),
            old_phase: report.old_phase,
            kind: ChangeKind::PlayerLeft { player_id },
        }
    }

    /// フェーズ遷移の結果から通知を作る。遷移していなければ `None`
    pub fn from_outcome(report: &ActionReport) -> Option<Self> {
        let kind = match report.outcome {
            PhaseOutcome::Unchanged => return None,
            PhaseOutcome::Started => ChangeKind::PhaseChanged {
                killed_player_id: None,
            },
            PhaseOutcome::Advanced => ChangeKind::PhaseChangedWithoutKilling,
            PhaseOutcome::Killed(player_id) => ChangeKind::PhaseChanged {
                killed_player_id: Some(player_id),
            },
            PhaseOutcome::GameOver(winner) => ChangeKind::GameOver { winner },
        };

        Some(Self {
            state: report.state.clone(),
            old_phase: report.old_phase,
            kind,
        })
    }
}
