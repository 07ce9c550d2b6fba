use serde::{Deserialize, Serialize};

use super::{
    game::{GameState, GamePhase},
    player::{Player, PlayerId},
    state_change::{ChangeKind, StateChange},
};

/// 外部に公開するプレイヤー情報。役職と陣営は含めない
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub player_name: String,
    pub is_dead: bool,
    pub index: usize,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            player_id: player.id,
            player_name: player.name.clone(),
            is_dead: player.is_dead,
            index: player.index,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateView {
    pub game_id: String,
    pub player_num: usize,
    pub werewolf_num: usize,
    pub phase: GamePhase,
    pub day: u32,
    pub players: Vec<PlayerView>,
}

impl From<&GameState> for StateView {
    fn from(state: &GameState) -> Self {
        let mut players: Vec<PlayerView> = state.players.values().map(PlayerView::from).collect();
        // 開始前は席番号が 0 なので ID 順
        players.sort_by_key(|p| (p.index, p.player_id));

        Self {
            game_id: state.id.clone(),
            player_num: state.config.player_num(),
            werewolf_num: state.config.werewolf_num(),
            phase: state.phase,
            day: state.day,
            players,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangeView {
    pub state: StateView,
    pub old_phase: GamePhase,
    #[serde(flatten)]
    pub change: ChangeKind,
}

impl From<&StateChange> for StateChangeView {
    fn from(change: &StateChange) -> Self {
        Self {
            state: StateView::from(&change.state),
            old_phase: change.old_phase,
            change: change.kind.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{config::GameConfig, role::Role};
    use std::collections::HashMap;

    #[test]
    fn test_state_view_hides_roles() {
        let mut wolf = Player::new(2, "Wolf".to_string());
        wolf.assign(Role::Werewolf);
        wolf.index = 1;
        let mut villager = Player::new(1, "Villager".to_string());
        villager.assign(Role::Villager);
        villager.index = 2;

        let state = GameState {
            id: "012345".to_string(),
            config: GameConfig::new(3, 1).unwrap(),
            phase: GamePhase::Night,
            day: 1,
            players: HashMap::from([(1, villager), (2, wolf)]),
        };
        let change = StateChange {
            state,
            old_phase: GamePhase::Start,
            kind: ChangeKind::PhaseChanged {
                killed_player_id: None,
            },
        };

        let json = serde_json::to_value(StateChangeView::from(&change)).unwrap();
        assert_eq!(json["change_type"], "phase_changed");
        assert_eq!(json["old_phase"], "Start");
        assert_eq!(json["state"]["game_id"], "012345");
        assert_eq!(json["state"]["players"][0]["player_id"], 2);
        assert_eq!(json["state"]["players"][1]["player_id"], 1);

        let text = json.to_string();
        assert!(!text.contains("Werewolf"));
        assert!(!text.contains("role"));
    }
}
