use serde::Serialize;

use crate::error::GameError;

/// ゲーム作成時のパラメータ。作成後は変更できない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameConfig {
    player_num: usize,
    werewolf_num: usize,
}

impl GameConfig {
    pub const MIN_PLAYERS: usize = 3;

    pub fn new(player_num: usize, werewolf_num: usize) -> Result<Self, GameError> {
        // 人狼は1人以上、かつ村人側が過半数であること
        if player_num < Self::MIN_PLAYERS
            || werewolf_num < 1
            || werewolf_num >= player_num
            || werewolf_num >= player_num - werewolf_num
        {
            return Err(GameError::InvalidConfiguration {
                player_num,
                werewolf_num,
            });
        }

        Ok(Self {
            player_num,
            werewolf_num,
        })
    }

    pub fn player_num(&self) -> usize {
        self.player_num
    }

    pub fn werewolf_num(&self) -> usize {
        self.werewolf_num
    }

    pub fn villager_num(&self) -> usize {
        self.player_num - self.werewolf_num
    }
}
