use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::{Role, Side};

/// 認証済みの参加者ID。0 は投票の「棄権」を表すため払い出さない
pub type PlayerId = u64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub side: Side,
    pub is_dead: bool,
    /// 参加順の席番号（1始まり）。役職配布時に確定する
    pub index: usize,
    pub joined_time: DateTime<Utc>,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            role: Role::Unknown,
            side: Side::Neutral,
            is_dead: false,
            index: 0,
            joined_time: Utc::now(),
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn assign(&mut self, role: Role) {
        self.role = role;
        self.side = role.side();
    }
}
