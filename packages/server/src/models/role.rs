use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Unknown, // 役職配布前
    Villager, // 村人
    Werewolf, // 人狼
}

impl Role {
    /// 役職が属する陣営
    pub fn side(self) -> Side {
        match self {
            Role::Unknown => Side::Neutral,
            Role::Villager => Side::Villagers,
            Role::Werewolf => Side::Werewolves,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Unknown => write!(f, "不明"),
            Role::Villager => write!(f, "村人"),
            Role::Werewolf => write!(f, "人狼"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Neutral,
    Villagers,
    Werewolves,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Neutral => write!(f, "中立"),
            Side::Villagers => write!(f, "村人陣営"),
            Side::Werewolves => write!(f, "人狼陣営"),
        }
    }
}
