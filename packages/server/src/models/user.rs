use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::player::PlayerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: PlayerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub player_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub player_id: PlayerId,
    pub player_name: String,
    pub token: String,
}
