use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::RwLock;

use crate::models::player::PlayerId;
use crate::models::user::{AuthResponse, RegisterUserRequest, User};
use crate::utils::auth::{create_token, AuthError};

const MAX_NAME_LENGTH: usize = 32;

/// 参加者の名簿。永続化は行わずプロセス内にだけ保持する
#[derive(Clone)]
pub struct UserService {
    users: Arc<RwLock<HashMap<PlayerId, User>>>,
    next_id: Arc<AtomicU64>,
}

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("認証エラー: {0}")]
    AuthError(#[from] AuthError),
    #[error("ユーザーが見つかりませんでした: {0}")]
    UserNotFound(PlayerId),
    #[error("不正なプレイヤー名です")]
    InvalidName,
}

impl Default for UserService {
    fn default() -> Self {
        Self::new()
    }
}

impl UserService {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            // 0 は棄権票に使うので 1 から払い出す
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn register(&self, req: RegisterUserRequest) -> Result<AuthResponse, UserServiceError> {
        let name = req.player_name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(UserServiceError::InvalidName);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = User::new(id, name.to_string());
        let token = create_token(user.id)?;

        self.users.write().await.insert(user.id, user.clone());

        Ok(AuthResponse {
            player_id: user.id,
            player_name: user.name,
            token,
        })
    }

    pub async fn get_user(&self, player_id: PlayerId) -> Result<User, UserServiceError> {
        self.users
            .read()
            .await
            .get(&player_id)
            .cloned()
            .ok_or(UserServiceError::UserNotFound(player_id))
    }

    pub async fn find_player_name(&self, player_id: PlayerId) -> Result<String, UserServiceError> {
        self.get_user(player_id).await.map(|user| user.name)
    }
}
