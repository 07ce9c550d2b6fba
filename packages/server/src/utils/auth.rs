use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::player::PlayerId;
use crate::utils::config::CONFIG;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn player_id(&self) -> Result<PlayerId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::TokenValidation)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("トークンの作成に失敗しました")]
    TokenCreation,
    #[error("トークンの検証に失敗しました")]
    TokenValidation,
}

pub fn create_token(player_id: PlayerId) -> Result<String, AuthError> {
    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::hours(CONFIG.token_ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: player_id.to_string(),
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(CONFIG.jwt_secret.as_bytes()),
    )
    .map_err(|_| AuthError::TokenCreation)
}

pub fn verify_token(token: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(CONFIG.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::TokenValidation)?;

    Ok(token_data.claims)
}
