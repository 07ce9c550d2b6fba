use axum::{
    extract::{Query, Request},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{models::player::PlayerId, utils::auth::verify_token};

/// 認証済みのプレイヤーID。ミドルウェアがリクエスト拡張に設定する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedPlayer(pub PlayerId);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

pub async fn auth_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    // ヘッダーからトークンを取得
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned());

    // WebSocket はヘッダーを付けられないのでクエリも見る
    let token = auth_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(request.uri())
            .ok()
            .and_then(|Query(query)| query.token)
    });

    let token = match token {
        Some(token) => token,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "認証が必要です" })),
            ));
        }
    };

    // トークンを検証
    let player_id = match verify_token(&token).and_then(|claims| claims.player_id()) {
        Ok(player_id) => player_id,
        Err(_) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "無効なトークンです" })),
            ));
        }
    };

    // プレイヤーIDをリクエスト拡張に設定
    request.extensions_mut().insert(AuthenticatedPlayer(player_id));

    // 次のハンドラに進む
    Ok(next.run(request).await)
}
