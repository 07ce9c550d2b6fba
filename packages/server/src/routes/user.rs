use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::models::player::PlayerId;
use crate::models::user::RegisterUserRequest;
use crate::services::user_service::UserServiceError;
use crate::state::AppState;

pub mod auth_middleware;

// ユーザールートの設定
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register_user))
        .route("/:id", get(get_user))
        .with_state(state)
}

pub(crate) fn user_error_status(error: &UserServiceError) -> StatusCode {
    match error {
        UserServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,
        UserServiceError::InvalidName => StatusCode::BAD_REQUEST,
        UserServiceError::AuthError(_) => StatusCode::UNAUTHORIZED,
    }
}

// エラーハンドリング
impl IntoResponse for UserServiceError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (user_error_status(&self), body).into_response()
    }
}

// ユーザー登録（トークンを発行する）
pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, UserServiceError> {
    let result = state.user_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

// ユーザー情報取得
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<PlayerId>,
) -> Result<impl IntoResponse, UserServiceError> {
    let user = state.user_service.get_user(user_id).await?;
    Ok((StatusCode::OK, Json(user)))
}
