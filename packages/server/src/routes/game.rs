use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::user::{auth_middleware::auth_middleware, user_error_status};
use super::AuthenticatedPlayer;
use crate::{
    error::{GameError, ServiceError},
    models::{
        config::GameConfig,
        player::PlayerId,
        view::{PlayerView, StateView},
    },
    services::game_service,
    state::AppState,
    utils::websocket,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGameRequest {
    pub player_num: usize,
    pub werewolf_num: usize,
}

/// 投票・襲撃の対象。投票では 0 が棄権
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetRequest {
    pub target_id: PlayerId,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/create", post(create_game))
        .nest(
            "/:gameid",
            Router::new()
                // 参加・退出
                .route("/join", post(join_game))
                .route("/leave", post(leave_game))
                // ゲームアクション
                .route("/vote", post(vote_handler))
                .route("/kill", post(kill_handler))
                .route("/next", post(next_handler))
                // 状態の取得
                .route("/state", get(get_game_state))
                .route("/roles", get(get_roles))
                .route("/players/:playerid", get(get_player))
                // 状態変化の購読
                .route("/ws", get(websocket::handler))
                .route("/unobserve", post(unobserve_handler)),
        )
        .route_layer(middleware::from_fn(auth_middleware))
        .with_state(state)
}

fn game_error_status(error: &GameError) -> StatusCode {
    match error {
        GameError::InvalidConfiguration { .. }
        | GameError::SelfTargetForbidden(_)
        | GameError::DeadTargetForbidden(_) => StatusCode::BAD_REQUEST,
        GameError::DeadActorForbidden(_) | GameError::NotWerewolf(_) => StatusCode::FORBIDDEN,
        GameError::NotJoined(_) | GameError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
        GameError::InvalidPhase(_)
        | GameError::AlreadyJoined(_)
        | GameError::AlreadyVoted(_)
        | GameError::AlreadyAcknowledged(_) => StatusCode::CONFLICT,
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Game(e) => game_error_status(e),
            ServiceError::User(e) => user_error_status(e),
            ServiceError::GameNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::GameIdExhausted => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub async fn create_game(
    State(state): State<AppState>,
    Extension(AuthenticatedPlayer(player_id)): Extension<AuthenticatedPlayer>,
    Json(req): Json<CreateGameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let config = GameConfig::new(req.player_num, req.werewolf_num)?;
    let game_state = game_service::create_game(&state, player_id, config).await?;
    Ok((StatusCode::CREATED, Json(StateView::from(&game_state))))
}

pub async fn join_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Extension(AuthenticatedPlayer(player_id)): Extension<AuthenticatedPlayer>,
) -> Result<impl IntoResponse, ServiceError> {
    let game_state = game_service::join_game(&state, &game_id, player_id).await?;
    Ok((StatusCode::OK, Json(StateView::from(&game_state))))
}

pub async fn leave_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Extension(AuthenticatedPlayer(player_id)): Extension<AuthenticatedPlayer>,
) -> Result<impl IntoResponse, ServiceError> {
    let game_state = game_service::leave_game(&state, &game_id, player_id).await?;
    Ok((StatusCode::OK, Json(StateView::from(&game_state))))
}

async fn vote_handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Extension(AuthenticatedPlayer(player_id)): Extension<AuthenticatedPlayer>,
    Json(req): Json<TargetRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let target_id = (req.target_id != 0).then_some(req.target_id);
    game_service::vote(&state, &game_id, player_id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn kill_handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Extension(AuthenticatedPlayer(player_id)): Extension<AuthenticatedPlayer>,
    Json(req): Json<TargetRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    game_service::kill(&state, &game_id, player_id, req.target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn next_handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Extension(AuthenticatedPlayer(player_id)): Extension<AuthenticatedPlayer>,
) -> Result<impl IntoResponse, ServiceError> {
    game_service::next(&state, &game_id, player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_game_state(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let game_state = game_service::get_game_state(&state, &game_id).await?;
    Ok((StatusCode::OK, Json(StateView::from(&game_state))))
}

async fn get_roles(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Extension(AuthenticatedPlayer(player_id)): Extension<AuthenticatedPlayer>,
) -> Result<impl IntoResponse, ServiceError> {
    let roles = game_service::get_roles(&state, &game_id, player_id).await?;
    Ok((StatusCode::OK, Json(roles)))
}

async fn get_player(
    State(state): State<AppState>,
    Path((game_id, target_id)): Path<(String, PlayerId)>,
) -> Result<impl IntoResponse, ServiceError> {
    let player = game_service::get_player(&state, &game_id, target_id).await?;
    Ok((StatusCode::OK, Json(PlayerView::from(&player))))
}

async fn unobserve_handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Extension(AuthenticatedPlayer(player_id)): Extension<AuthenticatedPlayer>,
) -> Result<impl IntoResponse, ServiceError> {
    game_service::unobserve_state(&state, &game_id, player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
