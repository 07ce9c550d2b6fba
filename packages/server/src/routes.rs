use crate::state::AppState;
use axum::Router;

mod game;
mod user;

pub use user::auth_middleware::AuthenticatedPlayer;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .nest("/api/game", game::routes(state.clone()))
        .nest("/api/users", user::routes(state.clone()))
}
