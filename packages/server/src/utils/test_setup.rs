use dotenvy::dotenv;
use std::sync::Once;

use crate::models::player::PlayerId;
use crate::models::user::RegisterUserRequest;
use crate::state::AppState;
use crate::utils::random::scripted_random_factory;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// 乱数を決め打ちにしたアプリ状態
pub fn scripted_state(picks: Vec<usize>) -> AppState {
    setup_test_env();
    AppState::with_random(scripted_random_factory(picks))
}

/// テスト用プレイヤーを登録し、ID とトークンを返す
pub async fn register_players(state: &AppState, count: usize) -> Vec<(PlayerId, String)> {
    let mut players = Vec::with_capacity(count);
    for i in 1..=count {
        let response = state
            .user_service
            .register(RegisterUserRequest {
                player_name: format!("Player{}", i),
            })
            .await
            .expect("テスト用プレイヤーの登録に失敗");
        players.push((response.player_id, response.token));
    }
    players
}
