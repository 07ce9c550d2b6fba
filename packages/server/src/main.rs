use anyhow::Context;
use axum::http::{self, HeaderValue, Method};
use dotenvy::dotenv;
use env_logger::Builder;
use log::LevelFilter;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use werewolf_server::{app, state::AppState, utils::config::CONFIG};

// ログ設定
fn init_logger() {
    let mut builder = Builder::from_default_env();
    builder
        .filter_level(LevelFilter::Info)
        .filter_module("werewolf_server", LevelFilter::Debug)
        .filter_module("tower_http", LevelFilter::Debug)
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 環境変数をロード
    if let Err(e) = dotenv() {
        eprintln!("Warning: .envファイルの読み込みに失敗しました: {}", e);
    }

    init_logger(); // ロガーの初期化

    log::info!(
        "設定: 購読キュー長={}, 遅い購読者への方針={:?}",
        CONFIG.observer_capacity,
        CONFIG.slow_subscriber_policy
    );

    // CORSレイヤーの設定
    let origin = CONFIG
        .allowed_origin
        .parse::<HeaderValue>()
        .context("CORS_ALLOWED_ORIGIN が不正です")?;
    let cors = CorsLayer::new()
        .allow_origin([origin])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]);

    // ルーティングの設定
    let app = app::create_app_with_state(AppState::new())
        .layer(cors) // CORSレイヤーを追加
        .layer(
            TraceLayer::new_for_http() // HTTPトレースログを有効化
                .make_span_with(|request: &http::Request<_>| {
                    tracing::info_span!(
                        "HTTP request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
        );

    // サーバーの起動
    let addr = CONFIG.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{} にバインドできません", addr))?;

    log::info!("サーバーを起動しました: http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
