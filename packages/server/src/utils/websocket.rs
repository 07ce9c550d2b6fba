use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::models::{event_bus::Subscription, state_change::StateChange, view::StateChangeView};
use crate::routes::AuthenticatedPlayer;
use crate::services::game_service;
use crate::state::AppState;

/// 購読を先に登録してからアップグレードするので、
/// 接続が確立した時点以降の状態変化は取りこぼさない
pub async fn handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Extension(AuthenticatedPlayer(player_id)): Extension<AuthenticatedPlayer>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ServiceError> {
    let subscription = game_service::observe_state(&state, &game_id, player_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, game_id, subscription)))
}

pub async fn handle_socket(
    ws: WebSocket,
    state: AppState,
    game_id: String,
    subscription: Subscription<StateChange>,
) {
    let player_id = subscription.player_id();
    info!("Player {} started observing game {}", player_id, game_id);

    let (mut sender, mut receiver) = ws.split();

    let game_id_for_send = game_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(change) = subscription.recv().await {
            let message_text = match serde_json::to_string(&StateChangeView::from(&change)) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to serialize state change: {}", e);
                    continue;
                }
            };

            debug!("Sending state change in game {}: {}", game_id_for_send, message_text);
            if let Err(e) = sender.send(Message::Text(message_text)).await {
                warn!("Error sending state change: {}", e);
                return;
            }
        }

        // 購読が閉じられた（ゲーム終了・購読解除）
        let _ = sender.send(Message::Close(None)).await;
    });

    // クライアントからのメッセージは読み捨て、切断だけを検知する
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }

    // ゲームが既に削除されていれば何もしない
    if let Err(e) = game_service::unobserve_state(&state, &game_id, player_id).await {
        debug!("Unobserve after disconnect skipped: {}", e);
    }

    info!("Player {} stopped observing game {}", player_id, game_id);
}
