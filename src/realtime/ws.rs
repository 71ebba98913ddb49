// src/realtime/ws.rs

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;

use crate::models::submission::LeaderboardEntry;
use crate::state::AppState;

/// WebSocket endpoint for a quiz's live leaderboard.
///
/// Broadcast only: the client receives the current snapshot on connect and a
/// fresh one after each scoring write; anything the client sends is ignored.
pub async fn leaderboard_ws(
    ws: WebSocketUpgrade,
    Path(quiz_id): Path<i64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, quiz_id, state))
}

async fn handle_socket(mut socket: WebSocket, quiz_id: i64, state: AppState) {
    tracing::debug!(quiz_id, "leaderboard viewer connected");
    let mut rx = state.broadcaster.subscribe(quiz_id);

    // Initial snapshot. A store hiccup here degrades to an empty board; the
    // next publish resyncs the viewer.
    let entries = state.leaderboard.top(quiz_id).await.unwrap_or_default();
    if send_snapshot(&mut socket, &entries).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(quiz_id, "leaderboard viewer disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(quiz_id, error = %e, "leaderboard socket error");
                        break;
                    }
                }
            }
            update = rx.recv() => {
                match update {
                    Ok(update) => {
                        if send_snapshot(&mut socket, &update.entries).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Missed intermediate snapshots; resync with a fresh
                        // read instead of replaying stale ones.
                        tracing::warn!(quiz_id, skipped, "leaderboard viewer lagged");
                        let entries =
                            state.leaderboard.top(quiz_id).await.unwrap_or_default();
                        if send_snapshot(&mut socket, &entries).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn send_snapshot(
    socket: &mut WebSocket,
    entries: &[LeaderboardEntry],
) -> Result<(), axum::Error> {
    let payload = serde_json::json!({
        "type": "leaderboard",
        "entries": entries,
    });
    socket.send(Message::Text(payload.to_string().into())).await
}
