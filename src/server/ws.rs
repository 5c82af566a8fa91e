//! WebSocket handler: the page message channel.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use crate::server::state::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles one connected page for the lifetime of its connection.
///
/// The page is registered for broadcasts on connect and removed when
/// either direction closes. It receives no historical broadcasts; the
/// page glue queries on becoming active.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut rx) = state.worker().clients().register();
    tracing::debug!(client = id, "page connected");

    // Drain this page's registry channel into the socket.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Feed inbound frames to the worker.
    let worker = state.worker().clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => worker.handle_message(&text),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.worker().clients().unregister(id);
    tracing::debug!(client = id, "page disconnected");
}
