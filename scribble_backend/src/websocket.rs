use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use nanoid::nanoid;
use tokio::sync::mpsc;
use tracing::info;

use crate::AppState;
use crate::registry::{ClientHandle, OUTBOUND_BUFFER};

/// The entry point for WebSocket connections.
/// Handles the initial upgrade from HTTP to WebSocket.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// The main logic for a single WebSocket connection: register it, pump
/// frames in both directions, unregister on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let id = nanoid!(10);
    let (tx, mut rx) = mpsc::channel(OUTBOUND_BUFFER);
    state
        .relay
        .registry()
        .register(ClientHandle::new(id.clone(), tx))
        .await;
    info!("client {} connected", id);

    // Split the WebSocket into a sender and receiver.
    let (mut sender, mut receiver) = socket.split();

    // Task to drain this client's outbound queue into the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    // Task to hand every inbound text frame to the relay, untouched.
    let relay = Arc::clone(&state.relay);
    let sender_id = id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => relay.dispatch(&sender_id, text).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish. If one does, the other is aborted.
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.relay.registry().unregister(&id).await;
    info!("client {} disconnected", id);
}
