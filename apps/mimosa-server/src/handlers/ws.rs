// [apps/mimosa-server/src/handlers/ws.rs]
//! The live-events WebSocket (§4.10, §6 `/ws/live`). Authentication is
//! enforced by `session_guard` running ahead of this handler in the
//! route's middleware stack, so an unauthenticated upgrade attempt
//! never reaches here at all and gets a plain 401 instead of a
//! completed handshake followed by a 4401 close frame.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use tracing::{debug, trace};

use crate::state::AppState;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stream(socket, state))
}

async fn stream(mut socket: WebSocket, state: AppState) {
    let mut receiver = state.event_bus.subscribe();
    debug!("live events subscriber connected");

    loop {
        tokio::select! {
            event = receiver.recv() => {
                match event {
                    Ok(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(payload) => payload,
                            Err(e) => {
                                trace!("failed to serialize live event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        trace!("live events subscriber lagged, skipped {} messages", skipped);
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => break,
                }
            }
        }
    }

    debug!("live events subscriber disconnected");
}
