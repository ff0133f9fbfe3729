//! WebSocket subscriber handling.
//!
//! # Data Flow
//! ```text
//! BroadcastHub ── unbounded queue ──▶ per-connection task ──▶ socket
//! ```
//!
//! # Design Decisions
//! - The push channel is server→subscriber only; inbound frames other
//!   than Close are ignored
//! - The hub owns the only reference to a connection (its queue
//!   sender); the socket task tears both down together

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::http::server::AppState;

/// `GET /ws`: upgrade and hand the socket to its connection task.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one subscriber connection until either side closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Registration performs the catch-up push into this queue.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let id = state.hub.register(tx);

    loop {
        tokio::select! {
            queued = rx.recv() => {
                match queued {
                    Some(payload) => {
                        if sink.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    // Hub dropped the sender (pruned connection).
                    None => break,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // No subscriber→server protocol is defined.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.unregister(id);
}
