//! Change-event push channel for the UI shell.
//!
//! Events are opaque refetch triggers; the UI re-reads whatever the named
//! table backs. The broadcast subscription lives exactly as long as the
//! socket, so navigating away releases it.

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::state::AppState;
use crate::sync::ChangeEvent;

pub async fn subscribe(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let events = state.bus.subscribe();
    ws.on_upgrade(move |socket| push_events(socket, events))
}

async fn push_events(socket: WebSocket, mut events: broadcast::Receiver<ChangeEvent>) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let body = match event {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(body) => body,
                        Err(e) => {
                            tracing::error!("Failed to serialize change event: {}", e);
                            continue;
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Too far behind to replay; tell the UI to refetch
                        // everything.
                        serde_json::json!({ "resync": true }).to_string()
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if sink.send(Message::Text(body)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {} // pings and stray frames
                }
            }
        }
    }
}
