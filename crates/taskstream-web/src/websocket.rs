//! WebSocket handler relaying hub events to one client connection.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, info, warn};

use crate::hub::Hub;
use crate::state::AppState;
use taskstream_db::ItemFilter;

/// WebSocket upgrade handler for `/ws/{view}`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(view): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let Some(filter) = ItemFilter::parse(&view) else {
        return (StatusCode::NOT_FOUND, "unknown view").into_response();
    };

    let hub = state.hubs.get(filter).clone();
    let shutdown = state.shutdown.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub, filter, shutdown))
        .into_response()
}

/// Relay hub events to the client until either side closes.
///
/// The client sends no application messages on this channel; incoming frames
/// are read only to detect close and keep the connection alive. Whatever ends
/// the loop, the subscriber is unregistered before the socket is released.
async fn handle_socket(
    socket: WebSocket,
    hub: Hub,
    filter: ItemFilter,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut handle = hub.register().await;

    info!(view = filter.as_str(), subscriber = handle.id(), "WebSocket client connected");

    loop {
        tokio::select! {
            event = handle.recv() => {
                let Some(event) = event else { break };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "failed to encode change event");
                        continue;
                    }
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    debug!(subscriber = handle.id(), "WebSocket send failed, client disconnected");
                    break;
                }
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {} // pings are answered by axum; anything else is ignored
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    hub.unregister(handle.id()).await;
    info!(view = filter.as_str(), subscriber = handle.id(), "WebSocket client disconnected");
}
