//! WebSocket presence and push channel.
//!
//! Each connection owns one outbound queue. Inbound text frames carry
//! presence signals; outbound frames are lifecycle events as JSON. When the
//! socket ends, for any reason, the connection's channel is released from
//! the registry.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use escrowmatch_engine::EscrowService;
use escrowmatch_presence::ChannelHandle;
use escrowmatch_types::{Caller, EscrowError, InboundSignal, Result};
use futures_util::{SinkExt, StreamExt};

use crate::{routes::AuthCaller, state::AppState};

// ---------------------------------------------------------------------------
// GET /v1/ws
// ---------------------------------------------------------------------------

pub(crate) async fn upgrade(
    State(st): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve(st, caller, socket))
}

async fn serve(st: Arc<AppState>, caller: Caller, socket: WebSocket) {
    let (channel, mut events) = st.service.open_channel();
    let channel_id = channel.id();
    let (mut sink, mut stream) = socket.split();
    tracing::info!(caller = %caller.id, role = %caller.role, %channel_id, "ws connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(error = %err, event = event.name(), "event encode failed");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let service = st.service.clone();
    let recv_channel = channel.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => {
                    if let Err(err) = handle_frame(&service, &caller, &recv_channel, &text) {
                        tracing::warn!(caller = %caller.id, error = %err, "ws frame rejected");
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    st.service.connection_closed(&caller, channel_id);
    tracing::info!(caller = %caller.id, %channel_id, "ws disconnected");
}

/// Decode and apply one inbound text frame.
pub fn handle_frame(
    service: &EscrowService,
    caller: &Caller,
    channel: &ChannelHandle,
    text: &str,
) -> Result<InboundSignal> {
    let signal: InboundSignal =
        serde_json::from_str(text).map_err(|e| EscrowError::Serialization(e.to_string()))?;
    service.signal(caller, signal, channel)?;
    Ok(signal)
}
