//! WebSocket connection lifecycle — one conversation per socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use sesli_core::protocol::{ClientFrame, TurnEvent, WireFrame};
use sesli_media::stt::{AudioBuffer, AudioFormat};

use crate::state::GatewayState;
use crate::turn::TurnCoordinator;

/// Handle a new voice connection.
///
/// The writer task is the only producer on the socket, draining one
/// FIFO channel, so events reach the client in emission order. The read
/// loop awaits each turn before polling the socket again: a second
/// audio message sent mid-turn queues in the socket and never
/// interleaves with the current turn. When the peer disconnects the
/// writer task cancels the shared token, so a turn still in flight
/// aborts at its next backend call instead of running to completion.
pub async fn handle_ws_connection(state: Arc<GatewayState>, ws: WebSocket) {
    let conn_id = Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, "new voice connection");
    state.register_connection(&conn_id).await;

    let (mut ws_tx, mut ws_rx) = ws.split();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<TurnEvent>();
    let cancel = CancellationToken::new();

    let send_cancel = cancel.clone();
    let send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let frame = match event.into_wire() {
                Ok(WireFrame::Json(json)) => Message::Text(json.into()),
                Ok(WireFrame::Binary(bytes)) => Message::Binary(bytes.into()),
                Err(e) => {
                    error!(%e, "failed to serialize event");
                    continue;
                }
            };
            if ws_tx.send(frame).await.is_err() {
                break;
            }
        }
        // Peer gone (or channel drained at teardown): stop any backend
        // call still running for this connection.
        send_cancel.cancel();
    });

    let mut coordinator = TurnCoordinator::new(
        state.stt.clone(),
        state.generator.clone(),
        state.tts.clone(),
        event_tx,
        cancel.clone(),
    );
    let mut format = AudioFormat::Webm;

    while let Some(msg_result) = ws_rx.next().await {
        match msg_result {
            Ok(Message::Binary(data)) => {
                let audio = AudioBuffer::new(data.to_vec(), format);
                if let Err(e) = coordinator.run_turn(audio).await {
                    // Transport is gone; nothing left to report to
                    warn!(conn_id = %conn_id, %e, "tearing down mid-turn");
                    break;
                }
            }
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientFrame>(text.as_str()) {
                Ok(ClientFrame::Config { format: hint }) => {
                    format = AudioFormat::from_hint(&hint);
                    debug!(conn_id = %conn_id, ?format, "audio format set");
                }
                Err(e) => {
                    debug!(conn_id = %conn_id, %e, "ignoring unrecognized text frame");
                }
            },
            Ok(Message::Close(_)) => {
                debug!(conn_id = %conn_id, "client requested close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Dropping the coordinator discards the conversation history and
    // cancels any in-flight backend call for this connection. History
    // commits in user/assistant pairs, so half its length is the number
    // of completed turns.
    let turns = coordinator.history().len() / 2;
    cancel.cancel();
    drop(coordinator);
    send_task.abort();
    state.unregister_connection(&conn_id).await;
    info!(conn_id = %conn_id, turns, "voice connection closed");
}
