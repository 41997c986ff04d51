//! WebSocket handler: bidirectional event relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection ID, runs the gateway handshake, and
//! enters a `select!` loop:
//! - Incoming client frames → gateway → replies to this socket only
//! - Room broadcasts from the registry → forward to client
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → decode `userId` / `chatId` → admit into a room
//! 2. Rejected → send `error`, then close
//! 3. Client sends frames → gateway → chat service fans out
//! 4. Close → release room membership

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use frames::ServerEvent;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{ErrorCode, error_event};
use crate::services::gateway;
use crate::services::store::INVALID_PAYLOAD_MESSAGE;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

/// `GET /ws?userId=..&chatId=..`. The query is kept as ordered pairs so the
/// first value of a repeated key wins.
pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state, params))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, params: Vec<(String, String)>) {
    let connection_id = Uuid::new_v4();

    // Per-connection channel for receiving room broadcasts.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(state.ws_client_buffer);

    let session = match gateway::admit(&state, &params, connection_id, client_tx).await {
        Ok(session) => session,
        Err(rejection) => {
            warn!(%connection_id, error = %rejection, error_code = rejection.error_code(), "ws: connection rejected");
            let _ = send_event(&mut socket, &error_event(&rejection)).await;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let room = session.room();
    let occupants = state.registry.room_size(room).await;
    info!(%connection_id, user_id = %session.user_id, %room, occupants, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = gateway::handle_inbound_text(&state, &session, text.as_str()).await;
                        if send_events(&mut socket, &replies).await.is_err() {
                            break;
                        }
                    }
                    Message::Binary(_) => {
                        let reply = ServerEvent::error(INVALID_PAYLOAD_MESSAGE);
                        if send_event(&mut socket, &reply).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    state.registry.release(connection_id).await;
    info!(%connection_id, "ws: client disconnected");
}

// =============================================================================
// OUTBOUND
// =============================================================================

async fn send_events(socket: &mut WebSocket, events: &[ServerEvent]) -> Result<(), ()> {
    for event in events {
        send_event(socket, event).await?;
    }
    Ok(())
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match frames::encode_server_event(event) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    if let ServerEvent::Error { message } = event {
        warn!(event = event.name(), text = %message, "ws: send error event");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
