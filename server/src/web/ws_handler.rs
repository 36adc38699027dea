use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use super::app_state::AppState;
use crate::engine::events::{ClientEvent, SessionId};
use crate::engine::relay::RelayEngine;
use crate::engine::roster::RoomMember;

/// `GET /ws` — upgrade to the relay's persistent bidirectional connection.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Owns one client connection for its whole life: registers it with the
/// engine, pumps outbound events into the socket from a spawned write task,
/// and dispatches inbound frames until the client goes away. Disconnect
/// cleanup is unconditional — it runs on close, read error, or task end,
/// before any later event could be processed for this session.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let engine = state.engine.clone();
    let (session_id, mut outbound) = engine.connect();
    let (mut sink, mut stream) = socket.split();

    let write_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to serialize outbound event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let msg = match frame {
            Ok(msg) => msg,
            Err(e) => {
                debug!(%session_id, error = %e, "websocket read error");
                break;
            }
        };

        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => dispatch(&engine, session_id, event),
                // Malformed or unknown frames are dropped, never answered.
                Err(e) => warn!(%session_id, error = %e, "dropping malformed event frame"),
            },
            Message::Close(_) => break,
            // Binary frames are not part of the protocol; ping/pong is
            // handled by axum.
            _ => {}
        }
    }

    engine.disconnect(session_id);
    write_task.abort();
}

/// Map a decoded client event onto the engine operation it names.
pub(crate) fn dispatch(engine: &RelayEngine, session_id: SessionId, event: ClientEvent) {
    match event {
        ClientEvent::Join { user_id } => engine.register_direct(session_id, user_id),
        ClientEvent::JoinChatroom {
            user_id,
            user_name,
            room,
        } => engine.join_room(
            session_id,
            RoomMember {
                user_id,
                user_name,
                room,
            },
        ),
        ClientEvent::ChatroomMessage(msg) => engine.chatroom_message(msg),
        ClientEvent::SendMessage(dm) => engine.send_direct(dm),
        ClientEvent::JoinVideoCall {
            user_id,
            user_name,
            room,
        } => engine.join_video_call(session_id, user_id, user_name, &room),
        // `to` is advisory: signaling is room-broadcast and receivers
        // filter by `from`, so the field is accepted but not routed on.
        ClientEvent::VideoOffer { to: _, offer, room } => {
            engine.video_offer(session_id, offer, &room)
        }
        ClientEvent::VideoAnswer {
            to: _,
            answer,
            room,
        } => engine.video_answer(session_id, answer, &room),
        ClientEvent::IceCandidate {
            to: _,
            candidate,
            room,
        } => engine.ice_candidate(session_id, candidate, &room),
        ClientEvent::LeaveVideoCall { user_id, room } => {
            engine.leave_video_call(session_id, user_id, &room)
        }
    }
}
