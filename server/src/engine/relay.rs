use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::call::CallSession;
use super::events::{ChatMessage, DirectMessage, ServerEvent, SessionId};
use super::roster::RoomMember;
use super::session::Session;

/// The in-memory relay core: connection registry, chatroom presence, room
/// chat fan-out, one-on-one delivery, and video-call signaling. Transport
/// adapters (the WebSocket handler) call into this; it never performs I/O
/// of its own beyond queueing events on per-session channels.
///
/// Every operation is synchronous and infallible by design: a missing
/// target or an unroutable payload is dropped silently, because the
/// protocol has no acknowledgement or retry semantics.
pub struct RelayEngine {
    /// All currently connected sessions, keyed by session ID.
    sessions: DashMap<SessionId, Arc<Session>>,
    /// Chatroom roster: identity and room for each session that has joined
    /// one. Removed synchronously on disconnect, so an entry always
    /// corresponds to an open connection.
    roster: DashMap<SessionId, RoomMember>,
    /// Personal channels for one-on-one messaging: userId -> the session
    /// currently bound to it. Last bind wins.
    direct_index: DashMap<String, SessionId>,
    /// Active video calls, keyed by room name.
    calls: DashMap<String, CallSession>,
    /// Outbound queue capacity for new sessions.
    queue_capacity: usize,
}

impl RelayEngine {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            roster: DashMap::new(),
            direct_index: DashMap::new(),
            calls: DashMap::new(),
            queue_capacity,
        }
    }

    // ── Connection lifecycle ────────────────────────────────────────

    /// Register a new connection. Returns the session ID and the receiver
    /// the transport's write loop drains.
    pub fn connect(&self) -> (SessionId, mpsc::Receiver<ServerEvent>) {
        let session_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        self.sessions
            .insert(session_id, Arc::new(Session::new(session_id, tx)));

        info!(%session_id, "session connected");
        (session_id, rx)
    }

    /// Tear down a connection. Unconditional and idempotent: removes the
    /// registry entry, releases the personal channel if this session still
    /// holds it, and — if the session had joined a room — rebroadcasts
    /// presence and notifies the room that the participant left the video
    /// call, whether or not it ever announced joining one.
    pub fn disconnect(&self, session_id: SessionId) {
        let Some((_, _session)) = self.sessions.remove(&session_id) else {
            return;
        };

        self.direct_index.retain(|_, sid| *sid != session_id);

        if let Some((_, member)) = self.roster.remove(&session_id) {
            self.drop_call_participant(&member.room, session_id);
            self.broadcast_presence(&member.room);
            self.broadcast_to_room(
                &member.room,
                &ServerEvent::UserLeftVideo {
                    user_id: member.user_id,
                },
                Some(session_id),
            );
        }

        info!(%session_id, "session disconnected");
    }

    // ── Personal channels (one-on-one messaging) ────────────────────

    /// Bind a session to the personal channel for `user_id`. A later bind
    /// for the same identity (reconnect, second tab) takes the channel over.
    pub fn register_direct(&self, session_id: SessionId, user_id: String) {
        debug!(%session_id, %user_id, "bound personal channel");
        self.direct_index.insert(user_id, session_id);
    }

    /// Deliver a one-on-one message to the receiver's personal channel.
    /// At-most-once: if the receiver is offline the message is dropped and
    /// the sender learns nothing — durable delivery is the job of the
    /// message store the client writes to over HTTP in parallel.
    pub fn send_direct(&self, message: DirectMessage) {
        let Some(target) = self.direct_index.get(&message.receiver).map(|r| *r) else {
            debug!(receiver = %message.receiver, "direct message dropped, receiver offline");
            return;
        };

        if let Some(session) = self.sessions.get(&target)
            && !session.send(ServerEvent::ReceiveMessage(message))
        {
            warn!(%target, "failed to queue direct message (queue full or closed)");
        }
    }

    // ── Chatroom membership and presence ────────────────────────────

    /// Put a session in a chatroom under a self-reported identity.
    /// Re-joining overwrites: the previous entry (possibly for a different
    /// room) is replaced, and presence is rebroadcast to every room whose
    /// roster changed.
    pub fn join_room(&self, session_id: SessionId, member: RoomMember) {
        if !self.sessions.contains_key(&session_id) {
            debug!(%session_id, "join-chatroom for unknown session ignored");
            return;
        }

        let room = member.room.clone();
        info!(%session_id, user_name = %member.user_name, %room, "joined chatroom");

        let previous = self.roster.insert(session_id, member);
        if let Some(prev) = previous
            && prev.room != room
        {
            self.broadcast_presence(&prev.room);
        }
        self.broadcast_presence(&room);
    }

    /// All current members of a room. O(n) scan over the roster — rooms are
    /// few and long-lived, no index is worth its bookkeeping here.
    pub fn members_of(&self, room: &str) -> Vec<RoomMember> {
        self.roster
            .iter()
            .filter(|entry| entry.room == room)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Send the full membership snapshot of `room` to everyone in it,
    /// including whoever triggered the recompute. Always the complete
    /// roster — clients replace, never reconcile.
    fn broadcast_presence(&self, room: &str) {
        let users = self.members_of(room);
        self.broadcast_to_room(room, &ServerEvent::OnlineUsers { users }, None);
    }

    // ── Room chat ───────────────────────────────────────────────────

    /// Fan a chatroom message out to every member of its target room,
    /// sender included. The payload's `room` field is trusted as-is; no
    /// history is kept, a late joiner sees nothing sent before it arrived.
    pub fn chatroom_message(&self, message: ChatMessage) {
        let room = message.room.clone();
        self.broadcast_to_room(&room, &ServerEvent::ChatroomMessage(message), None);
    }

    // ── Video call signaling ────────────────────────────────────────

    /// Announce a session into the room's call, creating the call session
    /// on first join. Everyone else in the room is notified; the joiner is
    /// not echoed back to.
    pub fn join_video_call(
        &self,
        session_id: SessionId,
        user_id: String,
        user_name: String,
        room: &str,
    ) {
        self.calls
            .entry(room.to_string())
            .or_insert_with(|| CallSession::new(room.to_string()))
            .participants
            .insert(session_id);

        info!(%session_id, %user_id, %room, "joined video call");

        self.broadcast_to_room(
            room,
            &ServerEvent::UserJoinedVideo { user_id, user_name },
            Some(session_id),
        );
    }

    /// Remove a session from the room's call and tell the rest of the room.
    pub fn leave_video_call(&self, session_id: SessionId, user_id: String, room: &str) {
        self.drop_call_participant(room, session_id);
        info!(%session_id, %user_id, %room, "left video call");
        self.broadcast_to_room(
            room,
            &ServerEvent::UserLeftVideo { user_id },
            Some(session_id),
        );
    }

    /// Relay a WebRTC offer to the rest of the sender's room, tagged with
    /// the sender's chatroom identity.
    pub fn video_offer(&self, session_id: SessionId, offer: serde_json::Value, room: &str) {
        let event = ServerEvent::VideoOffer {
            from: self.chatroom_identity(session_id),
            offer,
        };
        self.relay_signal(session_id, room, &event, "offer");
    }

    /// Relay a WebRTC answer.
    pub fn video_answer(&self, session_id: SessionId, answer: serde_json::Value, room: &str) {
        let event = ServerEvent::VideoAnswer {
            from: self.chatroom_identity(session_id),
            answer,
        };
        self.relay_signal(session_id, room, &event, "answer");
    }

    /// Relay an ICE candidate.
    pub fn ice_candidate(&self, session_id: SessionId, candidate: serde_json::Value, room: &str) {
        let event = ServerEvent::IceCandidate {
            from: self.chatroom_identity(session_id),
            candidate,
        };
        self.relay_signal(session_id, room, &event, "candidate");
    }

    /// Signaling payloads are opaque and unvalidated; they go to the whole
    /// room except the sender, and receivers filter by `from`. A sender
    /// that never announced `join-video-call` is still relayed (failures
    /// here must stay invisible on the wire), just noted in the log.
    fn relay_signal(&self, session_id: SessionId, room: &str, event: &ServerEvent, kind: &str) {
        let in_call = self
            .calls
            .get(room)
            .is_some_and(|call| call.is_participant(session_id));
        if !in_call {
            debug!(%session_id, %room, kind, "signaling from a session not in the call");
        }

        self.broadcast_to_room(room, event, Some(session_id));
    }

    /// Untrack a call participant; the call session goes away with its last
    /// participant.
    fn drop_call_participant(&self, room: &str, session_id: SessionId) {
        if let Some(mut call) = self.calls.get_mut(room) {
            call.participants.remove(&session_id);
        }
        self.calls
            .remove_if(room, |_, call| call.participants.is_empty());
    }

    // ── Utility ─────────────────────────────────────────────────────

    /// The chatroom userId a session announced, if it joined one. Used to
    /// tag relayed signaling payloads.
    fn chatroom_identity(&self, session_id: SessionId) -> Option<String> {
        self.roster
            .get(&session_id)
            .map(|member| member.user_id.clone())
    }

    /// Whether a room currently has an active call. The wire protocol never
    /// exposes this; presence of the call session is the Active state.
    pub fn call_active(&self, room: &str) -> bool {
        self.calls.contains_key(room)
    }

    /// Queue an event for every session whose current room is `room`,
    /// optionally excluding one. Delivery is fire-and-forget: a full or
    /// closed queue drops the event for that session only.
    fn broadcast_to_room(&self, room: &str, event: &ServerEvent, exclude: Option<SessionId>) {
        for entry in self.roster.iter().filter(|m| m.room == room) {
            let member_id = *entry.key();
            if Some(member_id) == exclude {
                continue;
            }
            if let Some(session) = self.sessions.get(&member_id)
                && !session.send(event.clone())
            {
                warn!(%member_id, "failed to queue event for session (queue full or closed)");
            }
        }
    }
}
