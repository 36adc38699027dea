use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::roster::RoomMember;

/// Unique identifier for a connected session (one per connection, not per user).
pub type SessionId = Uuid;

/// A chatroom message. Forwarded verbatim to every member of `room`,
/// including the sender — the sender's UI renders its own message from the
/// echo. The relay trusts `room` and the identity fields as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub room: String,
}

/// A one-on-one message, addressed to the receiver's personal channel.
/// `sender_model`/`receiver_model` name the role collections the identities
/// live in (Student, CollegeMentor, ...) — opaque to the relay, the client
/// uses them when it persists the message over HTTP in parallel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    pub sender: String,
    pub sender_model: String,
    pub receiver: String,
    pub receiver_model: String,
    pub message: String,
}

/// Events a client may send to the relay. The `type` tag carries the wire
/// event name. Frames that fail to deserialize into this closed set are
/// logged and dropped by the WebSocket handler — never answered with an
/// error, the protocol has no acknowledgement semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Bind this connection to the personal channel for `user_id`
    /// (one-on-one messaging, independent of chatrooms).
    #[serde(rename = "join", rename_all = "camelCase")]
    Join { user_id: String },

    /// Join a chatroom under a self-reported identity. May be re-sent to
    /// switch rooms; last write wins.
    #[serde(rename = "join-chatroom", rename_all = "camelCase")]
    JoinChatroom {
        user_id: String,
        user_name: String,
        room: String,
    },

    /// Send a message to a chatroom.
    #[serde(rename = "chatroom-message")]
    ChatroomMessage(ChatMessage),

    /// Send a one-on-one message to another user's personal channel.
    #[serde(rename = "sendMessage")]
    SendMessage(DirectMessage),

    /// Announce participation in the room's video call.
    #[serde(rename = "join-video-call", rename_all = "camelCase")]
    JoinVideoCall {
        user_id: String,
        user_name: String,
        room: String,
    },

    /// WebRTC session offer. `to` names the intended peer but routing is
    /// room-broadcast; receivers filter by `from`.
    #[serde(rename = "video-offer")]
    VideoOffer {
        to: String,
        offer: serde_json::Value,
        room: String,
    },

    /// WebRTC session answer.
    #[serde(rename = "video-answer")]
    VideoAnswer {
        to: String,
        answer: serde_json::Value,
        room: String,
    },

    /// WebRTC ICE candidate.
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        to: String,
        candidate: serde_json::Value,
        room: String,
    },

    /// Leave the room's video call.
    #[serde(rename = "leave-video-call", rename_all = "camelCase")]
    LeaveVideoCall { user_id: String, room: String },
}

/// Events the relay sends to clients. Signaling payloads are opaque blobs
/// passed through untouched; `from` is the sender's chatroom identity and
/// is absent when the sender never joined a chatroom.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Echo of a chatroom message to every member of the room.
    #[serde(rename = "chatroom-message")]
    ChatroomMessage(ChatMessage),

    /// Full membership snapshot of a room, sent to everyone in it after
    /// each join/leave. Always a complete roster, never a diff.
    #[serde(rename = "online-users")]
    OnlineUsers { users: Vec<RoomMember> },

    /// Delivery of a one-on-one message to the receiver's personal channel.
    #[serde(rename = "receiveMessage")]
    ReceiveMessage(DirectMessage),

    /// A participant announced joining the room's video call (not echoed
    /// back to that participant).
    #[serde(rename = "user-joined-video", rename_all = "camelCase")]
    UserJoinedVideo { user_id: String, user_name: String },

    #[serde(rename = "video-offer")]
    VideoOffer {
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        offer: serde_json::Value,
    },

    #[serde(rename = "video-answer")]
    VideoAnswer {
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        answer: serde_json::Value,
    },

    #[serde(rename = "ice-candidate")]
    IceCandidate {
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        candidate: serde_json::Value,
    },

    /// A participant left the room's video call, or disconnected outright.
    #[serde(rename = "user-left-video", rename_all = "camelCase")]
    UserLeftVideo { user_id: String },
}
