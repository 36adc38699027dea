use serde::{Deserialize, Serialize};

/// Registry entry for a session that has joined a chatroom: the identity it
/// announced and the room it is in. This is also the element type of the
/// `online-users` presence snapshot, so it serializes with wire field names.
///
/// Nothing here is validated — identity is self-reported and trusted, and an
/// empty `user_id` or `room` just produces a meaningless presence entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMember {
    pub user_id: String,
    pub user_name: String,
    pub room: String,
}
