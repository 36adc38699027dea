use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::events::SessionId;

/// In-memory state for a room's video call. One exists per room while at
/// least one session has announced `join-video-call`; the engine removes it
/// when the last participant leaves, so presence of the entry *is* the
/// Active state.
#[derive(Debug)]
pub struct CallSession {
    pub room: String,
    /// Session IDs that have announced joining the call.
    pub participants: HashSet<SessionId>,
    pub started_at: DateTime<Utc>,
}

impl CallSession {
    pub fn new(room: String) -> Self {
        Self {
            room,
            participants: HashSet::new(),
            started_at: Utc::now(),
        }
    }

    pub fn is_participant(&self, session_id: SessionId) -> bool {
        self.participants.contains(&session_id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}
