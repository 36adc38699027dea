use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::events::{ServerEvent, SessionId};

/// Default maximum queued outbound events per session (prevents memory
/// exhaustion from slow clients).
pub const MAX_OUTBOUND_QUEUE: usize = 1024;

/// A live connection to the relay. Holds only transport plumbing — the
/// caller-supplied identity lives in the engine's roster, since it arrives
/// after connect and may be rewritten on re-join.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    /// Send outbound events to this session's write loop (bounded to prevent memory exhaustion).
    pub outbound: mpsc::Sender<ServerEvent>,
    pub connected_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, outbound: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id,
            outbound,
            connected_at: Utc::now(),
        }
    }

    /// Send an event to this session. Returns false if the channel is closed
    /// or the outbound queue is full (slow client protection — drops event rather than blocking).
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbound.try_send(event).is_ok()
    }
}
