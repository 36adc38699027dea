//! The transport-agnostic relay core: connection registry, presence,
//! chatroom fan-out, one-on-one delivery, and video-call signaling.

pub mod call;
pub mod events;
pub mod relay;
pub mod roster;
pub mod session;
pub mod throttle;
