//! Integration tests for the relay — wire-level flows that feed JSON frames
//! through the event dispatcher and assert on what each connection's write
//! loop would send, mirroring the mentorship frontend's usage: students and
//! mentors in chatrooms, one-on-one messaging, and a group video call.

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    use crate::engine::events::{ServerEvent, SessionId};
    use crate::engine::relay::RelayEngine;
    use crate::engine::session::MAX_OUTBOUND_QUEUE;
    use crate::web::ws_handler::dispatch;

    // ── Helpers ──────────────────────────────────────────────────

    fn setup_engine() -> RelayEngine {
        RelayEngine::new(MAX_OUTBOUND_QUEUE)
    }

    /// Feed a raw wire frame through the same parse+dispatch path the
    /// WebSocket read loop uses.
    fn feed(engine: &RelayEngine, session_id: SessionId, frame: Value) {
        let event = serde_json::from_value(frame).expect("test frame must be valid");
        dispatch(engine, session_id, event);
    }

    /// Join a chatroom under a self-reported identity.
    fn join_chatroom(engine: &RelayEngine, sid: SessionId, user_id: &str, room: &str) {
        feed(
            engine,
            sid,
            json!({
                "type": "join-chatroom",
                "userId": user_id,
                "userName": user_id.to_uppercase(),
                "room": room,
            }),
        );
    }

    fn drain_events(rx: &mut mpsc::Receiver<ServerEvent>) {
        while rx.try_recv().is_ok() {}
    }

    /// Collect everything queued for a connection, as wire JSON.
    fn queued_frames(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<Value> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| serde_json::to_value(&event).unwrap())
            .collect()
    }

    // ── Chatroom flows ───────────────────────────────────────────

    #[tokio::test]
    async fn test_two_students_chat_with_self_echo() {
        let engine = setup_engine();
        let (c1, mut rx1) = engine.connect();
        let (c2, mut rx2) = engine.connect();

        join_chatroom(&engine, c1, "s1", "students");
        join_chatroom(&engine, c2, "s2", "students");
        drain_events(&mut rx1);
        drain_events(&mut rx2);

        feed(
            &engine,
            c1,
            json!({
                "type": "chatroom-message",
                "userId": "s1",
                "userName": "S1",
                "text": "hi",
                "timestamp": "2026-02-11T09:30:00Z",
                "room": "students",
            }),
        );

        // Both the sender and the other member receive the echo.
        for rx in [&mut rx1, &mut rx2] {
            let frames = queued_frames(rx);
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0]["type"], "chatroom-message");
            assert_eq!(frames[0]["userId"], "s1");
            assert_eq!(frames[0]["text"], "hi");
        }
    }

    #[tokio::test]
    async fn test_mentor_room_hears_nothing_from_students() {
        let engine = setup_engine();
        let (c1, mut rx1) = engine.connect();
        let (c3, mut rx3) = engine.connect();

        join_chatroom(&engine, c1, "s1", "students");
        join_chatroom(&engine, c3, "m1", "mentors");
        drain_events(&mut rx1);
        drain_events(&mut rx3);

        feed(
            &engine,
            c1,
            json!({
                "type": "chatroom-message",
                "userId": "s1",
                "userName": "S1",
                "text": "students only",
                "timestamp": "2026-02-11T09:30:00Z",
                "room": "students",
            }),
        );

        assert!(queued_frames(&mut rx3).is_empty());
    }

    #[tokio::test]
    async fn test_presence_shrinks_after_disconnect() {
        let engine = setup_engine();
        let (c1, mut rx1) = engine.connect();
        let (c2, _rx2) = engine.connect();

        join_chatroom(&engine, c1, "s1", "students");
        join_chatroom(&engine, c2, "s2", "students");
        drain_events(&mut rx1);

        engine.disconnect(c2);

        let frames = queued_frames(&mut rx1);
        let snapshot = frames
            .iter()
            .find(|f| f["type"] == "online-users")
            .expect("presence snapshot after disconnect");
        assert_eq!(snapshot["users"], json!([{ "userId": "s1", "userName": "S1", "room": "students" }]));

        // The room is also told the user left any video call.
        assert!(
            frames
                .iter()
                .any(|f| f["type"] == "user-left-video" && f["userId"] == "s2")
        );
    }

    // ── One-on-one messaging ─────────────────────────────────────

    #[tokio::test]
    async fn test_direct_message_reaches_only_the_receiver() {
        let engine = setup_engine();
        let (c1, mut rx1) = engine.connect();
        let (c3, mut rx3) = engine.connect();

        feed(&engine, c1, json!({ "type": "join", "userId": "s1" }));
        feed(&engine, c3, json!({ "type": "join", "userId": "m1" }));

        feed(
            &engine,
            c1,
            json!({
                "type": "sendMessage",
                "sender": "s1",
                "senderModel": "Student",
                "receiver": "m1",
                "receiverModel": "IndustryMentor",
                "message": "hello",
            }),
        );

        let frames = queued_frames(&mut rx3);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "receiveMessage");
        assert_eq!(frames[0]["message"], "hello");
        assert_eq!(frames[0]["senderModel"], "Student");

        // Fire-and-forget: the sender gets no acknowledgement.
        assert!(queued_frames(&mut rx1).is_empty());
    }

    #[tokio::test]
    async fn test_direct_message_to_offline_user_is_silent() {
        let engine = setup_engine();
        let (c1, mut rx1) = engine.connect();
        feed(&engine, c1, json!({ "type": "join", "userId": "s1" }));

        feed(
            &engine,
            c1,
            json!({
                "type": "sendMessage",
                "sender": "s1",
                "senderModel": "Student",
                "receiver": "m1",
                "receiverModel": "IndustryMentor",
                "message": "hello?",
            }),
        );

        assert!(queued_frames(&mut rx1).is_empty());
    }

    // ── Video call handshake ─────────────────────────────────────

    #[tokio::test]
    async fn test_group_call_handshake_fan_out() {
        let engine = setup_engine();
        let (c1, mut rx1) = engine.connect();
        let (c2, mut rx2) = engine.connect();

        join_chatroom(&engine, c1, "s1", "students");
        join_chatroom(&engine, c2, "s2", "students");
        drain_events(&mut rx1);
        drain_events(&mut rx2);

        feed(
            &engine,
            c1,
            json!({ "type": "join-video-call", "userId": "s1", "userName": "S1", "room": "students" }),
        );
        feed(
            &engine,
            c2,
            json!({ "type": "join-video-call", "userId": "s2", "userName": "S2", "room": "students" }),
        );

        // c1 hears s2 join; c2 hears s1 join; neither hears itself.
        let f1 = queued_frames(&mut rx1);
        assert_eq!(f1.len(), 1);
        assert_eq!(f1[0]["type"], "user-joined-video");
        assert_eq!(f1[0]["userId"], "s2");
        let f2 = queued_frames(&mut rx2);
        assert_eq!(f2.len(), 1);
        assert_eq!(f2[0]["userId"], "s1");

        // Offer / answer / candidate flow, each tagged with the sender.
        feed(
            &engine,
            c1,
            json!({ "type": "video-offer", "to": "s2", "offer": { "sdp": "offer-sdp" }, "room": "students" }),
        );
        let f2 = queued_frames(&mut rx2);
        assert_eq!(f2.len(), 1);
        assert_eq!(f2[0]["type"], "video-offer");
        assert_eq!(f2[0]["from"], "s1");
        assert_eq!(f2[0]["offer"]["sdp"], "offer-sdp");
        assert!(queued_frames(&mut rx1).is_empty(), "no self-echo of offers");

        feed(
            &engine,
            c2,
            json!({ "type": "video-answer", "to": "s1", "answer": { "sdp": "answer-sdp" }, "room": "students" }),
        );
        let f1 = queued_frames(&mut rx1);
        assert_eq!(f1[0]["type"], "video-answer");
        assert_eq!(f1[0]["from"], "s2");

        feed(
            &engine,
            c1,
            json!({ "type": "ice-candidate", "to": "s2", "candidate": { "sdpMid": "0" }, "room": "students" }),
        );
        let f2 = queued_frames(&mut rx2);
        assert_eq!(f2[0]["type"], "ice-candidate");
        assert_eq!(f2[0]["from"], "s1");

        // Leaving notifies the rest of the room only.
        feed(
            &engine,
            c2,
            json!({ "type": "leave-video-call", "userId": "s2", "room": "students" }),
        );
        let f1 = queued_frames(&mut rx1);
        assert_eq!(f1[0]["type"], "user-left-video");
        assert_eq!(f1[0]["userId"], "s2");
        assert!(queued_frames(&mut rx2).is_empty());
    }

    // ── Robustness ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_malformed_frame_does_not_disturb_the_connection() {
        let engine = setup_engine();
        let (c1, mut rx1) = engine.connect();
        let (c2, mut rx2) = engine.connect();
        join_chatroom(&engine, c1, "s1", "students");
        join_chatroom(&engine, c2, "s2", "students");
        drain_events(&mut rx1);
        drain_events(&mut rx2);

        // The read loop drops undecodable frames before dispatch.
        assert!(
            serde_json::from_str::<crate::engine::events::ClientEvent>("{\"type\":\"bogus\"}")
                .is_err()
        );

        // A valid event afterwards still relays normally.
        feed(
            &engine,
            c1,
            json!({
                "type": "chatroom-message",
                "userId": "s1",
                "userName": "S1",
                "text": "still here",
                "timestamp": "2026-02-11T09:31:00Z",
                "room": "students",
            }),
        );
        let frames = queued_frames(&mut rx2);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["text"], "still here");
    }
}
