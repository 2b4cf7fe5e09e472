use serde_json::json;

use super::*;

// ==================== ConnectionOptions Tests ====================

#[test]
fn test_connection_options_default() {
    let opts = ConnectionOptions::default();

    assert_eq!(
        opts.transports,
        vec![TransportKind::WebSocket, TransportKind::Polling],
        "default preference should be stream-first with polling fallback"
    );
    assert!(opts.auto_reconnect, "auto_reconnect should default to true");
    assert_eq!(opts.reconnect_delay_ms, 1000);
    assert_eq!(opts.max_reconnect_delay_ms, 30000);
    assert!(
        opts.max_reconnect_attempts.is_none(),
        "max_reconnect_attempts should default to None (infinite)"
    );
}

#[test]
fn test_connection_options_builder_pattern() {
    let opts = ConnectionOptions::new()
        .with_transports(vec![TransportKind::Polling])
        .with_auto_reconnect(false)
        .with_reconnect_delay_ms(2000)
        .with_max_reconnect_delay_ms(60000)
        .with_max_reconnect_attempts(Some(5));

    assert_eq!(opts.transports, vec![TransportKind::Polling]);
    assert!(!opts.auto_reconnect);
    assert_eq!(opts.reconnect_delay_ms, 2000);
    assert_eq!(opts.max_reconnect_delay_ms, 60000);
    assert_eq!(opts.max_reconnect_attempts, Some(5));
}

#[test]
fn test_connection_options_deserialize_defaults() {
    let opts: ConnectionOptions = serde_json::from_str("{}").expect("empty object is valid");
    assert!(opts.auto_reconnect);
    assert_eq!(opts.transports.len(), 2);
}

// ==================== Job event payload Tests ====================

#[test]
fn test_job_progress_from_payload() {
    let payload = json!({"job_id": "j1", "progress": 42.5});
    let ev = JobProgressEvent::from_payload(&payload).expect("valid payload");
    assert_eq!(ev.job_id, "j1");
    assert_eq!(ev.progress, 42.5);
}

#[test]
fn test_job_progress_rejects_malformed_payload() {
    assert!(JobProgressEvent::from_payload(&json!({"progress": 10})).is_none());
    assert!(JobProgressEvent::from_payload(&json!("nope")).is_none());
}

#[test]
fn test_job_completed_document_id_optional() {
    let ev = JobCompletedEvent::from_payload(&json!({"job_id": "j2"})).expect("valid payload");
    assert_eq!(ev.job_id, "j2");
    assert!(ev.document_id.is_none());

    let ev = JobCompletedEvent::from_payload(&json!({"job_id": "j2", "document_id": "d9"}))
        .expect("valid payload");
    assert_eq!(ev.document_id.as_deref(), Some("d9"));
}

#[test]
fn test_job_failed_from_payload() {
    let ev = JobFailedEvent::from_payload(&json!({"job_id": "j3", "error_message": "corrupt pdf"}))
        .expect("valid payload");
    assert_eq!(ev.error_message, "corrupt pdf");
}

// ==================== Handshake Tests ====================

#[test]
fn test_handshake_reply_parses_auth_success() {
    let reply: HandshakeReply =
        serde_json::from_str(r#"{"type":"auth_success","user_id":"u1"}"#).expect("valid reply");
    assert!(matches!(reply, HandshakeReply::AuthSuccess { user_id: Some(ref u) } if u == "u1"));

    let reply: HandshakeReply =
        serde_json::from_str(r#"{"type":"auth_success"}"#).expect("user_id is optional");
    assert!(matches!(reply, HandshakeReply::AuthSuccess { user_id: None }));
}

#[test]
fn test_handshake_reply_parses_auth_error() {
    let reply: HandshakeReply =
        serde_json::from_str(r#"{"type":"auth_error","message":"bad token"}"#).expect("valid reply");
    assert!(matches!(reply, HandshakeReply::AuthError { ref message } if message == "bad token"));
}

// ==================== Upload model Tests ====================

#[test]
fn test_upload_request_file_size() {
    let request = UploadRequest::new("a.pdf", "application/pdf", vec![0u8; 1024]);
    assert_eq!(request.file_size(), 1024);
}

#[test]
fn test_poll_response_events_default_empty() {
    let resp: PollResponse = serde_json::from_str(r#"{"cursor": 7}"#).expect("valid response");
    assert_eq!(resp.cursor, 7);
    assert!(resp.events.is_empty());
}
