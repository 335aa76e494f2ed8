use serde_json::Value;

use super::*;
use crate::constants::event_types;

#[test]
fn test_event_json_shape_full() {
    let event = Event::new(event_types::CONFIG_UPLOADED, "payments")
        .version(3)
        .performed_by("alice");

    let json: Value = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event_type"], "config.uploaded");
    assert_eq!(json["service_name"], "payments");
    assert_eq!(json["version"], 3);
    assert_eq!(json["performed_by"], "alice");
    assert!(json["timestamp"].as_i64().unwrap() > 0);
    // Unset optional keys are omitted entirely.
    assert!(json.get("instance_id").is_none());
}

#[test]
fn test_event_json_shape_connect() {
    let event = Event::new(event_types::CLIENT_CONNECT, "payments").instance("instance-123456");

    let json: Value = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event_type"], "client_connect");
    assert_eq!(json["instance_id"], "instance-123456");
    assert!(json.get("version").is_none());
    assert!(json.get("performed_by").is_none());
}

#[tokio::test]
async fn test_emit_absorbs_sink_failure() {
    let mut sink = MockEventSink::new();
    sink.expect_publish()
        .returning(|_| Err(EventError::Unavailable("broker gone".into())));

    // Must not panic or propagate.
    emit(&sink, Event::new(event_types::CONFIG_DELETED, "payments")).await;
}

#[tokio::test]
async fn test_emit_forwards_event() {
    let mut sink = MockEventSink::new();
    sink.expect_publish()
        .withf(|event| event.event_type == "config_update" && event.version == Some(2))
        .times(1)
        .returning(|_| Ok(()));

    emit(
        &sink,
        Event::new(event_types::CONFIG_UPDATE, "payments")
            .instance("i-1")
            .version(2),
    )
    .await;
}
