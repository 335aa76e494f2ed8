use bytes::Bytes;
use prost::Message;

use crate::common::ConfigDocument;
use crate::common::RolloutState;
use crate::common::RolloutStatus;
use crate::exts::document_id;

#[test]
fn test_document_id_format() {
    assert_eq!(document_id("payments", 1), "payments-v1");
    assert_eq!(document_id("svcA", 42), "svcA-v42");
}

#[test]
fn test_empty_sentinel() {
    let doc = ConfigDocument::empty("payments");
    assert!(doc.is_empty());
    assert_eq!(doc.service_name, "payments");
    assert_eq!(doc.version, 0);

    let real = ConfigDocument {
        config_id: document_id("payments", 3),
        service_name: "payments".into(),
        version: 3,
        content: Bytes::from_static(b"{}"),
        format: "json".into(),
        ..Default::default()
    };
    assert!(!real.is_empty());
}

#[test]
fn test_pending_rollout_sentinel() {
    let state = RolloutState::pending("payments-v1");
    assert_eq!(state.status(), RolloutStatus::Pending);
    assert_eq!(state.config_id, "payments-v1");
    assert_eq!(state.started_at, 0);
}

#[test]
fn test_document_prost_round_trip() {
    let doc = ConfigDocument {
        config_id: "svcA-v1".into(),
        service_name: "svcA".into(),
        version: 1,
        content: Bytes::from_static(b"{\"k\":1}"),
        format: "json".into(),
        content_hash: "abc123".into(),
        created_at: 1700000000,
        created_by: "api".into(),
    };

    let encoded = doc.encode_to_vec();
    let decoded = ConfigDocument::decode(encoded.as_slice()).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn test_document_serde_round_trip() {
    let doc = ConfigDocument {
        config_id: "svcA-v2".into(),
        service_name: "svcA".into(),
        version: 2,
        content: Bytes::from_static(b"{\"k\":2}"),
        format: "json".into(),
        content_hash: "deadbeef".into(),
        created_at: 1700000000,
        created_by: "api".into(),
    };

    let json = serde_json::to_string(&doc).unwrap();
    let decoded: ConfigDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn test_rollout_status_str_names() {
    assert_eq!(RolloutStatus::InProgress.as_str_name(), "IN_PROGRESS");
    assert_eq!(
        RolloutStatus::from_str_name("ROLLED_BACK"),
        Some(RolloutStatus::RolledBack)
    );
    assert_eq!(RolloutStatus::from_str_name("bogus"), None);
}
