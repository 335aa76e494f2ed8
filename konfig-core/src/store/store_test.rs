use super::*;

#[test]
fn test_instance_status_strings() {
    assert_eq!(InstanceStatus::Connected.as_str(), "connected");
    assert_eq!(InstanceStatus::Disconnected.as_str(), "disconnected");
}

#[test]
fn test_rule_type_parse_round_trip() {
    for rule_type in [RuleType::Required, RuleType::Range] {
        assert_eq!(RuleType::parse(rule_type.as_str()), Some(rule_type));
    }
    assert_eq!(RuleType::parse("regex"), None);
}

#[tokio::test]
async fn test_mock_store_conflict_surface() {
    // The mock exists so the servers can be tested without postgres; make
    // sure the error plumbing composes the way call sites expect.
    let mut store = MockConfigStore::new();
    store.expect_next_version().returning(|_| Ok(4));
    store.expect_insert_config().returning(|doc, _| {
        Err(crate::StoreError::Conflict {
            service_name: doc.service_name.clone(),
            version: doc.version,
        })
    });

    assert_eq!(store.next_version("svcA").await.unwrap(), 4);
    let doc = konfig_proto::common::ConfigDocument {
        service_name: "svcA".into(),
        version: 4,
        ..Default::default()
    };
    let err = store.insert_config(&doc, "").await.unwrap_err();
    assert!(matches!(err, crate::StoreError::Conflict { version: 4, .. }));
}
