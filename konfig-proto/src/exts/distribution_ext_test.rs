use crate::common::ConfigDocument;
use crate::distribution::ConfigUpdate;
use crate::distribution::SubscribeRequest;
use crate::distribution::UpdateType;

#[test]
fn test_new_config_update() {
    let doc = ConfigDocument {
        config_id: "svcA-v2".into(),
        service_name: "svcA".into(),
        version: 2,
        ..Default::default()
    };

    let update = ConfigUpdate::new_config(doc, true);
    assert_eq!(update.update_type(), UpdateType::NewConfig);
    assert!(update.force_reload);
    assert_eq!(update.config.unwrap().version, 2);
}

#[test]
fn test_heartbeat_ack_carries_no_config() {
    let ack = ConfigUpdate::heartbeat_ack();
    assert_eq!(ack.update_type(), UpdateType::HeartbeatAck);
    assert!(ack.config.is_none());
    assert!(!ack.force_reload);
}

#[test]
fn test_heartbeat_request() {
    let hb = SubscribeRequest::heartbeat("svcA", "instance-123456", 7);
    assert_eq!(hb.service_name, "svcA");
    assert_eq!(hb.instance_id, "instance-123456");
    assert_eq!(hb.current_version, 7);
}
