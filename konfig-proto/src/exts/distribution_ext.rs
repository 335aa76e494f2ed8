use crate::common::ConfigDocument;
use crate::distribution::ConfigUpdate;
use crate::distribution::SubscribeRequest;
use crate::distribution::UpdateType;

impl ConfigUpdate {
    /// An update carrying a new document version.
    pub fn new_config(
        config: ConfigDocument,
        force_reload: bool,
    ) -> Self {
        Self {
            update_type: UpdateType::NewConfig as i32,
            config: Some(config),
            force_reload,
        }
    }

    /// An acknowledgement for a received heartbeat.
    pub fn heartbeat_ack() -> Self {
        Self {
            update_type: UpdateType::HeartbeatAck as i32,
            config: None,
            force_reload: false,
        }
    }
}

impl SubscribeRequest {
    /// A heartbeat is a bare re-send of the subscriber identity.
    pub fn heartbeat(
        service_name: &str,
        instance_id: &str,
        current_version: i64,
    ) -> Self {
        Self {
            service_name: service_name.to_string(),
            instance_id: instance_id.to_string(),
            current_version,
        }
    }
}
