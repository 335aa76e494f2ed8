use crate::common::ConfigDocument;
use crate::common::RolloutState;
use crate::common::RolloutStatus;

/// Canonical document id: `<service_name>-v<version>`.
pub fn document_id(
    service_name: &str,
    version: i64,
) -> String {
    format!("{service_name}-v{version}")
}

impl ConfigDocument {
    /// The store returns a sentinel with `version == 0` when nothing matches.
    pub fn is_empty(&self) -> bool {
        self.version == 0
    }

    /// Sentinel for "no document" carrying only the service name.
    pub fn empty(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            ..Default::default()
        }
    }
}

impl RolloutState {
    /// Sentinel for a config that has never had a rollout started.
    pub fn pending(config_id: &str) -> Self {
        let mut state = Self {
            config_id: config_id.to_string(),
            ..Default::default()
        };
        state.set_status(RolloutStatus::Pending);
        state
    }
}
