use std::sync::Arc;

use bytes::Bytes;
use tonic::Request;

use super::*;
use konfig_core::events::MockEventSink;
use konfig_core::hash::content_hash;
use konfig_core::metrics::StatsdSink;
use konfig_core::store::MockConfigStore;
use konfig_core::validator::MockConfigValidator;
use konfig_core::NetworkError;
use konfig_core::StoreError;
use konfig_core::ValidationConfig;
use konfig_proto::api::config_api_service_server::ConfigApiService;
use konfig_proto::api::DeleteConfigRequest;
use konfig_proto::api::RollbackRequest;
use konfig_proto::api::StartRolloutRequest;
use konfig_proto::api::UploadConfigRequest;
use konfig_proto::common::ConfigDocument;
use konfig_proto::validation::ValidateConfigResponse;
use konfig_proto::validation::ValidationIssue;

fn service(
    store: MockConfigStore,
    events: MockEventSink,
    validator: MockConfigValidator,
) -> ApiService {
    ApiService::new(
        Arc::new(store),
        Arc::new(events),
        Arc::new(validator),
        StatsdSink::disabled(),
        ValidationConfig::default(),
    )
}

fn accepting_validator() -> MockConfigValidator {
    let mut validator = MockConfigValidator::new();
    validator.expect_validate().returning(|_| {
        Ok(ValidateConfigResponse {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            message: "Valid".into(),
        })
    });
    validator
}

fn upload_request(content: &'static [u8]) -> UploadConfigRequest {
    UploadConfigRequest {
        service_name: "svcA".into(),
        content: Bytes::from_static(content),
        format: "json".into(),
        description: "initial".into(),
        created_by: String::new(),
        validate: true,
    }
}

fn stored_doc(
    version: i64,
    content: &'static [u8],
) -> ConfigDocument {
    ConfigDocument {
        config_id: format!("svcA-v{version}"),
        service_name: "svcA".into(),
        version,
        content: Bytes::from_static(content),
        format: "json".into(),
        content_hash: content_hash(content),
        created_at: 1700000000,
        created_by: "api".into(),
    }
}

#[tokio::test]
async fn test_upload_happy_path() {
    let mut store = MockConfigStore::new();
    store.expect_next_version().return_once(|_| Ok(1));
    store
        .expect_insert_config()
        .withf(|doc, description| {
            doc.config_id == "svcA-v1"
                && doc.version == 1
                && doc.created_by == "api"
                && doc.content_hash == content_hash(b"{\"k\":1}")
                && description == "initial"
        })
        .return_once(|doc, _| Ok(doc.config_id.clone()));
    store
        .expect_append_audit()
        .withf(|_, config_id, action, _, _| config_id == "svcA-v1" && action == "uploaded")
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));

    let mut events = MockEventSink::new();
    events
        .expect_publish()
        .withf(|event| event.event_type == "config.uploaded" && event.version == Some(1))
        .times(1)
        .returning(|_| Ok(()));

    let api = service(store, events, accepting_validator());
    let response = api
        .upload_config(Request::new(upload_request(b"{\"k\":1}")))
        .await
        .unwrap()
        .into_inner();

    assert!(response.success, "{}", response.message);
    assert_eq!(response.config_id, "svcA-v1");
    assert_eq!(response.version, 1);
}

#[tokio::test]
async fn test_upload_requires_service_name_and_content() {
    let api = service(
        MockConfigStore::new(),
        MockEventSink::new(),
        MockConfigValidator::new(),
    );

    let mut request = upload_request(b"{}");
    request.service_name = String::new();
    let response = api
        .upload_config(Request::new(request))
        .await
        .unwrap()
        .into_inner();
    assert!(!response.success);
    assert_eq!(response.message, "service_name is required");

    let mut request = upload_request(b"{}");
    request.content = Bytes::new();
    let response = api
        .upload_config(Request::new(request))
        .await
        .unwrap()
        .into_inner();
    assert!(!response.success);
    assert_eq!(response.message, "content is required");
}

#[tokio::test]
async fn test_upload_rejects_oversized_content() {
    let api = service(
        MockConfigStore::new(),
        MockEventSink::new(),
        MockConfigValidator::new(),
    );

    let oversized: &'static [u8] = vec![b' '; 1024 * 1024 + 1].leak();
    let response = api
        .upload_config(Request::new(upload_request(oversized)))
        .await
        .unwrap()
        .into_inner();

    assert!(!response.success);
    assert_eq!(response.message, "Validation failed");
    assert!(response.validation_errors[0].contains("byte limit"));
}

#[tokio::test]
async fn test_upload_rejects_trailing_comma_despite_validate_false() {
    let api = service(
        MockConfigStore::new(),
        MockEventSink::new(),
        MockConfigValidator::new(),
    );

    let mut request = upload_request(b"{\"k\": 1,}");
    request.validate = false;
    let response = api
        .upload_config(Request::new(request))
        .await
        .unwrap()
        .into_inner();

    assert!(!response.success);
    assert!(response.validation_errors[0].contains("Trailing comma"));
}

#[tokio::test]
async fn test_upload_rejected_by_validation_service() {
    let mut validator = MockConfigValidator::new();
    validator.expect_validate().return_once(|_| {
        Ok(ValidateConfigResponse {
            valid: false,
            errors: vec![ValidationIssue {
                field: "max_connections".into(),
                error_type: "range".into(),
                message: "out of range".into(),
            }],
            warnings: Vec::new(),
            message: "Validation failed".into(),
        })
    });

    let api = service(MockConfigStore::new(), MockEventSink::new(), validator);
    let response = api
        .upload_config(Request::new(upload_request(b"{\"max_connections\": 0}")))
        .await
        .unwrap()
        .into_inner();

    assert!(!response.success);
    assert_eq!(response.message, "Validation service rejected config");
    assert_eq!(response.validation_errors, vec!["max_connections: out of range"]);
}

#[tokio::test]
async fn test_upload_rejected_when_validator_unreachable() {
    let mut validator = MockConfigValidator::new();
    validator
        .expect_validate()
        .return_once(|_| Err(NetworkError::ConnectError("refused".into())));

    let api = service(MockConfigStore::new(), MockEventSink::new(), validator);
    let response = api
        .upload_config(Request::new(upload_request(b"{}")))
        .await
        .unwrap()
        .into_inner();

    assert!(!response.success);
    assert_eq!(response.message, "Validation service unavailable");
}

#[tokio::test]
async fn test_upload_version_conflict_reported_as_failure() {
    let mut store = MockConfigStore::new();
    store.expect_next_version().return_once(|_| Ok(2));
    store.expect_insert_config().return_once(|doc, _| {
        Err(StoreError::Conflict {
            service_name: doc.service_name.clone(),
            version: doc.version,
        })
    });

    let api = service(store, MockEventSink::new(), accepting_validator());
    let response = api
        .upload_config(Request::new(upload_request(b"{}")))
        .await
        .unwrap()
        .into_inner();

    assert!(!response.success);
    assert!(response.message.contains("Failed to store"));
}

#[tokio::test]
async fn test_rollback_with_no_previous_version() {
    let mut store = MockConfigStore::new();
    store
        .expect_get_latest()
        .return_once(|_| Ok(stored_doc(1, b"{\"k\":1}")));

    let api = service(store, MockEventSink::new(), MockConfigValidator::new());
    let response = api
        .rollback(Request::new(RollbackRequest {
            service_name: "svcA".into(),
            target_version: 0,
        }))
        .await
        .unwrap()
        .into_inner();

    assert!(!response.success);
    assert_eq!(response.message, "No previous version to rollback to");
}

#[tokio::test]
async fn test_rollback_republishes_previous_content_as_new_version() {
    let mut store = MockConfigStore::new();
    store
        .expect_get_latest()
        .return_once(|_| Ok(stored_doc(2, b"{\"k\":2}")));
    store
        .expect_get_by_version()
        .withf(|_, version| *version == 1)
        .return_once(|_, _| Ok(stored_doc(1, b"{\"k\":1}")));
    store.expect_next_version().return_once(|_| Ok(3));
    store
        .expect_insert_config()
        .withf(|doc, description| {
            doc.config_id == "svcA-v3"
                && doc.version == 3
                && doc.content.as_ref() == b"{\"k\":1}"
                && doc.created_by == "rollback"
                && doc.content_hash == content_hash(b"{\"k\":1}")
                && description == "Rollback to v1"
        })
        .return_once(|doc, _| Ok(doc.config_id.clone()));
    store
        .expect_append_audit()
        .withf(|_, _, action, _, _| action == "rollback")
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));

    let mut events = MockEventSink::new();
    events
        .expect_publish()
        .withf(|event| event.event_type == "config.rolled_back" && event.version == Some(3))
        .times(1)
        .returning(|_| Ok(()));

    let api = service(store, events, MockConfigValidator::new());
    let response = api
        .rollback(Request::new(RollbackRequest {
            service_name: "svcA".into(),
            target_version: 0,
        }))
        .await
        .unwrap()
        .into_inner();

    assert!(response.success, "{}", response.message);
    assert_eq!(response.config_id, "svcA-v3");
    assert_eq!(response.message, "Rolled back to v1 as new v3");
}

#[tokio::test]
async fn test_rollback_unknown_target_version() {
    let mut store = MockConfigStore::new();
    store
        .expect_get_by_version()
        .withf(|_, version| *version == 9)
        .return_once(|service, _| Ok(ConfigDocument::empty(service)));

    let api = service(store, MockEventSink::new(), MockConfigValidator::new());
    let response = api
        .rollback(Request::new(RollbackRequest {
            service_name: "svcA".into(),
            target_version: 9,
        }))
        .await
        .unwrap()
        .into_inner();

    assert!(!response.success);
    assert_eq!(response.message, "Target version not found");
}

#[tokio::test]
async fn test_delete_unknown_config() {
    let mut store = MockConfigStore::new();
    store.expect_delete_by_id().return_once(|_| Ok(false));

    let api = service(store, MockEventSink::new(), MockConfigValidator::new());
    let response = api
        .delete_config(Request::new(DeleteConfigRequest {
            config_id: "svcA-v9".into(),
        }))
        .await
        .unwrap()
        .into_inner();

    assert!(!response.success);
    assert!(response.message.contains("not found"));
}

#[tokio::test]
async fn test_start_rollout_defaults_target_to_full() {
    let mut store = MockConfigStore::new();
    store
        .expect_get_by_id()
        .return_once(|_| Ok(stored_doc(1, b"{}")));
    store
        .expect_upsert_rollout()
        .withf(|config_id, _, target| config_id == "svcA-v1" && *target == 100)
        .return_once(|config_id, _, _| Ok(format!("rollout-{config_id}")));
    store
        .expect_append_audit()
        .returning(|_, _, _, _, _| Ok(()));

    let mut events = MockEventSink::new();
    events
        .expect_publish()
        .withf(|event| event.event_type == "config.rollout_started")
        .times(1)
        .returning(|_| Ok(()));

    let api = service(store, events, MockConfigValidator::new());
    let response = api
        .start_rollout(Request::new(StartRolloutRequest {
            config_id: "svcA-v1".into(),
            strategy: 0,
            target_percentage: 0,
        }))
        .await
        .unwrap()
        .into_inner();

    assert!(response.success, "{}", response.message);
    assert_eq!(response.rollout_id, "rollout-svcA-v1");
}
