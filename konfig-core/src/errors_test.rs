use super::*;

#[test]
fn test_conflict_display_names_service_and_version() {
    let err = Error::from(StoreError::Conflict {
        service_name: "payments".into(),
        version: 3,
    });
    let msg = err.to_string();
    assert!(msg.contains("payments"));
    assert!(msg.contains("v3"));
}

#[test]
fn test_rejected_carries_issue_list() {
    let err = Error::rejected("content", "size", "Content exceeds 1MB limit");
    match err {
        Error::ValidationRejected(issues) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].field, "content");
            assert_eq!(issues[0].error_type, "size");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_collaborator_errors_wrap_transparently() {
    let err = Error::from(CacheError::Unavailable("redis down".into()));
    assert_eq!(err.to_string(), "Cache unavailable: redis down");

    let err = Error::from(NetworkError::ConnectError("refused".into()));
    assert_eq!(err.to_string(), "Socket connect failed: refused");
}
