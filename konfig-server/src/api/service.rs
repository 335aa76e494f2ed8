use std::sync::Arc;

use tonic::Request;
use tonic::Response;
use tonic::Status;
use tracing::info;
use tracing::warn;

use konfig_core::constants::event_types;
use konfig_core::constants::DEFAULT_LIST_LIMIT;
use konfig_core::events::emit;
use konfig_core::events::Event;
use konfig_core::events::EventSink;
use konfig_core::hash::content_hash;
use konfig_core::metrics::StatsdSink;
use konfig_core::store::ConfigStore;
use konfig_core::syntax::check_syntax;
use konfig_core::time::unix_timestamp;
use konfig_core::validator::ConfigValidator;
use konfig_core::StoreError;
use konfig_core::ValidationConfig;
use konfig_proto::api::config_api_service_server::ConfigApiService;
use konfig_proto::api::DeleteConfigRequest;
use konfig_proto::api::DeleteConfigResponse;
use konfig_proto::api::GetConfigRequest;
use konfig_proto::api::GetConfigResponse;
use konfig_proto::api::GetRolloutStatusRequest;
use konfig_proto::api::GetRolloutStatusResponse;
use konfig_proto::api::ListConfigsRequest;
use konfig_proto::api::ListConfigsResponse;
use konfig_proto::api::RollbackRequest;
use konfig_proto::api::RollbackResponse;
use konfig_proto::api::StartRolloutRequest;
use konfig_proto::api::StartRolloutResponse;
use konfig_proto::api::UploadConfigRequest;
use konfig_proto::api::UploadConfigResponse;
use konfig_proto::common::ConfigDocument;
use konfig_proto::exts::document_id;
use konfig_proto::validation::ValidateConfigRequest;

/// The control-plane service.
///
/// Domain failures always come back as `success = false` with a message;
/// gRPC status codes are reserved for transport-level breakage.
pub struct ApiService {
    store: Arc<dyn ConfigStore>,
    events: Arc<dyn EventSink>,
    validator: Arc<dyn ConfigValidator>,
    metrics: StatsdSink,
    validation: ValidationConfig,
}

impl ApiService {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        events: Arc<dyn EventSink>,
        validator: Arc<dyn ConfigValidator>,
        metrics: StatsdSink,
        validation: ValidationConfig,
    ) -> Self {
        Self {
            store,
            events,
            validator,
            metrics,
            validation,
        }
    }

    /// Audit failures never fail the operation that produced them.
    async fn audit(
        &self,
        service_name: &str,
        config_id: &str,
        action: &str,
        performed_by: &str,
        details: &str,
    ) {
        if let Err(e) = self
            .store
            .append_audit(service_name, config_id, action, performed_by, details)
            .await
        {
            warn!(config_id, action, error = %e, "audit append failed");
        }
    }
}

fn upload_failure(
    message: &str,
    validation_errors: Vec<String>,
) -> UploadConfigResponse {
    UploadConfigResponse {
        success: false,
        config_id: String::new(),
        version: 0,
        message: message.to_string(),
        validation_errors,
    }
}

#[tonic::async_trait]
impl ConfigApiService for ApiService {
    async fn upload_config(
        &self,
        request: Request<UploadConfigRequest>,
    ) -> Result<Response<UploadConfigResponse>, Status> {
        let req = request.into_inner();
        self.metrics.incr("upload.request");
        info!(service = %req.service_name, bytes = req.content.len(), "upload requested");

        if req.service_name.is_empty() {
            return Ok(Response::new(upload_failure(
                "service_name is required",
                Vec::new(),
            )));
        }
        if req.content.is_empty() {
            return Ok(Response::new(upload_failure(
                "content is required",
                Vec::new(),
            )));
        }
        if req.content.len() > self.validation.max_config_size {
            self.metrics.incr("upload.validation_failed");
            return Ok(Response::new(upload_failure(
                "Validation failed",
                vec![format!(
                    "Content exceeds {} byte limit",
                    self.validation.max_config_size
                )],
            )));
        }

        // The request's `validate` flag is deprecated: the local syntactic
        // check always runs.
        let format = if req.format.is_empty() {
            "json"
        } else {
            req.format.as_str()
        };
        let issues = check_syntax(format, &req.content);
        if !issues.is_empty() {
            self.metrics.incr("upload.validation_failed");
            return Ok(Response::new(upload_failure(
                "Validation failed",
                issues.into_iter().map(|i| i.message).collect(),
            )));
        }

        // The validation collaborator gets the final say. An unreachable
        // validator rejects the upload rather than letting unchecked
        // content through.
        match self
            .validator
            .validate(ValidateConfigRequest {
                service_name: req.service_name.clone(),
                content: req.content.clone(),
                format: format.to_string(),
                strict: false,
            })
            .await
        {
            Ok(verdict) if !verdict.valid => {
                self.metrics.incr("upload.validation_service_failed");
                return Ok(Response::new(upload_failure(
                    "Validation service rejected config",
                    verdict
                        .errors
                        .into_iter()
                        .map(|e| format!("{}: {}", e.field, e.message))
                        .collect(),
                )));
            }
            Ok(verdict) => {
                for warning in &verdict.warnings {
                    warn!(service = %req.service_name, field = %warning.field, message = %warning.message, "validation warning");
                }
            }
            Err(e) => {
                warn!(error = %e, "validation service unreachable, rejecting upload");
                self.metrics.incr("upload.validation_service_failed");
                return Ok(Response::new(upload_failure(
                    "Validation service unavailable",
                    vec![e.to_string()],
                )));
            }
        }

        let version = match self.store.next_version(&req.service_name).await {
            Ok(version) => version,
            Err(e) => {
                self.metrics.incr("upload.db_failed");
                return Ok(Response::new(upload_failure(
                    &format!("Failed to allocate version: {e}"),
                    Vec::new(),
                )));
            }
        };

        let created_by = if req.created_by.is_empty() {
            "api"
        } else {
            req.created_by.as_str()
        };
        let doc = ConfigDocument {
            config_id: document_id(&req.service_name, version),
            service_name: req.service_name.clone(),
            version,
            content_hash: content_hash(&req.content),
            content: req.content,
            format: format.to_string(),
            created_at: unix_timestamp(),
            created_by: created_by.to_string(),
        };

        if let Err(e) = self.store.insert_config(&doc, &req.description).await {
            self.metrics.incr("upload.db_failed");
            return Ok(Response::new(upload_failure(
                &format!("Failed to store: {e}"),
                Vec::new(),
            )));
        }

        self.audit(
            &req.service_name,
            &doc.config_id,
            "uploaded",
            created_by,
            &format!("Version {version}"),
        )
        .await;
        emit(
            self.events.as_ref(),
            Event::new(event_types::CONFIG_UPLOADED, &req.service_name)
                .version(version)
                .performed_by(created_by),
        )
        .await;

        self.metrics.incr("upload.success");
        info!(config_id = %doc.config_id, version, "uploaded");

        Ok(Response::new(UploadConfigResponse {
            success: true,
            config_id: doc.config_id,
            version,
            message: "Uploaded successfully".to_string(),
            validation_errors: Vec::new(),
        }))
    }

    async fn get_config(
        &self,
        request: Request<GetConfigRequest>,
    ) -> Result<Response<GetConfigResponse>, Status> {
        let req = request.into_inner();
        self.metrics.incr("get.request");

        if req.config_id.is_empty() {
            return Ok(Response::new(GetConfigResponse {
                success: false,
                config: None,
                message: "config_id is required".to_string(),
            }));
        }

        match self.store.get_by_id(&req.config_id).await {
            Ok(doc) if doc.is_empty() => {
                self.metrics.incr("get.not_found");
                Ok(Response::new(GetConfigResponse {
                    success: false,
                    config: None,
                    message: format!("Config not found: {}", req.config_id),
                }))
            }
            Ok(doc) => {
                self.metrics.incr("get.success");
                Ok(Response::new(GetConfigResponse {
                    success: true,
                    config: Some(doc),
                    message: "Success".to_string(),
                }))
            }
            Err(e) => {
                self.metrics.incr("get.error");
                Ok(Response::new(GetConfigResponse {
                    success: false,
                    config: None,
                    message: format!("Internal error: {e}"),
                }))
            }
        }
    }

    async fn list_configs(
        &self,
        request: Request<ListConfigsRequest>,
    ) -> Result<Response<ListConfigsResponse>, Status> {
        let req = request.into_inner();
        self.metrics.incr("list.request");

        let limit = if req.limit == 0 {
            DEFAULT_LIST_LIMIT
        } else {
            req.limit as i64
        };

        match self
            .store
            .list_metadata(&req.service_name, limit, req.offset as i64)
            .await
        {
            Ok((configs, total_count)) => {
                self.metrics.incr("list.success");
                Ok(Response::new(ListConfigsResponse {
                    success: true,
                    configs,
                    total_count,
                    message: String::new(),
                }))
            }
            Err(e) => {
                self.metrics.incr("list.error");
                Ok(Response::new(ListConfigsResponse {
                    success: false,
                    configs: Vec::new(),
                    total_count: 0,
                    message: format!("Internal error: {e}"),
                }))
            }
        }
    }

    async fn delete_config(
        &self,
        request: Request<DeleteConfigRequest>,
    ) -> Result<Response<DeleteConfigResponse>, Status> {
        let req = request.into_inner();
        self.metrics.incr("delete.request");

        if req.config_id.is_empty() {
            return Ok(Response::new(DeleteConfigResponse {
                success: false,
                message: "config_id is required".to_string(),
            }));
        }

        match self.store.delete_by_id(&req.config_id).await {
            Ok(true) => {
                self.audit("", &req.config_id, "deleted", "api", "").await;
                emit(
                    self.events.as_ref(),
                    Event::new(event_types::CONFIG_DELETED, "").performed_by("api"),
                )
                .await;
                self.metrics.incr("delete.success");
                Ok(Response::new(DeleteConfigResponse {
                    success: true,
                    message: "Deleted successfully".to_string(),
                }))
            }
            Ok(false) => {
                self.metrics.incr("delete.failed");
                Ok(Response::new(DeleteConfigResponse {
                    success: false,
                    message: format!("Config not found: {}", req.config_id),
                }))
            }
            Err(e) => {
                self.metrics.incr("delete.failed");
                Ok(Response::new(DeleteConfigResponse {
                    success: false,
                    message: format!("Failed to delete: {e}"),
                }))
            }
        }
    }

    async fn start_rollout(
        &self,
        request: Request<StartRolloutRequest>,
    ) -> Result<Response<StartRolloutResponse>, Status> {
        let req = request.into_inner();
        self.metrics.incr("rollout.request");

        if req.config_id.is_empty() {
            return Ok(Response::new(StartRolloutResponse {
                success: false,
                rollout_id: String::new(),
                message: "config_id is required".to_string(),
            }));
        }

        let config = match self.store.get_by_id(&req.config_id).await {
            Ok(config) if config.is_empty() => {
                return Ok(Response::new(StartRolloutResponse {
                    success: false,
                    rollout_id: String::new(),
                    message: format!("Config not found: {}", req.config_id),
                }));
            }
            Ok(config) => config,
            Err(e) => {
                self.metrics.incr("rollout.failed");
                return Ok(Response::new(StartRolloutResponse {
                    success: false,
                    rollout_id: String::new(),
                    message: format!("Internal error: {e}"),
                }));
            }
        };

        let target = if req.target_percentage == 0 {
            100
        } else {
            req.target_percentage
        };

        match self
            .store
            .upsert_rollout(&req.config_id, req.strategy(), target)
            .await
        {
            Ok(rollout_id) => {
                self.audit(
                    &config.service_name,
                    &req.config_id,
                    "rollout_started",
                    "api",
                    &format!("Target {target}%"),
                )
                .await;
                emit(
                    self.events.as_ref(),
                    Event::new(event_types::CONFIG_ROLLOUT_STARTED, &config.service_name)
                        .version(config.version)
                        .performed_by("api"),
                )
                .await;
                self.metrics.incr("rollout.success");
                info!(rollout_id = %rollout_id, "rollout started");
                Ok(Response::new(StartRolloutResponse {
                    success: true,
                    rollout_id,
                    message: "Rollout started successfully".to_string(),
                }))
            }
            Err(e) => {
                self.metrics.incr("rollout.failed");
                Ok(Response::new(StartRolloutResponse {
                    success: false,
                    rollout_id: String::new(),
                    message: format!("Failed to create rollout: {e}"),
                }))
            }
        }
    }

    async fn get_rollout_status(
        &self,
        request: Request<GetRolloutStatusRequest>,
    ) -> Result<Response<GetRolloutStatusResponse>, Status> {
        let req = request.into_inner();
        self.metrics.incr("rollout_status.request");

        let state = match self.store.get_rollout_state(&req.config_id).await {
            Ok(state) => state,
            Err(e) => {
                self.metrics.incr("rollout_status.error");
                return Ok(Response::new(GetRolloutStatusResponse {
                    success: false,
                    rollout_state: None,
                    instances: Vec::new(),
                    message: format!("Internal error: {e}"),
                }));
            }
        };

        // Rollout state is surfaced exactly as stored; nothing in the core
        // advances it. Instances are informational.
        let mut instances = Vec::new();
        if let Ok(config) = self.store.get_by_id(&req.config_id).await {
            if !config.service_name.is_empty() {
                match self.store.list_instances(&config.service_name).await {
                    Ok(rows) => instances = rows,
                    Err(e) => warn!(error = %e, "instance listing failed"),
                }
            }
        }

        self.metrics.incr("rollout_status.success");
        Ok(Response::new(GetRolloutStatusResponse {
            success: true,
            rollout_state: Some(state),
            instances,
            message: String::new(),
        }))
    }

    async fn rollback(
        &self,
        request: Request<RollbackRequest>,
    ) -> Result<Response<RollbackResponse>, Status> {
        let req = request.into_inner();
        self.metrics.incr("rollback.request");
        info!(service = %req.service_name, target = req.target_version, "rollback requested");

        if req.service_name.is_empty() {
            return Ok(Response::new(RollbackResponse {
                success: false,
                config_id: String::new(),
                message: "service_name is required".to_string(),
            }));
        }

        let target = if req.target_version == 0 {
            let current = match self.store.get_latest(&req.service_name).await {
                Ok(current) => current,
                Err(e) => return Ok(Response::new(rollback_error(e))),
            };
            if current.version <= 1 {
                return Ok(Response::new(RollbackResponse {
                    success: false,
                    config_id: String::new(),
                    message: "No previous version to rollback to".to_string(),
                }));
            }
            match self
                .store
                .get_by_version(&req.service_name, current.version - 1)
                .await
            {
                Ok(target) => target,
                Err(e) => return Ok(Response::new(rollback_error(e))),
            }
        } else {
            match self
                .store
                .get_by_version(&req.service_name, req.target_version)
                .await
            {
                Ok(target) => target,
                Err(e) => return Ok(Response::new(rollback_error(e))),
            }
        };

        if target.is_empty() {
            self.metrics.incr("rollback.not_found");
            return Ok(Response::new(RollbackResponse {
                success: false,
                config_id: String::new(),
                message: "Target version not found".to_string(),
            }));
        }

        let version = match self.store.next_version(&req.service_name).await {
            Ok(version) => version,
            Err(e) => return Ok(Response::new(rollback_error(e))),
        };

        // Rollback is a re-upload of prior content as a brand new version,
        // hash recomputed from the content it carries.
        let doc = ConfigDocument {
            config_id: document_id(&req.service_name, version),
            service_name: target.service_name.clone(),
            version,
            content_hash: content_hash(&target.content),
            content: target.content.clone(),
            format: target.format.clone(),
            created_at: unix_timestamp(),
            created_by: "rollback".to_string(),
        };

        if let Err(e) = self
            .store
            .insert_config(&doc, &format!("Rollback to v{}", target.version))
            .await
        {
            self.metrics.incr("rollback.db_failed");
            return Ok(Response::new(RollbackResponse {
                success: false,
                config_id: String::new(),
                message: format!("Failed to create rollback config: {e}"),
            }));
        }

        self.audit(
            &req.service_name,
            &doc.config_id,
            "rollback",
            "api",
            &format!("Rolled back to v{}", target.version),
        )
        .await;
        emit(
            self.events.as_ref(),
            Event::new(event_types::CONFIG_ROLLED_BACK, &req.service_name)
                .version(version)
                .performed_by("api"),
        )
        .await;

        self.metrics.incr("rollback.success");
        info!(config_id = %doc.config_id, "rollback complete");

        Ok(Response::new(RollbackResponse {
            success: true,
            config_id: doc.config_id,
            message: format!(
                "Rolled back to v{} as new v{version}",
                target.version
            ),
        }))
    }
}

fn rollback_error(e: StoreError) -> RollbackResponse {
    RollbackResponse {
        success: false,
        config_id: String::new(),
        message: format!("Internal error: {e}"),
    }
}
