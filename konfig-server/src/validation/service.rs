use std::sync::Arc;

use prost::Message;
use tonic::Request;
use tonic::Response;
use tonic::Status;
use tracing::info;
use tracing::warn;

use super::rules::apply_rules;
use super::rules::parse_document;
use konfig_core::cache::ConfigCache;
use konfig_core::hash::content_hash;
use konfig_core::metrics::StatsdSink;
use konfig_core::store::ConfigStore;
use konfig_core::syntax::check_syntax;
use konfig_core::ValidationConfig;
use konfig_proto::validation::validation_service_server::ValidationService;
use konfig_proto::validation::GetSchemaRequest;
use konfig_proto::validation::GetSchemaResponse;
use konfig_proto::validation::ListSchemasRequest;
use konfig_proto::validation::ListSchemasResponse;
use konfig_proto::validation::RegisterSchemaRequest;
use konfig_proto::validation::RegisterSchemaResponse;
use konfig_proto::validation::ValidateConfigRequest;
use konfig_proto::validation::ValidateConfigResponse;
use konfig_proto::validation::ValidationIssue;

fn verdict_key(
    service_name: &str,
    hash: &str,
) -> String {
    format!("validation:{service_name}:{hash}")
}

/// The validation collaborator.
///
/// Verdicts are computed from the size bound, the syntactic check, and the
/// per-service rule rows, optionally cached in redis keyed by content
/// hash. Every verdict is appended to the validation history.
pub struct ValidationEngine {
    store: Arc<dyn ConfigStore>,
    cache: Arc<dyn ConfigCache>,
    metrics: StatsdSink,
    config: ValidationConfig,
    verdict_ttl: u64,
}

impl ValidationEngine {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        cache: Arc<dyn ConfigCache>,
        metrics: StatsdSink,
        config: ValidationConfig,
        verdict_ttl: u64,
    ) -> Self {
        Self {
            store,
            cache,
            metrics,
            config,
            verdict_ttl,
        }
    }

    async fn cached_verdict(
        &self,
        key: &str,
    ) -> Option<ValidateConfigResponse> {
        if !self.config.enable_caching {
            return None;
        }
        match self.cache.get(key).await {
            Ok(Some(bytes)) => ValidateConfigResponse::decode(bytes.as_slice()).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "verdict cache lookup failed");
                None
            }
        }
    }

    async fn cache_verdict(
        &self,
        key: &str,
        verdict: &ValidateConfigResponse,
    ) {
        if !self.config.enable_caching {
            return;
        }
        if let Err(e) = self
            .cache
            .set(key, &verdict.encode_to_vec(), self.verdict_ttl)
            .await
        {
            warn!(error = %e, "verdict cache write failed");
        }
    }
}

#[tonic::async_trait]
impl ValidationService for ValidationEngine {
    async fn validate_config(
        &self,
        request: Request<ValidateConfigRequest>,
    ) -> Result<Response<ValidateConfigResponse>, Status> {
        let req = request.into_inner();
        self.metrics.incr("validate.request");

        let hash = content_hash(&req.content);
        let key = verdict_key(&req.service_name, &hash);

        if let Some(cached) = self.cached_verdict(&key).await {
            self.metrics.incr("validate.cache_hit");
            return Ok(Response::new(cached));
        }

        let _timer = self.metrics.timer("validate.duration");

        let mut errors: Vec<ValidationIssue> = Vec::new();
        let mut warnings: Vec<ValidationIssue> = Vec::new();

        if req.content.len() > self.config.max_config_size {
            errors.push(ValidationIssue {
                field: "content".into(),
                error_type: "size".into(),
                message: format!(
                    "Content exceeds {} byte limit",
                    self.config.max_config_size
                ),
            });
        }

        errors.extend(check_syntax(&req.format, &req.content));

        // Rules run over a real parse tree. A document that survives the
        // shallow syntax scan but does not parse only matters when rules
        // exist for the service.
        if errors.is_empty() {
            match self.store.list_rules(&req.service_name).await {
                Ok(rules) if rules.is_empty() => {}
                Ok(rules) => match parse_document(&req.format, &req.content) {
                    Some(document) => errors.extend(apply_rules(&rules, &document)),
                    None => warnings.push(ValidationIssue {
                        field: String::new(),
                        error_type: "parse".into(),
                        message: "Document could not be parsed for rule checks".into(),
                    }),
                },
                Err(e) => {
                    warn!(error = %e, "rule lookup failed, skipping rule checks");
                }
            }
        }

        if req.strict || self.config.strict_mode {
            errors.append(&mut warnings);
        }

        let valid = errors.is_empty();
        let verdict = ValidateConfigResponse {
            valid,
            message: if valid {
                "Valid".to_string()
            } else {
                "Validation failed".to_string()
            },
            errors,
            warnings,
        };

        if let Err(e) = self
            .store
            .record_validation(&req.service_name, &hash, valid)
            .await
        {
            warn!(error = %e, "validation history append failed");
        }

        if valid {
            self.metrics.incr("validate.success");
        } else {
            self.metrics.incr("validate.failed");
        }

        self.cache_verdict(&key, &verdict).await;
        Ok(Response::new(verdict))
    }

    async fn register_schema(
        &self,
        request: Request<RegisterSchemaRequest>,
    ) -> Result<Response<RegisterSchemaResponse>, Status> {
        let req = request.into_inner();
        self.metrics.incr("schema.register");

        if req.service_name.is_empty() {
            return Ok(Response::new(RegisterSchemaResponse {
                success: false,
                schema_id: String::new(),
                message: "service_name is required".to_string(),
            }));
        }
        if serde_json::from_slice::<serde_json::Value>(&req.schema).is_err() {
            return Ok(Response::new(RegisterSchemaResponse {
                success: false,
                schema_id: String::new(),
                message: "Schema must be valid JSON".to_string(),
            }));
        }

        match self
            .store
            .upsert_schema(&req.service_name, &req.schema, &req.description)
            .await
        {
            Ok(schema_id) => {
                info!(service = %req.service_name, schema_id = %schema_id, "schema registered");
                Ok(Response::new(RegisterSchemaResponse {
                    success: true,
                    schema_id,
                    message: "Schema registered".to_string(),
                }))
            }
            Err(e) => Ok(Response::new(RegisterSchemaResponse {
                success: false,
                schema_id: String::new(),
                message: format!("Failed to register schema: {e}"),
            })),
        }
    }

    async fn get_schema(
        &self,
        request: Request<GetSchemaRequest>,
    ) -> Result<Response<GetSchemaResponse>, Status> {
        let req = request.into_inner();

        match self.store.get_schema(&req.service_name).await {
            Ok(Some(schema)) => Ok(Response::new(GetSchemaResponse {
                success: true,
                schema: Some(schema),
                message: "Success".to_string(),
            })),
            Ok(None) => Ok(Response::new(GetSchemaResponse {
                success: false,
                schema: None,
                message: format!("No schema for service: {}", req.service_name),
            })),
            Err(e) => Ok(Response::new(GetSchemaResponse {
                success: false,
                schema: None,
                message: format!("Internal error: {e}"),
            })),
        }
    }

    async fn list_schemas(
        &self,
        _request: Request<ListSchemasRequest>,
    ) -> Result<Response<ListSchemasResponse>, Status> {
        match self.store.list_schemas().await {
            Ok(schemas) => Ok(Response::new(ListSchemasResponse {
                success: true,
                schemas,
            })),
            Err(e) => {
                warn!(error = %e, "schema listing failed");
                Ok(Response::new(ListSchemasResponse {
                    success: false,
                    schemas: Vec::new(),
                }))
            }
        }
    }
}
