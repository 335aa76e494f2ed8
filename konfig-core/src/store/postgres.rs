use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio_postgres::error::SqlState;
use tokio_postgres::Client;
use tokio_postgres::NoTls;
use tokio_postgres::Row;
use tracing::error;
use tracing::info;

use super::ConfigStore;
use super::InstanceStatus;
use super::RuleType;
use super::ValidationRule;
use crate::config::PostgresConfig;
use crate::time::unix_timestamp;
use crate::StoreError;
use konfig_proto::common::ConfigDocument;
use konfig_proto::common::ConfigMetadata;
use konfig_proto::common::RolloutState;
use konfig_proto::common::RolloutStatus;
use konfig_proto::common::RolloutStrategy;
use konfig_proto::common::ServiceInstance;
use konfig_proto::exts::document_id;
use konfig_proto::validation::SchemaInfo;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS config_metadata (
    config_id    TEXT PRIMARY KEY,
    service_name TEXT NOT NULL,
    version      BIGINT NOT NULL,
    format       TEXT NOT NULL DEFAULT 'json',
    created_at   BIGINT NOT NULL,
    created_by   TEXT NOT NULL DEFAULT '',
    description  TEXT NOT NULL DEFAULT '',
    is_active    BOOLEAN NOT NULL DEFAULT TRUE,
    UNIQUE (service_name, version)
);
CREATE TABLE IF NOT EXISTS config_data (
    config_id    TEXT PRIMARY KEY REFERENCES config_metadata(config_id) ON DELETE CASCADE,
    content      BYTEA NOT NULL,
    content_hash TEXT NOT NULL DEFAULT '',
    size_bytes   BIGINT NOT NULL
);
CREATE TABLE IF NOT EXISTS rollouts (
    rollout_id         TEXT NOT NULL,
    config_id          TEXT PRIMARY KEY,
    strategy           INT NOT NULL DEFAULT 0,
    target_percentage  INT NOT NULL DEFAULT 100,
    current_percentage INT NOT NULL DEFAULT 0,
    status             TEXT NOT NULL DEFAULT 'PENDING',
    started_at         BIGINT NOT NULL DEFAULT 0,
    completed_at       BIGINT
);
CREATE TABLE IF NOT EXISTS service_instances (
    service_name           TEXT NOT NULL,
    instance_id            TEXT NOT NULL,
    current_config_version BIGINT NOT NULL DEFAULT 0,
    last_heartbeat         BIGINT NOT NULL DEFAULT 0,
    status                 TEXT NOT NULL DEFAULT 'disconnected',
    PRIMARY KEY (service_name, instance_id)
);
CREATE TABLE IF NOT EXISTS audit_log (
    id           BIGSERIAL PRIMARY KEY,
    config_id    TEXT NOT NULL,
    action       TEXT NOT NULL,
    performed_by TEXT NOT NULL DEFAULT '',
    details      JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at   BIGINT NOT NULL
);
CREATE TABLE IF NOT EXISTS validation_schemas (
    schema_id    TEXT PRIMARY KEY,
    service_name TEXT UNIQUE NOT NULL,
    schema       BYTEA NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    created_at   BIGINT NOT NULL
);
CREATE TABLE IF NOT EXISTS validation_rules (
    id           BIGSERIAL PRIMARY KEY,
    service_name TEXT NOT NULL,
    rule_type    TEXT NOT NULL,
    field        TEXT NOT NULL,
    min_value    DOUBLE PRECISION,
    max_value    DOUBLE PRECISION
);
CREATE TABLE IF NOT EXISTS validation_history (
    id           BIGSERIAL PRIMARY KEY,
    service_name TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    valid        BOOLEAN NOT NULL,
    checked_at   BIGINT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_config_metadata_service
    ON config_metadata (service_name, version DESC);
CREATE INDEX IF NOT EXISTS idx_audit_log_config
    ON audit_log (config_id);
"#;

const DOCUMENT_COLUMNS: &str = "m.config_id, m.service_name, m.version, m.format, \
     d.content, COALESCE(d.content_hash, '') AS content_hash, \
     m.created_at, m.created_by";

/// Store adapter over a single postgres connection.
///
/// The connection driver runs on its own task; statement execution is
/// serialized through a mutex, which also covers the multi-statement
/// transactions.
pub struct PostgresStore {
    client: Mutex<Client>,
}

impl PostgresStore {
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.database)
            .user(&config.user)
            .password(&config.password)
            .connect_timeout(Duration::from_secs(config.connect_timeout));

        let (client, connection) = pg
            .connect(NoTls)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "postgres connection terminated");
            }
        });

        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!(host = %config.host, database = %config.database, "connected to postgres");

        Ok(Self {
            client: Mutex::new(client),
        })
    }

    /// Idempotent table creation for fresh databases.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let client = self.client.lock().await;
        client
            .batch_execute(SCHEMA_SQL)
            .await
            .map_err(map_pg_err)?;
        Ok(())
    }
}

fn map_pg_err(e: tokio_postgres::Error) -> StoreError {
    if e.is_closed() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Postgres(e)
    }
}

fn document_from_row(row: &Row) -> ConfigDocument {
    ConfigDocument {
        config_id: row.get("config_id"),
        service_name: row.get("service_name"),
        version: row.get("version"),
        format: row.get("format"),
        content: Bytes::from(row.get::<_, Vec<u8>>("content")),
        content_hash: row.get("content_hash"),
        created_at: row.get("created_at"),
        created_by: row.get("created_by"),
    }
}

fn metadata_from_row(row: &Row) -> ConfigMetadata {
    ConfigMetadata {
        config_id: row.get("config_id"),
        service_name: row.get("service_name"),
        version: row.get("version"),
        format: row.get("format"),
        created_at: row.get("created_at"),
        created_by: row.get("created_by"),
        description: row.get("description"),
        is_active: row.get("is_active"),
    }
}

fn instance_from_row(row: &Row) -> ServiceInstance {
    ServiceInstance {
        service_name: row.get("service_name"),
        instance_id: row.get("instance_id"),
        current_config_version: row.get("current_config_version"),
        last_heartbeat: row.get("last_heartbeat"),
        status: row.get("status"),
    }
}

fn schema_from_row(row: &Row) -> SchemaInfo {
    SchemaInfo {
        schema_id: row.get("schema_id"),
        service_name: row.get("service_name"),
        schema: Bytes::from(row.get::<_, Vec<u8>>("schema")),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ConfigStore for PostgresStore {
    async fn insert_config(
        &self,
        doc: &ConfigDocument,
        description: &str,
    ) -> Result<String, StoreError> {
        let mut client = self.client.lock().await;
        let txn = client.transaction().await.map_err(map_pg_err)?;

        let inserted = txn
            .execute(
                "INSERT INTO config_metadata \
                   (config_id, service_name, version, format, created_at, created_by, \
                    description, is_active) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE) \
                 ON CONFLICT DO NOTHING",
                &[
                    &doc.config_id,
                    &doc.service_name,
                    &doc.version,
                    &doc.format,
                    &doc.created_at,
                    &doc.created_by,
                    &description,
                ],
            )
            .await
            .map_err(map_pg_err)?;

        if inserted == 0 {
            return Err(StoreError::Conflict {
                service_name: doc.service_name.clone(),
                version: doc.version,
            });
        }

        txn.execute(
            "INSERT INTO config_data (config_id, content, content_hash, size_bytes) \
             VALUES ($1, $2, $3, $4)",
            &[
                &doc.config_id,
                &doc.content.as_ref(),
                &doc.content_hash,
                &(doc.content.len() as i64),
            ],
        )
        .await
        .map_err(|e| {
            if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                StoreError::Conflict {
                    service_name: doc.service_name.clone(),
                    version: doc.version,
                }
            } else {
                map_pg_err(e)
            }
        })?;

        txn.commit().await.map_err(map_pg_err)?;
        Ok(doc.config_id.clone())
    }

    async fn next_version(
        &self,
        service_name: &str,
    ) -> Result<i64, StoreError> {
        let client = self.client.lock().await;
        let row = client
            .query_one(
                "SELECT COALESCE(MAX(version), 0) + 1 AS next \
                 FROM config_metadata WHERE service_name = $1",
                &[&service_name],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(row.get("next"))
    }

    async fn get_by_id(
        &self,
        config_id: &str,
    ) -> Result<ConfigDocument, StoreError> {
        let client = self.client.lock().await;
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} \
             FROM config_metadata m \
             JOIN config_data d ON m.config_id = d.config_id \
             WHERE m.config_id = $1"
        );
        let row = client
            .query_opt(query.as_str(), &[&config_id])
            .await
            .map_err(map_pg_err)?;

        Ok(row
            .as_ref()
            .map(document_from_row)
            .unwrap_or_default())
    }

    async fn get_latest(
        &self,
        service_name: &str,
    ) -> Result<ConfigDocument, StoreError> {
        let client = self.client.lock().await;
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} \
             FROM config_metadata m \
             JOIN config_data d ON m.config_id = d.config_id \
             WHERE m.service_name = $1 \
             ORDER BY m.version DESC LIMIT 1"
        );
        let row = client
            .query_opt(query.as_str(), &[&service_name])
            .await
            .map_err(map_pg_err)?;

        Ok(row
            .as_ref()
            .map(document_from_row)
            .unwrap_or_else(|| ConfigDocument::empty(service_name)))
    }

    async fn get_by_version(
        &self,
        service_name: &str,
        version: i64,
    ) -> Result<ConfigDocument, StoreError> {
        let client = self.client.lock().await;
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} \
             FROM config_metadata m \
             JOIN config_data d ON m.config_id = d.config_id \
             WHERE m.service_name = $1 AND m.version = $2"
        );
        let row = client
            .query_opt(query.as_str(), &[&service_name, &version])
            .await
            .map_err(map_pg_err)?;

        Ok(row
            .as_ref()
            .map(document_from_row)
            .unwrap_or_else(|| ConfigDocument::empty(service_name)))
    }

    async fn list_metadata(
        &self,
        service_name: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ConfigMetadata>, i64), StoreError> {
        let client = self.client.lock().await;

        let (rows, count_row) = if service_name.is_empty() {
            let rows = client
                .query(
                    "SELECT config_id, service_name, version, format, created_at, \
                            created_by, description, is_active \
                     FROM config_metadata \
                     ORDER BY service_name, version DESC \
                     LIMIT $1 OFFSET $2",
                    &[&limit, &offset],
                )
                .await
                .map_err(map_pg_err)?;
            let count = client
                .query_one("SELECT COUNT(*) AS total FROM config_metadata", &[])
                .await
                .map_err(map_pg_err)?;
            (rows, count)
        } else {
            let rows = client
                .query(
                    "SELECT config_id, service_name, version, format, created_at, \
                            created_by, description, is_active \
                     FROM config_metadata \
                     WHERE service_name = $1 \
                     ORDER BY version DESC \
                     LIMIT $2 OFFSET $3",
                    &[&service_name, &limit, &offset],
                )
                .await
                .map_err(map_pg_err)?;
            let count = client
                .query_one(
                    "SELECT COUNT(*) AS total FROM config_metadata WHERE service_name = $1",
                    &[&service_name],
                )
                .await
                .map_err(map_pg_err)?;
            (rows, count)
        };

        let items = rows.iter().map(metadata_from_row).collect();
        Ok((items, count_row.get("total")))
    }

    async fn delete_by_id(
        &self,
        config_id: &str,
    ) -> Result<bool, StoreError> {
        let client = self.client.lock().await;
        let deleted = client
            .execute(
                "DELETE FROM config_metadata WHERE config_id = $1",
                &[&config_id],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(deleted > 0)
    }

    async fn upsert_rollout(
        &self,
        config_id: &str,
        strategy: RolloutStrategy,
        target_percentage: i32,
    ) -> Result<String, StoreError> {
        let rollout_id = format!("rollout-{config_id}");
        let client = self.client.lock().await;
        client
            .execute(
                "INSERT INTO rollouts \
                   (rollout_id, config_id, strategy, target_percentage, \
                    current_percentage, status, started_at) \
                 VALUES ($1, $2, $3, $4, 0, 'IN_PROGRESS', $5) \
                 ON CONFLICT (config_id) DO UPDATE \
                 SET strategy = $3, target_percentage = $4, \
                     status = 'IN_PROGRESS', started_at = $5",
                &[
                    &rollout_id,
                    &config_id,
                    &(strategy as i32),
                    &target_percentage,
                    &unix_timestamp(),
                ],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(rollout_id)
    }

    async fn get_rollout_state(
        &self,
        config_id: &str,
    ) -> Result<RolloutState, StoreError> {
        let client = self.client.lock().await;
        let row = client
            .query_opt(
                "SELECT config_id, strategy, target_percentage, current_percentage, \
                        status, started_at, COALESCE(completed_at, 0) AS completed_at \
                 FROM rollouts WHERE config_id = $1",
                &[&config_id],
            )
            .await
            .map_err(map_pg_err)?;

        let Some(row) = row else {
            return Ok(RolloutState::pending(config_id));
        };

        let status_str: String = row.get("status");
        let mut state = RolloutState {
            config_id: row.get("config_id"),
            strategy: row.get::<_, i32>("strategy"),
            target_percentage: row.get("target_percentage"),
            current_percentage: row.get("current_percentage"),
            status: 0,
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        };
        state.set_status(
            RolloutStatus::from_str_name(&status_str).unwrap_or(RolloutStatus::Pending),
        );
        Ok(state)
    }

    async fn list_instances(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceInstance>, StoreError> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT service_name, instance_id, current_config_version, \
                        last_heartbeat, status \
                 FROM service_instances \
                 WHERE service_name = $1 \
                 ORDER BY instance_id",
                &[&service_name],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(rows.iter().map(instance_from_row).collect())
    }

    async fn update_instance_status(
        &self,
        service_name: &str,
        instance_id: &str,
        version: i64,
        status: InstanceStatus,
    ) -> Result<(), StoreError> {
        let client = self.client.lock().await;
        client
            .execute(
                "INSERT INTO service_instances \
                   (service_name, instance_id, current_config_version, last_heartbeat, status) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (service_name, instance_id) DO UPDATE \
                 SET current_config_version = $3, last_heartbeat = $4, status = $5",
                &[
                    &service_name,
                    &instance_id,
                    &version,
                    &unix_timestamp(),
                    &status.as_str(),
                ],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(())
    }

    async fn record_delivery(
        &self,
        service_name: &str,
        instance_id: &str,
        version: i64,
    ) -> Result<(), StoreError> {
        let client = self.client.lock().await;
        client
            .execute(
                "INSERT INTO audit_log (config_id, action, performed_by, details, created_at) \
                 VALUES ($1, 'delivered', 'distribution-service', $2, $3)",
                &[
                    &document_id(service_name, version),
                    &serde_json::json!({
                        "service_name": service_name,
                        "instance_id": instance_id,
                    }),
                    &unix_timestamp(),
                ],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(())
    }

    async fn append_audit(
        &self,
        service_name: &str,
        config_id: &str,
        action: &str,
        performed_by: &str,
        details: &str,
    ) -> Result<(), StoreError> {
        let client = self.client.lock().await;
        client
            .execute(
                "INSERT INTO audit_log (config_id, action, performed_by, details, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &config_id,
                    &action,
                    &performed_by,
                    &serde_json::json!({
                        "service_name": service_name,
                        "details": details,
                    }),
                    &unix_timestamp(),
                ],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(())
    }

    async fn upsert_schema(
        &self,
        service_name: &str,
        schema: &[u8],
        description: &str,
    ) -> Result<String, StoreError> {
        let schema_id = format!("schema-{service_name}");
        let client = self.client.lock().await;
        client
            .execute(
                "INSERT INTO validation_schemas \
                   (schema_id, service_name, schema, description, created_at) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (service_name) DO UPDATE \
                 SET schema = $3, description = $4, created_at = $5",
                &[
                    &schema_id,
                    &service_name,
                    &schema,
                    &description,
                    &unix_timestamp(),
                ],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(schema_id)
    }

    async fn get_schema(
        &self,
        service_name: &str,
    ) -> Result<Option<SchemaInfo>, StoreError> {
        let client = self.client.lock().await;
        let row = client
            .query_opt(
                "SELECT schema_id, service_name, schema, description, created_at \
                 FROM validation_schemas WHERE service_name = $1",
                &[&service_name],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(row.as_ref().map(schema_from_row))
    }

    async fn list_schemas(&self) -> Result<Vec<SchemaInfo>, StoreError> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT schema_id, service_name, schema, description, created_at \
                 FROM validation_schemas ORDER BY service_name",
                &[],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(rows.iter().map(schema_from_row).collect())
    }

    async fn list_rules(
        &self,
        service_name: &str,
    ) -> Result<Vec<ValidationRule>, StoreError> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT rule_type, field, min_value, max_value \
                 FROM validation_rules WHERE service_name = $1 ORDER BY id",
                &[&service_name],
            )
            .await
            .map_err(map_pg_err)?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in &rows {
            let rule_type: String = row.get("rule_type");
            let Some(rule_type) = RuleType::parse(&rule_type) else {
                tracing::warn!(rule_type = %rule_type, "skipping unknown validation rule type");
                continue;
            };
            rules.push(ValidationRule {
                rule_type,
                field: row.get("field"),
                min_value: row.get("min_value"),
                max_value: row.get("max_value"),
            });
        }
        Ok(rules)
    }

    async fn record_validation(
        &self,
        service_name: &str,
        content_hash: &str,
        valid: bool,
    ) -> Result<(), StoreError> {
        let client = self.client.lock().await;
        client
            .execute(
                "INSERT INTO validation_history (service_name, content_hash, valid, checked_at) \
                 VALUES ($1, $2, $3, $4)",
                &[&service_name, &content_hash, &valid, &unix_timestamp()],
            )
            .await
            .map_err(map_pg_err)?;
        Ok(())
    }
}
