//! PostgreSQL revision store for production use.
//!
//! Reads the chart document tables (`d_document`, `d_module`, `d_image`,
//! `d_attachment`). Timestamps are stored without zone and interpreted as UTC.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)
//! - `REVISION_DOC_TYPE`: Document type listed by history queries (default: karte)

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;

use super::{day_window, RevisionStore};
use crate::types::{
    Attachment, ChartId, ExternalRef, ModuleEntity, RevisionId, RevisionRecord, SchemaImage,
    Snapshot, STATUS_DELETED,
};

const RECORD_COLUMNS: &str = r#"
    d.id, d.linkid, d.karte_id, d.confirmed, d.started, d.status,
    d.doctype, d.title, u.userid AS creator_user_id
    FROM d_document d
    LEFT JOIN d_users u ON u.id = d.creator_id
"#;

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
    /// Document type listed by history queries (default: karte).
    pub doc_type: String,
}

impl PostgresConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/dolphin".to_string()),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            max_lifetime_secs: std::env::var("DB_MAX_LIFETIME_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800),
            doc_type: std::env::var("REVISION_DOC_TYPE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "karte".to_string()),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// PostgreSQL revision store.
pub struct PostgresRevisionStore {
    pool: PgPool,
    doc_type: String,
}

impl PostgresRevisionStore {
    /// Create a new store with the given configuration.
    pub async fn new(config: PostgresConfig) -> Result<Self, sqlx::Error> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            doc_type = %config.doc_type,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Self {
            pool,
            doc_type: config.doc_type,
        })
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, sqlx::Error> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get pool statistics for monitoring.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    /// Parse a revision record from a database row.
    fn parse_record_row(row: &PgRow) -> Result<RevisionRecord, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        // linkid is 0 or NULL for a root
        let link_id: Option<i64> = row.try_get("linkid")?;
        let karte_id: i64 = row.try_get("karte_id")?;
        let confirmed: Option<NaiveDateTime> = row.try_get("confirmed")?;
        let started: NaiveDateTime = row.try_get("started")?;
        let status: Option<String> = row.try_get("status")?;

        Ok(RevisionRecord {
            id: RevisionId::new(id),
            parent_id: RevisionId::parent_link(link_id.unwrap_or(0)),
            chart_id: ChartId::new(karte_id),
            confirmed_at: confirmed.map(|c| c.and_utc()),
            started_at: started.and_utc(),
            status: status.unwrap_or_default(),
            doc_type: row.try_get("doctype")?,
            title: row.try_get("title")?,
            creator_user_id: row.try_get("creator_user_id")?,
        })
    }

    async fn fetch_modules(&self, id: RevisionId) -> Result<Vec<ModuleEntity>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, entity, beanjson, beanbytes
            FROM d_module
            WHERE doc_id = $1
            ORDER BY id
            "#,
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok::<_, sqlx::Error>(ModuleEntity {
                    id: row.try_get("id")?,
                    entity: row.try_get("entity")?,
                    bean_json: row.try_get("beanjson")?,
                    bean_bytes: row.try_get("beanbytes")?,
                })
            })
            .collect()
    }

    async fn fetch_schema(&self, id: RevisionId) -> Result<Vec<SchemaImage>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, href, title, contenttype, jpegbyte
            FROM d_image
            WHERE doc_id = $1
            ORDER BY id
            "#,
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let ext_ref = ExternalRef {
                    href: row.try_get("href")?,
                    title: row.try_get("title")?,
                    content_type: row.try_get("contenttype")?,
                };
                let has_ref = ext_ref.href.is_some() || ext_ref.title.is_some() || ext_ref.content_type.is_some();
                Ok::<_, sqlx::Error>(SchemaImage {
                    id: row.try_get("id")?,
                    ext_ref: has_ref.then_some(ext_ref),
                    jpeg_bytes: row.try_get("jpegbyte")?,
                })
            })
            .collect()
    }

    async fn fetch_attachments(&self, id: RevisionId) -> Result<Vec<Attachment>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, filename, contenttype, contentsize, digest, bytes
            FROM d_attachment
            WHERE doc_id = $1
            ORDER BY id
            "#,
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let content_size: Option<i64> = row.try_get("contentsize")?;
                Ok::<_, sqlx::Error>(Attachment {
                    id: row.try_get("id")?,
                    file_name: row.try_get("filename")?,
                    content_type: row.try_get("contenttype")?,
                    content_size: content_size.unwrap_or(0),
                    digest: row.try_get("digest")?,
                    bytes: row.try_get("bytes")?,
                })
            })
            .collect()
    }
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
impl RevisionStore for PostgresRevisionStore {
    type Error = PostgresError;

    async fn fetch_records_for_chart_on_date(
        &self,
        chart_id: ChartId,
        day: NaiveDate,
    ) -> Result<Vec<RevisionRecord>, Self::Error> {
        let (from, to) = day_window(day);
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
             WHERE d.karte_id = $1
               AND d.started >= $2 AND d.started < $3
               AND d.status <> $4
               AND d.doctype = $5
             ORDER BY d.id"
        );
        let rows = sqlx::query(&sql)
            .bind(chart_id.get())
            .bind(from.naive_utc())
            .bind(to.naive_utc())
            .bind(STATUS_DELETED)
            .bind(&self.doc_type)
            .fetch_all(&self.pool)
            .await?;

        tracing::trace!(chart_id = %chart_id, day = %day, rows = rows.len(), "Fetched day records");

        rows.iter()
            .map(Self::parse_record_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostgresError::from)
    }

    async fn fetch_record_by_id(&self, id: RevisionId) -> Result<Option<RevisionRecord>, Self::Error> {
        let sql = format!("SELECT {RECORD_COLUMNS} WHERE d.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(Self::parse_record_row(r)?)),
            None => Ok(None),
        }
    }

    async fn fetch_snapshot_by_id(&self, id: RevisionId) -> Result<Option<Snapshot>, Self::Error> {
        let Some(record) = self.fetch_record_by_id(id).await? else {
            return Ok(None);
        };

        Ok(Some(Snapshot {
            record,
            modules: self.fetch_modules(id).await?,
            schema: self.fetch_schema(id).await?,
            attachments: self.fetch_attachments(id).await?,
        }))
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
