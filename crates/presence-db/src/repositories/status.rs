//! PostgreSQL implementation of RecordStore for the users_status collection

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use presence_core::{
    RecordFilter, RecordQuery, RecordStore, StatusFields, StatusRecord, StoreResult, SubjectId,
};

use crate::models::StatusModel;

use super::error::{check_collection, map_db_error, record_not_found};

/// PostgreSQL implementation of RecordStore
#[derive(Clone)]
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    /// Create a new PgStatusStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users_status table if it does not exist yet
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users_status (
                id UUID PRIMARY KEY,
                subject_id TEXT NOT NULL UNIQUE,
                online BOOLEAN NOT NULL DEFAULT FALSE,
                last_activity_at TIMESTAMPTZ NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgStatusStore {
    #[instrument(skip(self))]
    async fn query(&self, collection: &str, query: &RecordQuery) -> StoreResult<Vec<StatusRecord>> {
        check_collection(collection)?;

        let rows = match &query.filter {
            RecordFilter::Subject(subject_id) => sqlx::query_as::<_, StatusModel>(
                r"
                SELECT id, subject_id, online, last_activity_at
                FROM users_status
                WHERE subject_id = $1
                LIMIT $2
                ",
            )
            .bind(subject_id.as_str())
            .bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?,
        };

        rows.into_iter().map(StatusRecord::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn create(
        &self,
        collection: &str,
        subject_id: &SubjectId,
        fields: StatusFields,
    ) -> StoreResult<StatusRecord> {
        check_collection(collection)?;

        let record = StatusRecord::new(subject_id.clone(), fields);
        sqlx::query(
            r"
            INSERT INTO users_status (id, subject_id, online, last_activity_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(record.id)
        .bind(record.subject_id.as_str())
        .bind(record.online)
        .bind(record.last_activity_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(record)
    }

    #[instrument(skip(self))]
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: StatusFields,
    ) -> StoreResult<StatusRecord> {
        check_collection(collection)?;

        let row = sqlx::query_as::<_, StatusModel>(
            r"
            UPDATE users_status
            SET online = $2, last_activity_at = $3
            WHERE id = $1
            RETURNING id, subject_id, online, last_activity_at
            ",
        )
        .bind(id)
        .bind(fields.online)
        .bind(fields.last_activity_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.ok_or_else(|| record_not_found(id))?.try_into()
    }
}
