use crate::models::{EntityId, Validate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{FromRow, PgPool, types::Json};
use std::{future::Future, marker::PhantomData, sync::Arc, time::Duration};
use thiserror::Error;
use uuid::Uuid;

/// Document
///
/// Binds a domain entity to its stored representation. Each resource kind lives in
/// its own collection and stamps every document with a schema version; a document
/// read back with a different version, or a body that no longer fits `Fields`, is
/// rejected instead of being handed to callers.
pub trait Document: Serialize + Clone + Send + Sync + 'static {
    /// The caller-supplied, mutable part of the entity.
    type Fields: Serialize + DeserializeOwned + Validate + Clone + Send + Sync + 'static;

    const COLLECTION: &'static str;
    const SCHEMA_VERSION: i32;

    /// Builds the full entity from store metadata and its fields.
    fn assemble(meta: DocumentMeta, fields: Self::Fields) -> Self;

    fn id(&self) -> EntityId;

    fn fields(&self) -> Self::Fields;

    /// Normalized key that must be unique across the collection, if any.
    fn unique_key(_fields: &Self::Fields) -> Option<String> {
        None
    }
}

/// Store-owned metadata: the id and audit timestamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentMeta {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// StoreError
///
/// Failures raised by persistence adapters. These never carry HTTP semantics;
/// the web layer decides how to present them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("could not encode {collection} document: {source}")]
    Encode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A stored document that does not conform to the current schema.
    #[error("{collection} document {id} does not conform to schema v{expected}: {reason}")]
    Corrupt {
        collection: &'static str,
        id: EntityId,
        expected: i32,
        reason: String,
    },

    #[error("{collection} store call exceeded its {budget:?} budget")]
    Timeout {
        collection: &'static str,
        budget: Duration,
    },
}

/// Repository Trait
///
/// The persistence port. Every resource kind is served through the same contract,
/// so services and handlers never learn which store sits behind it.
///
/// * `get_by_id` and `update` report an unknown id as `Ok(None)`, never as an error.
/// * `delete` is idempotent: removing an unknown id succeeds.
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    /// Every stored entity, in store-native (insertion) order.
    async fn get_all(&self) -> Result<Vec<T>, StoreError>;

    async fn get_by_id(&self, id: EntityId) -> Result<Option<T>, StoreError>;

    /// Persists a new entity. The store assigns the id and timestamps.
    async fn create(&self, fields: T::Fields) -> Result<T, StoreError>;

    /// Replaces all mutable fields; id and `created_at` are preserved.
    async fn update(&self, id: EntityId, fields: T::Fields) -> Result<Option<T>, StoreError>;

    async fn delete(&self, id: EntityId) -> Result<(), StoreError>;
}

/// RepositoryState
///
/// The shared handle a service holds onto for one resource kind.
pub type RepositoryState<T> = Arc<dyn Repository<T>>;

/// Applies the bundled schema migrations (the `documents` table).
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

// --- Postgres adapter ---

const SELECT_ALL: &str = r#"
    SELECT id, schema_version, body, created_at, updated_at
    FROM documents
    WHERE collection = $1
    ORDER BY created_at ASC, id ASC
"#;

const SELECT_ONE: &str = r#"
    SELECT id, schema_version, body, created_at, updated_at
    FROM documents
    WHERE collection = $1 AND id = $2
"#;

const INSERT: &str = r#"
    INSERT INTO documents (collection, schema_version, body)
    VALUES ($1, $2, $3)
    RETURNING id, schema_version, body, created_at, updated_at
"#;

const UPDATE: &str = r#"
    UPDATE documents
    SET schema_version = $3, body = $4, updated_at = NOW()
    WHERE collection = $1 AND id = $2
    RETURNING id, schema_version, body, created_at, updated_at
"#;

const DELETE: &str = "DELETE FROM documents WHERE collection = $1 AND id = $2";

/// One row of the `documents` table.
#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    schema_version: i32,
    body: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    /// Checks the row against `T`'s schema and materializes the entity.
    fn into_document<T: Document>(self) -> Result<T, StoreError> {
        let id = EntityId::from(self.id);
        let corrupt = |reason: String| StoreError::Corrupt {
            collection: T::COLLECTION,
            id,
            expected: T::SCHEMA_VERSION,
            reason,
        };

        if self.schema_version != T::SCHEMA_VERSION {
            return Err(corrupt(format!(
                "stored with schema v{}",
                self.schema_version
            )));
        }

        let fields: T::Fields =
            serde_json::from_value(self.body.0).map_err(|e| corrupt(e.to_string()))?;
        fields.validate().map_err(|e| corrupt(e.to_string()))?;

        Ok(T::assemble(
            DocumentMeta {
                id,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            fields,
        ))
    }
}

fn encode<T: Document>(fields: &T::Fields) -> Result<Json<serde_json::Value>, StoreError> {
    serde_json::to_value(fields)
        .map(Json)
        .map_err(|source| StoreError::Encode {
            collection: T::COLLECTION,
            source,
        })
}

/// PostgresRepository
///
/// Document-store adapter backed by a single `documents` table, partitioned by
/// collection. One instance per resource kind; all of them share the same pool.
pub struct PostgresRepository<T> {
    pool: PgPool,
    _document: PhantomData<fn() -> T>,
}

impl<T> PostgresRepository<T> {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _document: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Document> Repository<T> for PostgresRepository<T> {
    async fn get_all(&self) -> Result<Vec<T>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(SELECT_ALL)
            .bind(T::COLLECTION)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DocumentRow::into_document::<T>).collect()
    }

    async fn get_by_id(&self, id: EntityId) -> Result<Option<T>, StoreError> {
        sqlx::query_as::<_, DocumentRow>(SELECT_ONE)
            .bind(T::COLLECTION)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(DocumentRow::into_document::<T>)
            .transpose()
    }

    async fn create(&self, fields: T::Fields) -> Result<T, StoreError> {
        let body = encode::<T>(&fields)?;
        sqlx::query_as::<_, DocumentRow>(INSERT)
            .bind(T::COLLECTION)
            .bind(T::SCHEMA_VERSION)
            .bind(body)
            .fetch_one(&self.pool)
            .await?
            .into_document::<T>()
    }

    async fn update(&self, id: EntityId, fields: T::Fields) -> Result<Option<T>, StoreError> {
        let body = encode::<T>(&fields)?;
        sqlx::query_as::<_, DocumentRow>(UPDATE)
            .bind(T::COLLECTION)
            .bind(id.as_uuid())
            .bind(T::SCHEMA_VERSION)
            .bind(body)
            .fetch_optional(&self.pool)
            .await?
            .map(DocumentRow::into_document::<T>)
            .transpose()
    }

    async fn delete(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query(DELETE)
            .bind(T::COLLECTION)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(collection = T::COLLECTION, %id, "delete of absent document");
        }
        Ok(())
    }
}

// --- Timeout decorator ---

/// TimedRepository
///
/// Wraps another adapter and bounds every call with a fixed budget. The inner
/// call is dropped when the budget runs out.
pub struct TimedRepository<T: Document> {
    inner: RepositoryState<T>,
    budget: Duration,
}

impl<T: Document> TimedRepository<T> {
    pub fn wrap(inner: RepositoryState<T>, budget: Duration) -> RepositoryState<T> {
        Arc::new(Self { inner, budget })
    }

    async fn bounded<R>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<R, StoreError>>,
    ) -> Result<R, StoreError> {
        match tokio::time::timeout(self.budget, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    collection = T::COLLECTION,
                    operation,
                    budget_ms = self.budget.as_millis() as u64,
                    "store call timed out"
                );
                Err(StoreError::Timeout {
                    collection: T::COLLECTION,
                    budget: self.budget,
                })
            }
        }
    }
}

#[async_trait]
impl<T: Document> Repository<T> for TimedRepository<T> {
    async fn get_all(&self) -> Result<Vec<T>, StoreError> {
        self.bounded("get_all", self.inner.get_all()).await
    }

    async fn get_by_id(&self, id: EntityId) -> Result<Option<T>, StoreError> {
        self.bounded("get_by_id", self.inner.get_by_id(id)).await
    }

    async fn create(&self, fields: T::Fields) -> Result<T, StoreError> {
        self.bounded("create", self.inner.create(fields)).await
    }

    async fn update(&self, id: EntityId, fields: T::Fields) -> Result<Option<T>, StoreError> {
        self.bounded("update", self.inner.update(id, fields)).await
    }

    async fn delete(&self, id: EntityId) -> Result<(), StoreError> {
        self.bounded("delete", self.inner.delete(id)).await
    }
}
