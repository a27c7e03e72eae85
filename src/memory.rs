use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{
    models::EntityId,
    repository::{Document, DocumentMeta, Repository, StoreError},
};

/// InMemoryRepository
///
/// Process-local adapter for the persistence port. Used by the test suite and by
/// local runs with `STORE_BACKEND=memory`, so the rest of the pipeline can be
/// exercised without a database.
///
/// Insertion order is kept separately from the map so `get_all` behaves like the
/// Postgres adapter (oldest first).
pub struct InMemoryRepository<T: Document> {
    inner: RwLock<Collection<T>>,
}

struct Collection<T: Document> {
    order: Vec<EntityId>,
    documents: HashMap<EntityId, (DocumentMeta, T::Fields)>,
}

impl<T: Document> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collection {
                order: Vec::new(),
                documents: HashMap::new(),
            }),
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<T: Document> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Document> Repository<T> for InMemoryRepository<T> {
    async fn get_all(&self) -> Result<Vec<T>, StoreError> {
        let collection = self.inner.read().await;
        Ok(collection
            .order
            .iter()
            .filter_map(|id| collection.documents.get(id))
            .map(|(meta, fields)| T::assemble(*meta, fields.clone()))
            .collect())
    }

    async fn get_by_id(&self, id: EntityId) -> Result<Option<T>, StoreError> {
        let collection = self.inner.read().await;
        Ok(collection
            .documents
            .get(&id)
            .map(|(meta, fields)| T::assemble(*meta, fields.clone())))
    }

    async fn create(&self, fields: T::Fields) -> Result<T, StoreError> {
        let now = Utc::now();
        let meta = DocumentMeta {
            id: EntityId::generate(),
            created_at: now,
            updated_at: now,
        };

        let mut collection = self.inner.write().await;
        collection.order.push(meta.id);
        collection
            .documents
            .insert(meta.id, (meta, fields.clone()));

        Ok(T::assemble(meta, fields))
    }

    async fn update(&self, id: EntityId, fields: T::Fields) -> Result<Option<T>, StoreError> {
        let mut collection = self.inner.write().await;
        let Some(entry) = collection.documents.get_mut(&id) else {
            return Ok(None);
        };

        entry.0.updated_at = Utc::now();
        entry.1 = fields;
        Ok(Some(T::assemble(entry.0, entry.1.clone())))
    }

    async fn delete(&self, id: EntityId) -> Result<(), StoreError> {
        let mut collection = self.inner.write().await;
        if collection.documents.remove(&id).is_some() {
            collection.order.retain(|existing| *existing != id);
        }
        Ok(())
    }
}
