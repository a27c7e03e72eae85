use thiserror::Error;

use crate::{
    models::{EntityId, Validate, ValidationError},
    repository::{Document, RepositoryState, StoreError},
};

/// ServiceError
///
/// Domain-level outcome of a use-case that did not succeed. Absence is not an
/// error here; lookups and updates return `Ok(None)` for unknown ids.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The payload clashes with another stored entity (e.g. a duplicate role name).
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// ResourceService
///
/// Use-case layer for one resource kind. It owns the injected repository handle
/// and is the single place where payload rules run before anything is written:
///
/// 1. field-level validation (`Validate` on the payload),
/// 2. collection-wide uniqueness, when the resource declares a unique key.
///
/// Reads pass straight through.
pub struct ResourceService<T: Document> {
    repo: RepositoryState<T>,
}

impl<T: Document> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<T: Document> ResourceService<T> {
    pub fn new(repo: RepositoryState<T>) -> Self {
        Self { repo }
    }

    pub async fn get_all(&self) -> Result<Vec<T>, ServiceError> {
        Ok(self.repo.get_all().await?)
    }

    pub async fn get_by_id(&self, id: EntityId) -> Result<Option<T>, ServiceError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    pub async fn create(&self, fields: T::Fields) -> Result<T, ServiceError> {
        fields.validate()?;
        self.ensure_unique(None, &fields).await?;

        let created = self.repo.create(fields).await?;
        tracing::debug!(collection = T::COLLECTION, id = %created.id(), "document created");
        Ok(created)
    }

    pub async fn update(&self, id: EntityId, fields: T::Fields) -> Result<Option<T>, ServiceError> {
        fields.validate()?;
        self.ensure_unique(Some(id), &fields).await?;

        Ok(self.repo.update(id, fields).await?)
    }

    pub async fn delete(&self, id: EntityId) -> Result<(), ServiceError> {
        Ok(self.repo.delete(id).await?)
    }

    /// Rejects `fields` if another entity (other than `target`) already holds its
    /// unique key. Last write wins between two racing requests; the store has no
    /// uniqueness constraint on document bodies.
    async fn ensure_unique(
        &self,
        target: Option<EntityId>,
        fields: &T::Fields,
    ) -> Result<(), ServiceError> {
        let Some(key) = T::unique_key(fields) else {
            return Ok(());
        };

        let existing = self.repo.get_all().await?;
        // An update of an unknown id is absent, not a conflict.
        if let Some(target) = target {
            if !existing.iter().any(|entity| entity.id() == target) {
                return Ok(());
            }
        }

        let clash = existing.iter().find(|entity| {
            Some(entity.id()) != target && T::unique_key(&entity.fields()).as_ref() == Some(&key)
        });

        match clash {
            Some(entity) => Err(ServiceError::Conflict(format!(
                "{} '{}' already exists with id {}",
                T::COLLECTION,
                key,
                entity.id()
            ))),
            None => Ok(()),
        }
    }
}
