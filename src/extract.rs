use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::{
    error::AppError,
    models::{EntityId, ValidationError},
};

/// JsonBody
///
/// Drop-in replacement for `Json<T>` whose rejections go through `AppError`, so a
/// malformed body, a missing field, or a wrong content type is always a 400 with
/// the usual `{ "error": ... }` body (axum would answer some of these with 415 or
/// 422). An oversized body keeps its 413. Field rules are not checked here; that
/// is the service's job.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
                _ => AppError::Validation(rejection.body_text()),
            })?;
        Ok(Self(value))
    }
}

/// IdPath
///
/// The `{id}` segment of an item route, parsed into an `EntityId`. Any failure,
/// including a segment that does not decode to UTF-8, is a 400 against `id`.
pub struct IdPath(pub EntityId);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationError::new("id", rejection.body_text()))?;
        Ok(Self(EntityId::parse(&raw)?))
    }
}
