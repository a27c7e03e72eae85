use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::error::AppError;

/// Claims
///
/// The payload expected inside a bearer token. Tokens are HS256-signed with the
/// configured secret; the role claim drives the authorization gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (sub): who the caller is. Opaque to this service.
    pub sub: String,
    /// The caller's role, e.g. "admin" or "customer".
    pub role: String,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
}

impl Claims {
    /// Claims valid from now for `ttl`.
    pub fn new(sub: impl Into<String>, role: impl Into<String>, ttl: Duration) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as usize;
        Self {
            sub: sub.into(),
            role: role.into(),
            iat: now,
            exp: now + ttl.as_secs() as usize,
        }
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request. The authentication gate
/// stores it in the request extensions; handlers behind the gate receive it as
/// an extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub subject: String,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role,
        }
    }
}

/// AuthError
///
/// Why a caller was turned away. The variants stay server-side; callers only see
/// a generic 401 or 403.
#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("no bearer credential on the request")]
    MissingCredential,

    #[error("bearer credential rejected: {0}")]
    InvalidCredential(String),

    #[error("role '{actual}' does not grant access (requires '{required}')")]
    InsufficientRole { actual: String, required: String },
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::InvalidCredential("authorization header is not ASCII".into()))?;

    // The scheme name is case-insensitive (RFC 9110 §11.1).
    value
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidCredential("expected a Bearer token".into()))
}

/// verify_token
///
/// Checks the signature and expiry of `token` and returns its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    // Ensure expiration time validation is always active.
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::InvalidCredential("token expired".into()),
            ErrorKind::InvalidSignature => AuthError::InvalidCredential("bad signature".into()),
            _ => AuthError::InvalidCredential(e.to_string()),
        })
}

/// authenticate_headers
///
/// The whole authentication decision for one request: a bearer token must be
/// present and must verify against `secret`.
pub fn authenticate_headers(headers: &HeaderMap, secret: &str) -> Result<AuthUser, AuthError> {
    let token = bearer_token(headers)?;
    verify_token(token, secret).map(AuthUser::from)
}

/// issue_token
///
/// Signs `claims` with `secret`. Token issuance belongs to an external identity
/// provider in production; this exists for local tooling and tests.
pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::InvalidCredential(e.to_string()))
}

/// AuthUser Extractor Implementation
///
/// Reads the identity the authentication gate attached to the request. A handler
/// that asks for `AuthUser` on a route without that gate gets a 401, never a
/// default identity.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AuthError::MissingCredential.into())
    }
}
