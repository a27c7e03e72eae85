use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{AuthError, AuthUser, authenticate_headers},
    config::AppConfig,
    error::AppError,
};

/// authenticate
///
/// Authentication gate. Requires a verifiable bearer token; on success the
/// decoded identity is attached to the request for the gates and handlers after
/// it. Any failure halts the chain with a 401.
pub async fn authenticate(
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate_headers(request.headers(), &config.jwt_secret)?;
    tracing::debug!(subject = %user.subject, role = %user.role, "caller authenticated");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// authorize_admin
///
/// Authorization gate. Must run after `authenticate`; a request that reaches it
/// without an identity is treated as unauthenticated. A role other than the
/// configured administrator role halts the chain with a 403.
pub async fn authorize_admin(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingCredential)?;
    require_role(user, &config.admin_role)?;

    Ok(next.run(request).await)
}

/// Exact, case-sensitive comparison of the role claim.
pub fn require_role(user: &AuthUser, required: &str) -> Result<(), AuthError> {
    if user.role == required {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole {
            actual: user.role.clone(),
            required: required.to_string(),
        })
    }
}
