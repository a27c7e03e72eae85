use crate::{
    auth::AuthUser,
    error::AppError,
    extract::{IdPath, JsonBody},
    models::{Coupon, CouponInput, EntityId, ErrorResponse, Order, OrderInput, Role, RoleInput},
    repository::Document,
    service::ResourceService,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

/// Tags for grouping endpoints in the OpenAPI document.
pub static COUPONS_TAG: &str = "coupons";
pub static ORDERS_TAG: &str = "orders";
pub static ROLES_TAG: &str = "roles";

/// Resolves a lookup that may come back empty into a 404.
fn found<T: Document>(entity: Option<T>, id: EntityId) -> Result<Json<T>, AppError> {
    entity
        .map(Json)
        .ok_or_else(|| AppError::not_found(T::COLLECTION, id))
}

// --- Coupons ---

/// get_coupons
///
/// [Public Route] Lists every coupon. An empty store yields an empty array.
#[utoipa::path(
    get,
    path = "/coupons",
    tag = COUPONS_TAG,
    responses(
        (status = 200, description = "All coupons", body = [Coupon]),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_coupons(
    State(coupons): State<ResourceService<Coupon>>,
) -> Result<Json<Vec<Coupon>>, AppError> {
    Ok(Json(coupons.get_all().await?))
}

/// get_coupon
///
/// [Public Route] Retrieves a single coupon by ID.
#[utoipa::path(
    get,
    path = "/coupons/{id}",
    tag = COUPONS_TAG,
    params(("id" = String, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Found", body = Coupon),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "Coupon not found", body = ErrorResponse)
    )
)]
pub async fn get_coupon(
    State(coupons): State<ResourceService<Coupon>>,
    IdPath(id): IdPath,
) -> Result<Json<Coupon>, AppError> {
    found(coupons.get_by_id(id).await?, id)
}

/// create_coupon
///
/// [Admin Route] Creates a coupon. The store assigns the ID.
#[utoipa::path(
    post,
    path = "/coupons",
    tag = COUPONS_TAG,
    request_body = CouponInput,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Created", body = Coupon),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 401, description = "No valid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
pub async fn create_coupon(
    user: AuthUser,
    State(coupons): State<ResourceService<Coupon>>,
    JsonBody(payload): JsonBody<CouponInput>,
) -> Result<(StatusCode, Json<Coupon>), AppError> {
    let coupon = coupons.create(payload).await?;
    tracing::info!(actor = %user.subject, coupon_id = %coupon.id, "coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// update_coupon
///
/// [Admin Route] Replaces every mutable field of a coupon.
#[utoipa::path(
    put,
    path = "/coupons/{id}",
    tag = COUPONS_TAG,
    params(("id" = String, Path, description = "Coupon ID")),
    request_body = CouponInput,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Updated", body = Coupon),
        (status = 400, description = "Invalid body or ID", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 401, description = "No valid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Coupon not found", body = ErrorResponse)
    )
)]
pub async fn update_coupon(
    user: AuthUser,
    State(coupons): State<ResourceService<Coupon>>,
    IdPath(id): IdPath,
    JsonBody(payload): JsonBody<CouponInput>,
) -> Result<Json<Coupon>, AppError> {
    let updated = coupons.update(id, payload).await?;
    if updated.is_some() {
        tracing::info!(actor = %user.subject, coupon_id = %id, "coupon updated");
    }
    found(updated, id)
}

/// delete_coupon
///
/// [Admin Route] Removes a coupon. Idempotent: 204 whether or not it existed.
#[utoipa::path(
    delete,
    path = "/coupons/{id}",
    tag = COUPONS_TAG,
    params(("id" = String, Path, description = "Coupon ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 204, description = "Deleted (or already absent)"),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 401, description = "No valid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
pub async fn delete_coupon(
    user: AuthUser,
    State(coupons): State<ResourceService<Coupon>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    coupons.delete(id).await?;
    tracing::info!(actor = %user.subject, coupon_id = %id, "coupon deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- Orders ---

/// get_orders
///
/// [Public Route] Lists every order.
#[utoipa::path(
    get,
    path = "/orders",
    tag = ORDERS_TAG,
    responses(
        (status = 200, description = "All orders", body = [Order]),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_orders(
    State(orders): State<ResourceService<Order>>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(orders.get_all().await?))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = ORDERS_TAG,
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Found", body = Order),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    )
)]
pub async fn get_order(
    State(orders): State<ResourceService<Order>>,
    IdPath(id): IdPath,
) -> Result<Json<Order>, AppError> {
    found(orders.get_by_id(id).await?, id)
}

/// create_order
///
/// [Admin Route] Records a new order. `coupon_id` is stored as given; it is not
/// checked against the coupon collection.
#[utoipa::path(
    post,
    path = "/orders",
    tag = ORDERS_TAG,
    request_body = OrderInput,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Created", body = Order),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 401, description = "No valid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
pub async fn create_order(
    user: AuthUser,
    State(orders): State<ResourceService<Order>>,
    JsonBody(payload): JsonBody<OrderInput>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = orders.create(payload).await?;
    tracing::info!(actor = %user.subject, order_id = %order.id, "order created");
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    put,
    path = "/orders/{id}",
    tag = ORDERS_TAG,
    params(("id" = String, Path, description = "Order ID")),
    request_body = OrderInput,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Updated", body = Order),
        (status = 400, description = "Invalid body or ID", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 401, description = "No valid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    )
)]
pub async fn update_order(
    user: AuthUser,
    State(orders): State<ResourceService<Order>>,
    IdPath(id): IdPath,
    JsonBody(payload): JsonBody<OrderInput>,
) -> Result<Json<Order>, AppError> {
    let updated = orders.update(id, payload).await?;
    if updated.is_some() {
        tracing::info!(actor = %user.subject, order_id = %id, "order updated");
    }
    found(updated, id)
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    tag = ORDERS_TAG,
    params(("id" = String, Path, description = "Order ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 204, description = "Deleted (or already absent)"),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 401, description = "No valid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
pub async fn delete_order(
    user: AuthUser,
    State(orders): State<ResourceService<Order>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    orders.delete(id).await?;
    tracing::info!(actor = %user.subject, order_id = %id, "order deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- Roles ---

/// get_roles
///
/// [Public Route] Lists every role.
#[utoipa::path(
    get,
    path = "/roles",
    tag = ROLES_TAG,
    responses(
        (status = 200, description = "All roles", body = [Role]),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_roles(
    State(roles): State<ResourceService<Role>>,
) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(roles.get_all().await?))
}

#[utoipa::path(
    get,
    path = "/roles/{id}",
    tag = ROLES_TAG,
    params(("id" = String, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Found", body = Role),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn get_role(
    State(roles): State<ResourceService<Role>>,
    IdPath(id): IdPath,
) -> Result<Json<Role>, AppError> {
    found(roles.get_by_id(id).await?, id)
}

/// create_role
///
/// [Admin Route] Creates a role. Names are unique, ignoring case.
#[utoipa::path(
    post,
    path = "/roles",
    tag = ROLES_TAG,
    request_body = RoleInput,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Created", body = Role),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 401, description = "No valid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Role with this name already exists", body = ErrorResponse)
    )
)]
pub async fn create_role(
    user: AuthUser,
    State(roles): State<ResourceService<Role>>,
    JsonBody(payload): JsonBody<RoleInput>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let role = roles.create(payload).await?;
    tracing::info!(actor = %user.subject, role_id = %role.id, name = %role.name, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// update_role
///
/// [Admin Route] Replaces a role's name and description. Renaming onto a name
/// held by another role is a conflict.
#[utoipa::path(
    put,
    path = "/roles/{id}",
    tag = ROLES_TAG,
    params(("id" = String, Path, description = "Role ID")),
    request_body = RoleInput,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Updated", body = Role),
        (status = 400, description = "Invalid body or ID", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 401, description = "No valid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 409, description = "Role with this name already exists", body = ErrorResponse)
    )
)]
pub async fn update_role(
    user: AuthUser,
    State(roles): State<ResourceService<Role>>,
    IdPath(id): IdPath,
    JsonBody(payload): JsonBody<RoleInput>,
) -> Result<Json<Role>, AppError> {
    let updated = roles.update(id, payload).await?;
    if updated.is_some() {
        tracing::info!(actor = %user.subject, role_id = %id, "role updated");
    }
    found(updated, id)
}

#[utoipa::path(
    delete,
    path = "/roles/{id}",
    tag = ROLES_TAG,
    params(("id" = String, Path, description = "Role ID")),
    security(("bearerAuth" = [])),
    responses(
        (status = 204, description = "Deleted (or already absent)"),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 401, description = "No valid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
pub async fn delete_role(
    user: AuthUser,
    State(roles): State<ResourceService<Role>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    roles.delete(id).await?;
    tracing::info!(actor = %user.subject, role_id = %id, "role deleted");
    Ok(StatusCode::NO_CONTENT)
}
