use axum::{Router, extract::FromRef, http::HeaderName};
use std::sync::Arc;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod repository;
pub mod service;

// Resource mounting and the access policy table.
pub mod routes;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use memory::InMemoryRepository;
pub use models::{Coupon, Order, Role};
pub use repository::{PostgresRepository, RepositoryState, TimedRepository};
pub use service::ResourceService;

/// ApiDoc
///
/// Auto-generates the OpenAPI document for every endpoint and schema. Served at
/// `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_coupons, handlers::get_coupon, handlers::create_coupon,
        handlers::update_coupon, handlers::delete_coupon,
        handlers::get_orders, handlers::get_order, handlers::create_order,
        handlers::update_order, handlers::delete_order,
        handlers::get_roles, handlers::get_role, handlers::create_role,
        handlers::update_role, handlers::delete_role,
    ),
    components(
        schemas(
            models::EntityId, models::ErrorResponse,
            models::Coupon, models::CouponInput,
            models::Order, models::OrderInput,
            models::Role, models::RoleInput,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "coupons", description = "Coupon catalogue"),
        (name = "orders", description = "Customer orders"),
        (name = "roles", description = "Role definitions")
    )
)]
pub struct ApiDoc;

/// Registers the `bearerAuth` scheme referenced by the mutating endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// AppState
///
/// The single, immutable container shared by every request: one service per
/// resource plus the loaded configuration. Each service already holds its
/// repository handle, so handlers never see the store directly.
#[derive(Clone)]
pub struct AppState {
    pub coupons: ResourceService<Coupon>,
    pub orders: ResourceService<Order>,
    pub roles: ResourceService<Role>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires one repository per resource into its service.
    pub fn new(
        coupons: RepositoryState<Coupon>,
        orders: RepositoryState<Order>,
        roles: RepositoryState<Role>,
        config: AppConfig,
    ) -> Self {
        Self {
            coupons: ResourceService::new(coupons),
            orders: ResourceService::new(orders),
            roles: ResourceService::new(roles),
            config,
        }
    }

    /// State backed entirely by fresh in-memory stores, each call bounded by
    /// `config.store_timeout`.
    pub fn in_memory(config: AppConfig) -> Self {
        let budget = config.store_timeout;
        Self::new(
            TimedRepository::wrap(Arc::new(InMemoryRepository::<Coupon>::new()), budget),
            TimedRepository::wrap(Arc::new(InMemoryRepository::<Order>::new()), budget),
            TimedRepository::wrap(Arc::new(InMemoryRepository::<Role>::new()), budget),
            config,
        )
    }
}

// --- Axum FromRef Extractor Implementations ---

// Handlers pull only the service they work on; the gates pull the config.

impl FromRef<AppState> for ResourceService<Coupon> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.coupons.clone()
    }
}

impl FromRef<AppState> for ResourceService<Order> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.orders.clone()
    }
}

impl FromRef<AppState> for ResourceService<Role> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.roles.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the resource routes, applies the global middleware and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Each endpoint carries its own gate chain from the policy table.
        .merge(routes::api_routes(&state))
        .with_state(state);

    // 3. Observability and Correlation Layers (outermost first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Every request gets an x-request-id unless the caller sent one.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. One span per request, tagged with that id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo the id back on the response.
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // 3d. A panicking handler becomes a 500 inside the span.
                .layer(CatchPanicLayer::custom(error::panic_response)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span from the method, the URI and the `x-request-id`
/// header, so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
