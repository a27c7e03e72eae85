/// Router Module Index
///
/// Mounts each resource's five endpoints and wraps every endpoint in exactly the
/// gate chain its policy entry names. Reads stay open; writes pass through
/// authentication and then authorization before the handler runs.

/// Declarative (resource, operation) -> gate chain table.
pub mod policy;

use axum::{
    Router,
    http::{Method, Uri},
    middleware,
    routing::{MethodRouter, get},
};

use crate::{AppState, access, error::AppError, handlers};
use policy::{Gate, Operation, ResourceKind, gates_for};

/// The handlers backing one resource, one per operation.
struct Endpoints {
    list: MethodRouter<AppState>,
    get: MethodRouter<AppState>,
    create: MethodRouter<AppState>,
    update: MethodRouter<AppState>,
    delete: MethodRouter<AppState>,
}

fn endpoints(resource: ResourceKind) -> Endpoints {
    use axum::routing::{delete, post, put};
    match resource {
        ResourceKind::Coupons => Endpoints {
            list: get(handlers::get_coupons),
            get: get(handlers::get_coupon),
            create: post(handlers::create_coupon),
            update: put(handlers::update_coupon),
            delete: delete(handlers::delete_coupon),
        },
        ResourceKind::Orders => Endpoints {
            list: get(handlers::get_orders),
            get: get(handlers::get_order),
            create: post(handlers::create_order),
            update: put(handlers::update_order),
            delete: delete(handlers::delete_order),
        },
        ResourceKind::Roles => Endpoints {
            list: get(handlers::get_roles),
            get: get(handlers::get_role),
            create: post(handlers::create_role),
            update: put(handlers::update_role),
            delete: delete(handlers::delete_role),
        },
    }
}

/// guarded
///
/// Applies the policy's gates to one endpoint. Layers added later wrap the ones
/// added earlier, so the chain is folded in reverse to make the first gate in
/// the table the first to see the request.
fn guarded(
    resource: ResourceKind,
    operation: Operation,
    endpoint: MethodRouter<AppState>,
    state: &AppState,
) -> MethodRouter<AppState> {
    gates_for(resource, operation)
        .iter()
        .rev()
        .fold(endpoint, |endpoint, gate| match gate {
            Gate::Authenticate => endpoint.route_layer(middleware::from_fn_with_state(
                state.clone(),
                access::authenticate,
            )),
            Gate::AuthorizeAdmin => endpoint.route_layer(middleware::from_fn_with_state(
                state.clone(),
                access::authorize_admin,
            )),
        })
}

/// Mounts `/{resource}` (list, create) and `/{resource}/{id}` (get, update, delete).
fn mount(resource: ResourceKind, state: &AppState) -> Router<AppState> {
    let Endpoints {
        list,
        get,
        create,
        update,
        delete,
    } = endpoints(resource);

    let base = resource.base_path();
    let collection = guarded(resource, Operation::List, list, state)
        .merge(guarded(resource, Operation::Create, create, state));
    let item = guarded(resource, Operation::Get, get, state)
        .merge(guarded(resource, Operation::Update, update, state))
        .merge(guarded(resource, Operation::Delete, delete, state));

    Router::new()
        .route(base, collection)
        .route(&format!("{base}/{{id}}"), item)
}

/// api_routes
///
/// Every resource plus the liveness check, still waiting for the shared state.
/// Unknown paths and unsupported verbs answer with the usual JSON error body.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    ResourceKind::ALL
        .into_iter()
        .fold(Router::new().route("/health", get(health)), |router, resource| {
            router.merge(mount(resource, state))
        })
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(no_route)
}

/// Liveness check. Does not touch the store.
async fn health() -> &'static str {
    "ok"
}

async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!("{method} is not supported on {}", uri.path()))
}

async fn no_route(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
