pub mod config;
pub mod dtos;
pub mod grpc;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use service_core::error::AppError;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::services::{
    AuthService, Database, ItemSequencer, JwtService, KeyedLocks, PickupPointRegistry,
    ReceptionLifecycle, Repositories,
};

#[derive(Clone)]
pub struct AppState {
    /// Present only with the Postgres backend; used by the health probes.
    pub db: Option<Arc<Database>>,
    pub pickup_points: PickupPointRegistry,
    pub receptions: ReceptionLifecycle,
    pub items: ItemSequencer,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(repos: Repositories, jwt: JwtService, db: Option<Arc<Database>>) -> Self {
        // Lifecycle and sequencer must share one lock table.
        let locks = KeyedLocks::new();

        Self {
            db,
            pickup_points: PickupPointRegistry::new(repos.pickup_points.clone()),
            receptions: ReceptionLifecycle::new(&repos, locks.clone()),
            items: ItemSequencer::new(&repos, locks),
            auth: AuthService::new(repos.users.clone(), jwt),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/dummyLogin", post(handlers::auth::dummy_login))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_handler));

    // Role checks happen in the handler extractors.
    let protected_routes = Router::new()
        .route(
            "/pvz",
            post(handlers::pickup_points::create_pickup_point)
                .get(handlers::pickup_points::list_pickup_points),
        )
        .route("/pvz/:pvz_id", get(handlers::pickup_points::get_pickup_point))
        .route(
            "/pvz/:pvz_id/close_last_reception",
            post(handlers::pickup_points::close_last_reception),
        )
        .route(
            "/pvz/:pvz_id/delete_last_product",
            post(handlers::items::delete_last_product),
        )
        .route("/receptions", post(handlers::receptions::create_reception))
        .route("/receptions/:reception_id", get(handlers::receptions::get_reception))
        .route(
            "/receptions/:reception_id/products",
            get(handlers::receptions::list_reception_products),
        )
        .route("/products", post(handlers::items::add_product))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    with_middleware(Router::new().merge(public_routes).merge(protected_routes)).with_state(state)
}

/// Shared HTTP middleware. A panicking handler becomes a 500 that the
/// request-id, metrics and trace layers still observe.
fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %message, "Handler panicked");

    AppError::InternalError(anyhow::anyhow!("handler panicked: {}", message)).into_response()
}
