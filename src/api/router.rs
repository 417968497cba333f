//! Scheduling API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Trace + CORS → 2. Actor extraction → 3. Access logger

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route("/appointments/check", post(endpoints::appointments::check))
        .route(
            "/appointments/:id",
            get(endpoints::appointments::detail).patch(endpoints::appointments::update),
        )
        .route("/appointments/:id/cancel", post(endpoints::appointments::cancel))
        .route("/appointments/:id/status", post(endpoints::appointments::set_status))
        .route(
            "/appointment-types",
            get(endpoints::appointment_types::list).post(endpoints::appointment_types::create),
        )
        .route(
            "/appointment-types/:id",
            patch(endpoints::appointment_types::update),
        )
        .route("/providers", get(endpoints::directory::providers))
        .route("/locations", get(endpoints::directory::locations))
        .route("/audit", get(endpoints::audit::list))
        .route(
            "/waitlist",
            get(endpoints::waitlist::list).post(endpoints::waitlist::create),
        )
        .route("/waitlist/:id", patch(endpoints::waitlist::update))
        .route("/waitlist/:id/book", post(endpoints::waitlist::book))
        .route("/realtime", get(endpoints::realtime::subscribe))
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_actor))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
