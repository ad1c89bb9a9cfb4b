//! Router configuration.

use crate::handlers::{health, members, reservations, sessions};
use crate::state::AppState;
use axum::{
    Router,
    http::{HeaderName, Request},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Header carrying the request ID, generated when the client sends none.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the complete Axum router.
///
/// ```text
/// GET  /health
/// GET  /ready
/// POST /api/reservations
/// GET  /api/reservations/:id
/// POST /api/reservations/:id/cancel
/// POST /api/reservations/:id/outcome
/// GET  /api/members/:id/reservations
/// GET  /api/sessions/:id/roster
/// GET  /api/sessions/:id/availability
/// POST /api/sessions/:id/cancel
/// ```
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Reservations (write side goes through the capacity gate)
        .route("/reservations", post(reservations::create_reservation))
        .route("/reservations/:id", get(reservations::get_reservation))
        .route("/reservations/:id/cancel", post(reservations::cancel_reservation))
        .route("/reservations/:id/outcome", post(reservations::set_outcome))
        // Read-side views
        .route("/members/:id/reservations", get(members::list_member_reservations))
        .route("/sessions/:id/roster", get(sessions::get_roster))
        .route("/sessions/:id/availability", get(sessions::get_availability))
        // Administration
        .route("/sessions/:id/cancel", post(sessions::cancel_session));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                tracing::info_span!(
                    "http_request",
                    request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(request_id));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api_routes)
        .layer(layers)
        .with_state(state)
}
