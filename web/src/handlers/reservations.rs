//! Reservation endpoints.
//!
//! - POST /api/reservations - Request a seat
//! - GET /api/reservations/:id - Get a reservation
//! - POST /api/reservations/:id/cancel - Cancel a reservation
//! - POST /api/reservations/:id/outcome - Record attendance

use crate::WebResult;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use studio_booking_core::{MemberId, Outcome, Reservation, ReservationId, SessionId};

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /api/reservations`.
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    /// Member asking for a seat
    pub member_id: MemberId,
    /// Session to book
    pub session_id: SessionId,
}

/// Body of `POST /api/reservations/:id/outcome`.
#[derive(Debug, Deserialize)]
pub struct SetOutcomeRequest {
    /// `attended` or `no_show`
    pub outcome: Outcome,
}

// ============================================================================
// Handlers
// ============================================================================

/// Request a seat in a session.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/reservations \
///   -H 'Content-Type: application/json' \
///   -d '{"member_id":"...","session_id":"..."}'
/// ```
///
/// Returns 201 with the confirmed reservation, 409 when the session is full
/// or the member already holds a seat, 422 when the member, class or session
/// is not bookable, 404 when either ID is unknown.
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<CreateReservationRequest>,
) -> WebResult<(StatusCode, Json<Reservation>)> {
    let reservation = state
        .service
        .request_reservation(request.member_id, request.session_id)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Get a single reservation.
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<ReservationId>,
) -> WebResult<Json<Reservation>> {
    Ok(Json(state.service.get_reservation(reservation_id).await?))
}

/// Cancel a confirmed reservation. 422 if it is already terminal.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<ReservationId>,
) -> WebResult<Json<Reservation>> {
    Ok(Json(state.service.cancel_reservation(reservation_id).await?))
}

/// Record whether the member attended. 422 unless the reservation is confirmed.
pub async fn set_outcome(
    State(state): State<AppState>,
    Path(reservation_id): Path<ReservationId>,
    Json(request): Json<SetOutcomeRequest>,
) -> WebResult<Json<Reservation>> {
    Ok(Json(
        state
            .service
            .set_outcome(reservation_id, request.outcome)
            .await?,
    ))
}
