//! Session endpoints for staff.
//!
//! - GET /api/sessions/:id/roster - Every reservation of a session
//! - GET /api/sessions/:id/availability - Capacity, occupancy, remaining seats
//! - POST /api/sessions/:id/cancel - Call a session off

use crate::WebResult;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use studio_booking_core::{Availability, RosterEntry, Session, SessionId};

/// Session roster ordered by admission time.
pub async fn get_roster(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> WebResult<Json<Vec<RosterEntry>>> {
    Ok(Json(state.service.session_roster(session_id).await?))
}

/// Live availability for a session.
///
/// ```json
/// {"session_id":"...","capacity":12,"occupancy":9,"remaining":3,"cancelled":false,"class_active":true}
/// ```
pub async fn get_availability(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> WebResult<Json<Availability>> {
    Ok(Json(state.service.session_availability(session_id).await?))
}

/// Cancel a session. Existing reservations keep their status.
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> WebResult<Json<Session>> {
    Ok(Json(state.service.cancel_session(session_id).await?))
}
