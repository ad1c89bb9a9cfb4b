//! Member-facing queries.
//!
//! - GET /api/members/:id/reservations?from=&to= - A member's schedule

use crate::WebResult;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use studio_booking_core::{DateTime, MemberId, MemberReservation, TimeWindow, Utc};

/// Optional RFC 3339 bounds on session start, `[from, to)`.
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    /// Inclusive lower bound
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub to: Option<DateTime<Utc>>,
}

impl TryFrom<WindowParams> for TimeWindow {
    type Error = AppError;

    fn try_from(params: WindowParams) -> Result<Self, Self::Error> {
        if params.from.zip(params.to).is_some_and(|(from, to)| from > to) {
            return Err(AppError::bad_request("`from` must not be after `to`"));
        }
        Ok(Self {
            from: params.from,
            to: params.to,
        })
    }
}

/// List a member's reservations, in every status, ordered by session start.
///
/// ```bash
/// curl 'http://localhost:8080/api/members/<id>/reservations?from=2025-01-01T00:00:00Z'
/// ```
pub async fn list_member_reservations(
    State(state): State<AppState>,
    Path(member_id): Path<MemberId>,
    Query(params): Query<WindowParams>,
) -> WebResult<Json<Vec<MemberReservation>>> {
    let window = TimeWindow::try_from(params)?;
    Ok(Json(
        state.service.member_reservations(member_id, window).await?,
    ))
}
