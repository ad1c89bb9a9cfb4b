//! Read-side views: a member's schedule and a session roster.
//!
//! Views are read without locks and may be stale by the time they are
//! returned. They must never show a reservation that was not committed.

use crate::error::Result;
use crate::store::StoreFuture;
use crate::types::{
    MemberId, Reservation, ReservationId, ReservationStatus, SessionId, TimeWindow,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reservation joined with the session details a member wants to see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReservation {
    /// The reservation itself
    pub reservation: Reservation,
    /// Class name
    pub class_name: String,
    /// Session start
    pub starts_at: DateTime<Utc>,
    /// Session end
    pub ends_at: DateTime<Utc>,
    /// Room, if assigned
    pub room: Option<String>,
    /// Whether the session was called off
    pub session_cancelled: bool,
}

/// One line of a session roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Reservation ID
    pub reservation_id: ReservationId,
    /// Member holding the reservation
    pub member_id: MemberId,
    /// Member display name
    pub member_name: String,
    /// Reservation status
    pub status: ReservationStatus,
    /// When the reservation was admitted
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

/// Read-only queries over reservations.
pub trait ReservationQuery: Send + Sync {
    /// Reservations of a member whose session starts inside `window`, in
    /// every status, ordered by session start.
    ///
    /// # Errors
    ///
    /// - [`crate::BookingError::MemberNotFound`]
    /// - [`crate::BookingError::Store`]
    fn member_reservations(
        &self,
        member_id: MemberId,
        window: TimeWindow,
    ) -> StoreFuture<'_, Result<Vec<MemberReservation>>>;

    /// Every reservation of a session, in every status, ordered by admission
    /// time.
    ///
    /// # Errors
    ///
    /// - [`crate::BookingError::SessionNotFound`]
    /// - [`crate::BookingError::Store`]
    fn session_roster(&self, session_id: SessionId) -> StoreFuture<'_, Result<Vec<RosterEntry>>>;
}

/// Sort a member view by session start, then reservation creation.
pub fn sort_member_view(view: &mut [MemberReservation]) {
    view.sort_by(|a, b| {
        a.starts_at
            .cmp(&b.starts_at)
            .then_with(|| a.reservation.created_at.cmp(&b.reservation.created_at))
            .then_with(|| a.reservation.id.cmp(&b.reservation.id))
    });
}

/// Sort a roster by admission time.
pub fn sort_roster(roster: &mut [RosterEntry]) {
    roster.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.reservation_id.cmp(&b.reservation_id))
    });
}
