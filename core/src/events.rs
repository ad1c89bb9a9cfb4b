//! Booking events published after a change commits.
//!
//! Events are notifications, not the source of truth: the store is. A sink
//! that fails never rolls anything back; the service logs the failure and
//! returns the committed result.

use crate::store::StoreFuture;
use crate::types::{MemberId, Outcome, ReservationId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Something that happened to a reservation or session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    /// A member was admitted into a session.
    ReservationConfirmed {
        /// New reservation
        reservation_id: ReservationId,
        /// Member admitted
        member_id: MemberId,
        /// Session booked
        session_id: SessionId,
        /// When
        at: DateTime<Utc>,
    },
    /// A member gave up a seat.
    ReservationCancelled {
        /// Reservation cancelled
        reservation_id: ReservationId,
        /// Session whose seat was freed
        session_id: SessionId,
        /// When
        at: DateTime<Utc>,
    },
    /// Attendance was recorded.
    OutcomeRecorded {
        /// Reservation marked
        reservation_id: ReservationId,
        /// Recorded outcome
        outcome: Outcome,
        /// When
        at: DateTime<Utc>,
    },
    /// A session was called off.
    SessionCancelled {
        /// Session cancelled
        session_id: SessionId,
        /// When
        at: DateTime<Utc>,
    },
}

impl BookingEvent {
    /// Event type name, used in logs.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::ReservationConfirmed { .. } => "ReservationConfirmed.v1",
            Self::ReservationCancelled { .. } => "ReservationCancelled.v1",
            Self::OutcomeRecorded { .. } => "OutcomeRecorded.v1",
            Self::SessionCancelled { .. } => "SessionCancelled.v1",
        }
    }
}

/// Error returned by a [`BookingEventSink`].
#[derive(Error, Debug)]
pub enum PublishError {
    /// Transport rejected the event.
    #[error("Publish failed: {0}")]
    Transport(String),
}

/// Destination for post-commit booking events.
pub trait BookingEventSink: Send + Sync {
    /// Publish one event.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the event could not be delivered.
    fn publish(&self, event: BookingEvent) -> StoreFuture<'_, Result<(), PublishError>>;
}

/// Default sink: writes each event to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl BookingEventSink for TracingEventSink {
    fn publish(&self, event: BookingEvent) -> StoreFuture<'_, Result<(), PublishError>> {
        Box::pin(async move {
            tracing::info!(event_type = event.event_type(), ?event, "Booking event");
            Ok(())
        })
    }
}
