//! Error taxonomy for booking operations.
//!
//! Every rejection a caller can trigger is a typed [`BookingError`] variant.
//! Only [`StoreError`] represents an infrastructure failure; it is never
//! retried here, the calling layer owns retry policy.

use crate::types::{MemberId, ReservationId, ReservationStatus, SessionId};
use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database rejected or failed the query.
    #[error("Database error: {0}")]
    Database(String),

    /// Backend could not be reached (pool exhausted, connection refused).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be mapped back to a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Classification of [`BookingError`], used by transports to pick a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced member, session or reservation does not exist.
    NotFound,
    /// The referenced entity is in a state that forbids the operation.
    InvalidState,
    /// The operation collides with existing reservations.
    Conflict,
    /// The store failed.
    Infrastructure,
}

/// Errors returned by booking operations.
#[derive(Error, Debug)]
pub enum BookingError {
    /// Member does not exist.
    #[error("Member {0} not found")]
    MemberNotFound(MemberId),

    /// Session does not exist.
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    /// Reservation does not exist.
    #[error("Reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// Member account is inactive.
    #[error("Member {0} is inactive")]
    MemberInactive(MemberId),

    /// The class owning the session is no longer offered.
    #[error("Class for session {0} is inactive")]
    ClassInactive(SessionId),

    /// Session was cancelled.
    #[error("Session {0} is cancelled")]
    SessionCancelled(SessionId),

    /// Reservation already reached a terminal status.
    #[error("Reservation {reservation_id} is already {status}")]
    AlreadyTerminal {
        /// Reservation that was targeted
        reservation_id: ReservationId,
        /// Its current status
        status: ReservationStatus,
    },

    /// Outcome can only be recorded on a confirmed reservation.
    #[error("Reservation {reservation_id} is {status}, not confirmed")]
    NotConfirmed {
        /// Reservation that was targeted
        reservation_id: ReservationId,
        /// Its current status
        status: ReservationStatus,
    },

    /// Member already holds a seat in this session.
    #[error("Member {member_id} already holds a reservation for session {session_id}")]
    Duplicate {
        /// Member that asked again
        member_id: MemberId,
        /// Session already booked
        session_id: SessionId,
    },

    /// Every seat is taken.
    #[error("Session {session_id} is full ({capacity} seats)")]
    Full {
        /// Session at capacity
        session_id: SessionId,
        /// Its capacity
        capacity: u32,
    },

    /// Infrastructure failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    /// Taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MemberNotFound(_) | Self::SessionNotFound(_) | Self::ReservationNotFound(_) => {
                ErrorKind::NotFound
            },
            Self::MemberInactive(_)
            | Self::ClassInactive(_)
            | Self::SessionCancelled(_)
            | Self::AlreadyTerminal { .. }
            | Self::NotConfirmed { .. } => ErrorKind::InvalidState,
            Self::Duplicate { .. } | Self::Full { .. } => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Infrastructure,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MemberNotFound(_) | Self::SessionNotFound(_) | Self::ReservationNotFound(_) => {
                "NOT_FOUND"
            },
            Self::MemberInactive(_) | Self::ClassInactive(_) => "INACTIVE",
            Self::SessionCancelled(_) => "CANCELLED",
            Self::AlreadyTerminal { .. } => "ALREADY_TERMINAL",
            Self::NotConfirmed { .. } => "NOT_CONFIRMED",
            Self::Duplicate { .. } => "DUPLICATE",
            Self::Full { .. } => "FULL",
            Self::Store(StoreError::Unavailable(_)) => "STORE_UNAVAILABLE",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

/// Result type for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_error_display() {
        let session_id = SessionId::new();
        let error = BookingError::Full {
            session_id,
            capacity: 12,
        };

        let display = format!("{error}");
        assert!(display.contains(&session_id.to_string()));
        assert!(display.contains("12 seats"));
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(error.code(), "FULL");
    }

    #[test]
    fn inactive_member_and_class_share_a_code() {
        let member = BookingError::MemberInactive(MemberId::new());
        let class = BookingError::ClassInactive(SessionId::new());

        assert_eq!(member.code(), "INACTIVE");
        assert_eq!(class.code(), "INACTIVE");
        assert_eq!(member.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn store_errors_are_infrastructure() {
        let error = BookingError::from(StoreError::Unavailable("pool timed out".into()));
        assert_eq!(error.kind(), ErrorKind::Infrastructure);
        assert_eq!(error.code(), "STORE_UNAVAILABLE");
        assert_eq!(error.to_string(), "Store unavailable: pool timed out");
    }
}
