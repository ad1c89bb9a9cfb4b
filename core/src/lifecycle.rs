//! Reservation lifecycle state machine.
//!
//! Every status a reservation ever takes is written here and nowhere else:
//! [`admit`] produces the initial `Confirmed` record and [`apply`] performs
//! every later transition.
//!
//! # State Machine
//!
//! ```text
//!              ┌──── Cancel ─────────▶ Cancelled
//!              │
//! Confirmed ───┼──── Outcome(Attended) ▶ Attended
//!              │
//!              └──── Outcome(NoShow) ──▶ NoShow
//! ```
//!
//! `Cancelled`, `Attended` and `NoShow` are terminal. Only `Cancel` releases
//! the seat; outcomes keep it because the seat was used for the session.

use crate::error::{BookingError, Result};
use crate::types::{MemberId, Outcome, Reservation, ReservationId, ReservationStatus, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A requested status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "outcome")]
pub enum Transition {
    /// Member gives up the seat
    Cancel,
    /// Staff records attendance
    RecordOutcome(Outcome),
}

impl Transition {
    /// Status reached when the transition succeeds.
    #[must_use]
    pub const fn target(self) -> ReservationStatus {
        match self {
            Self::Cancel => ReservationStatus::Cancelled,
            Self::RecordOutcome(outcome) => outcome.status(),
        }
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::RecordOutcome(Outcome::Attended) => "attended",
            Self::RecordOutcome(Outcome::NoShow) => "no_show",
        }
    }
}

/// Build the record for a freshly admitted reservation.
#[must_use]
pub const fn admit(
    id: ReservationId,
    member_id: MemberId,
    session_id: SessionId,
    at: DateTime<Utc>,
) -> Reservation {
    Reservation {
        id,
        member_id,
        session_id,
        status: ReservationStatus::Confirmed,
        created_at: at,
        updated_at: at,
    }
}

/// Check a transition against the current status without mutating anything.
///
/// # Errors
///
/// - [`BookingError::AlreadyTerminal`] when cancelling a terminal reservation
/// - [`BookingError::NotConfirmed`] when recording an outcome on anything but
///   a confirmed reservation
pub fn validate(reservation: &Reservation, transition: Transition) -> Result<()> {
    if reservation.status == ReservationStatus::Confirmed {
        return Ok(());
    }

    Err(match transition {
        Transition::Cancel => BookingError::AlreadyTerminal {
            reservation_id: reservation.id,
            status: reservation.status,
        },
        Transition::RecordOutcome(_) => BookingError::NotConfirmed {
            reservation_id: reservation.id,
            status: reservation.status,
        },
    })
}

/// Apply a transition in place.
///
/// Only `status` and `updated_at` change. On error the reservation is left
/// untouched.
///
/// # Errors
///
/// See [`validate`].
pub fn apply(reservation: &mut Reservation, transition: Transition, at: DateTime<Utc>) -> Result<()> {
    validate(reservation, transition)?;
    reservation.status = transition.target();
    reservation.updated_at = at.max(reservation.updated_at);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn confirmed() -> Reservation {
        admit(ReservationId::new(), MemberId::new(), SessionId::new(), Utc::now())
    }

    #[test]
    fn admitted_reservation_is_confirmed() {
        let reservation = confirmed();
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        assert_eq!(reservation.created_at, reservation.updated_at);
    }

    #[test]
    fn cancel_then_cancel_is_already_terminal() {
        let mut reservation = confirmed();
        let later = reservation.created_at + Duration::minutes(5);

        apply(&mut reservation, Transition::Cancel, later).unwrap();
        assert_eq!(reservation.status, ReservationStatus::Cancelled);
        assert_eq!(reservation.updated_at, later);

        let error = apply(&mut reservation, Transition::Cancel, later).unwrap_err();
        assert!(matches!(
            error,
            BookingError::AlreadyTerminal {
                status: ReservationStatus::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn cancel_then_outcome_is_not_confirmed() {
        let mut reservation = confirmed();
        apply(&mut reservation, Transition::Cancel, Utc::now()).unwrap();

        let error = apply(
            &mut reservation,
            Transition::RecordOutcome(Outcome::Attended),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(error, BookingError::NotConfirmed { .. }));
        assert_eq!(reservation.status, ReservationStatus::Cancelled);
    }

    #[test]
    fn attended_cannot_be_cancelled() {
        let mut reservation = confirmed();
        apply(
            &mut reservation,
            Transition::RecordOutcome(Outcome::Attended),
            Utc::now(),
        )
        .unwrap();

        assert!(matches!(
            apply(&mut reservation, Transition::Cancel, Utc::now()),
            Err(BookingError::AlreadyTerminal {
                status: ReservationStatus::Attended,
                ..
            })
        ));
    }

    #[test]
    fn updated_at_never_moves_backwards() {
        let mut reservation = confirmed();
        let earlier = reservation.created_at - Duration::seconds(30);
        apply(&mut reservation, Transition::Cancel, earlier).unwrap();
        assert_eq!(reservation.updated_at, reservation.created_at);
    }

    fn any_transition() -> impl Strategy<Value = Transition> {
        prop_oneof![
            Just(Transition::Cancel),
            Just(Transition::RecordOutcome(Outcome::Attended)),
            Just(Transition::RecordOutcome(Outcome::NoShow)),
        ]
    }

    proptest! {
        /// Whatever sequence is thrown at a reservation, exactly the first
        /// transition succeeds and the identity fields never change.
        #[test]
        fn first_transition_wins(transitions in prop::collection::vec(any_transition(), 1..8)) {
            let mut reservation = confirmed();
            let original = reservation.clone();

            let results: Vec<_> = transitions
                .iter()
                .map(|t| apply(&mut reservation, *t, Utc::now()))
                .collect();

            prop_assert!(results[0].is_ok());
            prop_assert!(results[1..].iter().all(|result| result.is_err()));
            prop_assert_eq!(reservation.status, transitions[0].target());
            prop_assert_eq!(reservation.id, original.id);
            prop_assert_eq!(reservation.member_id, original.member_id);
            prop_assert_eq!(reservation.session_id, original.session_id);
            prop_assert_eq!(reservation.created_at, original.created_at);
        }
    }
}
