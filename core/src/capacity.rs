//! Capacity gate: the admission decision.
//!
//! The gate is split in two. This module holds the pure verdict over a
//! snapshot; the store holds the atomicity. A store implementation must:
//!
//! 1. serialize on the session (row lock, or a store-wide lock in memory),
//! 2. load the member, the session and the live occupancy under that lock,
//! 3. call [`AdmissionCheck::evaluate`],
//! 4. insert the confirmed reservation before releasing the lock.
//!
//! ```text
//! CRITICAL: occupancy is counted under the session lock
//!
//! request A ──lock(session)──count──insert──commit──┐
//! request B ──────────────────────wait───────────────┴──lock──count──Full
//! ```
//!
//! Counting first and inserting afterwards without the lock is the classic
//! check-then-act race: both requests would see one free seat.

use crate::error::{BookingError, Result};
use crate::types::{Member, MemberId, ReservationStatus, Session, SessionId};
use serde::{Deserialize, Serialize};

/// Snapshot a store loads, under the session lock, before admitting.
#[derive(Clone, Copy, Debug)]
pub struct AdmissionCheck<'a> {
    /// Member asking for a seat
    pub member_id: MemberId,
    /// Session being booked
    pub session_id: SessionId,
    /// Member record, if it exists
    pub member: Option<&'a Member>,
    /// Session record, if it exists
    pub session: Option<&'a Session>,
    /// Seats currently held in the session
    pub occupancy: u32,
    /// Whether the member already holds a confirmed reservation here
    pub member_confirmed: bool,
}

impl AdmissionCheck<'_> {
    /// Decide whether a new confirmed reservation may be created.
    ///
    /// Rejections are checked in a fixed order: member, session, class,
    /// duplicate, capacity.
    ///
    /// # Errors
    ///
    /// - [`BookingError::MemberNotFound`] / [`BookingError::MemberInactive`]
    /// - [`BookingError::SessionNotFound`] / [`BookingError::SessionCancelled`]
    /// - [`BookingError::ClassInactive`]
    /// - [`BookingError::Duplicate`]
    /// - [`BookingError::Full`]
    pub fn evaluate(&self) -> Result<()> {
        let member = self
            .member
            .ok_or(BookingError::MemberNotFound(self.member_id))?;
        if !member.active {
            return Err(BookingError::MemberInactive(self.member_id));
        }

        let session = self
            .session
            .ok_or(BookingError::SessionNotFound(self.session_id))?;
        if session.cancelled {
            return Err(BookingError::SessionCancelled(self.session_id));
        }
        if !session.class_active {
            return Err(BookingError::ClassInactive(self.session_id));
        }

        if self.member_confirmed {
            return Err(BookingError::Duplicate {
                member_id: self.member_id,
                session_id: self.session_id,
            });
        }

        if self.occupancy >= session.capacity.seats() {
            return Err(BookingError::Full {
                session_id: self.session_id,
                capacity: session.capacity.seats(),
            });
        }

        Ok(())
    }
}

/// Count the seats held by a set of reservation statuses.
#[must_use]
pub fn occupancy<'a, I>(statuses: I) -> u32
where
    I: IntoIterator<Item = &'a ReservationStatus>,
{
    let held = statuses.into_iter().filter(|status| status.holds_seat()).count();
    u32::try_from(held).unwrap_or(u32::MAX)
}

/// Read-only availability snapshot for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Session ID
    pub session_id: SessionId,
    /// Total seats
    pub capacity: u32,
    /// Seats held
    pub occupancy: u32,
    /// Seats left (zero when cancelled or inactive)
    pub remaining: u32,
    /// Session was called off
    pub cancelled: bool,
    /// Owning class is still offered
    pub class_active: bool,
}

impl Availability {
    /// Build the snapshot from a session and its live occupancy.
    #[must_use]
    pub fn of(session: &Session, occupancy: u32) -> Self {
        let capacity = session.capacity.seats();
        let bookable = !session.cancelled && session.class_active;
        Self {
            session_id: session.id,
            capacity,
            occupancy,
            remaining: if bookable { capacity.saturating_sub(occupancy) } else { 0 },
            cancelled: session.cancelled,
            class_active: session.class_active,
        }
    }
}
