//! Domain types for class bookings.
//!
//! Identifiers, the session/member snapshots read from the catalog, and the
//! reservation record whose status is driven by [`crate::lifecycle`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a member
    MemberId
);
define_id!(
    /// Unique identifier for a class definition
    ClassId
);
define_id!(
    /// Unique identifier for a scheduled session
    SessionId
);
define_id!(
    /// Unique identifier for a reservation
    ReservationId
);

// ============================================================================
// Value Objects
// ============================================================================

/// Number of seats a class offers per session. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Capacity(u32);

impl Capacity {
    /// Creates a capacity, or `None` for zero seats.
    #[must_use]
    pub const fn new(seats: u32) -> Option<Self> {
        if seats == 0 { None } else { Some(Self(seats)) }
    }

    /// Number of seats
    #[must_use]
    pub const fn seats(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Capacity {
    type Error = String;

    fn try_from(seats: u32) -> Result<Self, Self::Error> {
        Self::new(seats).ok_or_else(|| "capacity must be positive".to_string())
    }
}

impl From<Capacity> for u32 {
    fn from(capacity: Capacity) -> Self {
        capacity.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open window `[from, to)` over session start times.
///
/// Either bound may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive lower bound
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub to: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// A window with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { from: None, to: None }
    }

    /// A window between two instants.
    #[must_use]
    pub const fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Whether `instant` falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| instant >= from) && self.to.is_none_or(|to| instant < to)
    }
}

// ============================================================================
// Catalog Records
// ============================================================================

/// A gym member as seen by the booking core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member ID
    pub id: MemberId,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Inactive members cannot book
    pub active: bool,
}

/// A class definition in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinition {
    /// Class ID
    pub id: ClassId,
    /// Class name (e.g. "Morning Yoga")
    pub name: String,
    /// Seats per session
    pub capacity: Capacity,
    /// Nominal duration in minutes
    pub duration_minutes: u32,
    /// Inactive classes accept no bookings
    pub active: bool,
}

/// One scheduled occurrence of a class, joined with the class fields the
/// capacity gate needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID
    pub id: SessionId,
    /// Owning class
    pub class_id: ClassId,
    /// Owning class name
    pub class_name: String,
    /// Seats available in this session
    pub capacity: Capacity,
    /// Scheduled start
    pub starts_at: DateTime<Utc>,
    /// Scheduled end
    pub ends_at: DateTime<Utc>,
    /// Room, if assigned
    pub room: Option<String>,
    /// Session was called off
    pub cancelled: bool,
    /// When the session was called off
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Owning class is still offered
    pub class_active: bool,
}

// ============================================================================
// Reservations
// ============================================================================

/// Reservation status.
///
/// `Confirmed` is the only non-terminal state. Transitions between these
/// values happen exclusively in [`crate::lifecycle::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Seat is held for the member
    Confirmed,
    /// Member cancelled; the seat is free again
    Cancelled,
    /// Member showed up
    Attended,
    /// Member did not show up
    NoShow,
}

impl ReservationStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Confirmed, Self::Cancelled, Self::Attended, Self::NoShow];

    /// Convert status to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Attended => "attended",
            Self::NoShow => "no_show",
        }
    }

    /// Parse status from database string.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized string if it doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "attended" => Ok(Self::Attended),
            "no_show" => Ok(Self::NoShow),
            other => Err(format!("Invalid reservation status: {other}")),
        }
    }

    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Confirmed)
    }

    /// Whether a reservation in this status consumes a seat.
    ///
    /// Attendance outcomes keep the seat: it was used for the session.
    #[must_use]
    pub const fn holds_seat(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attendance outcome recorded after a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Member attended
    Attended,
    /// Member did not show
    NoShow,
}

impl Outcome {
    /// The status this outcome moves a reservation to.
    #[must_use]
    pub const fn status(self) -> ReservationStatus {
        match self {
            Self::Attended => ReservationStatus::Attended,
            Self::NoShow => ReservationStatus::NoShow,
        }
    }
}

/// One member's claim on one seat of one session.
///
/// Never deleted; the status is the history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation ID
    pub id: ReservationId,
    /// Member holding the seat
    pub member_id: MemberId,
    /// Session the seat belongs to
    pub session_id: SessionId,
    /// Current status
    pub status: ReservationStatus,
    /// When the reservation was admitted
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}
