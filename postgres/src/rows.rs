//! Row types and their mapping to domain values.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use studio_booking_core::{
    Capacity, ClassDefinition, ClassId, Member, MemberId, MemberReservation, Reservation,
    ReservationId, ReservationStatus, RosterEntry, Session, SessionId, StoreError,
};
use uuid::Uuid;

/// Map a sqlx error to a [`StoreError`].
///
/// Pool exhaustion and I/O failures mean the database could not be reached;
/// everything else is a query failure.
pub(crate) fn store_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(error.to_string())
        },
        other => StoreError::Database(other.to_string()),
    }
}

/// Whether an error is a unique constraint violation (`23505`).
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.code().as_deref() == Some("23505"))
}

fn status(raw: &str) -> Result<ReservationStatus, StoreError> {
    ReservationStatus::parse(raw).map_err(StoreError::Corrupt)
}

pub(crate) fn to_i32(value: u32, what: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Database(format!("{what} out of range: {value}")))
}

fn to_u32(value: i32, what: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {what}: {value}")))
}

fn capacity(value: i32) -> Result<Capacity, StoreError> {
    Capacity::new(to_u32(value, "capacity")?)
        .ok_or_else(|| StoreError::Corrupt("zero capacity".to_string()))
}

#[derive(Debug, FromRow)]
pub(crate) struct MemberRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub active: bool,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Self {
            id: MemberId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            active: row.active,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ClassRow {
    pub id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub duration_minutes: i32,
    pub active: bool,
}

impl TryFrom<ClassRow> for ClassDefinition {
    type Error = StoreError;

    fn try_from(row: ClassRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ClassId::from_uuid(row.id),
            name: row.name,
            capacity: capacity(row.capacity)?,
            duration_minutes: to_u32(row.duration_minutes, "duration")?,
            active: row.active,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct SessionRow {
    pub id: Uuid,
    pub class_id: Uuid,
    pub class_name: String,
    pub capacity: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub room: Option<String>,
    pub cancelled: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub class_active: bool,
}

impl TryFrom<SessionRow> for Session {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SessionId::from_uuid(row.id),
            class_id: ClassId::from_uuid(row.class_id),
            class_name: row.class_name,
            capacity: capacity(row.capacity)?,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            room: row.room,
            cancelled: row.cancelled,
            cancelled_at: row.cancelled_at,
            class_active: row.class_active,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReservationRow {
    pub id: Uuid,
    pub member_id: Uuid,
    pub session_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReservationId::from_uuid(row.id),
            member_id: MemberId::from_uuid(row.member_id),
            session_id: SessionId::from_uuid(row.session_id),
            status: status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct MemberReservationRow {
    #[sqlx(flatten)]
    pub reservation: ReservationRow,
    pub class_name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub room: Option<String>,
    pub session_cancelled: bool,
}

impl TryFrom<MemberReservationRow> for MemberReservation {
    type Error = StoreError;

    fn try_from(row: MemberReservationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            reservation: row.reservation.try_into()?,
            class_name: row.class_name,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            room: row.room,
            session_cancelled: row.session_cancelled,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct RosterRow {
    pub reservation_id: Uuid,
    pub member_id: Uuid,
    pub member_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RosterRow> for RosterEntry {
    type Error = StoreError;

    fn try_from(row: RosterRow) -> Result<Self, Self::Error> {
        Ok(Self {
            reservation_id: ReservationId::from_uuid(row.reservation_id),
            member_id: MemberId::from_uuid(row.member_id),
            member_name: row.member_name,
            status: status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_corrupt() {
        let row = ReservationRow {
            id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            status: "waitlisted".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(Reservation::try_from(row), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn zero_capacity_is_corrupt() {
        assert!(matches!(capacity(0), Err(StoreError::Corrupt(_))));
        assert!(matches!(capacity(-3), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn pool_timeout_is_unavailable() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
