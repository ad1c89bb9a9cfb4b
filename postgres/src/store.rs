//! `PostgreSQL` booking store.
//!
//! # Locking
//!
//! Admission and session cancellation both take `FOR UPDATE` on the session
//! row. Under the default `READ COMMITTED` isolation every statement after
//! the lock sees all reservations committed by earlier lock holders, so the
//! occupancy count and the insert behave as one step:
//!
//! ```text
//! BEGIN
//!   SELECT ... FROM sessions ... FOR UPDATE     -- serialize on the session
//!   SELECT count(*) ... FROM reservations      -- live occupancy
//!   -- AdmissionCheck::evaluate
//!   INSERT INTO reservations ...
//! COMMIT                                       -- releases the row lock
//! ```
//!
//! The partial unique index `idx_reservations_member_session_confirmed` stops
//! a second confirmed row for the same member and session even if a code
//! path forgets the lock.

use crate::rows::{
    ClassRow, MemberReservationRow, MemberRow, ReservationRow, RosterRow, SessionRow,
    is_unique_violation, store_error, to_i32,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use studio_booking_core::capacity::AdmissionCheck;
use studio_booking_core::lifecycle::{self, Transition};
use studio_booking_core::query::{MemberReservation, ReservationQuery, RosterEntry};
use studio_booking_core::store::{NewReservation, ReservationStore, SessionCatalog, StoreFuture};
use studio_booking_core::{
    BookingError, Capacity, ClassDefinition, ClassId, Member, MemberId, Reservation,
    ReservationId, ReservationStatus, Result, Session, SessionId, StoreError, TimeWindow,
};
use uuid::Uuid;

const SESSION_COLUMNS: &str = r"
    s.id, s.class_id, c.name AS class_name, c.capacity, s.starts_at, s.ends_at,
    s.room, s.cancelled, s.cancelled_at, c.active AS class_active
    FROM sessions s
    JOIN classes c ON c.id = s.class_id
    WHERE s.id = $1
";

const RESERVATION_COLUMNS: &str = "id, member_id, session_id, status, created_at, updated_at";

/// `PostgreSQL`-backed implementation of every booking storage contract.
///
/// # Example
///
/// ```no_run
/// use studio_booking_postgres::PostgresBookingStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = sqlx::PgPool::connect("postgres://localhost/booking").await?;
/// let store = PostgresBookingStore::new(pool);
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations for the booking tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if migration fails.
    pub async fn migrate(&self) -> std::result::Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ========================================================================
    // Catalog administration
    // ========================================================================

    /// Add an active class to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    pub async fn create_class(
        &self,
        name: &str,
        capacity: Capacity,
        duration_minutes: u32,
    ) -> std::result::Result<ClassDefinition, StoreError> {
        let row: ClassRow = sqlx::query_as(
            r"
            INSERT INTO classes (id, name, capacity, duration_minutes, active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, name, capacity, duration_minutes, active
            ",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(to_i32(capacity.seats(), "capacity")?)
        .bind(to_i32(duration_minutes, "duration")?)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        tracing::info!(class_id = %row.id, name, %capacity, "Class created");
        row.try_into()
    }

    /// Schedule a session of `class` starting at `starts_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails (for example an unknown class).
    pub async fn schedule_session(
        &self,
        class: &ClassDefinition,
        starts_at: DateTime<Utc>,
        room: Option<&str>,
    ) -> std::result::Result<Session, StoreError> {
        let session_id = SessionId::new();
        let ends_at = starts_at + Duration::minutes(i64::from(class.duration_minutes));

        sqlx::query(
            r"
            INSERT INTO sessions (id, class_id, starts_at, ends_at, room)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(session_id.as_uuid())
        .bind(class.id.as_uuid())
        .bind(starts_at)
        .bind(ends_at)
        .bind(room)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        tracing::info!(%session_id, class_id = %class.id, %starts_at, "Session scheduled");
        self.load_session(session_id)
            .await?
            .ok_or_else(|| StoreError::Database(format!("Session {session_id} vanished after insert")))
    }

    /// Register an active member.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails (for example a taken email).
    pub async fn register_member(&self, name: &str, email: &str) -> std::result::Result<Member, StoreError> {
        let row: MemberRow = sqlx::query_as(
            r"
            INSERT INTO members (id, name, email, active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, name, email, active
            ",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        tracing::info!(member_id = %row.id, "Member registered");
        Ok(row.into())
    }

    /// Activate or deactivate a member. Returns `false` if unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    pub async fn set_member_active(&self, member_id: MemberId, active: bool) -> std::result::Result<bool, StoreError> {
        let result = sqlx::query("UPDATE members SET active = $2 WHERE id = $1")
            .bind(member_id.as_uuid())
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() == 1)
    }

    /// Activate or deactivate a class. Returns `false` if unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    pub async fn set_class_active(&self, class_id: ClassId, active: bool) -> std::result::Result<bool, StoreError> {
        let result = sqlx::query("UPDATE classes SET active = $2 WHERE id = $1")
            .bind(class_id.as_uuid())
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() == 1)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn load_session(&self, session_id: SessionId) -> std::result::Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!("SELECT {SESSION_COLUMNS}"))
            .bind(session_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn lock_session(
        tx: &mut Transaction<'_, Postgres>,
        session_id: SessionId,
    ) -> std::result::Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> =
            sqlx::query_as(&format!("SELECT {SESSION_COLUMNS} FOR UPDATE OF s"))
                .bind(session_id.as_uuid())
                .fetch_optional(&mut **tx)
                .await
                .map_err(store_error)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn admit_in_tx(&self, request: NewReservation) -> Result<Reservation> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let session = Self::lock_session(&mut tx, request.session_id).await?;

        let member: Option<Member> = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, email, active FROM members WHERE id = $1",
        )
        .bind(request.member_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?
        .map(Into::into);

        let (occupancy, member_confirmed): (i64, bool) = sqlx::query_as(
            r"
            SELECT
                COUNT(*) FILTER (WHERE status <> 'cancelled'),
                COALESCE(BOOL_OR(member_id = $2 AND status = 'confirmed'), FALSE)
            FROM reservations
            WHERE session_id = $1
            ",
        )
        .bind(request.session_id.as_uuid())
        .bind(request.member_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        AdmissionCheck {
            member_id: request.member_id,
            session_id: request.session_id,
            member: member.as_ref(),
            session: session.as_ref(),
            occupancy: u32::try_from(occupancy)
                .map_err(|_| StoreError::Corrupt(format!("occupancy out of range: {occupancy}")))?,
            member_confirmed,
        }
        .evaluate()?;

        let reservation = lifecycle::admit(
            request.id,
            request.member_id,
            request.session_id,
            request.created_at,
        );

        let inserted = sqlx::query(&format!(
            "INSERT INTO reservations ({RESERVATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(reservation.id.as_uuid())
        .bind(reservation.member_id.as_uuid())
        .bind(reservation.session_id.as_uuid())
        .bind(reservation.status.as_str())
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(error) = inserted {
            if is_unique_violation(&error) {
                metrics::counter!("booking_store_unique_violations_total").increment(1);
                tracing::warn!(
                    member_id = %request.member_id,
                    session_id = %request.session_id,
                    "Unique index rejected a second seat for the same member"
                );
                return Err(BookingError::Duplicate {
                    member_id: request.member_id,
                    session_id: request.session_id,
                });
            }
            return Err(store_error(error).into());
        }

        tx.commit().await.map_err(store_error)?;
        Ok(reservation)
    }

    async fn transition_in_tx(
        &self,
        reservation_id: ReservationId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<Reservation> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE"
        ))
        .bind(reservation_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        let mut reservation: Reservation = row
            .ok_or(BookingError::ReservationNotFound(reservation_id))?
            .try_into()?;
        lifecycle::apply(&mut reservation, transition, at)?;

        sqlx::query("UPDATE reservations SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(reservation.id.as_uuid())
            .bind(reservation.status.as_str())
            .bind(reservation.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        Ok(reservation)
    }

    async fn cancel_session_in_tx(&self, session_id: SessionId, at: DateTime<Utc>) -> Result<Session> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let mut session = Self::lock_session(&mut tx, session_id)
            .await?
            .ok_or(BookingError::SessionNotFound(session_id))?;
        if session.cancelled {
            return Err(BookingError::SessionCancelled(session_id));
        }

        sqlx::query("UPDATE sessions SET cancelled = TRUE, cancelled_at = $2 WHERE id = $1")
            .bind(session_id.as_uuid())
            .bind(at)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        session.cancelled = true;
        session.cancelled_at = Some(at);
        Ok(session)
    }

    async fn member_exists(&self, member_id: MemberId) -> std::result::Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM members WHERE id = $1)")
            .bind(member_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(exists)
    }

    async fn session_exists(&self, session_id: SessionId) -> std::result::Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM sessions WHERE id = $1)")
            .bind(session_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(exists)
    }

    async fn load_member_view(
        &self,
        member_id: MemberId,
        window: TimeWindow,
    ) -> Result<Vec<MemberReservation>> {
        if !self.member_exists(member_id).await? {
            return Err(BookingError::MemberNotFound(member_id));
        }

        let rows: Vec<MemberReservationRow> = sqlx::query_as(
            r"
            SELECT r.id, r.member_id, r.session_id, r.status, r.created_at, r.updated_at,
                   c.name AS class_name, s.starts_at, s.ends_at, s.room,
                   s.cancelled AS session_cancelled
            FROM reservations r
            JOIN sessions s ON s.id = r.session_id
            JOIN classes c ON c.id = s.class_id
            WHERE r.member_id = $1
              AND ($2::timestamptz IS NULL OR s.starts_at >= $2)
              AND ($3::timestamptz IS NULL OR s.starts_at < $3)
            ORDER BY s.starts_at, r.created_at, r.id
            ",
        )
        .bind(member_id.as_uuid())
        .bind(window.from)
        .bind(window.to)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(|row| MemberReservation::try_from(row).map_err(BookingError::from))
            .collect()
    }

    async fn load_roster(&self, session_id: SessionId) -> Result<Vec<RosterEntry>> {
        if !self.session_exists(session_id).await? {
            return Err(BookingError::SessionNotFound(session_id));
        }

        let rows: Vec<RosterRow> = sqlx::query_as(
            r"
            SELECT r.id AS reservation_id, r.member_id, m.name AS member_name,
                   r.status, r.created_at, r.updated_at
            FROM reservations r
            JOIN members m ON m.id = r.member_id
            WHERE r.session_id = $1
            ORDER BY r.created_at, r.id
            ",
        )
        .bind(session_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(|row| RosterEntry::try_from(row).map_err(BookingError::from))
            .collect()
    }
}

impl SessionCatalog for PostgresBookingStore {
    fn get_session(&self, session_id: SessionId) -> StoreFuture<'_, std::result::Result<Option<Session>, StoreError>> {
        Box::pin(self.load_session(session_id))
    }

    fn cancel_session(&self, session_id: SessionId, at: DateTime<Utc>) -> StoreFuture<'_, Result<Session>> {
        Box::pin(self.cancel_session_in_tx(session_id, at))
    }
}

impl ReservationStore for PostgresBookingStore {
    fn admit(&self, request: NewReservation) -> StoreFuture<'_, Result<Reservation>> {
        Box::pin(self.admit_in_tx(request))
    }

    fn transition(
        &self,
        reservation_id: ReservationId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, Result<Reservation>> {
        Box::pin(self.transition_in_tx(reservation_id, transition, at))
    }

    fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> StoreFuture<'_, std::result::Result<Option<Reservation>, StoreError>> {
        Box::pin(async move {
            let row: Option<ReservationRow> = sqlx::query_as(&format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
            ))
            .bind(reservation_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
            row.map(TryInto::try_into).transpose()
        })
    }

    fn occupancy(&self, session_id: SessionId) -> StoreFuture<'_, std::result::Result<u32, StoreError>> {
        Box::pin(async move {
            let (count,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM reservations WHERE session_id = $1 AND status <> $2",
            )
            .bind(session_id.as_uuid())
            .bind(ReservationStatus::Cancelled.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
            u32::try_from(count).map_err(|_| StoreError::Corrupt(format!("occupancy out of range: {count}")))
        })
    }
}

impl ReservationQuery for PostgresBookingStore {
    fn member_reservations(
        &self,
        member_id: MemberId,
        window: TimeWindow,
    ) -> StoreFuture<'_, Result<Vec<MemberReservation>>> {
        Box::pin(self.load_member_view(member_id, window))
    }

    fn session_roster(&self, session_id: SessionId) -> StoreFuture<'_, Result<Vec<RosterEntry>>> {
        Box::pin(self.load_roster(session_id))
    }
}
