//! Readiness probe for the Postgres pool.

use sqlx::PgPool;
use std::future::Future;
use std::pin::Pin;
use studio_booking_web::ReadinessProbe;

/// Pings the database with `SELECT 1`.
#[derive(Clone, Debug)]
pub struct DatabaseProbe {
    pool: PgPool,
}

impl DatabaseProbe {
    /// Probe the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ReadinessProbe for DatabaseProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            match sqlx::query("SELECT 1").execute(&self.pool).await {
                Ok(_) => true,
                Err(error) => {
                    tracing::warn!(error = %error, "Database readiness check failed");
                    false
                },
            }
        })
    }
}
