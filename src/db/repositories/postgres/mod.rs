//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;
use uuid::Uuid;

use crate::api::{DailySession, SessionId, SubscriptionRecord, TimeSlot, UserId};
use crate::db::repository::{
    ErrorContext, FullRepository, RepositoryError, RepositoryResult, SessionRepository,
    SlotRepository, SubscriptionRepository,
};

mod models;
mod schema;

use models::{SessionRow, SlotRow, SubscriptionRow};
use schema::{daily_sessions, push_subscriptions, time_slots};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let parse_u32 = |key: &str, default: u32| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(default)
        };
        let parse_u64 = |key: &str, default: u64| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            database_url,
            max_pool_size: parse_u32("PG_POOL_MAX", 10),
            min_pool_size: parse_u32("PG_POOL_MIN", 1),
            connection_timeout_sec: parse_u64("PG_CONN_TIMEOUT_SEC", 30),
            idle_timeout_sec: parse_u64("PG_IDLE_TIMEOUT_SEC", 600),
            max_retries: parse_u32("PG_MAX_RETRIES", 3),
            retry_delay_ms: parse_u64("PG_RETRY_DELAY_MS", 100),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient
    /// failures (connection errors, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

#[async_trait]
impl SessionRepository for PostgresRepository {
    async fn upsert_session(&self, session: &DailySession) -> RepositoryResult<DailySession> {
        let row = SessionRow::from(session);
        let stored = self
            .with_conn(move |conn| {
                diesel::insert_into(daily_sessions::table)
                    .values(&row)
                    .on_conflict((daily_sessions::user_id, daily_sessions::date))
                    .do_update()
                    .set((
                        daily_sessions::start_time.eq(row.start_time),
                        daily_sessions::end_time.eq(row.end_time),
                    ))
                    .get_result::<SessionRow>(conn)
                    .map_err(|e| {
                        RepositoryError::from(e).with_operation("upsert_session")
                    })
            })
            .await?;
        Ok(stored.into())
    }

    async fn find_session(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DailySession>> {
        let uid = user_id.value();
        let row = self
            .with_conn(move |conn| {
                daily_sessions::table
                    .filter(daily_sessions::user_id.eq(uid))
                    .filter(daily_sessions::date.eq(date))
                    .first::<SessionRow>(conn)
                    .optional()
                    .map_err(|e| RepositoryError::from(e).with_operation("find_session"))
            })
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_session_by_id(&self, id: SessionId) -> RepositoryResult<Option<DailySession>> {
        let sid = id.value();
        let row = self
            .with_conn(move |conn| {
                daily_sessions::table
                    .find(sid)
                    .first::<SessionRow>(conn)
                    .optional()
                    .map_err(|e| RepositoryError::from(e).with_operation("find_session_by_id"))
            })
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_active_sessions(&self, date: NaiveDate) -> RepositoryResult<Vec<DailySession>> {
        let rows = self
            .with_conn(move |conn| {
                daily_sessions::table
                    .filter(daily_sessions::date.eq(date))
                    .filter(daily_sessions::start_time.is_not_null())
                    .filter(daily_sessions::end_time.is_null())
                    .load::<SessionRow>(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("list_active_sessions"))
            })
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_sessions_in_range(
        &self,
        user_id: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<DailySession>> {
        let uid = user_id.value();
        let rows = self
            .with_conn(move |conn| {
                daily_sessions::table
                    .filter(daily_sessions::user_id.eq(uid))
                    .filter(daily_sessions::date.between(from, to))
                    .order(daily_sessions::date.asc())
                    .load::<SessionRow>(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("list_sessions_in_range"))
            })
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl SlotRepository for PostgresRepository {
    async fn upsert_slot(&self, slot: &TimeSlot) -> RepositoryResult<TimeSlot> {
        let row = SlotRow::from(slot);
        let stored = self
            .with_conn(move |conn| {
                diesel::insert_into(time_slots::table)
                    .values(&row)
                    .on_conflict((time_slots::session_id, time_slots::slot_time))
                    .do_update()
                    .set((
                        time_slots::activity.eq(row.activity.clone()),
                        time_slots::condition_score.eq(row.condition_score),
                    ))
                    .get_result::<SlotRow>(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("upsert_slot"))
            })
            .await?;
        stored.try_into()
    }

    async fn delete_slot(
        &self,
        session_id: SessionId,
        slot_time: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let sid = session_id.value();
        let deleted = self
            .with_conn(move |conn| {
                diesel::delete(
                    time_slots::table
                        .filter(time_slots::session_id.eq(sid))
                        .filter(time_slots::slot_time.eq(slot_time)),
                )
                .execute(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("delete_slot"))
            })
            .await?;
        Ok(deleted > 0)
    }

    async fn list_slots(&self, session_id: SessionId) -> RepositoryResult<Vec<TimeSlot>> {
        let sid = session_id.value();
        let rows = self
            .with_conn(move |conn| {
                time_slots::table
                    .filter(time_slots::session_id.eq(sid))
                    .order(time_slots::slot_time.asc())
                    .load::<SlotRow>(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("list_slots"))
            })
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_slots_for_user_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Vec<TimeSlot>> {
        let uid = user_id.value();
        let rows = self
            .with_conn(move |conn| {
                time_slots::table
                    .filter(time_slots::user_id.eq(uid))
                    .filter(time_slots::slot_time.ge(since))
                    .order(time_slots::slot_time.asc())
                    .load::<SlotRow>(conn)
                    .map_err(|e| {
                        RepositoryError::from(e).with_operation("list_slots_for_user_since")
                    })
            })
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresRepository {
    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> RepositoryResult<()> {
        let row = SubscriptionRow::try_from(record)?;
        self.with_conn(move |conn| {
            diesel::insert_into(push_subscriptions::table)
                .values(&row)
                .on_conflict(push_subscriptions::user_id)
                .do_update()
                .set((
                    push_subscriptions::subscription.eq(row.subscription.clone()),
                    push_subscriptions::updated_at.eq(row.updated_at),
                ))
                .execute(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("upsert_subscription"))?;
            Ok(())
        })
        .await
    }

    async fn delete_subscription(&self, user_id: UserId) -> RepositoryResult<bool> {
        let uid = user_id.value();
        let deleted = self
            .with_conn(move |conn| {
                diesel::delete(push_subscriptions::table.find(uid))
                    .execute(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("delete_subscription"))
            })
            .await?;
        Ok(deleted > 0)
    }

    async fn find_subscription(
        &self,
        user_id: UserId,
    ) -> RepositoryResult<Option<SubscriptionRecord>> {
        let uid = user_id.value();
        let row = self
            .with_conn(move |conn| {
                push_subscriptions::table
                    .find(uid)
                    .first::<SubscriptionRow>(conn)
                    .optional()
                    .map_err(|e| RepositoryError::from(e).with_operation("find_subscription"))
            })
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_subscriptions_for_users(
        &self,
        user_ids: &[UserId],
    ) -> RepositoryResult<Vec<SubscriptionRecord>> {
        let uids: Vec<Uuid> = user_ids.iter().map(|id| id.value()).collect();
        let rows = self
            .with_conn(move |conn| {
                push_subscriptions::table
                    .filter(push_subscriptions::user_id.eq_any(uids.clone()))
                    .load::<SubscriptionRow>(conn)
                    .map_err(|e| {
                        RepositoryError::from(e).with_operation("find_subscriptions_for_users")
                    })
            })
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_subscriptions(&self) -> RepositoryResult<Vec<SubscriptionRecord>> {
        let rows = self
            .with_conn(move |conn| {
                push_subscriptions::table
                    .load::<SubscriptionRow>(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("list_subscriptions"))
            })
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("health_check"))
        })
        .await
        .map(|_| true)
    }
}
