//! PostgreSQL store backed by an explicitly constructed `sqlx` pool.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use sqlx::postgres::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

use super::RepositoryError;
use crate::config::DatabaseConfig;
use crate::identity::{Role, UserId};
use crate::workflows::accounts::{ProfileChanges, SeedUser, UserProfile, UserRepository};
use crate::workflows::host_applications::{
    ApplicationId, ApplicationStatus, HostApplication, HostApplicationRepository,
    NewHostApplication, ReviewTransaction, ReviewTransition,
};

macro_rules! application_columns {
    () => {
        "id, user_id, offering_type, space_types, categories, capacity, notes, status, \
         reviewed_by, reviewed_at, review_notes, created_at, updated_at"
    };
}

macro_rules! user_columns {
    () => {
        "id, email, full_name, role, locale, created_at, updated_at"
    };
}

/// Open the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let url = config.url.as_deref().ok_or_else(|| {
        sqlx::Error::Configuration("DATABASE_URL is not configured".into())
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(url)
        .await?;

    info!(max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("database migrations applied");
    Ok(())
}

/// Repository implementation over the `users` and `host_applications` tables.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HostApplicationRow {
    id: i64,
    user_id: i64,
    offering_type: String,
    space_types: Vec<String>,
    categories: Vec<String>,
    capacity: i32,
    notes: String,
    status: String,
    reviewed_by: Option<i64>,
    reviewed_at: Option<DateTime<Utc>>,
    review_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HostApplicationRow> for HostApplication {
    type Error = RepositoryError;

    fn try_from(row: HostApplicationRow) -> Result<Self, Self::Error> {
        let offering_type = row.offering_type.parse().map_err(|_| {
            RepositoryError::InvalidRow(format!("offering_type '{}'", row.offering_type))
        })?;
        let status = row
            .status
            .parse()
            .map_err(|_| RepositoryError::InvalidRow(format!("status '{}'", row.status)))?;
        let capacity = u32::try_from(row.capacity)
            .map_err(|_| RepositoryError::InvalidRow(format!("capacity {}", row.capacity)))?;

        Ok(HostApplication {
            id: ApplicationId(row.id),
            user_id: UserId(row.user_id),
            offering_type,
            space_types: row.space_types,
            categories: row.categories,
            capacity,
            notes: row.notes,
            status,
            reviewed_by: row.reviewed_by.map(UserId),
            reviewed_at: row.reviewed_at,
            review_notes: row.review_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    full_name: Option<String>,
    role: String,
    locale: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            id: UserId(row.id),
            email: row.email,
            full_name: row.full_name,
            role: parse_role(&row.role)?,
            locale: row.locale,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_role(raw: &str) -> Result<Role, RepositoryError> {
    raw.parse()
        .map_err(|_| RepositoryError::InvalidRow(format!("role '{raw}'")))
}

fn convert_optional(
    row: Option<HostApplicationRow>,
) -> Result<Option<HostApplication>, RepositoryError> {
    row.map(HostApplication::try_from).transpose()
}

#[async_trait]
impl HostApplicationRepository for PgStore {
    async fn create(
        &self,
        user_id: UserId,
        application: &NewHostApplication,
    ) -> Result<HostApplication, RepositoryError> {
        let capacity = i32::try_from(application.capacity)
            .map_err(|_| RepositoryError::InvalidRow(format!("capacity {}", application.capacity)))?;

        let row = sqlx::query_as::<_, HostApplicationRow>(concat!(
            "INSERT INTO host_applications \
               (user_id, offering_type, space_types, categories, capacity, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING ",
            application_columns!()
        ))
        .bind(user_id.0)
        .bind(application.offering_type.label())
        .bind(&application.space_types)
        .bind(&application.categories)
        .bind(capacity)
        .bind(&application.notes)
        .fetch_one(&self.pool)
        .await?;

        HostApplication::try_from(row)
    }

    async fn find_pending_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        let row = sqlx::query_as::<_, HostApplicationRow>(concat!(
            "SELECT ",
            application_columns!(),
            " FROM host_applications \
              WHERE user_id = $1 AND status = 'pending' \
              ORDER BY created_at DESC, id DESC \
              LIMIT 1"
        ))
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        convert_optional(row)
    }

    async fn find_latest_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        let row = sqlx::query_as::<_, HostApplicationRow>(concat!(
            "SELECT ",
            application_columns!(),
            " FROM host_applications \
              WHERE user_id = $1 \
              ORDER BY created_at DESC, id DESC \
              LIMIT 1"
        ))
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        convert_optional(row)
    }

    async fn list_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<HostApplication>, RepositoryError> {
        let rows = sqlx::query_as::<_, HostApplicationRow>(concat!(
            "SELECT ",
            application_columns!(),
            " FROM host_applications \
              WHERE status = $1 \
              ORDER BY created_at ASC, id ASC"
        ))
        .bind(status.label())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HostApplication::try_from).collect()
    }

    async fn get_by_id(&self, id: ApplicationId) -> Result<Option<HostApplication>, RepositoryError> {
        let row = sqlx::query_as::<_, HostApplicationRow>(concat!(
            "SELECT ",
            application_columns!(),
            " FROM host_applications WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        convert_optional(row)
    }

    async fn begin_review(&self) -> Result<Box<dyn ReviewTransaction>, RepositoryError> {
        // READ COMMITTED: a racing reviewer's UPDATE re-checks `status = 'pending'`
        // after the row lock is released and matches nothing.
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgReviewTransaction { tx }))
    }
}

/// Review unit of work on a pooled connection. Dropping it without `commit`
/// rolls the transaction back.
pub struct PgReviewTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ReviewTransaction for PgReviewTransaction {
    async fn update_on_review(
        &mut self,
        id: ApplicationId,
        transition: &ReviewTransition,
    ) -> Result<Option<HostApplication>, RepositoryError> {
        let row = sqlx::query_as::<_, HostApplicationRow>(concat!(
            "UPDATE host_applications \
             SET status = $1, \
                 reviewed_by = $2, \
                 reviewed_at = $3, \
                 review_notes = $4, \
                 updated_at = $3 \
             WHERE id = $5 AND status = 'pending' \
             RETURNING ",
            application_columns!()
        ))
        .bind(transition.status().label())
        .bind(transition.reviewed_by.0)
        .bind(transition.reviewed_at)
        .bind(&transition.review_notes)
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await?;

        convert_optional(row)
    }

    async fn user_role(&mut self, user_id: UserId) -> Result<Option<Role>, RepositoryError> {
        let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id.0)
            .fetch_optional(&mut *self.tx)
            .await?;

        role.as_deref().map(parse_role).transpose()
    }

    async fn promote_user(
        &mut self,
        user_id: UserId,
        from: Role,
        to: Role,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 AND role = $3",
        )
        .bind(to.label())
        .bind(user_id.0)
        .bind(from.label())
        .execute(&mut *self.tx)
        .await?;

        debug!(%user_id, from = from.label(), to = to.label(), rows = result.rows_affected(), "role write");
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let PgReviewTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        let PgReviewTransaction { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserProfile::try_from).transpose()
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "UPDATE users \
             SET full_name = COALESCE($1, full_name), \
                 locale = COALESCE($2, locale), \
                 updated_at = NOW() \
             WHERE id = $3 \
             RETURNING ",
            user_columns!()
        ))
        .bind(changes.full_name.as_deref())
        .bind(changes.locale.as_deref())
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserProfile::try_from).transpose()
    }

    async fn upsert_with_role(&self, seed: &SeedUser) -> Result<UserProfile, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "INSERT INTO users (email, full_name, role, locale) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO UPDATE \
               SET role = EXCLUDED.role, updated_at = NOW() \
             RETURNING ",
            user_columns!()
        ))
        .bind(&seed.email)
        .bind(&seed.full_name)
        .bind(seed.role.label())
        .bind(&seed.locale)
        .fetch_one(&self.pool)
        .await?;

        UserProfile::try_from(row)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        // Applications cascade; rows this user reviewed block the delete.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
