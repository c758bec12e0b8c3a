use crate::core::status::{resolve_like, LikeResolution};
use crate::models::{MatchRecord, MatchStatus};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result of recording a like
#[derive(Debug, Clone, Copy)]
pub struct LikeOutcome {
    pub resolution: LikeResolution,
    pub match_score: f64,
}

/// PostgreSQL store for match relations
///
/// One row per direction: `(user_id, target_user_id)` holds what `user_id` decided
/// about `target_user_id`. A mutual match is two `accepted` rows.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connect and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
        idle_timeout_secs: u64,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(idle_timeout_secs))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            acquire_timeout_secs.unwrap_or(5),
            idle_timeout_secs.unwrap_or(600),
        )
        .await
    }

    /// Wrap an existing pool without running migrations
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record that `user_id` likes `target_user_id`
    ///
    /// Runs in one transaction holding a lock scoped to the unordered user pair, so
    /// two users liking each other concurrently still end up both `accepted`, and
    /// nobody observes one side accepted while the other is pending.
    pub async fn record_like(
        &self,
        user_id: &str,
        target_user_id: &str,
        match_score: f64,
    ) -> Result<LikeOutcome, PostgresError> {
        if user_id == target_user_id {
            return Err(PostgresError::InvalidInput("cannot like yourself".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(pair_lock_key(user_id, target_user_id))
            .execute(&mut *tx)
            .await?;

        let reverse: Option<MatchStatus> = sqlx::query_scalar(
            r#"
            SELECT status
            FROM match_relations
            WHERE user_id = $1 AND target_user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(target_user_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let resolution = resolve_like(reverse);

        upsert_relation(
            &mut tx,
            user_id,
            target_user_id,
            resolution.requester_status,
            Some(match_score),
        )
        .await?;

        if let Some(target_status) = resolution.target_status {
            sqlx::query(
                r#"
                UPDATE match_relations
                SET status = $3, updated_at = NOW()
                WHERE user_id = $1 AND target_user_id = $2
                "#,
            )
            .bind(target_user_id)
            .bind(user_id)
            .bind(target_status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Recorded like: {} -> {} ({:?}, mutual: {})",
            user_id,
            target_user_id,
            resolution.requester_status,
            resolution.is_mutual
        );

        Ok(LikeOutcome {
            resolution,
            match_score,
        })
    }

    /// Record that `user_id` rejects `target_user_id`
    ///
    /// Keeps any previously stored score.
    pub async fn record_reject(
        &self,
        user_id: &str,
        target_user_id: &str,
    ) -> Result<(), PostgresError> {
        if user_id == target_user_id {
            return Err(PostgresError::InvalidInput("cannot reject yourself".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(pair_lock_key(user_id, target_user_id))
            .execute(&mut *tx)
            .await?;

        upsert_relation(&mut tx, user_id, target_user_id, MatchStatus::Rejected, None).await?;

        tx.commit().await?;

        tracing::debug!("Recorded reject: {} -> {}", user_id, target_user_id);

        Ok(())
    }

    /// Remove the relation from `user_id` to `target_user_id`
    ///
    /// Makes a rejected target eligible as a candidate again.
    pub async fn reset_relation(
        &self,
        user_id: &str,
        target_user_id: &str,
    ) -> Result<bool, PostgresError> {
        let query = r#"
            DELETE FROM match_relations
            WHERE user_id = $1 AND target_user_id = $2
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .bind(target_user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// IDs of every user that `user_id` has rejected
    pub async fn get_rejected_ids(&self, user_id: &str) -> Result<Vec<String>, PostgresError> {
        let query = r#"
            SELECT target_user_id
            FROM match_relations
            WHERE user_id = $1 AND status = 'rejected'
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let ids: Vec<String> = rows.iter().map(|row| row.get("target_user_id")).collect();

        tracing::debug!("User {} has rejected {} users", user_id, ids.len());

        Ok(ids)
    }

    /// Mutual matches of `user_id`, most recent first
    pub async fn get_connections(&self, user_id: &str) -> Result<Vec<MatchRecord>, PostgresError> {
        let query = r#"
            SELECT mine.user_id, mine.target_user_id, mine.status, mine.match_score,
                   GREATEST(mine.updated_at, theirs.updated_at) AS updated_at
            FROM match_relations mine
            JOIN match_relations theirs
              ON theirs.user_id = mine.target_user_id
             AND theirs.target_user_id = mine.user_id
            WHERE mine.user_id = $1
              AND mine.status = 'accepted'
              AND theirs.status = 'accepted'
            ORDER BY updated_at DESC
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Outgoing likes of `user_id` still waiting for an answer, best score first
    pub async fn get_pending(&self, user_id: &str) -> Result<Vec<MatchRecord>, PostgresError> {
        let query = r#"
            SELECT user_id, target_user_id, status, match_score, updated_at
            FROM match_relations
            WHERE user_id = $1 AND status = 'pending'
            ORDER BY match_score DESC, updated_at DESC
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Insert or overwrite one direction of a relation
///
/// A `None` score keeps the stored one (0 for new rows).
async fn upsert_relation(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
    target_user_id: &str,
    status: MatchStatus,
    match_score: Option<f64>,
) -> Result<(), PostgresError> {
    let query = r#"
        INSERT INTO match_relations (user_id, target_user_id, status, match_score, updated_at)
        VALUES ($1, $2, $3, COALESCE($4, 0), NOW())
        ON CONFLICT (user_id, target_user_id)
        DO UPDATE SET
            status = EXCLUDED.status,
            match_score = COALESCE($4, match_relations.match_score),
            updated_at = EXCLUDED.updated_at
    "#;

    sqlx::query(query)
        .bind(user_id)
        .bind(target_user_id)
        .bind(status)
        .bind(match_score)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> MatchRecord {
    MatchRecord {
        user_id: row.get("user_id"),
        target_user_id: row.get("target_user_id"),
        status: row.get("status"),
        match_score: row.get("match_score"),
        updated_at: row.get("updated_at"),
    }
}

/// Same key for (a, b) and (b, a)
fn pair_lock_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("match:{}:{}", a, b)
    } else {
        format!("match:{}:{}", b, a)
    }
}
