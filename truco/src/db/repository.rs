//! Match repository port and its PostgreSQL adapter.
//!
//! Matches are stored as their versioned snapshot in a JSONB column. The
//! adapter only ever goes through [`Match::to_json`] and [`Match::from_json`].

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::{future::Future, time::Duration};
use thiserror::Error;
use tokio::time::timeout;
use uuid::Uuid;

use crate::{
    game::{GameError, Match},
    room::MatchId,
};

/// Upper bound for a single repository query.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("match not found: {0}")]
    NotFound(MatchId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("stored match is unreadable: {0}")]
    Snapshot(#[from] GameError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persistence port for the match aggregate.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Store a new match and return its freshly assigned id.
    async fn create(&self, game: &Match) -> RepositoryResult<MatchId>;

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Match>>;

    /// Overwrite an existing match. Fails with [`RepositoryError::NotFound`]
    /// when `id` was never created.
    async fn save(&self, id: &str, game: &Match) -> RepositoryResult<()>;
}

async fn bounded<F, T>(future: F) -> RepositoryResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(QUERY_TIMEOUT, future).await {
        Ok(result) => result.map_err(RepositoryError::from),
        Err(_) => Err(RepositoryError::Timeout(QUERY_TIMEOUT)),
    }
}

/// PostgreSQL implementation of [`MatchRepository`].
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `matches` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> RepositoryResult<()> {
        bounded(
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS matches (
                    id TEXT PRIMARY KEY,
                    points_to_win BIGINT NOT NULL,
                    state TEXT NOT NULL,
                    snapshot JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
            )
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MatchRepository for PgMatchRepository {
    async fn create(&self, game: &Match) -> RepositoryResult<MatchId> {
        let id = Uuid::new_v4().to_string();
        let snapshot = game.to_json()?;

        bounded(
            sqlx::query(
                "INSERT INTO matches (id, points_to_win, state, snapshot) VALUES ($1, $2, $3, $4)",
            )
            .bind(&id)
            .bind(i64::from(game.points_to_win()))
            .bind(game.state().as_str())
            .bind(snapshot)
            .execute(&self.pool),
        )
        .await?;

        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Match>> {
        let row = bounded(
            sqlx::query("SELECT snapshot FROM matches WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => {
                let snapshot: serde_json::Value = row.try_get("snapshot")?;
                Ok(Some(Match::from_json(snapshot)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, id: &str, game: &Match) -> RepositoryResult<()> {
        let snapshot = game.to_json()?;

        let result = bounded(
            sqlx::query(
                "UPDATE matches SET state = $2, snapshot = $3, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(game.state().as_str())
            .bind(snapshot)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
