//! In-process [`MatchRepository`], used by tests and the `memory` storage
//! backend.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::sync::RwLock;

use super::repository::{MatchRepository, RepositoryError, RepositoryResult};
use crate::{
    game::{Match, MatchSnapshot},
    room::MatchId,
};

/// Keeps one snapshot per match. Ids are `match_1`, `match_2`, ...
#[derive(Debug, Default)]
pub struct InMemoryMatchRepository {
    matches: RwLock<HashMap<MatchId, MatchSnapshot>>,
    next_id: AtomicU64,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn create(&self, game: &Match) -> RepositoryResult<MatchId> {
        let id = format!("match_{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.matches
            .write()
            .await
            .insert(id.clone(), game.to_snapshot());
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Match>> {
        let matches = self.matches.read().await;
        match matches.get(id) {
            Some(snapshot) => Ok(Some(Match::from_snapshot(snapshot)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, id: &str, game: &Match) -> RepositoryResult<()> {
        let mut matches = self.matches.write().await;
        let slot = matches
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        *slot = game.to_snapshot();
        Ok(())
    }
}
