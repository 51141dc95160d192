//! Match manager: spawns match actors and routes connections to them.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock, mpsc};

use super::{
    actor::{MatchActor, MatchHandle},
    messages::{CardPlayed, ServerEvent},
};
use crate::{
    db::MatchRepository,
    game::{Card, Rank},
    room::{MatchId, PlayerSession, RoomCoordinator, RoomError, RoomView},
    service::{
        MatchService, MatchStateView, ServiceError, ServiceResult, StartHandResult,
        requests::normalize_match_id,
    },
};

/// Owns the live match actors of this process.
#[derive(Clone)]
pub struct MatchManager {
    service: MatchService,

    /// Seats of every match, shared with the actors
    rooms: Arc<Mutex<RoomCoordinator>>,

    /// Running actors by match id
    matches: Arc<RwLock<HashMap<MatchId, MatchHandle>>>,
}

impl MatchManager {
    pub fn new(repository: Arc<dyn MatchRepository>) -> Self {
        Self {
            service: MatchService::new(repository),
            rooms: Arc::new(Mutex::new(RoomCoordinator::new())),
            matches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn service(&self) -> &MatchService {
        &self.service
    }

    pub fn rooms(&self) -> &Arc<Mutex<RoomCoordinator>> {
        &self.rooms
    }

    /// Number of running actors. Actors that stopped on their own are
    /// pruned here.
    pub async fn active_matches(&self) -> usize {
        let mut matches = self.matches.write().await;
        matches.retain(|_, handle| !handle.is_closed());
        matches.len()
    }

    fn spawn(&self, match_id: &str) -> MatchHandle {
        let (actor, handle) =
            MatchActor::new(match_id.to_string(), self.service.clone(), self.rooms.clone());
        tokio::spawn(actor.run());
        handle
    }

    /// Create and persist a match. Its actor is spawned by the first join.
    pub async fn create_match(&self, points_to_win: Option<i64>) -> ServiceResult<MatchId> {
        self.service.create_match(points_to_win).await
    }

    /// Handle of a running match. A persisted match without an actor, new or
    /// retired or from before a restart, gets one spawned.
    pub async fn handle(&self, match_id: &str) -> ServiceResult<MatchHandle> {
        let match_id = normalize_match_id(match_id)?;

        if let Some(handle) = self.matches.read().await.get(&match_id)
            && !handle.is_closed()
        {
            return Ok(handle.clone());
        }

        if !self.service.exists(&match_id).await? {
            return Err(ServiceError::MatchNotFound(match_id));
        }

        let mut matches = self.matches.write().await;
        if let Some(handle) = matches.get(&match_id)
            && !handle.is_closed()
        {
            return Ok(handle.clone());
        }
        let handle = self.spawn(&match_id);
        matches.insert(match_id.clone(), handle.clone());
        log::info!("Spawned actor for match {match_id}");
        Ok(handle)
    }

    async fn joined_handle(&self, connection_id: &str) -> ServiceResult<MatchHandle> {
        let session = self
            .rooms
            .lock()
            .await
            .session(connection_id)
            .ok_or(RoomError::NotJoined)?;
        self.handle(&session.match_id).await
    }

    pub async fn join(
        &self,
        match_id: &str,
        connection_id: &str,
        token: &str,
        events: mpsc::Sender<ServerEvent>,
    ) -> ServiceResult<PlayerSession> {
        let handle = self.handle(match_id).await?;
        let joined = handle.join(connection_id, token, events).await;
        if joined.is_err() {
            self.retire_if_idle(handle.match_id()).await;
        }
        joined
    }

    /// Toggle readiness in whatever match the connection joined.
    pub async fn set_ready(&self, connection_id: &str, ready: bool) -> ServiceResult<RoomView> {
        self.joined_handle(connection_id)
            .await?
            .set_ready(connection_id, ready)
            .await
    }

    pub async fn start_hand(
        &self,
        connection_id: &str,
        match_id: &str,
        vira: Option<Rank>,
    ) -> ServiceResult<StartHandResult> {
        let handle = self.handle(match_id).await?;
        let started = handle.start_hand(connection_id, vira).await;
        if started.is_err() {
            self.retire_if_idle(handle.match_id()).await;
        }
        started
    }

    pub async fn play_card(
        &self,
        connection_id: &str,
        match_id: &str,
        card: Card,
    ) -> ServiceResult<CardPlayed> {
        let handle = self.handle(match_id).await?;
        let played = handle.play_card(connection_id, card).await;
        if played.is_err() {
            self.retire_if_idle(handle.match_id()).await;
        }
        played
    }

    /// Read through the running actor, or straight from storage when the
    /// match has none.
    pub async fn view_state(&self, match_id: &str) -> ServiceResult<MatchStateView> {
        let match_id = normalize_match_id(match_id)?;
        let running = self
            .matches
            .read()
            .await
            .get(&match_id)
            .filter(|handle| !handle.is_closed())
            .cloned();
        match running {
            Some(handle) => handle.state().await,
            None => self.service.view_state(&match_id).await,
        }
    }

    /// Route a disconnect to the match the connection sat in. The match's
    /// actor is retired once its room is gone.
    pub async fn leave(&self, connection_id: &str) -> Option<MatchId> {
        let handle = self.joined_handle(connection_id).await.ok()?;
        let match_id = handle.leave(connection_id).await?;
        self.retire_if_idle(&match_id).await;
        Some(match_id)
    }

    /// Close the actor of a match nobody is seated in.
    async fn retire_if_idle(&self, match_id: &str) {
        let mut matches = self.matches.write().await;
        if self.rooms.lock().await.has_room(match_id) {
            return;
        }
        if let Some(handle) = matches.remove(match_id) {
            handle.close().await;
            log::info!("Match {match_id} has no seated players, actor retired");
        }
    }

    /// Stop every actor.
    pub async fn shutdown(&self) {
        let handles: Vec<MatchHandle> = self
            .matches
            .write()
            .await
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in handles {
            handle.close().await;
        }
    }
}
