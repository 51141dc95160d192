//! Match actor: the single writer of one match and its room.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, mpsc, oneshot};

use super::messages::{CardPlayed, MatchMessage, ServerEvent};
use crate::{
    game::{Card, Rank},
    room::{ConnectionId, MatchId, PlayerSession, RoomCoordinator, RoomError, RoomView},
    service::{
        MatchService, MatchStateView, ServiceError, ServiceResult, StartHandResult,
        requests::draw_vira,
    },
};

/// Capacity of an actor's inbox.
pub const INBOX_CAPACITY: usize = 100;

/// Handle for sending messages to a match actor
#[derive(Clone, Debug)]
pub struct MatchHandle {
    sender: mpsc::Sender<MatchMessage>,
    match_id: MatchId,
}

impl MatchHandle {
    pub fn new(sender: mpsc::Sender<MatchMessage>, match_id: MatchId) -> Self {
        Self { sender, match_id }
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the match
    pub async fn send(&self, message: MatchMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| format!("Match {} is closed", self.match_id))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<ServiceResult<T>>) -> MatchMessage,
    ) -> ServiceResult<T> {
        let (response, reply) = oneshot::channel();
        self.send(build(response))
            .await
            .map_err(|_| ServiceError::Unavailable(self.match_id.clone()))?;
        reply
            .await
            .map_err(|_| ServiceError::Unavailable(self.match_id.clone()))?
    }

    pub async fn join(
        &self,
        connection_id: &str,
        token: &str,
        events: mpsc::Sender<ServerEvent>,
    ) -> ServiceResult<PlayerSession> {
        self.request(|response| MatchMessage::Join {
            connection_id: connection_id.to_string(),
            token: token.to_string(),
            events,
            response,
        })
        .await
    }

    pub async fn set_ready(&self, connection_id: &str, ready: bool) -> ServiceResult<RoomView> {
        self.request(|response| MatchMessage::SetReady {
            connection_id: connection_id.to_string(),
            ready,
            response,
        })
        .await
    }

    pub async fn start_hand(
        &self,
        connection_id: &str,
        vira: Option<Rank>,
    ) -> ServiceResult<StartHandResult> {
        self.request(|response| MatchMessage::StartHand {
            connection_id: connection_id.to_string(),
            vira,
            response,
        })
        .await
    }

    pub async fn play_card(&self, connection_id: &str, card: Card) -> ServiceResult<CardPlayed> {
        self.request(|response| MatchMessage::PlayCard {
            connection_id: connection_id.to_string(),
            card,
            response,
        })
        .await
    }

    pub async fn state(&self) -> ServiceResult<MatchStateView> {
        self.request(|response| MatchMessage::GetState { response })
            .await
    }

    pub async fn leave(&self, connection_id: &str) -> Option<MatchId> {
        let (response, reply) = oneshot::channel();
        let message = MatchMessage::Leave {
            connection_id: connection_id.to_string(),
            response,
        };
        if self.send(message).await.is_err() {
            return None;
        }
        reply.await.ok().flatten()
    }

    pub async fn close(&self) {
        let _ = self.send(MatchMessage::Close).await;
    }
}

/// Actor owning every mutation of one match.
///
/// The room coordinator is shared by all matches. Its lock is only ever held
/// between awaits, never across a repository call.
pub struct MatchActor {
    id: MatchId,

    service: MatchService,

    rooms: Arc<Mutex<RoomCoordinator>>,

    inbox: mpsc::Receiver<MatchMessage>,

    /// Event channels of the connections seated here
    subscribers: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,

    is_closed: bool,
}

impl MatchActor {
    pub fn new(
        id: MatchId,
        service: MatchService,
        rooms: Arc<Mutex<RoomCoordinator>>,
    ) -> (Self, MatchHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);

        let actor = Self {
            id: id.clone(),
            service,
            rooms,
            inbox,
            subscribers: HashMap::new(),
            is_closed: false,
        };

        (actor, MatchHandle::new(sender, id))
    }

    /// Process messages until closed or every handle is dropped.
    pub async fn run(mut self) {
        log::info!("Match {} actor starting", self.id);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;
            if self.is_closed {
                break;
            }
        }

        log::info!("Match {} actor stopped", self.id);
    }

    async fn handle_message(&mut self, message: MatchMessage) {
        match message {
            MatchMessage::Join {
                connection_id,
                token,
                events,
                response,
            } => {
                let result = self.handle_join(&connection_id, &token, events).await;
                let _ = response.send(result);
            }

            MatchMessage::SetReady {
                connection_id,
                ready,
                response,
            } => {
                let result = self.handle_set_ready(&connection_id, ready).await;
                let _ = response.send(result);
            }

            MatchMessage::StartHand {
                connection_id,
                vira,
                response,
            } => {
                let result = self.handle_start_hand(&connection_id, vira).await;
                let _ = response.send(result);
            }

            MatchMessage::PlayCard {
                connection_id,
                card,
                response,
            } => {
                let result = self.handle_play_card(&connection_id, card).await;
                let _ = response.send(result);
            }

            MatchMessage::GetState { response } => {
                let _ = response.send(self.service.view_state(&self.id).await);
            }

            MatchMessage::Leave {
                connection_id,
                response,
            } => {
                let result = self.handle_leave(&connection_id).await;
                let _ = response.send(result);
            }

            MatchMessage::Close => {
                self.is_closed = true;
            }
        }
    }

    /// Send an event to every subscriber, dropping the ones that went away.
    ///
    /// A subscriber whose queue is full is unseated like a disconnect; its
    /// seat stays reserved and a rejoin with the same token resubscribes it.
    async fn broadcast(&mut self, event: ServerEvent) {
        let mut lagging = Vec::new();
        self.subscribers
            .retain(|connection_id, sender| match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    lagging.push(connection_id.clone());
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });

        if lagging.is_empty() {
            return;
        }
        let mut rooms = self.rooms.lock().await;
        for connection_id in lagging {
            log::warn!(
                "Match {}: event queue of {} is full, unseating it",
                self.id,
                connection_id
            );
            rooms.leave(&connection_id);
        }
        if !rooms.has_room(&self.id) {
            self.is_closed = true;
        }
    }

    async fn broadcast_room_state(&mut self) {
        let view = self.rooms.lock().await.room_state(&self.id);
        self.broadcast(view.into()).await;
    }

    /// The caller's session, provided it is seated in this match.
    fn seated(&self, rooms: &RoomCoordinator, connection_id: &str) -> ServiceResult<PlayerSession> {
        rooms
            .session(connection_id)
            .filter(|session| session.match_id == self.id)
            .ok_or(ServiceError::Room(RoomError::NotJoined))
    }

    async fn handle_join(
        &mut self,
        connection_id: &str,
        token: &str,
        events: mpsc::Sender<ServerEvent>,
    ) -> ServiceResult<PlayerSession> {
        if !self.service.exists(&self.id).await? {
            return Err(ServiceError::MatchNotFound(self.id.clone()));
        }

        let session = {
            let mut rooms = self.rooms.lock().await;
            let session = rooms.join(&self.id, connection_id, token)?;
            self.subscribers.insert(connection_id.to_string(), events);
            // a reattached token leaves its previous connection unseated
            self.subscribers
                .retain(|subscriber, _| rooms.session(subscriber).is_some());
            session
        };

        log::info!(
            "Match {}: connection {} seated at {}",
            self.id,
            connection_id,
            session.seat
        );
        self.broadcast_room_state().await;
        Ok(session)
    }

    async fn handle_set_ready(&mut self, connection_id: &str, ready: bool) -> ServiceResult<RoomView> {
        let view = {
            let mut rooms = self.rooms.lock().await;
            self.seated(&rooms, connection_id)?;
            rooms.set_ready(connection_id, ready)?
        };

        self.broadcast(view.clone().into()).await;
        Ok(view)
    }

    async fn handle_start_hand(
        &mut self,
        connection_id: &str,
        vira: Option<Rank>,
    ) -> ServiceResult<StartHandResult> {
        {
            let rooms = self.rooms.lock().await;
            self.seated(&rooms, connection_id)?;
            if !rooms.can_start(&self.id) {
                return Err(RoomError::NotAllReady.into());
            }
        }

        let vira = vira.unwrap_or_else(draw_vira);
        let result = self.service.start_hand(&self.id, vira).await?;
        {
            let mut rooms = self.rooms.lock().await;
            if result.started {
                rooms.begin_hand(&self.id)?;
            } else {
                // a room rebuilt after every seat dropped has lost its turn
                rooms.resume_hand(&self.id, result.awaiting)?;
            }
        }

        let state = self.service.view_state(&self.id).await?;
        self.broadcast((&result).into()).await;
        self.broadcast(state.into()).await;
        self.broadcast_room_state().await;
        Ok(result)
    }

    async fn handle_play_card(&mut self, connection_id: &str, card: Card) -> ServiceResult<CardPlayed> {
        let session = {
            let rooms = self.rooms.lock().await;
            let session = self.seated(&rooms, connection_id)?;
            if !rooms.is_players_turn(connection_id, &self.id) {
                return Err(RoomError::NotYourTurn.into());
            }
            session
        };

        let result = self
            .service
            .play_card(&self.id, session.side, card)
            .await?;

        {
            let mut rooms = self.rooms.lock().await;
            let turn = if result.outcome.hand_completed() {
                rooms.end_hand(&self.id)
            } else {
                // mid-round only the other side may answer
                let awaiting = result.outcome.round.is_none().then(|| session.side.other());
                rooms.advance_turn(&self.id, awaiting)
            };
            if let Err(e) = turn {
                log::warn!("Match {}: turn not updated: {}", self.id, e);
            }
        }

        let played = CardPlayed {
            seat: session.seat,
            team: session.team,
            card,
            result,
        };
        self.broadcast((&played).into()).await;
        self.broadcast(played.result.state.clone().into()).await;
        self.broadcast_room_state().await;
        Ok(played)
    }

    async fn handle_leave(&mut self, connection_id: &str) -> Option<MatchId> {
        self.subscribers.remove(connection_id);
        let left = self.rooms.lock().await.leave(connection_id);
        if left.is_some() {
            log::info!("Match {}: connection {} left", self.id, connection_id);
            self.broadcast_room_state().await;
        }
        left
    }
}
