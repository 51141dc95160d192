//! Match actor messages and the client-facing command/event protocol.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::{
    game::{Card, MatchState, Rank, Side},
    room::{ConnectionId, MatchId, PlayerSession, RoomView, SeatId, TeamId},
    service::{MatchStateView, PlayCardResult, ScoreView, ServiceResult, StartHandResult},
};

/// Messages that can be sent to a [`MatchActor`](super::MatchActor).
#[derive(Debug)]
pub enum MatchMessage {
    /// Seat a connection and subscribe it to the match's events
    Join {
        connection_id: ConnectionId,
        token: String,
        events: mpsc::Sender<ServerEvent>,
        response: oneshot::Sender<ServiceResult<PlayerSession>>,
    },

    SetReady {
        connection_id: ConnectionId,
        ready: bool,
        response: oneshot::Sender<ServiceResult<RoomView>>,
    },

    /// Open a hand. Without a vira one is drawn at random.
    StartHand {
        connection_id: ConnectionId,
        vira: Option<Rank>,
        response: oneshot::Sender<ServiceResult<StartHandResult>>,
    },

    PlayCard {
        connection_id: ConnectionId,
        card: Card,
        response: oneshot::Sender<ServiceResult<CardPlayed>>,
    },

    GetState {
        response: oneshot::Sender<ServiceResult<MatchStateView>>,
    },

    /// Connection dropped
    Leave {
        connection_id: ConnectionId,
        response: oneshot::Sender<Option<MatchId>>,
    },

    /// Stop the actor
    Close,
}

/// Reply to an accepted play.
#[derive(Debug, Clone)]
pub struct CardPlayed {
    pub seat: SeatId,
    pub team: TeamId,
    pub card: Card,
    pub result: PlayCardResult,
}

/// Card as sent by clients: rank and suit apart, suit in any accepted alias.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CardPayload {
    pub rank: String,
    pub suit: String,
}

/// Commands accepted from clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    CreateMatch {
        #[serde(default)]
        points_to_win: Option<i64>,
    },
    JoinMatch {
        match_id: String,
    },
    SetReady {
        ready: bool,
    },
    StartHand {
        match_id: String,
        #[serde(default)]
        vira_rank: Option<String>,
    },
    PlayCard {
        match_id: String,
        card: CardPayload,
    },
    GetState {
        match_id: String,
    },
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayer {
    pub seat_id: SeatId,
    pub team_id: TeamId,
    pub ready: bool,
    pub connected: bool,
}

/// Events sent to clients, either as a direct reply or as a broadcast to
/// every connection seated in a match.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Created {
        match_id: MatchId,
    },
    PlayerAssigned {
        match_id: MatchId,
        seat_id: SeatId,
        team_id: TeamId,
        domain_side: Side,
    },
    RoomState {
        match_id: MatchId,
        players: Vec<RoomPlayer>,
        can_start: bool,
        current_turn_seat: Option<SeatId>,
    },
    MatchState {
        match_id: MatchId,
        state: MatchState,
        score: ScoreView,
        points_to_win: u32,
        vira_rank: Option<Rank>,
        rounds_played: usize,
    },
    HandStarted {
        match_id: MatchId,
        vira_rank: Rank,
    },
    CardPlayed {
        match_id: MatchId,
        seat_id: SeatId,
        team_id: TeamId,
        card: Card,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl From<&PlayerSession> for ServerEvent {
    fn from(session: &PlayerSession) -> Self {
        Self::PlayerAssigned {
            match_id: session.match_id.clone(),
            seat_id: session.seat,
            team_id: session.team,
            domain_side: session.side,
        }
    }
}

impl From<RoomView> for ServerEvent {
    fn from(view: RoomView) -> Self {
        Self::RoomState {
            match_id: view.match_id,
            players: view
                .players
                .into_iter()
                .map(|player| RoomPlayer {
                    seat_id: player.seat,
                    team_id: player.team,
                    ready: player.ready,
                    connected: player.connected,
                })
                .collect(),
            can_start: view.can_start,
            current_turn_seat: view.current_turn,
        }
    }
}

impl From<MatchStateView> for ServerEvent {
    fn from(view: MatchStateView) -> Self {
        Self::MatchState {
            match_id: view.match_id,
            state: view.state,
            score: view.score,
            points_to_win: view.points_to_win,
            vira_rank: view.vira,
            rounds_played: view.rounds_played,
        }
    }
}

impl From<&StartHandResult> for ServerEvent {
    fn from(result: &StartHandResult) -> Self {
        Self::HandStarted {
            match_id: result.match_id.clone(),
            vira_rank: result.vira,
        }
    }
}

impl From<&CardPlayed> for ServerEvent {
    fn from(played: &CardPlayed) -> Self {
        Self::CardPlayed {
            match_id: played.result.state.match_id.clone(),
            seat_id: played.seat,
            team_id: played.team,
            card: played.card,
        }
    }
}
