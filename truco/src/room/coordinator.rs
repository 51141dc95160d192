//! In-memory seat, readiness and turn bookkeeping per match.
//!
//! Rooms are created on first join and torn down once the last live
//! connection leaves. A seat stays reserved for its token while the player
//! is disconnected, so the same token reclaims it on reconnect.

use serde::Serialize;
use std::collections::HashMap;

use super::{
    ConnectionId, MatchId,
    errors::RoomError,
    seat::{SeatId, TeamId},
};
use crate::game::{constants::SEAT_COUNT, entities::Side};

/// A connection's seat in a match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSession {
    pub match_id: MatchId,
    pub seat: SeatId,
    pub team: TeamId,
    pub side: Side,
    #[serde(skip)]
    pub token: String,
    pub connection_id: ConnectionId,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub seat: SeatId,
    pub team: TeamId,
    pub side: Side,
    pub ready: bool,
    pub connected: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub match_id: MatchId,
    pub players: Vec<SeatView>,
    pub can_start: bool,
    pub current_turn: Option<SeatId>,
}

#[derive(Debug)]
struct SeatSlot {
    token: String,
    connection: Option<ConnectionId>,
    ready: bool,
}

#[derive(Debug, Default)]
struct Room {
    seats: HashMap<SeatId, SeatSlot>,
    current_turn: Option<SeatId>,
    /// Side still owing a card in the open round, if one side already played
    awaiting: Option<Side>,
}

impl Room {
    fn seat_of_token(&self, token: &str) -> Option<SeatId> {
        SeatId::ALL
            .into_iter()
            .find(|seat| self.seats.get(seat).is_some_and(|slot| slot.token == token))
    }

    fn next_free_seat(&self) -> Option<SeatId> {
        SeatId::ALL
            .into_iter()
            .find(|seat| !self.seats.contains_key(seat))
    }

    /// Reserved seats after `seat` in turn order that may play now.
    fn turn_candidates(&self, seat: SeatId) -> impl Iterator<Item = SeatId> + '_ {
        seat.turn_successors().filter(move |next| {
            self.seats.contains_key(next) && self.awaiting.is_none_or(|side| next.side() == side)
        })
    }

    fn next_turn_after(&self, seat: SeatId) -> Option<SeatId> {
        self.turn_candidates(seat).next()
    }

    /// Like [`Room::next_turn_after`], preferring a seat with a live
    /// connection.
    fn next_live_turn_after(&self, seat: SeatId) -> Option<SeatId> {
        self.turn_candidates(seat)
            .find(|next| {
                self.seats
                    .get(next)
                    .is_some_and(|slot| slot.connection.is_some())
            })
            .or_else(|| self.next_turn_after(seat))
    }

    fn has_live_connection(&self) -> bool {
        self.seats.values().any(|slot| slot.connection.is_some())
    }

    fn can_start(&self) -> bool {
        self.seats.len() == SEAT_COUNT && self.seats.values().all(|slot| slot.ready)
    }
}

/// Maps connections to seats for every live match.
#[derive(Debug, Default)]
pub struct RoomCoordinator {
    rooms: HashMap<MatchId, Room>,
    connections: HashMap<ConnectionId, (MatchId, SeatId)>,
}

impl RoomCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn session_for(&self, connection_id: &str, match_id: &str, seat: SeatId) -> Option<PlayerSession> {
        let slot = self.rooms.get(match_id)?.seats.get(&seat)?;
        Some(PlayerSession {
            match_id: match_id.to_string(),
            seat,
            team: seat.team(),
            side: seat.side(),
            token: slot.token.clone(),
            connection_id: connection_id.to_string(),
        })
    }

    /// Seat `connection_id` in `match_id` on behalf of `token`.
    ///
    /// Repeating a join from the same connection returns its session. A token
    /// that already holds a seat gets it back under the new connection, with
    /// its readiness untouched. Otherwise the first free seat in `T1A`, `T1B`,
    /// `T2A`, `T2B` order is taken, not ready.
    ///
    /// # Errors
    ///
    /// - [`RoomError::MissingToken`] for a blank token.
    /// - [`RoomError::AlreadyInAnotherMatch`] when the connection sits in
    ///   another match.
    /// - [`RoomError::MatchFull`] when all four seats are taken.
    pub fn join(
        &mut self,
        match_id: &str,
        connection_id: &str,
        token: &str,
    ) -> Result<PlayerSession, RoomError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(RoomError::MissingToken);
        }

        if let Some((bound_match, seat)) = self.connections.get(connection_id) {
            if bound_match != match_id {
                return Err(RoomError::AlreadyInAnotherMatch(bound_match.clone()));
            }
            let seat = *seat;
            return self
                .session_for(connection_id, match_id, seat)
                .ok_or(RoomError::NotJoined);
        }

        let room = self.rooms.entry(match_id.to_string()).or_default();
        let seat = if let Some(seat) = room.seat_of_token(token) {
            if let Some(slot) = room.seats.get_mut(&seat)
                && let Some(stale) = slot.connection.replace(connection_id.to_string())
            {
                self.connections.remove(&stale);
            }
            log::debug!("Match {match_id}: connection {connection_id} reattached to {seat}");
            seat
        } else {
            let seat = room.next_free_seat().ok_or(RoomError::MatchFull)?;
            room.seats.insert(
                seat,
                SeatSlot {
                    token: token.to_string(),
                    connection: Some(connection_id.to_string()),
                    ready: false,
                },
            );
            log::debug!("Match {match_id}: connection {connection_id} took {seat}");
            seat
        };

        self.connections
            .insert(connection_id.to_string(), (match_id.to_string(), seat));
        self.session_for(connection_id, match_id, seat)
            .ok_or(RoomError::NotJoined)
    }

    /// Drop a connection, keeping its seat reserved for the token.
    ///
    /// A turn held by the leaving seat passes to the next connected seat
    /// that may play, which inside an open round means a seat of the side
    /// that still owes its card. The room is removed once no seat has a live
    /// connection. Returns the match the connection was in.
    pub fn leave(&mut self, connection_id: &str) -> Option<MatchId> {
        let (match_id, seat) = self.connections.remove(connection_id)?;

        let teardown = match self.rooms.get_mut(&match_id) {
            Some(room) => {
                if let Some(slot) = room.seats.get_mut(&seat)
                    && slot.connection.as_deref() == Some(connection_id)
                {
                    slot.connection = None;
                }
                if room.current_turn == Some(seat) {
                    room.current_turn = room.next_live_turn_after(seat);
                    log::debug!(
                        "Match {match_id}: {seat} left on its turn, turn passed to {:?}",
                        room.current_turn
                    );
                }
                !room.has_live_connection()
            }
            None => false,
        };

        if teardown {
            self.rooms.remove(&match_id);
            log::debug!("Match {match_id}: last connection left, room closed");
        }
        Some(match_id)
    }

    /// # Errors
    ///
    /// Fails with [`RoomError::NotJoined`] for an unknown connection.
    pub fn set_ready(&mut self, connection_id: &str, ready: bool) -> Result<RoomView, RoomError> {
        let (match_id, seat) = self
            .connections
            .get(connection_id)
            .cloned()
            .ok_or(RoomError::NotJoined)?;
        let slot = self
            .rooms
            .get_mut(&match_id)
            .and_then(|room| room.seats.get_mut(&seat))
            .ok_or(RoomError::NotJoined)?;
        slot.ready = ready;
        Ok(self.room_state(&match_id))
    }

    /// All four seats occupied and ready.
    #[must_use]
    pub fn can_start(&self, match_id: &str) -> bool {
        self.rooms.get(match_id).is_some_and(Room::can_start)
    }

    fn room_mut(&mut self, match_id: &str) -> Result<&mut Room, RoomError> {
        self.rooms
            .get_mut(match_id)
            .ok_or_else(|| RoomError::RoomNotFound(match_id.to_string()))
    }

    /// Hand the first turn of a new hand to `T1A`.
    ///
    /// # Errors
    ///
    /// Fails with [`RoomError::RoomNotFound`] when nobody joined the match.
    pub fn begin_hand(&mut self, match_id: &str) -> Result<RoomView, RoomError> {
        let room = self.room_mut(match_id)?;
        room.current_turn = Some(SeatId::T1A);
        room.awaiting = None;
        Ok(self.room_state(match_id))
    }

    /// Give the turn back for a hand that outlived its room.
    ///
    /// The turn goes to the first seat in turn order that may play, preferring
    /// connected seats. A turn already set is left alone.
    ///
    /// # Errors
    ///
    /// Fails with [`RoomError::RoomNotFound`] when nobody joined the match.
    pub fn resume_hand(
        &mut self,
        match_id: &str,
        awaiting: Option<Side>,
    ) -> Result<RoomView, RoomError> {
        let room = self.room_mut(match_id)?;
        if room.current_turn.is_none() {
            room.awaiting = awaiting;
            // successors of the last seat start at T1A
            room.current_turn = room.next_live_turn_after(SeatId::T2B);
        }
        Ok(self.room_state(match_id))
    }

    /// Move the turn to the next occupied seat in `T1A`, `T2A`, `T1B`, `T2B`
    /// order, wrapping around. Without a current turn, `T1A` plays first.
    ///
    /// `awaiting` is the side that still owes a card in the open round, or
    /// `None` once the round closed; seats of the other side are skipped.
    ///
    /// # Errors
    ///
    /// Fails with [`RoomError::RoomNotFound`] when nobody joined the match.
    pub fn advance_turn(
        &mut self,
        match_id: &str,
        awaiting: Option<Side>,
    ) -> Result<RoomView, RoomError> {
        let room = self.room_mut(match_id)?;
        room.awaiting = awaiting;
        room.current_turn = match room.current_turn {
            Some(seat) => room.next_turn_after(seat),
            None => Some(SeatId::T1A),
        };
        Ok(self.room_state(match_id))
    }

    /// Clear the turn once a hand is over.
    ///
    /// # Errors
    ///
    /// Fails with [`RoomError::RoomNotFound`] when nobody joined the match.
    pub fn end_hand(&mut self, match_id: &str) -> Result<RoomView, RoomError> {
        let room = self.room_mut(match_id)?;
        room.current_turn = None;
        room.awaiting = None;
        Ok(self.room_state(match_id))
    }

    #[must_use]
    pub fn is_players_turn(&self, connection_id: &str, match_id: &str) -> bool {
        let Some((bound_match, seat)) = self.connections.get(connection_id) else {
            return false;
        };
        bound_match == match_id
            && self
                .rooms
                .get(match_id)
                .is_some_and(|room| room.current_turn == Some(*seat))
    }

    #[must_use]
    pub fn session(&self, connection_id: &str) -> Option<PlayerSession> {
        let (match_id, seat) = self.connections.get(connection_id)?;
        self.session_for(connection_id, match_id, *seat)
    }

    /// Whether anyone holds a seat in `match_id`.
    #[must_use]
    pub fn has_room(&self, match_id: &str) -> bool {
        self.rooms.contains_key(match_id)
    }

    #[must_use]
    pub fn current_turn(&self, match_id: &str) -> Option<SeatId> {
        self.rooms.get(match_id).and_then(|room| room.current_turn)
    }

    /// Seats in `T1A`, `T1B`, `T2A`, `T2B` order. An unknown match reads as
    /// an empty room.
    #[must_use]
    pub fn room_state(&self, match_id: &str) -> RoomView {
        let Some(room) = self.rooms.get(match_id) else {
            return RoomView {
                match_id: match_id.to_string(),
                players: Vec::new(),
                can_start: false,
                current_turn: None,
            };
        };

        let players = SeatId::ALL
            .into_iter()
            .filter_map(|seat| {
                room.seats.get(&seat).map(|slot| SeatView {
                    seat,
                    team: seat.team(),
                    side: seat.side(),
                    ready: slot.ready,
                    connected: slot.connection.is_some(),
                })
            })
            .collect();

        RoomView {
            match_id: match_id.to_string(),
            players,
            can_start: room.can_start(),
            current_turn: room.current_turn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCH: &str = "match_1";

    fn full_room() -> RoomCoordinator {
        let mut rooms = RoomCoordinator::new();
        for n in 1..=4 {
            rooms
                .join(MATCH, &format!("conn-{n}"), &format!("token-{n}"))
                .unwrap();
        }
        rooms
    }

    #[test]
    fn test_seats_are_assigned_in_fixed_order() {
        let mut rooms = RoomCoordinator::new();
        let seats: Vec<SeatId> = (1..=4)
            .map(|n| {
                rooms
                    .join(MATCH, &format!("conn-{n}"), &format!("token-{n}"))
                    .unwrap()
                    .seat
            })
            .collect();
        assert_eq!(seats, SeatId::ALL.to_vec());

        let session = rooms.session("conn-3").unwrap();
        assert_eq!(session.team, TeamId::T2);
        assert_eq!(session.side, Side::B);
    }

    #[test]
    fn test_fifth_token_is_rejected() {
        let mut rooms = full_room();
        assert_eq!(
            rooms.join(MATCH, "conn-5", "token-5").unwrap_err().to_string(),
            "match is full"
        );
        assert!(rooms.session("conn-5").is_none());
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let mut rooms = RoomCoordinator::new();
        assert_eq!(rooms.join(MATCH, "conn-1", "  "), Err(RoomError::MissingToken));
        assert_eq!(rooms.room_state(MATCH).players.len(), 0);
    }

    #[test]
    fn test_repeated_join_is_idempotent() {
        let mut rooms = RoomCoordinator::new();
        let first = rooms.join(MATCH, "conn-1", "token-1").unwrap();
        let again = rooms.join(MATCH, "conn-1", "token-1").unwrap();
        assert_eq!(first, again);
        assert_eq!(rooms.room_state(MATCH).players.len(), 1);
    }

    #[test]
    fn test_connection_cannot_join_two_matches() {
        let mut rooms = RoomCoordinator::new();
        rooms.join(MATCH, "conn-1", "token-1").unwrap();
        assert_eq!(
            rooms.join("match_2", "conn-1", "token-1"),
            Err(RoomError::AlreadyInAnotherMatch(MATCH.to_string()))
        );
    }

    #[test]
    fn test_reconnect_reclaims_seat_and_readiness() {
        let mut rooms = RoomCoordinator::new();
        rooms.join(MATCH, "conn-1", "token-1").unwrap();
        let original = rooms.join(MATCH, "conn-2", "token-2").unwrap();
        rooms.set_ready("conn-2", true).unwrap();

        assert_eq!(rooms.leave("conn-2"), Some(MATCH.to_string()));
        assert!(rooms.session("conn-2").is_none());
        let seat_view = &rooms.room_state(MATCH).players[1];
        assert!(!seat_view.connected);
        assert!(seat_view.ready);

        let back = rooms.join(MATCH, "conn-9", "token-2").unwrap();
        assert_eq!(back.seat, original.seat);
        assert_eq!(back.team, original.team);
        assert_eq!(back.side, original.side);
        assert_eq!(back.connection_id, "conn-9");
        assert!(rooms.room_state(MATCH).players[1].ready);
    }

    #[test]
    fn test_reconnect_while_old_connection_is_live() {
        let mut rooms = RoomCoordinator::new();
        rooms.join(MATCH, "conn-1", "token-1").unwrap();
        let moved = rooms.join(MATCH, "conn-2", "token-1").unwrap();
        assert_eq!(moved.seat, SeatId::T1A);
        assert!(rooms.session("conn-1").is_none());
        assert_eq!(rooms.room_state(MATCH).players.len(), 1);
    }

    #[test]
    fn test_reserved_seats_keep_room_full() {
        let mut rooms = full_room();
        rooms.leave("conn-2");
        assert_eq!(
            rooms.join(MATCH, "conn-5", "token-5"),
            Err(RoomError::MatchFull)
        );
    }

    #[test]
    fn test_last_leave_tears_room_down() {
        let mut rooms = RoomCoordinator::new();
        rooms.join(MATCH, "conn-1", "token-1").unwrap();
        rooms.join(MATCH, "conn-2", "token-2").unwrap();
        rooms.leave("conn-1");
        rooms.leave("conn-2");
        assert!(rooms.room_state(MATCH).players.is_empty());
        assert_eq!(rooms.leave("conn-2"), None);

        let fresh = rooms.join(MATCH, "conn-3", "token-2").unwrap();
        assert_eq!(fresh.seat, SeatId::T1A);
    }

    #[test]
    fn test_readiness_gate() {
        let mut rooms = full_room();
        assert!(!rooms.can_start(MATCH));
        for n in 1..=3 {
            rooms.set_ready(&format!("conn-{n}"), true).unwrap();
        }
        assert!(!rooms.can_start(MATCH));
        let view = rooms.set_ready("conn-4", true).unwrap();
        assert!(view.can_start);
        assert!(rooms.can_start(MATCH));

        rooms.set_ready("conn-4", false).unwrap();
        assert!(!rooms.can_start(MATCH));
        assert_eq!(rooms.set_ready("ghost", true), Err(RoomError::NotJoined));
    }

    #[test]
    fn test_turn_rotation_alternates_teams() {
        let mut rooms = full_room();
        assert_eq!(rooms.begin_hand(MATCH).unwrap().current_turn, Some(SeatId::T1A));
        assert!(rooms.is_players_turn("conn-1", MATCH));

        let order: Vec<SeatId> = (0..4)
            .filter_map(|_| rooms.advance_turn(MATCH, None).unwrap().current_turn)
            .collect();
        assert_eq!(order, vec![SeatId::T2A, SeatId::T1B, SeatId::T2B, SeatId::T1A]);
        assert!(!rooms.is_players_turn("conn-3", "match_2"));
    }

    #[test]
    fn test_advance_skips_unoccupied_seats() {
        let mut rooms = RoomCoordinator::new();
        rooms.join(MATCH, "conn-1", "token-1").unwrap(); // T1A
        rooms.join(MATCH, "conn-2", "token-2").unwrap(); // T1B

        assert_eq!(rooms.advance_turn(MATCH, None).unwrap().current_turn, Some(SeatId::T1A));
        assert_eq!(rooms.advance_turn(MATCH, None).unwrap().current_turn, Some(SeatId::T1B));
        assert_eq!(rooms.advance_turn(MATCH, None).unwrap().current_turn, Some(SeatId::T1A));
    }

    #[test]
    fn test_advance_skips_side_that_already_played() {
        let mut rooms = RoomCoordinator::new();
        rooms.join(MATCH, "conn-1", "token-1").unwrap(); // T1A
        rooms.join(MATCH, "conn-2", "token-2").unwrap(); // T1B
        rooms.join(MATCH, "conn-3", "token-3").unwrap(); // T2A
        rooms.begin_hand(MATCH).unwrap();

        // side A still owes a card, so T2A is passed over
        let view = rooms.advance_turn(MATCH, Some(Side::A)).unwrap();
        assert_eq!(view.current_turn, Some(SeatId::T1B));

        let view = rooms.advance_turn(MATCH, Some(Side::B)).unwrap();
        assert_eq!(view.current_turn, Some(SeatId::T2A));
    }

    #[test]
    fn test_leave_mid_round_passes_turn_to_owing_side() {
        let mut rooms = full_room();
        rooms.begin_hand(MATCH).unwrap();
        // T1A played, side B owes its card
        rooms.advance_turn(MATCH, Some(Side::B)).unwrap();
        assert_eq!(rooms.current_turn(MATCH), Some(SeatId::T2A));

        rooms.leave("conn-3");
        assert_eq!(rooms.current_turn(MATCH), Some(SeatId::T2B));
        assert!(rooms.is_players_turn("conn-4", MATCH));
    }

    #[test]
    fn test_leave_prefers_connected_seat() {
        let mut rooms = full_room();
        rooms.begin_hand(MATCH).unwrap();
        rooms.leave("conn-3"); // T2A reserved, disconnected
        rooms.leave("conn-1"); // T1A holds the turn
        assert_eq!(rooms.current_turn(MATCH), Some(SeatId::T1B));
    }

    #[test]
    fn test_leaving_turn_holder_passes_turn() {
        let mut rooms = full_room();
        rooms.begin_hand(MATCH).unwrap();
        rooms.leave("conn-1");
        assert_eq!(rooms.current_turn(MATCH), Some(SeatId::T2A));
        assert!(rooms.is_players_turn("conn-3", MATCH));
    }

    #[test]
    fn test_resume_hand_restores_turn() {
        let mut rooms = full_room();
        rooms.leave("conn-3"); // T2A

        let view = rooms.resume_hand(MATCH, Some(Side::B)).unwrap();
        assert_eq!(view.current_turn, Some(SeatId::T2B));

        // an existing turn is kept
        let view = rooms.resume_hand(MATCH, None).unwrap();
        assert_eq!(view.current_turn, Some(SeatId::T2B));
        assert!(rooms.has_room(MATCH));
        assert!(!rooms.has_room("match_2"));
    }

    #[test]
    fn test_end_hand_clears_turn() {
        let mut rooms = full_room();
        rooms.begin_hand(MATCH).unwrap();
        assert_eq!(rooms.end_hand(MATCH).unwrap().current_turn, None);
        assert!(!rooms.is_players_turn("conn-1", MATCH));
        assert_eq!(
            rooms.end_hand("nowhere"),
            Err(RoomError::RoomNotFound("nowhere".to_string()))
        );
    }
}
