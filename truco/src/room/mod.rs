//! Live-session coordination: which connection sits where, who is ready and
//! whose turn it is. Room state lives only in memory and is never persisted.

pub mod coordinator;
pub mod errors;
pub mod seat;

pub use coordinator::{PlayerSession, RoomCoordinator, RoomView, SeatView};
pub use errors::RoomError;
pub use seat::{SeatId, TeamId};

/// Identifier of a persisted match.
pub type MatchId = String;

/// Identifier of one live transport connection.
pub type ConnectionId = String;
