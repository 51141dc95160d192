//! # Truco
//!
//! Rules engine and live-session coordinator for Truco Paulista, a two-side,
//! four-seat trick-taking card game.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, the round resolver, hands with their tie cascade and
//!   the match aggregate with its snapshot format
//! - [`room`]: seats, reconnection by token, readiness and turn order
//! - [`db`]: the match repository port with in-memory and PostgreSQL adapters
//! - [`service`]: input normalization and the match use cases
//! - [`table`]: one actor per match plus the command/event protocol
//!
//! ## Example
//!
//! ```
//! use truco::game::{Card, Match, Rank, Side};
//!
//! let mut game = Match::new(1).unwrap();
//! game.start(Rank::Four).unwrap();
//! game.play(Side::A, Card::parse("3C").unwrap()).unwrap();
//! game.play(Side::B, Card::parse("4D").unwrap()).unwrap();
//! game.play(Side::A, Card::parse("2C").unwrap()).unwrap();
//! let outcome = game.play(Side::B, Card::parse("4H").unwrap()).unwrap();
//!
//! assert_eq!(outcome.match_winner, Some(Side::A));
//! assert!(game.is_finished());
//! ```

pub mod db;
pub mod game;
pub mod room;
pub mod service;
pub mod table;

pub use game::{
    Card, GameError, Match, MatchState, Rank, Side, Suit,
    constants::{self, DEFAULT_POINTS_TO_WIN},
};
pub use room::{PlayerSession, RoomCoordinator, RoomError, SeatId, TeamId};
pub use service::{MatchService, ServiceError};
pub use table::{ClientCommand, MatchManager, ServerEvent};
