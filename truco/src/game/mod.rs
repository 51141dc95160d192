//! Truco rules engine.
//!
//! Everything here is synchronous and free of I/O. Commands flow down from
//! [`Match`] to the running [`Hand`] and its current [`Round`]; results bubble
//! back up as [`PlayOutcome`]s.

pub mod constants;
pub mod entities;
pub mod errors;
pub mod hand;
pub mod round;
pub mod rules;
pub mod score;
pub mod snapshot;
pub mod state_machine;

pub use entities::{Card, Rank, Side, Suit};
pub use errors::GameError;
pub use hand::{Hand, HandResult};
pub use round::{Round, RoundResult};
pub use rules::{Outcome, compare, manilha_for};
pub use score::Score;
pub use snapshot::MatchSnapshot;
pub use state_machine::{Match, MatchState, PlayOutcome, StartOutcome};
