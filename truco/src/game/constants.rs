//! Fixed numbers of the game.

/// Points a side needs to win a match when the creator does not say otherwise.
pub const DEFAULT_POINTS_TO_WIN: u32 = 12;

/// A hand is best of three rounds.
pub const MAX_ROUNDS_PER_HAND: usize = 3;

/// Round wins that settle a hand outright.
pub const ROUND_WINS_FOR_HAND: usize = 2;

/// Number of seats in a room, split evenly between the two teams.
pub const SEAT_COUNT: usize = 4;

/// Version written into every persisted match snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;
