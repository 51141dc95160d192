//! Card comparison under a vira.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::entities::{Card, Rank, Side};

/// Result of comparing card `a` against card `b`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Outcome {
    A,
    B,
    Tie,
}

impl Outcome {
    /// The outcome of the same comparison with the arguments swapped.
    #[must_use]
    pub fn flip(self) -> Outcome {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
            Self::Tie => Self::Tie,
        }
    }

    fn from_ordering(ordering: Ordering) -> Outcome {
        match ordering {
            Ordering::Greater => Self::A,
            Ordering::Less => Self::B,
            Ordering::Equal => Self::Tie,
        }
    }

    /// Map the outcome onto sides, `a` being side A's card.
    #[must_use]
    pub fn winner(self) -> Option<Side> {
        match self {
            Self::A => Some(Side::A),
            Self::B => Some(Side::B),
            Self::Tie => None,
        }
    }
}

/// The manilha of a hand is the rank right after the vira.
#[must_use]
pub fn manilha_for(vira: Rank) -> Rank {
    vira.successor()
}

/// Compare two cards under the given vira.
///
/// A lone manilha wins outright. Two manilhas are decided by suit strength.
/// Otherwise the base rank order decides and equal ranks tie, whatever the
/// suits.
///
/// ```
/// use truco::game::entities::{Card, Rank};
/// use truco::game::rules::{Outcome, compare};
///
/// let five = Card::parse("5D").unwrap();
/// let three = Card::parse("3C").unwrap();
/// // Vira 4 makes 5 the manilha, beating the otherwise strongest rank.
/// assert_eq!(compare(five, three, Rank::Four), Outcome::A);
/// ```
#[must_use]
pub fn compare(a: Card, b: Card, vira: Rank) -> Outcome {
    let manilha = manilha_for(vira);

    match (a.rank() == manilha, b.rank() == manilha) {
        (true, false) => Outcome::A,
        (false, true) => Outcome::B,
        (true, true) => Outcome::from_ordering(a.suit().strength().cmp(&b.suit().strength())),
        (false, false) => Outcome::from_ordering(a.rank().strength().cmp(&b.rank().strength())),
    }
}
