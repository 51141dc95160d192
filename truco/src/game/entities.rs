use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::errors::GameError;

/// The ten ranks of the Truco deck, declared weakest to strongest.
///
/// The deck has no 8, 9 or 10. Declaration order is the base strength used
/// when neither card is a manilha, and also the cyclic order used to derive
/// the manilha from the vira.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Rank {
    Four,
    Five,
    Six,
    Seven,
    Queen,
    Jack,
    King,
    Ace,
    Two,
    Three,
}

impl Rank {
    pub const ALL: [Rank; 10] = [
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Queen,
        Self::Jack,
        Self::King,
        Self::Ace,
        Self::Two,
        Self::Three,
    ];

    /// Position in the base order, 0 for `4` up to 9 for `3`.
    #[must_use]
    pub fn strength(self) -> u8 {
        self as u8
    }

    /// Next rank in the cyclic order. `3` wraps around to `4`.
    #[must_use]
    pub fn successor(self) -> Rank {
        let idx = (self.strength() as usize + 1) % Self::ALL.len();
        Self::ALL[idx]
    }

    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Four => '4',
            Self::Five => '5',
            Self::Six => '6',
            Self::Seven => '7',
            Self::Queen => 'Q',
            Self::Jack => 'J',
            Self::King => 'K',
            Self::Ace => 'A',
            Self::Two => '2',
            Self::Three => '3',
        }
    }

    #[must_use]
    pub fn from_symbol(symbol: char) -> Option<Rank> {
        Self::ALL
            .into_iter()
            .find(|rank| rank.symbol() == symbol.to_ascii_uppercase())
    }

    /// Parse a single rank symbol, ignoring surrounding whitespace and case.
    pub fn parse(raw: &str) -> Result<Rank, GameError> {
        let normalized = raw.trim().to_uppercase();
        let mut chars = normalized.chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => {
                Self::from_symbol(symbol).ok_or_else(|| GameError::InvalidRank(raw.to_string()))
            }
            _ => Err(GameError::InvalidRank(raw.to_string())),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Rank {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Rank {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.to_string()
    }
}

/// Card suits. Only consulted when both cards of a round are manilhas.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Suit {
    Clubs,
    Hearts,
    Spades,
    Diamonds,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Self::Clubs, Self::Hearts, Self::Spades, Self::Diamonds];

    /// Fixed manilha strength: clubs > hearts > spades > diamonds.
    #[must_use]
    pub fn strength(self) -> u8 {
        match self {
            Self::Clubs => 3,
            Self::Hearts => 2,
            Self::Spades => 1,
            Self::Diamonds => 0,
        }
    }

    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Clubs => 'C',
            Self::Hearts => 'H',
            Self::Spades => 'S',
            Self::Diamonds => 'D',
        }
    }

    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::Clubs => '♣',
            Self::Hearts => '♥',
            Self::Spades => '♠',
            Self::Diamonds => '♦',
        }
    }

    #[must_use]
    pub fn from_symbol(symbol: char) -> Option<Suit> {
        Self::ALL
            .into_iter()
            .find(|suit| suit.symbol() == symbol.to_ascii_uppercase())
    }

    /// Parse a single suit letter, ignoring surrounding whitespace and case.
    pub fn parse(raw: &str) -> Result<Suit, GameError> {
        let normalized = raw.trim().to_uppercase();
        let mut chars = normalized.chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => {
                Self::from_symbol(symbol).ok_or_else(|| GameError::InvalidSuit(raw.to_string()))
            }
            _ => Err(GameError::InvalidSuit(raw.to_string())),
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl TryFrom<String> for Suit {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Suit> for String {
    fn from(suit: Suit) -> Self {
        suit.to_string()
    }
}

/// An immutable card, written as a two character code such as `5C` or `QH`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    #[must_use]
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Parse a card code.
    ///
    /// Whitespace around the code is ignored and letters are case
    /// insensitive. Anything that is not exactly one rank symbol followed by
    /// one suit letter fails with [`GameError::InvalidCard`].
    ///
    /// ```
    /// use truco::game::entities::{Card, Rank, Suit};
    ///
    /// let card = Card::parse(" qh ").unwrap();
    /// assert_eq!(card, Card::new(Rank::Queen, Suit::Hearts));
    /// assert!(Card::parse("8C").is_err());
    /// ```
    pub fn parse(code: &str) -> Result<Card, GameError> {
        let normalized = code.trim().to_uppercase();
        let mut chars = normalized.chars();
        let parsed = match (chars.next(), chars.next(), chars.next()) {
            (Some(rank), Some(suit), None) => {
                Rank::from_symbol(rank).zip(Suit::from_symbol(suit))
            }
            _ => None,
        };

        parsed
            .map(|(rank, suit)| Card::new(rank, suit))
            .ok_or_else(|| GameError::InvalidCard(code.to_string()))
    }

    #[must_use]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    #[must_use]
    pub fn suit(&self) -> Suit {
        self.suit
    }

    /// Every card of the 40-card deck.
    pub fn all() -> impl Iterator<Item = Card> {
        Rank::ALL
            .into_iter()
            .flat_map(|rank| Suit::ALL.into_iter().map(move |suit| Card::new(rank, suit)))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Card {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.to_string()
    }
}

/// One of the two competing parties of a match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const ALL: [Side; 2] = [Self::A, Self::B];

    #[must_use]
    pub fn other(self) -> Side {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::A => "A",
            Self::B => "B",
        };
        write!(f, "{repr}")
    }
}
