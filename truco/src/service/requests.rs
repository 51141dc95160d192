//! Normalization of raw client input into domain values.
//!
//! Every helper fails with [`ServiceError::Validation`] and a message meant to
//! be shown to the client as is.

use rand::Rng;

use super::errors::{ServiceError, ServiceResult};
use crate::game::{Card, Rank, Suit, constants::DEFAULT_POINTS_TO_WIN};

pub fn normalize_match_id(raw: &str) -> ServiceResult<String> {
    let normalized = raw.trim();
    if normalized.is_empty() {
        return Err(ServiceError::validation("matchId is required"));
    }
    Ok(normalized.to_string())
}

/// Missing means the default of 12. Anything else must be positive.
pub fn normalize_points_to_win(raw: Option<i64>) -> ServiceResult<u32> {
    match raw {
        None => Ok(DEFAULT_POINTS_TO_WIN),
        Some(value) if value <= 0 => Err(ServiceError::validation(
            "pointsToWin must be greater than 0",
        )),
        Some(value) => u32::try_from(value)
            .map_err(|_| ServiceError::validation("pointsToWin is too large")),
    }
}

pub fn parse_vira(raw: &str) -> ServiceResult<Rank> {
    let normalized = raw.trim();
    if normalized.is_empty() {
        return Err(ServiceError::validation("viraRank is required"));
    }
    Rank::parse(normalized)
        .map_err(|_| ServiceError::validation(format!("invalid rank: {normalized}")))
}

/// Accepts suit letters, English and Portuguese names and the card glyphs,
/// in any case.
pub fn normalize_suit(raw: &str) -> ServiceResult<Suit> {
    let normalized = raw.trim().to_uppercase();
    let suit = match normalized.as_str() {
        "C" | "CLUBS" | "PAUS" | "♣" => Suit::Clubs,
        "H" | "HEARTS" | "COPAS" | "♥" => Suit::Hearts,
        "S" | "SPADES" | "ESPADAS" | "♠" => Suit::Spades,
        "D" | "DIAMONDS" | "OUROS" | "♦" => Suit::Diamonds,
        _ => {
            return Err(ServiceError::validation(format!(
                "invalid suit: {}",
                raw.trim()
            )));
        }
    };
    Ok(suit)
}

/// Build a card from a separately sent rank and suit.
pub fn card_from_parts(rank: &str, suit: &str) -> ServiceResult<Card> {
    let rank = rank.trim();
    if rank.is_empty() {
        return Err(ServiceError::validation("card.rank is required"));
    }
    if suit.trim().is_empty() {
        return Err(ServiceError::validation("card.suit is required"));
    }

    let rank = Rank::parse(rank)
        .map_err(|_| ServiceError::validation(format!("invalid rank: {rank}")))?;
    Ok(Card::new(rank, normalize_suit(suit)?))
}

/// A uniformly drawn vira, for hands started without one.
pub fn draw_vira() -> Rank {
    draw_vira_with(&mut rand::rng())
}

pub fn draw_vira_with<R: Rng + ?Sized>(rng: &mut R) -> Rank {
    Rank::ALL[rng.random_range(0..Rank::ALL.len())]
}
