//! Match use cases: create, start a hand, play a card, view.
//!
//! Input is normalized before the repository is touched, and a match is only
//! saved after the domain accepted the change.

use std::sync::Arc;

use super::{
    errors::{ServiceError, ServiceResult},
    requests::{normalize_match_id, normalize_points_to_win},
    views::{MatchStateView, PlayCardResult, StartHandResult},
};
use crate::{
    db::MatchRepository,
    game::{Card, Match, Rank, Side, StartOutcome},
    room::MatchId,
};

#[derive(Clone)]
pub struct MatchService {
    repository: Arc<dyn MatchRepository>,
}

impl MatchService {
    pub fn new(repository: Arc<dyn MatchRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn MatchRepository> {
        &self.repository
    }

    async fn load(&self, match_id: &str) -> ServiceResult<Match> {
        self.repository
            .get_by_id(match_id)
            .await?
            .ok_or_else(|| ServiceError::MatchNotFound(match_id.to_string()))
    }

    pub async fn exists(&self, match_id: &str) -> ServiceResult<bool> {
        let match_id = normalize_match_id(match_id)?;
        Ok(self.repository.get_by_id(&match_id).await?.is_some())
    }

    /// Create a match with the given threshold, 12 when absent.
    pub async fn create_match(&self, points_to_win: Option<i64>) -> ServiceResult<MatchId> {
        let points_to_win = normalize_points_to_win(points_to_win)?;
        let game = Match::new(points_to_win)?;
        let match_id = self.repository.create(&game).await?;
        log::info!("Match {match_id} created, {points_to_win} points to win");
        Ok(match_id)
    }

    /// Open a hand. Starting while a hand is running changes nothing and
    /// reports `started: false`.
    pub async fn start_hand(&self, match_id: &str, vira: Rank) -> ServiceResult<StartHandResult> {
        let match_id = normalize_match_id(match_id)?;
        let mut game = self.load(&match_id).await?;

        let started = match game.start(vira)? {
            StartOutcome::Started => {
                self.repository.save(&match_id, &game).await?;
                log::debug!("Match {match_id}: hand started with vira {vira}");
                true
            }
            StartOutcome::AlreadyInProgress => false,
        };

        let hand = game.current_hand();
        Ok(StartHandResult {
            vira: hand.map_or(vira, |hand| hand.vira()),
            awaiting: hand.and_then(|hand| hand.awaiting()),
            match_id,
            started,
        })
    }

    pub async fn play_card(
        &self,
        match_id: &str,
        side: Side,
        card: Card,
    ) -> ServiceResult<PlayCardResult> {
        let match_id = normalize_match_id(match_id)?;
        let mut game = self.load(&match_id).await?;

        let outcome = game.play(side, card)?;
        self.repository.save(&match_id, &game).await?;

        if let Some(winner) = outcome.match_winner {
            log::info!("Match {match_id} finished, side {winner} won");
        }

        Ok(PlayCardResult {
            state: MatchStateView::new(match_id, &game),
            outcome,
        })
    }

    pub async fn view_state(&self, match_id: &str) -> ServiceResult<MatchStateView> {
        let match_id = normalize_match_id(match_id)?;
        let game = self.load(&match_id).await?;
        Ok(MatchStateView::new(match_id, &game))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::InMemoryMatchRepository,
        game::{GameError, HandResult, MatchState},
    };

    fn service() -> MatchService {
        MatchService::new(Arc::new(InMemoryMatchRepository::new()))
    }

    fn card(code: &str) -> Card {
        Card::parse(code).unwrap()
    }

    #[tokio::test]
    async fn test_create_match_validates_points() {
        let service = service();
        let id = service.create_match(None).await.unwrap();
        assert_eq!(service.view_state(&id).await.unwrap().points_to_win, 12);

        let err = service.create_match(Some(0)).await.unwrap_err();
        assert_eq!(err.client_message(), "pointsToWin must be greater than 0");
    }

    #[tokio::test]
    async fn test_unknown_and_blank_match_ids() {
        let service = service();
        let err = service.start_hand("match_404", Rank::Four).await.unwrap_err();
        assert_eq!(err.client_message(), "match not found");

        let err = service.view_state("  ").await.unwrap_err();
        assert_eq!(err.client_message(), "matchId is required");
        assert!(!service.exists("match_404").await.unwrap());
    }

    #[tokio::test]
    async fn test_start_hand_twice_keeps_first_vira() {
        let service = service();
        let id = service.create_match(None).await.unwrap();

        let first = service.start_hand(&id, Rank::Four).await.unwrap();
        assert!(first.started);
        let second = service.start_hand(&format!(" {id} "), Rank::King).await.unwrap();
        assert!(!second.started);
        assert_eq!(second.vira, Rank::Four);
        assert_eq!(second.match_id, id);
        assert_eq!(second.awaiting, None);

        service.play_card(&id, Side::A, card("7C")).await.unwrap();
        let resumed = service.start_hand(&id, Rank::Four).await.unwrap();
        assert_eq!(resumed.awaiting, Some(Side::B));
    }

    #[tokio::test]
    async fn test_play_card_persists_and_scores() {
        let service = service();
        let id = service.create_match(Some(1)).await.unwrap();
        service.start_hand(&id, Rank::Four).await.unwrap();

        service.play_card(&id, Side::A, card("3C")).await.unwrap();
        let view = service.view_state(&id).await.unwrap();
        assert_eq!(view.state, MatchState::InProgress);
        assert_eq!(view.rounds_played, 0);
        assert_eq!(view.vira, Some(Rank::Four));

        service.play_card(&id, Side::B, card("4D")).await.unwrap();
        service.play_card(&id, Side::A, card("2C")).await.unwrap();
        let last = service.play_card(&id, Side::B, card("4H")).await.unwrap();

        assert_eq!(last.outcome.hand, Some(HandResult::Won(Side::A)));
        assert_eq!(last.state.state, MatchState::Finished);
        assert_eq!(last.state.score.side_a, 1);
        assert_eq!(service.view_state(&id).await.unwrap(), last.state);
    }

    #[tokio::test]
    async fn test_rejected_play_is_not_saved() {
        let service = service();
        let id = service.create_match(None).await.unwrap();

        let err = service.play_card(&id, Side::A, card("3C")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::MatchNotInProgress)));

        service.start_hand(&id, Rank::Four).await.unwrap();
        service.play_card(&id, Side::A, card("3C")).await.unwrap();
        let err = service.play_card(&id, Side::A, card("2C")).await.unwrap_err();
        assert_eq!(err.client_message(), "side A already played this round");

        let view = service.view_state(&id).await.unwrap();
        assert_eq!(view.rounds_played, 0);
    }
}
