//! End-to-end match flows through the use cases and the in-memory repository.

use std::sync::Arc;
use truco::{
    db::{InMemoryMatchRepository, MatchRepository},
    game::{Card, GameError, HandResult, MatchState, Rank, Side},
    service::{MatchService, ServiceError, requests::card_from_parts},
};

fn card(code: &str) -> Card {
    Card::parse(code).unwrap()
}

fn setup() -> (MatchService, Arc<InMemoryMatchRepository>) {
    let repository = Arc::new(InMemoryMatchRepository::new());
    (MatchService::new(repository.clone()), repository)
}

#[tokio::test]
async fn test_single_point_match_runs_to_completion() {
    let (service, _) = setup();
    let id = service.create_match(Some(1)).await.unwrap();

    let started = service.start_hand(&id, Rank::Four).await.unwrap();
    assert!(started.started);

    // vira 4 makes 5 the manilha
    let plays = [
        (Side::A, card_from_parts("5", "paus").unwrap()),
        (Side::B, card_from_parts("3", "♥").unwrap()),
        (Side::A, card_from_parts("2", "hearts").unwrap()),
        (Side::B, card_from_parts("K", "S").unwrap()),
    ];
    let mut last = None;
    for (side, card) in plays {
        last = Some(service.play_card(&id, side, card).await.unwrap());
    }
    let last = last.unwrap();

    assert_eq!(last.outcome.hand, Some(HandResult::Won(Side::A)));
    assert_eq!(last.outcome.match_winner, Some(Side::A));

    let view = service.view_state(&id).await.unwrap();
    assert_eq!(view.state, MatchState::Finished);
    assert_eq!((view.score.side_a, view.score.side_b), (1, 0));

    let err = service.start_hand(&id, Rank::Five).await.unwrap_err();
    assert!(matches!(err, ServiceError::Game(GameError::MatchFinished)));
    assert_eq!(err.client_message(), "match already finished");
}

#[tokio::test]
async fn test_tie_cascade_through_the_service() {
    let (service, _) = setup();
    let id = service.create_match(None).await.unwrap();

    // first round tied, second decides
    service.start_hand(&id, Rank::Four).await.unwrap();
    for (side, code) in [(Side::A, "7C"), (Side::B, "7H"), (Side::A, "QD"), (Side::B, "AD")] {
        service.play_card(&id, side, card(code)).await.unwrap();
    }
    let view = service.view_state(&id).await.unwrap();
    assert_eq!(view.state, MatchState::Waiting);
    assert_eq!((view.score.side_a, view.score.side_b), (0, 1));

    // three ties: nobody scores
    service.start_hand(&id, Rank::Four).await.unwrap();
    for (a, b) in [("6C", "6H"), ("KC", "KD"), ("JS", "JH")] {
        service.play_card(&id, Side::A, card(a)).await.unwrap();
        service.play_card(&id, Side::B, card(b)).await.unwrap();
    }
    let view = service.view_state(&id).await.unwrap();
    assert_eq!((view.score.side_a, view.score.side_b), (0, 1));
    assert_eq!(view.rounds_played, 0);
}

#[tokio::test]
async fn test_match_resumes_from_repository_mid_round() {
    let (service, repository) = setup();
    let id = service.create_match(Some(3)).await.unwrap();
    service.start_hand(&id, Rank::Two).await.unwrap();
    service.play_card(&id, Side::B, card("3D")).await.unwrap();

    // a fresh service over the same storage sees the half-played round
    let resumed = MatchService::new(repository.clone());
    let err = resumed
        .play_card(&id, Side::B, card("3S"))
        .await
        .unwrap_err();
    assert_eq!(err.client_message(), "side B already played this round");

    // vira 2 makes 3 the manilha; clubs beats diamonds
    let result = resumed.play_card(&id, Side::A, card("3C")).await.unwrap();
    assert_eq!(result.state.rounds_played, 1);

    let stored = repository.get_by_id(&id).await.unwrap().unwrap();
    let round = &stored.current_hand().unwrap().rounds()[0];
    assert_eq!(round.result().unwrap().winner(), Some(Side::A));
}
