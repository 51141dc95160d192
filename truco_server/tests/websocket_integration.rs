//! WebSocket sessions against a live server: commands, broadcasts and error
//! events.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use truco::{db::InMemoryMatchRepository, table::MatchManager};
use truco_server::api::{AppState, create_router};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let manager = MatchManager::new(Arc::new(InMemoryMatchRepository::new()));
    let app = create_router(AppState::new(manager, None, 12));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, token: Option<&str>) -> Client {
    let url = match token {
        Some(token) => format!("ws://{addr}/ws?token={token}"),
        None => format!("ws://{addr}/ws"),
    };
    let (client, _) = connect_async(url).await.expect("Failed to connect to WebSocket");
    client
}

async fn send(client: &mut Client, command: Value) {
    client.send(Message::text(command.to_string())).await.unwrap();
}

/// Next JSON event, failing after two seconds of silence.
async fn next_event(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for an event")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip events until one of the given type arrives.
async fn wait_for(client: &mut Client, kind: &str) -> Value {
    wait_until(client, kind, |_| true).await
}

/// Skip events until one of the given type satisfies `accept`.
async fn wait_until(client: &mut Client, kind: &str, accept: impl Fn(&Value) -> bool) -> Value {
    loop {
        let event = next_event(client).await;
        if event["type"] == kind && accept(&event) {
            return event;
        }
    }
}

async fn create_match(client: &mut Client, points_to_win: u32) -> String {
    send(client, json!({ "type": "create-match", "pointsToWin": points_to_win })).await;
    let created = wait_for(client, "created").await;
    created["matchId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_malformed_input_keeps_connection_open() {
    let addr = spawn_server().await;
    let mut client = connect(addr, Some("alice")).await;

    client.send(Message::text("{not json".to_string())).await.unwrap();
    let event = next_event(&mut client).await;
    assert_eq!(event, json!({ "type": "error", "message": "Invalid message format" }));

    send(&mut client, json!({ "type": "fold" })).await;
    assert_eq!(next_event(&mut client).await["type"], "error");

    send(&mut client, json!({ "type": "get-state", "matchId": "match_404" })).await;
    let event = next_event(&mut client).await;
    assert_eq!(event["message"], "match not found");

    send(
        &mut client,
        json!({
            "type": "play-card",
            "matchId": "match_404",
            "card": { "rank": "3", "suit": "stars" }
        }),
    )
    .await;
    assert_eq!(next_event(&mut client).await["message"], "invalid suit: stars");
}

#[tokio::test]
async fn test_room_commands_require_a_token() {
    let addr = spawn_server().await;
    let mut client = connect(addr, None).await;

    let match_id = create_match(&mut client, 12).await;

    send(&mut client, json!({ "type": "join-match", "matchId": match_id })).await;
    let event = next_event(&mut client).await;
    assert_eq!(event["message"], "player token is required");

    send(&mut client, json!({ "type": "set-ready", "ready": true })).await;
    assert_eq!(next_event(&mut client).await["message"], "player token is required");

    // reads stay open to anonymous connections
    send(&mut client, json!({ "type": "get-state", "matchId": match_id })).await;
    let state = next_event(&mut client).await;
    assert_eq!(state["type"], "match-state");
    assert_eq!(state["state"], "waiting");
}

#[tokio::test]
async fn test_four_players_finish_a_match() {
    let addr = spawn_server().await;

    let mut clients = Vec::new();
    for token in ["p1", "p2", "p3", "p4"] {
        clients.push(connect(addr, Some(token)).await);
    }
    let match_id = create_match(&mut clients[0], 1).await;

    let expected_seats = ["T1A", "T1B", "T2A", "T2B"];
    for (client, seat) in clients.iter_mut().zip(expected_seats) {
        send(client, json!({ "type": "join-match", "matchId": match_id })).await;
        let assigned = wait_for(client, "player-assigned").await;
        assert_eq!(assigned["seatId"], seat);
    }

    // starting before everyone is ready fails
    send(
        &mut clients[0],
        json!({ "type": "start-hand", "matchId": match_id, "viraRank": "4" }),
    )
    .await;
    assert_eq!(
        wait_for(&mut clients[0], "error").await["message"],
        "not all players are ready"
    );

    for client in clients.iter_mut() {
        send(client, json!({ "type": "set-ready", "ready": true })).await;
    }
    wait_until(&mut clients[0], "room-state", |room| room["canStart"] == true).await;

    send(
        &mut clients[0],
        json!({ "type": "start-hand", "matchId": match_id, "viraRank": "4" }),
    )
    .await;
    for client in clients.iter_mut() {
        let started = wait_for(client, "hand-started").await;
        assert_eq!(started["viraRank"], "4");
    }

    // T1B does not open the hand
    send(
        &mut clients[1],
        json!({
            "type": "play-card",
            "matchId": match_id,
            "card": { "rank": "3", "suit": "paus" }
        }),
    )
    .await;
    assert_eq!(wait_for(&mut clients[1], "error").await["message"], "not your turn");

    // T1A, T2A, T1B, T2B; vira 4 makes 5 the manilha, side A takes two rounds
    let plays = [(0, "3", "C"), (2, "4", "D"), (1, "2", "C"), (3, "4", "H")];
    for (seat, rank, suit) in plays {
        let seat_id = expected_seats[seat];
        send(
            &mut clients[seat],
            json!({
                "type": "play-card",
                "matchId": match_id,
                "card": { "rank": rank, "suit": suit }
            }),
        )
        .await;
        let played = wait_until(&mut clients[seat], "card-played", |event| {
            event["seatId"] == seat_id
        })
        .await;
        assert_eq!(played["card"], format!("{rank}{suit}"));
    }

    let state = wait_until(&mut clients[3], "match-state", |state| {
        state["state"] == "finished"
    })
    .await;
    assert_eq!(state["score"], json!({ "sideA": 1, "sideB": 0 }));
}

#[tokio::test]
async fn test_reconnect_with_same_token_keeps_seat() {
    let addr = spawn_server().await;
    let mut first = connect(addr, Some("carol")).await;
    let match_id = create_match(&mut first, 12).await;

    send(&mut first, json!({ "type": "join-match", "matchId": match_id })).await;
    assert_eq!(wait_for(&mut first, "player-assigned").await["seatId"], "T1A");

    let mut other = connect(addr, Some("dave")).await;
    send(&mut other, json!({ "type": "join-match", "matchId": match_id })).await;
    assert_eq!(wait_for(&mut other, "player-assigned").await["seatId"], "T1B");

    first.close(None).await.unwrap();
    drop(first);

    // the disconnect shows up as a room-state for the remaining player
    let room = wait_until(&mut other, "room-state", |room| {
        room["players"][0]["connected"] == false
    })
    .await;
    assert_eq!(room["players"][0]["seatId"], "T1A");

    let mut again = connect(addr, Some("carol")).await;
    send(&mut again, json!({ "type": "join-match", "matchId": match_id })).await;
    let assigned = wait_for(&mut again, "player-assigned").await;
    assert_eq!(assigned["seatId"], "T1A");
    assert_eq!(assigned["teamId"], "T1");
    assert_eq!(assigned["domainSide"], "A");
}
