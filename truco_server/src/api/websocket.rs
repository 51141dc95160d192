//! WebSocket sessions: the live command/event surface.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?token=<player token>`
//! 2. The server gives the connection a fresh id and spawns a send task
//!    draining the connection's event queue into the socket
//! 3. Every text frame is parsed as a [`ClientCommand`] and answered with
//!    its success event or an `error` event
//! 4. On disconnect the connection leaves its match; the seat stays
//!    reserved for the token
//!
//! Events broadcast by a match actor land in the same queue as direct
//! replies. Commands whose result is broadcast to the whole room
//! (`set-ready`, `start-hand`, `play-card`) get no separate reply.
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws?token=alice');
//! ws.send(JSON.stringify({ type: 'join-match', matchId: 'match_1' }));
//! ws.send(JSON.stringify({
//!   type: 'play-card',
//!   matchId: 'match_1',
//!   card: { rank: '7', suit: 'copas' },
//! }));
//! ```

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::{sync::atomic::Ordering, time::Instant};
use tokio::sync::mpsc;
use truco::{
    RoomError,
    service::{
        ServiceError, ServiceResult,
        requests::{card_from_parts, parse_vira},
    },
    table::{ClientCommand, ServerEvent},
};
use uuid::Uuid;

use super::{AppState, rate_limiter::RateLimiter};
use crate::{logging, metrics};

/// Queue between the actors and one socket.
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    token: Option<String>,
}

/// Upgrade to a WebSocket session.
///
/// A missing token does not refuse the upgrade; room commands are then
/// answered with "player token is required".
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let token = query
        .token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    ws.on_upgrade(move |socket| handle_socket(socket, token, state))
}

async fn handle_socket(socket: WebSocket, token: Option<String>, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();

    let open = state.connections.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(open);
    info!(
        "WebSocket connected: connection={}, token={}",
        connection_id,
        token.as_deref().map_or_else(|| "-".to_string(), logging::token_fingerprint)
    );

    let mut limiter = RateLimiter::default();
    let (events, mut outbox) = mpsc::channel::<ServerEvent>(EVENT_BUFFER);

    let send_task = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                if let Err(limit) = limiter.check() {
                    logging::log_security_event(
                        "rate_limited",
                        Some(&connection_id),
                        None,
                        limit.message(),
                    );
                    metrics::rate_limit_hits_total("ws");
                    if events.send(ServerEvent::error(limit.message())).await.is_err() {
                        break;
                    }
                    continue;
                }

                let reply = match serde_json::from_str::<ClientCommand>(&text) {
                    Ok(command) => {
                        let name = command_name(&command);
                        debug!("Connection {} sent {}", connection_id, name);
                        let started = Instant::now();
                        let outcome =
                            dispatch(&state, &connection_id, token.as_deref(), command, &events)
                                .await;
                        let elapsed_ms =
                            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                        logging::log_performance(name, elapsed_ms, Some(&connection_id));

                        match outcome {
                            Ok(reply) => reply,
                            Err(e) => {
                                metrics::commands_rejected_total(name);
                                debug!("Connection {}: {} rejected: {}", connection_id, name, e);
                                Some(ServerEvent::error(e.client_message()))
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        metrics::commands_rejected_total("malformed");
                        Some(ServerEvent::error("Invalid message format"))
                    }
                };

                if let Some(reply) = reply
                    && events.send(reply).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                if events
                    .send(ServerEvent::error("Invalid message format"))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: connection={}", connection_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    if let Some(match_id) = state.manager.leave(&connection_id).await {
        info!(
            "Connection {} left match {} on disconnect",
            connection_id, match_id
        );
        metrics::active_matches(state.manager.active_matches().await);
    }
    send_task.abort();

    let open = state.connections.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    metrics::websocket_connections_active(open);
    info!("WebSocket disconnected: connection={}", connection_id);
}

fn command_name(command: &ClientCommand) -> &'static str {
    match command {
        ClientCommand::CreateMatch { .. } => "create-match",
        ClientCommand::JoinMatch { .. } => "join-match",
        ClientCommand::SetReady { .. } => "set-ready",
        ClientCommand::StartHand { .. } => "start-hand",
        ClientCommand::PlayCard { .. } => "play-card",
        ClientCommand::GetState { .. } => "get-state",
    }
}

/// Run one command. `Ok(None)` means the result already reached the caller
/// through the room broadcast.
async fn dispatch(
    state: &AppState,
    connection_id: &str,
    token: Option<&str>,
    command: ClientCommand,
    events: &mpsc::Sender<ServerEvent>,
) -> ServiceResult<Option<ServerEvent>> {
    let manager = &state.manager;
    let require_token = || token.ok_or(ServiceError::Room(RoomError::MissingToken));

    match command {
        ClientCommand::CreateMatch { points_to_win } => {
            let points_to_win = points_to_win.or(Some(i64::from(state.default_points_to_win)));
            let match_id = manager.create_match(points_to_win).await?;
            metrics::matches_created_total();
            metrics::active_matches(manager.active_matches().await);
            Ok(Some(ServerEvent::Created { match_id }))
        }

        ClientCommand::JoinMatch { match_id } => {
            let token = require_token()?;
            let session = manager
                .join(&match_id, connection_id, token, events.clone())
                .await?;
            metrics::active_matches(manager.active_matches().await);
            Ok(Some((&session).into()))
        }

        ClientCommand::SetReady { ready } => {
            require_token()?;
            manager.set_ready(connection_id, ready).await?;
            Ok(None)
        }

        ClientCommand::StartHand {
            match_id,
            vira_rank,
        } => {
            require_token()?;
            let vira = vira_rank.as_deref().map(parse_vira).transpose()?;
            let result = manager.start_hand(connection_id, &match_id, vira).await?;
            if result.started {
                metrics::hands_started_total();
            }
            Ok(None)
        }

        ClientCommand::PlayCard { match_id, card } => {
            require_token()?;
            let card = card_from_parts(&card.rank, &card.suit)?;
            manager.play_card(connection_id, &match_id, card).await?;
            metrics::cards_played_total();
            Ok(None)
        }

        ClientCommand::GetState { match_id } => {
            let view = manager.view_state(&match_id).await?;
            Ok(Some(view.into()))
        }
    }
}
