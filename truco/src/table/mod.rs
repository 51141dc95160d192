//! Match runtime built on the actor model.
//!
//! Each match runs in its own Tokio task with an mpsc inbox; replies travel
//! back over oneshot channels. The [`MatchManager`] spawns actors on demand
//! and routes connections to them, so every mutation of one match is applied
//! in inbox order by a single writer.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use truco::{db::InMemoryMatchRepository, table::MatchManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), truco::service::ServiceError> {
//!     let manager = MatchManager::new(Arc::new(InMemoryMatchRepository::new()));
//!     let match_id = manager.create_match(Some(12)).await?;
//!
//!     let (events, _inbox) = mpsc::channel(32);
//!     let session = manager.join(&match_id, "conn-1", "player-token", events).await?;
//!     println!("seated at {}", session.seat);
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod manager;
pub mod messages;

pub use actor::{MatchActor, MatchHandle};
pub use manager::MatchManager;
pub use messages::{CardPayload, CardPlayed, ClientCommand, MatchMessage, RoomPlayer, ServerEvent};
