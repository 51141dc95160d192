//! Application layer between transports and the rules engine.

pub mod errors;
pub mod match_service;
pub mod requests;
pub mod views;

pub use errors::{ServiceError, ServiceResult};
pub use match_service::MatchService;
pub use views::{MatchStateView, PlayCardResult, ScoreView, StartHandResult};
