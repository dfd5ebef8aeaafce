pub mod dto;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod handlers;
pub mod prompt;
pub mod service;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::analysis_routes()
}
