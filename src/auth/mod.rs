use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod service;
pub mod session;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
