use crate::state::AuthState;
use axum::Router;

pub mod claims;
pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AuthState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::session_routes())
}
