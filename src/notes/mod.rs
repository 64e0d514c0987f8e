pub mod dto;
pub mod handlers;
pub mod html;
pub mod repo;
pub mod repo_types;
pub mod users;

use crate::state::NotesState;
use axum::Router;

pub fn router() -> Router<NotesState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
