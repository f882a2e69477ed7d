use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
mod repo;
mod repo_types;

pub(crate) use repo::find as find_client;

pub fn router() -> Router<AppState> {
    handlers::client_routes()
}
