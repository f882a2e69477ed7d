use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod handlers;
mod jwt;
mod password;
mod repo;
mod repo_types;
mod services;

pub use jwt::AuthCoach;
pub(crate) use services::is_valid_email;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
