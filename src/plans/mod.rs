mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
mod repo;
mod repo_types;
mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::{PgPlanStore, PlanStore};
pub use repo_types::{ColorCode, IngredientEntry, Plan};

pub fn router() -> Router<AppState> {
    handlers::coach_routes()
}

pub fn public_router() -> Router<AppState> {
    handlers::public_routes()
}
