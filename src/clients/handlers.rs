use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{ClientInput, ClientRequest};
use super::repo;
use super::repo_types::Client;
use crate::{auth::AuthCoach, error::AppError, state::AppState};

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("Client not found".into())
}

#[instrument(skip(state))]
pub async fn list_clients(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
) -> Result<Json<Vec<Client>>, AppError> {
    Ok(Json(repo::list_by_coach(&state.db, coach_id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_client(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Json(body): Json<ClientRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Client>), AppError> {
    let input = ClientInput::try_from(body)?;
    let client = repo::create(&state.db, coach_id, &input).await?;
    info!(client_id = %client.id, %coach_id, "client created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/clients/{}", client.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(client)))
}

#[instrument(skip(state))]
pub async fn get_client(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    repo::find(&state.db, coach_id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state, body))]
pub async fn update_client(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Path(id): Path<Uuid>,
    Json(body): Json<ClientRequest>,
) -> Result<Json<Client>, AppError> {
    let input = ClientInput::try_from(body)?;
    repo::update(&state.db, coach_id, id, &input)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Plans keep their copy of the client's name; their `clientId` is cleared.
#[instrument(skip(state))]
pub async fn delete_client(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if repo::delete(&state.db, coach_id, id).await? {
        info!(client_id = %id, %coach_id, "client deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
