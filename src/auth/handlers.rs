use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{AuthResponse, LoginRequest, PublicCoach, RefreshRequest, RegisterRequest};
use super::jwt::{AuthCoach, JwtKeys};
use super::password::{hash_password, verify_password};
use super::repo_types::Coach;
use super::services::{is_valid_email, issue_tokens, normalize_email, validate_registration};
use crate::{error::AppError, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    validate_registration(&mut payload).inspect_err(|e| warn!(error = %e, "registration rejected"))?;

    let hash = hash_password(&payload.password)?;
    let coach = Coach::create(&state.db, &payload.email, payload.name.as_deref(), &hash)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "email already registered");
            AppError::Conflict("Email already registered".into())
        })?;

    info!(coach_id = %coach.id, email = %coach.email, "coach registered");
    let keys = JwtKeys::from_ref(&state);
    Ok((StatusCode::CREATED, Json(issue_tokens(&keys, coach)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".into());
    let Some(coach) = Coach::find_by_email(&state.db, &email).await? else {
        warn!(%email, "login unknown email");
        return Err(invalid());
    };
    if !verify_password(&payload.password, &coach.password_hash)? {
        warn!(coach_id = %coach.id, "login invalid password");
        return Err(invalid());
    }

    info!(coach_id = %coach.id, "coach logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, coach)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("Invalid refresh token".into())
    })?;

    let coach = Coach::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Coach not found".into()))?;
    Ok(Json(issue_tokens(&keys, coach)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
) -> Result<Json<PublicCoach>, AppError> {
    let coach = Coach::find_by_id(&state.db, coach_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Coach not found".into()))?;
    Ok(Json(coach.into()))
}
