use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, patch, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    CreatePlanRequest, Pagination, PlanDetails, PlanListItem, PublicPlanView,
    RegenerateTokenRequest, ReplaceIngredientsRequest, TrackingAck, TrackingRequest,
};
use super::repo_types::PlanStatus;
use super::services::{self, PlanError};
use crate::{auth::AuthCoach, clients, error::AppError, state::AppState};

pub fn coach_routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/:id", get(get_plan).delete(delete_plan))
        .route("/plans/:id/ingredients", put(replace_ingredients))
        .route("/plans/:id/publish", post(publish_plan))
        .route("/plans/:id/unpublish", post(unpublish_plan))
        .route("/plans/:id/share-token", post(regenerate_share_token))
}

/// Routes reachable with nothing but a share token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/public/plans/:token", get(get_public_plan))
        .route("/public/plans/:token/tracking", patch(update_tracking))
}

fn details(state: &AppState, plan: super::Plan) -> PlanDetails {
    PlanDetails::from_plan(plan, &state.tracking_policy, &state.config.share)
}

// --- coach ---

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<PlanListItem>>, AppError> {
    let (limit, offset) = p.clamped();
    let plans = state
        .plans
        .list_by_coach(coach_id, limit, offset)
        .await
        .map_err(PlanError::Store)?;
    Ok(Json(
        plans
            .into_iter()
            .map(|plan| PlanListItem::from_plan(plan, &state.tracking_policy))
            .collect(),
    ))
}

#[instrument(skip(state, body))]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Json(body): Json<CreatePlanRequest>,
) -> Result<(StatusCode, HeaderMap, Json<PlanDetails>), AppError> {
    if let Some(client_id) = body.client_id {
        if clients::find_client(&state.db, coach_id, client_id).await?.is_none() {
            return Err(AppError::BadRequest("Unknown clientId".into()));
        }
    }

    let plan = services::create_plan(
        state.plans.as_ref(),
        coach_id,
        body,
        state.config.share.token_length,
    )
    .await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/plans/{}", plan.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(details(&state, plan))))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanDetails>, AppError> {
    let plan = state
        .plans
        .find_by_id(coach_id, id)
        .await
        .map_err(PlanError::Store)?
        .ok_or(PlanError::PlanNotFound)?;
    Ok(Json(details(&state, plan)))
}

#[instrument(skip(state, body))]
pub async fn replace_ingredients(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Path(id): Path<Uuid>,
    Json(body): Json<ReplaceIngredientsRequest>,
) -> Result<Json<PlanDetails>, AppError> {
    let plan =
        services::replace_ingredients(state.plans.as_ref(), coach_id, id, body.ingredients).await?;
    Ok(Json(details(&state, plan)))
}

#[instrument(skip(state))]
pub async fn publish_plan(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanDetails>, AppError> {
    let plan = services::set_status(state.plans.as_ref(), coach_id, id, PlanStatus::Published).await?;
    Ok(Json(details(&state, plan)))
}

#[instrument(skip(state))]
pub async fn unpublish_plan(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanDetails>, AppError> {
    let plan = services::set_status(state.plans.as_ref(), coach_id, id, PlanStatus::Draft).await?;
    Ok(Json(details(&state, plan)))
}

/// An empty body regenerates a standard token. Any other body must parse.
#[instrument(skip(state, body))]
pub async fn regenerate_share_token(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<PlanDetails>, AppError> {
    let req = parse_regenerate_body(&body)?;
    let plan = services::regenerate_share_token(
        state.plans.as_ref(),
        coach_id,
        id,
        req.format,
        state.config.share.token_length,
    )
    .await?;
    Ok(Json(details(&state, plan)))
}

fn parse_regenerate_body(body: &[u8]) -> Result<RegenerateTokenRequest, PlanError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RegenerateTokenRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "malformed regenerate body");
        PlanError::InvalidRequest(e.to_string())
    })
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .plans
        .delete(coach_id, id)
        .await
        .map_err(PlanError::Store)?;
    if !deleted {
        return Err(PlanError::PlanNotFound.into());
    }
    info!(plan_id = %id, %coach_id, "plan deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- public ---

/// Read-only view for the client. Food names are best effort: if the catalog
/// cannot be read the view is served without them.
#[instrument(skip_all)]
pub async fn get_public_plan(
    State(state): State<AppState>,
    Path(raw_token): Path<String>,
) -> Result<Json<PublicPlanView>, AppError> {
    let token = services::parse_share_token(&raw_token)
        .inspect_err(|_| warn!("malformed share token"))?;
    let plan = services::published_plan(state.plans.as_ref(), &token).await?;

    let ids: Vec<String> = plan.ingredients.iter().map(|i| i.food_id.clone()).collect();
    let names = state.foods.names_for(&ids).await.unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), plan_id = %plan.id, "food names unavailable");
        Default::default()
    });

    Ok(Json(PublicPlanView::from_plan(plan, &state.tracking_policy, &names)))
}

/// The token is checked before the body so malformed tokens never reach
/// storage regardless of what else is wrong with the request.
#[instrument(skip_all)]
pub async fn update_tracking(
    State(state): State<AppState>,
    Path(raw_token): Path<String>,
    body: Result<Json<TrackingRequest>, JsonRejection>,
) -> Result<Json<TrackingAck>, AppError> {
    let token = services::parse_share_token(&raw_token)
        .inspect_err(|_| warn!("malformed share token"))?;
    let Json(update) = body.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "malformed tracking body");
        PlanError::InvalidRequest(rejection.body_text())
    })?;

    let ack = services::update_tracking(state.plans.as_ref(), &token, update).await?;
    Ok(Json(ack))
}
