use std::collections::HashSet;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{CreatePlanRequest, TrackingAck, TrackingRequest};
use super::repo::PlanStore;
use super::repo_types::{IngredientDraft, NewPlan, Plan, PlanStatus};
use crate::error::AppError;
use crate::share::{ShareToken, TokenError, TokenFormat};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid token format")]
    InvalidToken,

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    /// Public lookup by token found nothing.
    #[error("Not found")]
    NotFound,

    /// Coach lookup by id found nothing owned by the caller.
    #[error("Plan not found")]
    PlanNotFound,

    #[error("Not available")]
    NotShared,

    #[error("Not available for updates")]
    NotAvailableForUpdates,

    #[error("Ingredient not found")]
    IngredientNotFound,

    #[error("Unpublish the plan before regenerating its share link")]
    ShareTokenLocked,

    #[error("share token generation failed")]
    Token(#[from] TokenError),

    #[error("plan store failure")]
    Store(#[source] anyhow::Error),
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::InvalidToken | PlanError::InvalidRequest(_) => {
                AppError::BadRequest(e.to_string())
            }
            PlanError::NotFound | PlanError::PlanNotFound | PlanError::IngredientNotFound => {
                AppError::NotFound(e.to_string())
            }
            PlanError::NotShared | PlanError::NotAvailableForUpdates => {
                AppError::Forbidden(e.to_string())
            }
            PlanError::ShareTokenLocked => AppError::Conflict(e.to_string()),
            PlanError::Token(inner) => AppError::Internal(inner.into()),
            PlanError::Store(inner) => AppError::Internal(inner),
        }
    }
}

/// Syntactic check of an inbound token, before any storage access.
pub fn parse_share_token(raw: &str) -> Result<ShareToken, PlanError> {
    ShareToken::parse(raw).map_err(|_| PlanError::InvalidToken)
}

/// Resolves a token to a plan the public may see.
pub async fn published_plan(store: &dyn PlanStore, token: &ShareToken) -> Result<Plan, PlanError> {
    let plan = store
        .find_by_share_token(token.as_str())
        .await
        .map_err(PlanError::Store)?
        .ok_or(PlanError::NotFound)?;
    if plan.status != PlanStatus::Published {
        return Err(PlanError::NotShared);
    }
    Ok(plan)
}

/// Sets `clientChecked` of one ingredient on a published plan.
///
/// Checks run in order: plan exists, plan is published, ingredient exists.
/// `foodId` must match a stored id exactly. Only the matched ingredient's flag
/// is written, and only while the plan is still published under this token.
/// Setting the same value twice is a no-op the second time.
pub async fn update_tracking(
    store: &dyn PlanStore,
    token: &ShareToken,
    update: TrackingRequest,
) -> Result<TrackingAck, PlanError> {
    let food_id = update.food_id.as_str();
    if food_id.trim().is_empty() {
        return Err(PlanError::InvalidRequest("foodId must not be empty".into()));
    }

    let plan = store
        .find_by_share_token(token.as_str())
        .await
        .map_err(PlanError::Store)?
        .ok_or(PlanError::NotFound)?;
    ensure_trackable(&plan, food_id)?;

    let updated = store
        .set_client_checked(plan.id, token.as_str(), food_id, update.client_checked)
        .await
        .map_err(|e| {
            error!(error = %format!("{e:#}"), plan_id = %plan.id, food_id, "tracking update failed");
            PlanError::Store(e)
        })?;
    if !updated {
        // The plan changed between the read and the write. Report what changed.
        let current = store
            .find_by_share_token(token.as_str())
            .await
            .map_err(PlanError::Store)?
            .ok_or(PlanError::NotFound)?;
        ensure_trackable(&current, food_id)?;
        return Err(PlanError::IngredientNotFound);
    }

    info!(plan_id = %plan.id, food_id, client_checked = update.client_checked, "tracking updated");
    Ok(TrackingAck {
        food_id: update.food_id,
        client_checked: update.client_checked,
    })
}

fn ensure_trackable(plan: &Plan, food_id: &str) -> Result<(), PlanError> {
    if plan.status != PlanStatus::Published {
        warn!(plan_id = %plan.id, "tracking update on unpublished plan");
        return Err(PlanError::NotAvailableForUpdates);
    }
    if plan.ingredient(food_id).is_none() {
        return Err(PlanError::IngredientNotFound);
    }
    Ok(())
}

pub fn validate_ingredients(ingredients: &[IngredientDraft]) -> Result<(), PlanError> {
    let mut seen = HashSet::new();
    for ing in ingredients {
        if ing.food_id.trim().is_empty() {
            return Err(PlanError::InvalidRequest("foodId must not be empty".into()));
        }
        if ing.food_id.trim() != ing.food_id {
            return Err(PlanError::InvalidRequest(format!(
                "foodId {:?} has surrounding whitespace",
                ing.food_id
            )));
        }
        if ing.category_id.trim().is_empty() {
            return Err(PlanError::InvalidRequest(format!(
                "categoryId missing for food {}",
                ing.food_id
            )));
        }
        if !seen.insert(ing.food_id.as_str()) {
            return Err(PlanError::InvalidRequest(format!(
                "food {} appears more than once",
                ing.food_id
            )));
        }
    }
    Ok(())
}

pub async fn create_plan(
    store: &dyn PlanStore,
    coach_id: Uuid,
    req: CreatePlanRequest,
    token_length: usize,
) -> Result<Plan, PlanError> {
    let client_name = req.client_name.trim().to_string();
    if client_name.is_empty() {
        return Err(PlanError::InvalidRequest("clientName is required".into()));
    }
    validate_ingredients(&req.ingredients)?;

    let share_token = TokenFormat::Standard.generate(token_length)?;
    let plan = store
        .insert(NewPlan {
            coach_id,
            client_id: req.client_id,
            client_name,
            title: req.title.filter(|t| !t.trim().is_empty()),
            share_token: share_token.into_inner(),
            ingredients: req.ingredients,
        })
        .await
        .map_err(PlanError::Store)?;

    info!(plan_id = %plan.id, %coach_id, "plan created");
    Ok(plan)
}

pub async fn replace_ingredients(
    store: &dyn PlanStore,
    coach_id: Uuid,
    plan_id: Uuid,
    ingredients: Vec<IngredientDraft>,
) -> Result<Plan, PlanError> {
    validate_ingredients(&ingredients)?;
    store
        .replace_ingredients(coach_id, plan_id, ingredients)
        .await
        .map_err(PlanError::Store)?
        .ok_or(PlanError::PlanNotFound)
}

pub async fn set_status(
    store: &dyn PlanStore,
    coach_id: Uuid,
    plan_id: Uuid,
    status: PlanStatus,
) -> Result<Plan, PlanError> {
    let plan = store
        .set_status(coach_id, plan_id, status)
        .await
        .map_err(PlanError::Store)?
        .ok_or(PlanError::PlanNotFound)?;
    info!(plan_id = %plan.id, status = ?plan.status, "plan status changed");
    Ok(plan)
}

/// Issues a new token; links built from the old one stop resolving. A
/// published plan keeps its token until it is unpublished.
pub async fn regenerate_share_token(
    store: &dyn PlanStore,
    coach_id: Uuid,
    plan_id: Uuid,
    format: TokenFormat,
    token_length: usize,
) -> Result<Plan, PlanError> {
    let current = store
        .find_by_id(coach_id, plan_id)
        .await
        .map_err(PlanError::Store)?
        .ok_or(PlanError::PlanNotFound)?;
    if current.status == PlanStatus::Published {
        return Err(PlanError::ShareTokenLocked);
    }

    let token = format.generate(token_length)?;
    let plan = store
        .set_share_token(coach_id, plan_id, token.as_str())
        .await
        .map_err(PlanError::Store)?
        .ok_or(PlanError::PlanNotFound)?;
    info!(plan_id = %plan.id, ?format, "share token regenerated");
    Ok(plan)
}
