use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ColorCode, IngredientDraft, IngredientEntry, Plan, PlanStatus};
use crate::config::ShareConfig;
use crate::progress::{calculate_progress, progress_summary, ProgressMetrics, TrackingPolicy};
use crate::share::TokenFormat;

/// Body of the public tracking endpoint. `clientChecked` must be a JSON
/// boolean; `1` or `"true"` fail deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    pub food_id: String,
    pub client_checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingAck {
    pub food_id: String,
    pub client_checked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[serde(default)]
    pub client_id: Option<Uuid>,
    pub client_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientDraft>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceIngredientsRequest {
    pub ingredients: Vec<IngredientDraft>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegenerateTokenRequest {
    #[serde(default)]
    pub format: TokenFormat,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanListItem {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub title: Option<String>,
    pub status: PlanStatus,
    pub percentage: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PlanListItem {
    pub fn from_plan(plan: Plan, policy: &TrackingPolicy) -> Self {
        let percentage = calculate_progress(&plan.ingredients, policy).percentage;
        Self {
            id: plan.id,
            client_id: plan.client_id,
            client_name: plan.client_name,
            title: plan.title,
            status: plan.status,
            percentage,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

/// Full coach view of a plan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetails {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub title: Option<String>,
    pub status: PlanStatus,
    pub share_token: String,
    pub share_url: String,
    pub ingredients: Vec<IngredientEntry>,
    pub progress: ProgressMetrics,
    pub summary: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PlanDetails {
    pub fn from_plan(plan: Plan, policy: &TrackingPolicy, share: &ShareConfig) -> Self {
        let progress = calculate_progress(&plan.ingredients, policy);
        let summary = progress_summary(&progress);
        Self {
            share_url: share.share_url(&plan.share_token),
            id: plan.id,
            client_id: plan.client_id,
            client_name: plan.client_name,
            title: plan.title,
            status: plan.status,
            share_token: plan.share_token,
            ingredients: plan.ingredients,
            progress,
            summary,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIngredient {
    pub food_id: String,
    pub food_name: Option<String>,
    pub category_id: String,
    pub color_code: Option<ColorCode>,
    pub client_checked: bool,
    pub notes: Option<String>,
}

/// What a client holding the share link sees. Carries neither the coach's
/// identity nor the token itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPlanView {
    pub client_name: String,
    pub title: Option<String>,
    pub ingredients: Vec<PublicIngredient>,
    pub progress: ProgressMetrics,
    pub summary: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PublicPlanView {
    /// Unselected ingredients are left out.
    pub fn from_plan(plan: Plan, policy: &TrackingPolicy, food_names: &HashMap<String, String>) -> Self {
        let progress = calculate_progress(&plan.ingredients, policy);
        let summary = progress_summary(&progress);
        let ingredients = plan
            .ingredients
            .into_iter()
            .filter(|i| i.is_selected)
            .map(|i| PublicIngredient {
                food_name: food_names.get(&i.food_id).cloned(),
                food_id: i.food_id,
                category_id: i.category_id,
                color_code: i.color_code,
                client_checked: i.client_checked,
                notes: i.notes,
            })
            .collect();
        Self {
            client_name: plan.client_name,
            title: plan.title,
            ingredients,
            progress,
            summary,
            updated_at: plan.updated_at,
        }
    }
}
