use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::plans::ColorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "food_source", rename_all = "lowercase")]
pub enum FoodSource {
    Manual,
    Usda,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientAmount {
    pub name: String,
    pub unit: String,
    pub amount: f64,
}

/// Catalog entry shared by every coach.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    pub food_group: Option<String>,
    pub default_color: Option<ColorCode>,
    pub source: FoodSource,
    pub fdc_id: Option<i64>,
    pub nutrients: Json<Vec<NutrientAmount>>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub food_group: Option<String>,
    pub default_color: Option<ColorCode>,
    pub source: FoodSource,
    pub fdc_id: Option<i64>,
    pub nutrients: Vec<NutrientAmount>,
}
