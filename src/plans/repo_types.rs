use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle of a plan. Only `Published` plans are reachable by share token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "plan_status", rename_all = "lowercase")]
pub enum PlanStatus {
    Draft,
    Published,
}

/// Color category a coach assigns to an ingredient.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "color_code", rename_all = "lowercase")]
pub enum ColorCode {
    Blue,
    Yellow,
    Red,
}

impl ColorCode {
    pub const ALL: [ColorCode; 3] = [ColorCode::Blue, ColorCode::Yellow, ColorCode::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

/// One food inside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientEntry {
    pub food_id: String,
    pub category_id: String,
    pub color_code: Option<ColorCode>,
    pub is_selected: bool,
    pub client_checked: bool,
    pub notes: Option<String>,
}

/// Coach-supplied ingredient. `clientChecked` is not accepted from coaches;
/// it is carried over from the stored entry or starts out `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientDraft {
    pub food_id: String,
    pub category_id: String,
    #[serde(default)]
    pub color_code: Option<ColorCode>,
    #[serde(default = "default_selected")]
    pub is_selected: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_selected() -> bool {
    true
}

impl IngredientDraft {
    pub fn into_entry(self, client_checked: bool) -> IngredientEntry {
        IngredientEntry {
            food_id: self.food_id,
            category_id: self.category_id,
            color_code: self.color_code,
            is_selected: self.is_selected,
            client_checked,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub title: Option<String>,
    pub status: PlanStatus,
    pub share_token: String,
    pub ingredients: Vec<IngredientEntry>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Plan {
    pub fn ingredient(&self, food_id: &str) -> Option<&IngredientEntry> {
        self.ingredients.iter().find(|i| i.food_id == food_id)
    }
}

/// Everything needed to insert a fresh draft.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub coach_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub title: Option<String>,
    pub share_token: String,
    pub ingredients: Vec<IngredientDraft>,
}

#[derive(Debug, FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub title: Option<String>,
    pub status: PlanStatus,
    pub share_token: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PlanRow {
    pub fn into_plan(self, ingredients: Vec<IngredientEntry>) -> Plan {
        Plan {
            id: self.id,
            coach_id: self.coach_id,
            client_id: self.client_id,
            client_name: self.client_name,
            title: self.title,
            status: self.status,
            share_token: self.share_token,
            ingredients,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct IngredientRow {
    pub plan_id: Uuid,
    pub food_id: String,
    pub category_id: String,
    pub color_code: Option<ColorCode>,
    pub is_selected: bool,
    pub client_checked: bool,
    pub notes: Option<String>,
}

impl From<IngredientRow> for IngredientEntry {
    fn from(r: IngredientRow) -> Self {
        Self {
            food_id: r.food_id,
            category_id: r.category_id,
            color_code: r.color_code,
            is_selected: r.is_selected,
            client_checked: r.client_checked,
            notes: r.notes,
        }
    }
}
