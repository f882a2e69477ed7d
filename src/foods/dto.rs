use serde::{Deserialize, Serialize};

use super::classifier::ColorSuggestion;
use crate::plans::ColorCode;

pub const MAX_CATEGORIZE_BATCH: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodRequest {
    pub name: String,
    #[serde(default)]
    pub food_group: Option<String>,
    #[serde(default)]
    pub default_color: Option<ColorCode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportUsdaRequest {
    pub fdc_id: i64,
    #[serde(default)]
    pub default_color: Option<ColorCode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdaSearchQuery {
    pub query: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}
fn default_page_size() -> u32 {
    25
}

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub names: Vec<String>,
}

impl CategorizeRequest {
    /// Trimmed, non-empty names, or a message explaining what is wrong.
    pub fn cleaned(self) -> Result<Vec<String>, String> {
        let names: Vec<String> = self
            .names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Err("names must contain at least one food name".into());
        }
        if names.len() > MAX_CATEGORIZE_BATCH {
            return Err(format!("at most {MAX_CATEGORIZE_BATCH} names per request"));
        }
        Ok(names)
    }
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub suggestions: Vec<ColorSuggestion>,
}
