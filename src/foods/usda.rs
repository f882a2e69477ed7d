//! USDA FoodData Central client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::repo_types::NutrientAmount;
use crate::config::UsdaConfig;

#[derive(Debug, Error)]
pub enum UsdaError {
    #[error("USDA request failed")]
    Http(#[from] reqwest::Error),

    #[error("invalid USDA url: {0}")]
    InvalidUrl(String),

    #[error("USDA food {0} not found")]
    NotFound(i64),

    #[error("unexpected USDA response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdaSearchHit {
    pub fdc_id: i64,
    pub description: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub brand_owner: Option<String>,
    #[serde(default)]
    pub food_category: Option<String>,
}

/// A food's details reduced to what the catalog stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdaFood {
    pub fdc_id: i64,
    pub description: String,
    pub food_group: Option<String>,
    pub nutrients: Vec<NutrientAmount>,
}

#[async_trait]
pub trait NutritionSource: Send + Sync {
    async fn search(&self, query: &str, page_size: u32) -> Result<Vec<UsdaSearchHit>, UsdaError>;

    async fn food_details(&self, fdc_id: i64) -> Result<UsdaFood, UsdaError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<UsdaSearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodDetailsResponse {
    fdc_id: i64,
    description: String,
    #[serde(default)]
    food_category: Option<FoodCategoryField>,
    #[serde(default)]
    branded_food_category: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<RawNutrient>,
}

// Foundation/SR Legacy foods nest the category, search results and some
// branded payloads give a plain string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FoodCategoryField {
    Named { description: String },
    Plain(String),
}

#[derive(Debug, Deserialize)]
struct RawNutrient {
    #[serde(default)]
    nutrient: Option<RawNutrientInfo>,
    #[serde(default)]
    amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNutrientInfo {
    name: String,
    #[serde(default)]
    unit_name: Option<String>,
}

impl From<FoodDetailsResponse> for UsdaFood {
    fn from(r: FoodDetailsResponse) -> Self {
        let food_group = match r.food_category {
            Some(FoodCategoryField::Named { description }) => Some(description),
            Some(FoodCategoryField::Plain(s)) => Some(s),
            None => r.branded_food_category,
        };
        let nutrients = r
            .food_nutrients
            .into_iter()
            .filter_map(|n| {
                let info = n.nutrient?;
                Some(NutrientAmount {
                    name: info.name,
                    unit: info.unit_name.unwrap_or_default().to_lowercase(),
                    amount: n.amount?,
                })
            })
            .collect();
        Self {
            fdc_id: r.fdc_id,
            description: r.description,
            food_group,
            nutrients,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsdaClient {
    config: UsdaConfig,
    http: Client,
}

impl UsdaClient {
    pub fn new(config: UsdaConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, UsdaError> {
        let base = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut all = vec![("api_key", self.config.api_key.as_str())];
        all.extend_from_slice(params);
        Url::parse_with_params(&base, all).map_err(|e| UsdaError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl NutritionSource for UsdaClient {
    async fn search(&self, query: &str, page_size: u32) -> Result<Vec<UsdaSearchHit>, UsdaError> {
        let page_size = page_size.to_string();
        let url = self.url("/foods/search", &[("query", query), ("pageSize", &page_size)])?;

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(UsdaError::UnexpectedResponse(format!(
                "search failed with status {status}: {text}"
            )));
        }

        let parsed: SearchResponse = response.json().await?;
        debug!(query, hits = parsed.foods.len(), "usda search");
        Ok(parsed.foods)
    }

    async fn food_details(&self, fdc_id: i64) -> Result<UsdaFood, UsdaError> {
        let url = self.url(&format!("/food/{fdc_id}"), &[])?;

        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(UsdaError::NotFound(fdc_id));
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(UsdaError::UnexpectedResponse(format!(
                "food {fdc_id} failed with status {status}: {text}"
            )));
        }

        let parsed: FoodDetailsResponse = response.json().await?;
        debug!(fdc_id, "usda food details");
        Ok(parsed.into())
    }
}
