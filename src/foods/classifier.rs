//! Color suggestions from a hosted zero-shot classification model.
//!
//! Each color has one natural-language label; the model scores a food name
//! against all of them and the best-scoring label picks the color.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::NlpConfig;
use crate::plans::ColorCode;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed")]
    Http(#[from] reqwest::Error),

    #[error("unexpected classifier response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorSuggestion {
    pub name: String,
    pub color_code: ColorCode,
    pub confidence: f64,
}

#[async_trait]
pub trait FoodClassifier: Send + Sync {
    async fn classify(&self, food_name: &str) -> Result<ColorSuggestion, ClassifierError>;
}

pub fn label_for(color: ColorCode) -> &'static str {
    match color {
        ColorCode::Blue => "whole, minimally processed, nutrient-dense food",
        ColorCode::Yellow => "moderately processed food to eat in moderation",
        ColorCode::Red => "highly processed food high in sugar, salt or unhealthy fat",
    }
}

fn color_for_label(label: &str) -> Option<ColorCode> {
    ColorCode::ALL.into_iter().find(|c| label_for(*c) == label)
}

#[derive(Debug, Deserialize)]
struct ZeroShotResult {
    labels: Vec<String>,
    scores: Vec<f64>,
}

// The inference API answers with a single object or a one-element list,
// depending on the deployment.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotPayload {
    One(ZeroShotResult),
    Many(Vec<ZeroShotResult>),
}

fn suggestion_from(name: &str, payload: ZeroShotPayload) -> Result<ColorSuggestion, ClassifierError> {
    let result = match payload {
        ZeroShotPayload::One(r) => r,
        ZeroShotPayload::Many(list) => list
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::UnexpectedResponse("empty result list".into()))?,
    };
    if result.labels.len() != result.scores.len() {
        return Err(ClassifierError::UnexpectedResponse(
            "labels and scores differ in length".into(),
        ));
    }

    let (label, score) = result
        .labels
        .iter()
        .zip(result.scores.iter().copied())
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| ClassifierError::UnexpectedResponse("no labels".into()))?;

    let color = color_for_label(label)
        .ok_or_else(|| ClassifierError::UnexpectedResponse(format!("unknown label {label:?}")))?;

    Ok(ColorSuggestion {
        name: name.to_string(),
        color_code: color,
        confidence: score,
    })
}

#[derive(Debug, Clone)]
pub struct HuggingFaceClassifier {
    config: NlpConfig,
    http: Client,
}

impl HuggingFaceClassifier {
    pub fn new(config: NlpConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl FoodClassifier for HuggingFaceClassifier {
    async fn classify(&self, food_name: &str) -> Result<ColorSuggestion, ClassifierError> {
        let labels: Vec<&str> = ColorCode::ALL.into_iter().map(label_for).collect();
        let body = serde_json::json!({
            "inputs": food_name,
            "parameters": { "candidate_labels": labels },
        });

        let mut request = self.http.post(&self.config.model_url).json(&body);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ClassifierError::UnexpectedResponse(format!(
                "classification failed with status {status}: {text}"
            )));
        }

        let payload: ZeroShotPayload = response.json().await?;
        let suggestion = suggestion_from(food_name, payload)?;
        debug!(
            food = food_name,
            color = suggestion.color_code.as_str(),
            confidence = suggestion.confidence,
            "food classified"
        );
        Ok(suggestion)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_back_to_colors() {
        for color in ColorCode::ALL {
            assert_eq!(color_for_label(label_for(color)), Some(color));
        }
        assert_eq!(color_for_label("something else"), None);
    }

    #[test]
    fn picks_the_highest_score_regardless_of_order() {
        let raw = serde_json::json!({
            "sequence": "cola",
            "labels": [label_for(ColorCode::Blue), label_for(ColorCode::Red), label_for(ColorCode::Yellow)],
            "scores": [0.1, 0.7, 0.2],
        });
        let payload: ZeroShotPayload = serde_json::from_value(raw).unwrap();
        let s = suggestion_from("cola", payload).unwrap();
        assert_eq!(s.color_code, ColorCode::Red);
        assert!((s.confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn accepts_list_payloads() {
        let raw = serde_json::json!([{
            "labels": [label_for(ColorCode::Blue)],
            "scores": [0.95],
        }]);
        let payload: ZeroShotPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(suggestion_from("kale", payload).unwrap().color_code, ColorCode::Blue);
    }

    #[test]
    fn rejects_malformed_payloads() {
        let empty: ZeroShotPayload = serde_json::from_value(serde_json::json!([])).unwrap();
        assert!(suggestion_from("x", empty).is_err());

        let uneven: ZeroShotPayload = serde_json::from_value(serde_json::json!({
            "labels": [label_for(ColorCode::Blue)],
            "scores": [],
        }))
        .unwrap();
        assert!(suggestion_from("x", uneven).is_err());

        let unknown: ZeroShotPayload = serde_json::from_value(serde_json::json!({
            "labels": ["tasty"],
            "scores": [1.0],
        }))
        .unwrap();
        assert!(suggestion_from("x", unknown).is_err());
    }
}
