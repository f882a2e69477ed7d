use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

use crate::share::{DEFAULT_TOKEN_LENGTH, MAX_TOKEN_LENGTH, MIN_TOKEN_LENGTH};

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// USDA FoodData Central.
#[derive(Debug, Clone, Deserialize)]
pub struct UsdaConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Hosted zero-shot classification model used for color suggestions.
#[derive(Debug, Clone, Deserialize)]
pub struct NlpConfig {
    pub api_token: Option<String>,
    pub model_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    pub token_length: usize,
    pub public_base_url: String,
}

impl ShareConfig {
    pub fn new(token_length: usize, public_base_url: impl Into<String>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH).contains(&token_length),
            "SHARE_TOKEN_LENGTH must be between {MIN_TOKEN_LENGTH} and {MAX_TOKEN_LENGTH}, got {token_length}"
        );
        Ok(Self {
            token_length,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Link handed to the client for a plan's share token.
    pub fn share_url(&self, token: &str) -> String {
        format!("{}/share/{}", self.public_base_url, token)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub usda: UsdaConfig,
    pub nlp: NlpConfig,
    pub share: ShareConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: env_or("JWT_ISSUER", "coachplan"),
            audience: env_or("JWT_AUDIENCE", "coachplan-coaches"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };
        let usda = UsdaConfig {
            api_key: env_or("USDA_API_KEY", "DEMO_KEY"),
            base_url: env_or("USDA_BASE_URL", "https://api.nal.usda.gov/fdc/v1"),
        };
        let nlp = NlpConfig {
            api_token: std::env::var("NLP_API_TOKEN").ok().filter(|t| !t.is_empty()),
            model_url: env_or(
                "NLP_MODEL_URL",
                "https://api-inference.huggingface.co/models/facebook/bart-large-mnli",
            ),
        };
        let share = ShareConfig::new(
            env_parse("SHARE_TOKEN_LENGTH", DEFAULT_TOKEN_LENGTH)?,
            env_or("PUBLIC_BASE_URL", "http://localhost:3000"),
        )?;
        Ok(Self {
            database_url,
            jwt,
            usda,
            nlp,
            share,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// Unset falls back to `default`; set but unparsable is an error.
fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
