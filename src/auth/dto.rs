use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::Coach;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub coach: PublicCoach,
}

#[derive(Debug, Serialize)]
pub struct PublicCoach {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl From<Coach> for PublicCoach {
    fn from(c: Coach) -> Self {
        Self {
            id: c.id,
            email: c.email,
            name: c.name,
        }
    }
}
