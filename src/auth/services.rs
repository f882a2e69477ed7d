use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{AuthResponse, RegisterRequest};
use super::jwt::JwtKeys;
use super::repo_types::Coach;
use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalizes a registration in place and rejects it if unusable.
pub fn validate_registration(req: &mut RegisterRequest) -> Result<(), AppError> {
    req.email = normalize_email(&req.email);
    if !is_valid_email(&req.email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest("Password too short".into()));
    }
    req.name = req
        .name
        .take()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Ok(())
}

pub fn issue_tokens(keys: &JwtKeys, coach: Coach) -> anyhow::Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(coach.id)?,
        refresh_token: keys.sign_refresh(coach.id)?,
        coach: coach.into(),
    })
}
