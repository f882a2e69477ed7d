use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ClientRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A validated [`ClientRequest`].
#[derive(Debug, PartialEq)]
pub struct ClientInput {
    pub name: String,
    pub email: Option<String>,
    pub notes: Option<String>,
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl TryFrom<ClientRequest> for ClientInput {
    type Error = AppError;

    fn try_from(req: ClientRequest) -> Result<Self, Self::Error> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".into()));
        }
        let email = non_blank(req.email).map(|e| e.to_lowercase());
        if let Some(email) = &email {
            if !crate::auth::is_valid_email(email) {
                return Err(AppError::BadRequest("Invalid email".into()));
            }
        }
        Ok(Self {
            name,
            email,
            notes: non_blank(req.notes),
        })
    }
}
