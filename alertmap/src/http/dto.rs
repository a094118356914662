use serde::{Deserialize, Serialize};

use crate::{
    errors::ValidationError,
    id::{AlertId, UserId},
    service::AlertView,
    types::{AlertFilter, AlertStatus, User, UserProfile},
};

/// GET /health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
}

/// POST /alerts/{id}/react request
#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    #[serde(default)]
    pub reaction_type: String,
}

/// POST /alerts/{id}/react response: the refreshed alert plus what the ledger did.
#[derive(Debug, Serialize)]
pub struct ReactResponse {
    #[serde(flatten)]
    pub alert: AlertView,
    pub transition: &'static str,
}

/// POST /alerts/{id}/comments request
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

/// GET /alerts query string
#[derive(Debug, Default, Deserialize)]
pub struct AlertListQuery {
    pub owner: Option<String>,
    pub status: Option<String>,
}

impl AlertListQuery {
    pub fn into_filter(self) -> Result<AlertFilter, ValidationError> {
        let status = self
            .status
            .filter(|status| !status.is_empty())
            .map(|status| status.parse::<AlertStatus>())
            .transpose()?;
        Ok(AlertFilter {
            owner: self.owner.filter(|owner| !owner.is_empty()).map(UserId::from),
            status,
        })
    }
}

/// POST /users and GET /users/{id} response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub profile: UserProfile,
}

/// DELETE /alerts/{id} response
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: AlertId,
    pub profile: UserProfile,
}
