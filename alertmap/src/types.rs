use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ValidationError,
    id::{AlertId, CommentId, UserId},
};

/// Caller identity as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User(UserId),
}

impl Requester {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Requester::Anonymous => None,
            Requester::User(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Registration input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Per-user statistics. Only `phone` and `avatar` are ever edited by hand;
/// the counters are derived by the statistics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub alerts_reported: i64,
    pub alerts_resolved: i64,
    pub reputation_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            phone: String::new(),
            avatar: None,
            alerts_reported: 0,
            alerts_resolved: 0,
            reputation_points: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Hand-editable profile fields. An empty `avatar` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Resolved,
    /// Reserved. Nothing moves an alert into this state yet.
    Expired,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(AlertStatus::Active),
            "resolved" => Ok(AlertStatus::Resolved),
            "expired" => Ok(AlertStatus::Expired),
            other => Err(ValidationError::single(
                "status",
                "validation.enum",
                format!("unknown status '{other}', expected one of active, resolved, expired"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub owner: UserId,
    pub category: String,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub status: AlertStatus,
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// A fresh active alert with zeroed counters.
    pub fn open(id: AlertId, owner: UserId, input: NewAlert, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            category: input.category,
            title: input.title,
            description: input.description,
            latitude: round_coordinate(input.latitude),
            longitude: round_coordinate(input.longitude),
            address: input.address,
            image: input.image.filter(|image| !image.is_empty()),
            status: AlertStatus::Active,
            likes_count: 0,
            dislikes_count: 0,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner == user_id
    }
}

/// Coordinates keep six decimal places (roughly 0.1 m).
pub fn round_coordinate(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Submission input for a new alert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAlert {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Owner edits. Status and counters are not editable; an empty `image` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl AlertPatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.address.is_none()
            && self.image.is_none()
    }

    pub fn apply_to(&self, alert: &mut Alert, now: DateTime<Utc>) {
        if let Some(category) = &self.category {
            alert.category = category.clone();
        }
        if let Some(title) = &self.title {
            alert.title = title.clone();
        }
        if let Some(description) = &self.description {
            alert.description = description.clone();
        }
        if let Some(latitude) = self.latitude {
            alert.latitude = round_coordinate(latitude);
        }
        if let Some(longitude) = self.longitude {
            alert.longitude = round_coordinate(longitude);
        }
        if let Some(address) = &self.address {
            alert.address = address.clone();
        }
        if let Some(image) = &self.image {
            alert.image = if image.is_empty() { None } else { Some(image.clone()) };
        }
        alert.updated_at = now;
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub owner: Option<UserId>,
    pub status: Option<AlertStatus>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        self.owner.as_ref().is_none_or(|owner| &alert.owner == owner)
            && self.status.is_none_or(|status| alert.status == status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a user asks the ledger to do with their reaction on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionRequest {
    Set(ReactionKind),
    Remove,
}

impl ReactionRequest {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionRequest::Set(kind) => kind.as_str(),
            ReactionRequest::Remove => "remove",
        }
    }
}

impl FromStr for ReactionRequest {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "like" => Ok(ReactionRequest::Set(ReactionKind::Like)),
            "dislike" => Ok(ReactionRequest::Set(ReactionKind::Dislike)),
            "remove" => Ok(ReactionRequest::Remove),
            "" => Err(ValidationError::single(
                "reaction_type",
                "validation.required",
                "reaction_type is required",
            )),
            other => Err(ValidationError::single(
                "reaction_type",
                "validation.enum",
                format!("unknown reaction_type '{other}', expected one of like, dislike, remove"),
            )),
        }
    }
}

impl Serialize for ReactionRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One row of the reaction ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReaction {
    pub user_id: UserId,
    pub alert_id: AlertId,
    pub reaction_type: ReactionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertComment {
    pub id: CommentId,
    pub alert_id: AlertId,
    pub user_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_request_parses_known_kinds() {
        assert_eq!("like".parse::<ReactionRequest>().unwrap(), ReactionRequest::Set(ReactionKind::Like));
        assert_eq!(
            "dislike".parse::<ReactionRequest>().unwrap(),
            ReactionRequest::Set(ReactionKind::Dislike)
        );
        assert_eq!("remove".parse::<ReactionRequest>().unwrap(), ReactionRequest::Remove);
    }

    #[test]
    fn reaction_request_rejects_unknown_and_blank() {
        let err = "love".parse::<ReactionRequest>().unwrap_err();
        assert_eq!(err.issues[0].code, "validation.enum");
        let err = "".parse::<ReactionRequest>().unwrap_err();
        assert_eq!(err.issues[0].code, "validation.required");
    }

    #[test]
    fn alert_status_round_trips_through_text() {
        for status in [AlertStatus::Active, AlertStatus::Resolved, AlertStatus::Expired] {
            assert_eq!(status.as_str().parse::<AlertStatus>().unwrap(), status);
        }
        assert!("open".parse::<AlertStatus>().is_err());
    }

    #[test]
    fn open_alert_starts_active_and_rounds_coordinates() {
        let now = Utc::now();
        let alert = Alert::open(
            AlertId::from("a1"),
            UserId::from("u1"),
            NewAlert {
                category: "flooding".into(),
                title: "Water on 5th".into(),
                description: "Knee deep".into(),
                latitude: 4.123_456_789,
                longitude: -74.1,
                address: String::new(),
                image: Some(String::new()),
            },
            now,
        );
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.likes_count, 0);
        assert_eq!(alert.latitude, 4.123457);
        assert!(alert.image.is_none());
        assert!(alert.closed_at.is_none());
    }

    #[test]
    fn patch_leaves_status_and_counters_alone() {
        let now = Utc::now();
        let mut alert = Alert::open(
            AlertId::from("a1"),
            UserId::from("u1"),
            NewAlert {
                category: "flooding".into(),
                title: "t".into(),
                description: "d".into(),
                latitude: 1.0,
                longitude: 2.0,
                address: String::new(),
                image: Some("img/1.png".into()),
            },
            now,
        );
        alert.likes_count = 3;
        let patch = AlertPatch {
            title: Some("new title".into()),
            image: Some(String::new()),
            ..Default::default()
        };
        patch.apply_to(&mut alert, now);
        assert_eq!(alert.title, "new title");
        assert!(alert.image.is_none());
        assert_eq!(alert.likes_count, 3);
        assert_eq!(alert.status, AlertStatus::Active);
    }

    #[test]
    fn serialized_alert_omits_absent_optionals() {
        let now = Utc::now();
        let alert = Alert::open(AlertId::from("a1"), UserId::from("u1"), NewAlert::default(), now);
        let json = serde_json::to_value(&alert).unwrap();
        assert!(json.get("closed_at").is_none());
        assert!(json.get("image").is_none());
        assert_eq!(json["status"], "active");
    }
}
