//! Persistence providers.
//!
//! Each mutating method is one atomic unit: the backend must apply the whole
//! chain (ledger, counters, statistics) or nothing. Statistics recomputation is
//! always the last step of a chain.

mod memory;
mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::{REDIS_SERVICE, RedisStore};

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
    engine::ReactionTransition,
    errors::ServiceError,
    id::{AlertId, UserId},
    types::{
        Alert, AlertComment, AlertFilter, AlertPatch, AlertReaction, ProfileContact, ReactionKind, ReactionRequest,
        User, UserProfile,
    },
};

/// Result of a reaction write, after counters and owner statistics were refreshed.
#[derive(Debug, Clone)]
pub struct ReactionOutcome {
    pub alert: Alert,
    pub reaction: Option<AlertReaction>,
    pub transition: ReactionTransition,
    pub owner_profile: UserProfile,
}

impl ReactionOutcome {
    pub fn current_kind(&self) -> Option<ReactionKind> {
        self.reaction.as_ref().map(|reaction| reaction.reaction_type)
    }
}

pub trait Store: Send + Sync + 'static {
    /// Inserts the user and their profile together. Conflict when the username is taken.
    fn create_user(&self, user: User) -> impl Future<Output = Result<(User, UserProfile), ServiceError>> + Send;

    fn get_user(&self, user_id: &UserId) -> impl Future<Output = Result<Option<User>, ServiceError>> + Send;

    fn list_user_ids(&self) -> impl Future<Output = Result<Vec<UserId>, ServiceError>> + Send;

    /// Returns the profile, creating and computing it first when absent.
    fn profile(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<UserProfile, ServiceError>> + Send;

    fn update_profile_contact(
        &self,
        user_id: &UserId,
        contact: ProfileContact,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<UserProfile, ServiceError>> + Send;

    /// Stores a new alert, then recomputes the owner's statistics.
    fn insert_alert(&self, alert: Alert) -> impl Future<Output = Result<(Alert, UserProfile), ServiceError>> + Send;

    fn get_alert(&self, alert_id: &AlertId) -> impl Future<Output = Result<Option<Alert>, ServiceError>> + Send;

    /// Alerts matching `filter`, newest first.
    fn list_alerts(&self, filter: &AlertFilter) -> impl Future<Output = Result<Vec<Alert>, ServiceError>> + Send;

    fn update_alert(
        &self,
        alert_id: &AlertId,
        requester: &UserId,
        patch: AlertPatch,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Alert, ServiceError>> + Send;

    /// Removes the alert with its ledger and comments, then recomputes the owner's statistics.
    fn delete_alert(
        &self,
        alert_id: &AlertId,
        requester: &UserId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<UserProfile, ServiceError>> + Send;

    fn close_alert(
        &self,
        alert_id: &AlertId,
        requester: &UserId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<(Alert, UserProfile), ServiceError>> + Send;

    /// Ledger transition, counter recount, and owner statistics in one unit.
    fn set_reaction(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
        request: ReactionRequest,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<ReactionOutcome, ServiceError>> + Send;

    fn reaction_of(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<ReactionKind>, ServiceError>> + Send;

    /// Number of ledger rows held for an alert.
    fn reaction_count(&self, alert_id: &AlertId) -> impl Future<Output = Result<usize, ServiceError>> + Send;

    fn insert_comment(
        &self,
        comment: AlertComment,
    ) -> impl Future<Output = Result<AlertComment, ServiceError>> + Send;

    /// Comments on an alert, newest first.
    fn comments(&self, alert_id: &AlertId) -> impl Future<Output = Result<Vec<AlertComment>, ServiceError>> + Send;

    fn recompute_counters(&self, alert_id: &AlertId) -> impl Future<Output = Result<Alert, ServiceError>> + Send;

    fn recompute_statistics(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<UserProfile, ServiceError>> + Send;
}

/// Lowercased username used by the uniqueness guard.
pub(crate) fn username_key(username: &str) -> String {
    username.to_lowercase()
}

/// Newest first, ties broken by id so listings are stable.
pub(crate) fn sort_newest_first(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}
