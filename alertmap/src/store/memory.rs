use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;
use tokio::sync::Mutex;

use super::{ReactionOutcome, Store, sort_newest_first, username_key};
use crate::{
    engine::{self, ReactionTally, UserStatistics},
    errors::ServiceError,
    id::{AlertId, UserId},
    types::{
        Alert, AlertComment, AlertFilter, AlertPatch, AlertReaction, ProfileContact, ReactionKind, ReactionRequest,
        User, UserProfile,
    },
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    usernames: HashMap<String, UserId>,
    profiles: HashMap<UserId, UserProfile>,
    alerts: HashMap<AlertId, Alert>,
    /// Ledger rows per alert, keyed by user: one row per pair by construction.
    ledger: HashMap<AlertId, HashMap<UserId, AlertReaction>>,
    /// Comments per alert in insertion order.
    comments: HashMap<AlertId, Vec<AlertComment>>,
}

impl MemoryState {
    fn alert(&self, alert_id: &AlertId) -> Result<&Alert, ServiceError> {
        self.alerts
            .get(alert_id)
            .ok_or_else(|| ServiceError::not_found("alert", alert_id.as_str()))
    }

    fn alert_mut(&mut self, alert_id: &AlertId) -> Result<&mut Alert, ServiceError> {
        self.alerts
            .get_mut(alert_id)
            .ok_or_else(|| ServiceError::not_found("alert", alert_id.as_str()))
    }

    fn ensure_user(&self, user_id: &UserId) -> Result<(), ServiceError> {
        if self.users.contains_key(user_id) {
            Ok(())
        } else {
            Err(ServiceError::not_found("user", user_id.as_str()))
        }
    }

    fn recompute_counters(&mut self, alert_id: &AlertId) -> Result<Alert, ServiceError> {
        let tally = ReactionTally::count(
            self.ledger
                .get(alert_id)
                .into_iter()
                .flat_map(|rows| rows.values().map(|row| row.reaction_type)),
        );
        let alert = self.alert_mut(alert_id)?;
        tally.apply_to(alert);
        Ok(alert.clone())
    }

    fn recompute_statistics(&mut self, user_id: &UserId, now: DateTime<Utc>) -> Result<UserProfile, ServiceError> {
        self.ensure_user(user_id)?;
        let stats = UserStatistics::from_alerts(self.alerts.values().filter(|alert| alert.is_owned_by(user_id)));
        let profile = self
            .profiles
            .entry(user_id.clone())
            .or_insert_with(|| UserProfile::new(user_id.clone(), now));
        stats.apply_to(profile, now);
        Ok(profile.clone())
    }
}

/// Process-local store. Every operation runs under a single lock acquisition,
/// which makes each chain atomic with respect to concurrent requests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn create_user(&self, user: User) -> Result<(User, UserProfile), ServiceError> {
        let mut state = self.state.lock().await;
        let key = username_key(&user.username);
        if state.usernames.contains_key(&key) {
            return Err(ServiceError::conflict(format!("username '{}' is already taken", user.username)));
        }
        state.usernames.insert(key, user.id.clone());
        state.users.insert(user.id.clone(), user.clone());
        let profile = state.recompute_statistics(&user.id, user.created_at)?;
        debug!("created user {} ({})", user.id, user.username);
        Ok((user, profile))
    }

    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, ServiceError> {
        Ok(self.state.lock().await.users.get(user_id).cloned())
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>, ServiceError> {
        let mut ids: Vec<UserId> = self.state.lock().await.users.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn profile(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<UserProfile, ServiceError> {
        let mut state = self.state.lock().await;
        state.ensure_user(user_id)?;
        match state.profiles.get(user_id) {
            Some(profile) => Ok(profile.clone()),
            None => {
                debug!("profile for {user_id} missing, creating it");
                state.recompute_statistics(user_id, now)
            }
        }
    }

    async fn update_profile_contact(
        &self,
        user_id: &UserId,
        contact: ProfileContact,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ServiceError> {
        let mut state = self.state.lock().await;
        if !state.profiles.contains_key(user_id) {
            state.recompute_statistics(user_id, now)?;
        }
        let profile = state
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| ServiceError::not_found("profile", user_id.as_str()))?;
        if let Some(phone) = contact.phone {
            profile.phone = phone;
        }
        if let Some(avatar) = contact.avatar {
            profile.avatar = if avatar.is_empty() { None } else { Some(avatar) };
        }
        profile.updated_at = now;
        Ok(profile.clone())
    }

    async fn insert_alert(&self, alert: Alert) -> Result<(Alert, UserProfile), ServiceError> {
        let mut state = self.state.lock().await;
        state.ensure_user(&alert.owner)?;
        if state.alerts.contains_key(&alert.id) {
            return Err(ServiceError::conflict(format!("alert '{}' already exists", alert.id)));
        }
        state.alerts.insert(alert.id.clone(), alert.clone());
        let profile = state.recompute_statistics(&alert.owner, alert.created_at)?;
        Ok((alert, profile))
    }

    async fn get_alert(&self, alert_id: &AlertId) -> Result<Option<Alert>, ServiceError> {
        Ok(self.state.lock().await.alerts.get(alert_id).cloned())
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, ServiceError> {
        let state = self.state.lock().await;
        let mut alerts: Vec<Alert> = state.alerts.values().filter(|alert| filter.matches(alert)).cloned().collect();
        sort_newest_first(&mut alerts);
        Ok(alerts)
    }

    async fn update_alert(
        &self,
        alert_id: &AlertId,
        requester: &UserId,
        patch: AlertPatch,
        now: DateTime<Utc>,
    ) -> Result<Alert, ServiceError> {
        let mut state = self.state.lock().await;
        let alert = state.alert_mut(alert_id)?;
        engine::ensure_owner(alert, requester, "edit")?;
        patch.apply_to(alert, now);
        Ok(alert.clone())
    }

    async fn delete_alert(
        &self,
        alert_id: &AlertId,
        requester: &UserId,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ServiceError> {
        let mut state = self.state.lock().await;
        let owner = {
            let alert = state.alert(alert_id)?;
            engine::ensure_owner(alert, requester, "delete")?;
            alert.owner.clone()
        };
        state.alerts.remove(alert_id);
        state.ledger.remove(alert_id);
        state.comments.remove(alert_id);
        state.recompute_statistics(&owner, now)
    }

    async fn close_alert(
        &self,
        alert_id: &AlertId,
        requester: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(Alert, UserProfile), ServiceError> {
        let mut state = self.state.lock().await;
        let alert = state.alert_mut(alert_id)?;
        engine::close_alert(alert, requester, now)?;
        let alert = alert.clone();
        let profile = state.recompute_statistics(&alert.owner, now)?;
        Ok((alert, profile))
    }

    async fn set_reaction(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
        request: ReactionRequest,
        now: DateTime<Utc>,
    ) -> Result<ReactionOutcome, ServiceError> {
        let mut state = self.state.lock().await;
        state.alert(alert_id)?;
        state.ensure_user(user_id)?;

        let rows = state.ledger.entry(alert_id.clone()).or_default();
        let existing = rows.get(user_id).map(|row| row.reaction_type);
        let transition = engine::plan_reaction(existing, request);
        match transition.resulting_kind() {
            None => {
                rows.remove(user_id);
            }
            Some(kind) => {
                let row = rows.entry(user_id.clone()).or_insert_with(|| AlertReaction {
                    user_id: user_id.clone(),
                    alert_id: alert_id.clone(),
                    reaction_type: kind,
                    created_at: now,
                    updated_at: now,
                });
                if row.reaction_type != kind {
                    row.reaction_type = kind;
                    row.updated_at = now;
                }
            }
        }
        let reaction = rows.get(user_id).cloned();
        if rows.is_empty() {
            state.ledger.remove(alert_id);
        }

        let alert = state.recompute_counters(alert_id)?;
        let owner_profile = state.recompute_statistics(&alert.owner, now)?;
        Ok(ReactionOutcome {
            alert,
            reaction,
            transition,
            owner_profile,
        })
    }

    async fn reaction_of(&self, alert_id: &AlertId, user_id: &UserId) -> Result<Option<ReactionKind>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .ledger
            .get(alert_id)
            .and_then(|rows| rows.get(user_id))
            .map(|row| row.reaction_type))
    }

    async fn reaction_count(&self, alert_id: &AlertId) -> Result<usize, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.ledger.get(alert_id).map_or(0, HashMap::len))
    }

    async fn insert_comment(&self, comment: AlertComment) -> Result<AlertComment, ServiceError> {
        let mut state = self.state.lock().await;
        state.alert(&comment.alert_id)?;
        state.ensure_user(&comment.user_id)?;
        state
            .comments
            .entry(comment.alert_id.clone())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    async fn comments(&self, alert_id: &AlertId) -> Result<Vec<AlertComment>, ServiceError> {
        let state = self.state.lock().await;
        state.alert(alert_id)?;
        Ok(state
            .comments
            .get(alert_id)
            .map(|comments| comments.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn recompute_counters(&self, alert_id: &AlertId) -> Result<Alert, ServiceError> {
        self.state.lock().await.recompute_counters(alert_id)
    }

    async fn recompute_statistics(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<UserProfile, ServiceError> {
        self.state.lock().await.recompute_statistics(user_id, now)
    }
}
