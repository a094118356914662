//! Request-level operations: identity checks, validation, and response shaping
//! on top of a [`Store`].

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Category, CategoryCatalog},
    engine::ReactionTransition,
    errors::{ServiceError, ServiceResult, ValidationError, ValidationIssue},
    id::{AlertId, CommentId, UserId},
    store::Store,
    types::{
        Alert, AlertComment, AlertFilter, AlertPatch, AlertStatus, NewAlert, NewUser, ProfileContact, ReactionKind,
        ReactionRequest, Requester, User, UserProfile,
    },
    validators,
};

/// Search radius in kilometres used by `nearby` when the caller gives none.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 5.0;

/// An alert decorated for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: Alert,
    /// Catalog entry for `alert.category`, absent when the key is unknown.
    pub category_detail: Option<Category>,
    /// The requester's current reaction. Always `None` for anonymous requests.
    pub user_reaction: Option<ReactionKind>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeSummary {
    pub alerts: usize,
    pub users: usize,
}

pub struct AlertService<S: Store> {
    store: Arc<S>,
    catalog: Arc<CategoryCatalog>,
}

impl<S: Store> Clone for AlertService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<S: Store> AlertService<S> {
    pub fn new(store: S, catalog: Arc<CategoryCatalog>) -> Self {
        Self {
            store: Arc::new(store),
            catalog,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn categories(&self) -> &[Category] {
        self.catalog.all()
    }

    pub fn category(&self, key: &str) -> ServiceResult<&Category> {
        self.catalog
            .get(key)
            .ok_or_else(|| ServiceError::not_found("category", key))
    }

    // ---- identity ----

    /// The authenticated user behind `requester`. Anonymous requests are rejected.
    pub async fn authenticate(&self, requester: &Requester) -> ServiceResult<UserId> {
        match requester {
            Requester::Anonymous => Err(ServiceError::Unauthenticated),
            Requester::User(user_id) => {
                self.get_user(user_id).await?;
                Ok(user_id.clone())
            }
        }
    }

    /// Like [`authenticate`](Self::authenticate) but lets anonymous requests through.
    async fn viewer(&self, requester: &Requester) -> ServiceResult<Option<UserId>> {
        match requester {
            Requester::Anonymous => Ok(None),
            Requester::User(_) => self.authenticate(requester).await.map(Some),
        }
    }

    // ---- users and profiles ----

    pub async fn register_user(&self, input: NewUser) -> ServiceResult<(User, UserProfile)> {
        validators::validate_new_user(&input)?;
        let user = User {
            id: UserId::generate(),
            username: input.username,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            created_at: Utc::now(),
        };
        let (user, profile) = self.store.create_user(user).await?;
        info!("registered user {} ({})", user.id, user.username);
        Ok((user, profile))
    }

    pub async fn get_user(&self, user_id: &UserId) -> ServiceResult<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", user_id.as_str()))
    }

    /// The requester's own profile.
    pub async fn profile(&self, requester: &Requester) -> ServiceResult<UserProfile> {
        let user_id = self.authenticate(requester).await?;
        self.store.profile(&user_id, Utc::now()).await
    }

    pub async fn profile_of(&self, user_id: &UserId) -> ServiceResult<UserProfile> {
        self.store.profile(user_id, Utc::now()).await
    }

    pub async fn update_profile(&self, requester: &Requester, contact: ProfileContact) -> ServiceResult<UserProfile> {
        let user_id = self.authenticate(requester).await?;
        validators::validate_profile_contact(&contact)?;
        let profile = self.store.update_profile_contact(&user_id, contact, Utc::now()).await?;
        debug!("updated contact details for {user_id}");
        Ok(profile)
    }

    // ---- alerts ----

    async fn view(&self, alert: Alert, viewer: Option<&UserId>) -> ServiceResult<AlertView> {
        let user_reaction = match viewer {
            Some(user_id) => self.store.reaction_of(&alert.id, user_id).await?,
            None => None,
        };
        Ok(AlertView {
            category_detail: self.catalog.get(&alert.category).cloned(),
            user_reaction,
            alert,
        })
    }

    async fn views(&self, alerts: Vec<Alert>, viewer: Option<&UserId>) -> ServiceResult<Vec<AlertView>> {
        let mut views = Vec::with_capacity(alerts.len());
        for alert in alerts {
            views.push(self.view(alert, viewer).await?);
        }
        Ok(views)
    }

    async fn load_alert(&self, alert_id: &AlertId) -> ServiceResult<Alert> {
        self.store
            .get_alert(alert_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("alert", alert_id.as_str()))
    }

    pub async fn create_alert(&self, requester: &Requester, input: NewAlert) -> ServiceResult<AlertView> {
        let owner = self.authenticate(requester).await?;
        validators::validate_new_alert(&self.catalog, &input)?;
        let alert = Alert::open(AlertId::generate(), owner.clone(), input, Utc::now());
        let (alert, profile) = self.store.insert_alert(alert).await?;
        info!(
            "alert {} reported by {owner} in '{}' (reputation now {})",
            alert.id, alert.category, profile.reputation_points
        );
        self.view(alert, Some(&owner)).await
    }

    pub async fn get_alert(&self, requester: &Requester, alert_id: &AlertId) -> ServiceResult<AlertView> {
        let viewer = self.viewer(requester).await?;
        let alert = self.load_alert(alert_id).await?;
        self.view(alert, viewer.as_ref()).await
    }

    /// Alerts matching `filter`, newest first.
    pub async fn list_alerts(&self, requester: &Requester, filter: &AlertFilter) -> ServiceResult<Vec<AlertView>> {
        let viewer = self.viewer(requester).await?;
        let alerts = self.store.list_alerts(filter).await?;
        self.views(alerts, viewer.as_ref()).await
    }

    pub async fn my_alerts(&self, requester: &Requester) -> ServiceResult<Vec<AlertView>> {
        let user_id = self.authenticate(requester).await?;
        let filter = AlertFilter {
            owner: Some(user_id.clone()),
            status: None,
        };
        let alerts = self.store.list_alerts(&filter).await?;
        self.views(alerts, Some(&user_id)).await
    }

    /// Active alerts around a point. Distance is not applied yet: every active
    /// alert is returned once the coordinates are present and in range.
    pub async fn nearby(&self, requester: &Requester, query: &NearbyQuery) -> ServiceResult<Vec<AlertView>> {
        let (lat, lng) = match (query.lat, query.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            (lat, lng) => {
                let missing = [("lat", lat), ("lng", lng)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(field, _)| ValidationIssue::new(field, "validation.required", "field is required"));
                return Err(ValidationError::new(missing).into());
            }
        };
        validators::validate_coordinates(lat, lng)?;
        let radius = query.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
        debug!("nearby lookup at ({lat}, {lng}) radius {radius}km");

        let viewer = self.viewer(requester).await?;
        let filter = AlertFilter {
            owner: None,
            status: Some(AlertStatus::Active),
        };
        let alerts = self.store.list_alerts(&filter).await?;
        self.views(alerts, viewer.as_ref()).await
    }

    pub async fn update_alert(
        &self,
        requester: &Requester,
        alert_id: &AlertId,
        patch: AlertPatch,
    ) -> ServiceResult<AlertView> {
        let user_id = self.authenticate(requester).await?;
        validators::validate_alert_patch(&self.catalog, &patch)?;
        let alert = self
            .store
            .update_alert(alert_id, &user_id, patch, Utc::now())
            .await
            .inspect_err(|err| log_rejection("update", alert_id, err))?;
        debug!("alert {alert_id} edited by {user_id}");
        self.view(alert, Some(&user_id)).await
    }

    /// Deletes the alert and returns the owner's refreshed profile.
    pub async fn delete_alert(&self, requester: &Requester, alert_id: &AlertId) -> ServiceResult<UserProfile> {
        let user_id = self.authenticate(requester).await?;
        let profile = self
            .store
            .delete_alert(alert_id, &user_id, Utc::now())
            .await
            .inspect_err(|err| log_rejection("delete", alert_id, err))?;
        info!("alert {alert_id} deleted by {user_id}");
        Ok(profile)
    }

    pub async fn close_alert(&self, requester: &Requester, alert_id: &AlertId) -> ServiceResult<AlertView> {
        let user_id = self.authenticate(requester).await?;
        let (alert, profile) = self
            .store
            .close_alert(alert_id, &user_id, Utc::now())
            .await
            .inspect_err(|err| log_rejection("close", alert_id, err))?;
        info!(
            "alert {alert_id} resolved by {user_id} (reputation now {})",
            profile.reputation_points
        );
        self.view(alert, Some(&user_id)).await
    }

    /// Applies a `like`, `dislike`, or `remove` request from the requester.
    pub async fn react(
        &self,
        requester: &Requester,
        alert_id: &AlertId,
        reaction_type: &str,
    ) -> ServiceResult<(AlertView, ReactionTransition)> {
        let user_id = self.authenticate(requester).await?;
        let request: ReactionRequest = reaction_type.parse()?;
        let outcome = self
            .store
            .set_reaction(alert_id, &user_id, request, Utc::now())
            .await
            .inspect_err(|err| log_rejection("react to", alert_id, err))?;
        debug!(
            "reaction {} on {alert_id} by {user_id}: {} (likes {}, dislikes {})",
            request.as_str(),
            outcome.transition.label(),
            outcome.alert.likes_count,
            outcome.alert.dislikes_count
        );
        let view = AlertView {
            category_detail: self.catalog.get(&outcome.alert.category).cloned(),
            user_reaction: outcome.current_kind(),
            alert: outcome.alert,
        };
        Ok((view, outcome.transition))
    }

    // ---- comments ----

    pub async fn add_comment(&self, requester: &Requester, alert_id: &AlertId, text: &str) -> ServiceResult<AlertComment> {
        let user_id = self.authenticate(requester).await?;
        validators::validate_comment_text(text)?;
        let comment = AlertComment {
            id: CommentId::generate(),
            alert_id: alert_id.clone(),
            user_id,
            text: text.trim().to_string(),
            created_at: Utc::now(),
        };
        let comment = self.store.insert_comment(comment).await?;
        debug!("comment {} added to {alert_id}", comment.id);
        Ok(comment)
    }

    /// Comments on an alert, newest first.
    pub async fn comments(&self, alert_id: &AlertId) -> ServiceResult<Vec<AlertComment>> {
        self.store.comments(alert_id).await
    }

    // ---- maintenance ----

    /// Recounts every alert from the ledger, then rebuilds every user's statistics.
    pub async fn recompute_all(&self) -> ServiceResult<RecomputeSummary> {
        let mut summary = RecomputeSummary::default();
        for alert in self.store.list_alerts(&AlertFilter::default()).await? {
            self.store.recompute_counters(&alert.id).await?;
            summary.alerts += 1;
        }
        let now = Utc::now();
        for user_id in self.store.list_user_ids().await? {
            self.store.recompute_statistics(&user_id, now).await?;
            summary.users += 1;
        }
        info!("recomputed {} alerts and {} users", summary.alerts, summary.users);
        Ok(summary)
    }
}

fn log_rejection(action: &str, alert_id: &AlertId, err: &ServiceError) {
    if err.is_client_error() {
        warn!("refused to {action} alert {alert_id}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AlertService<MemoryStore> {
        AlertService::new(MemoryStore::new(), Arc::new(CategoryCatalog::builtin()))
    }

    async fn register(service: &AlertService<MemoryStore>, name: &str) -> Requester {
        let (user, _) = service
            .register_user(NewUser {
                username: name.into(),
                email: format!("{name}@example.com"),
                ..Default::default()
            })
            .await
            .expect("register");
        Requester::User(user.id)
    }

    fn pothole() -> NewAlert {
        NewAlert {
            category: "road_hazard".into(),
            title: "Pothole on 7th".into(),
            description: "Deep enough to lose a wheel".into(),
            latitude: 4.6097,
            longitude: -74.0817,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn anonymous_requests_cannot_write() {
        let service = service();
        let err = service.create_alert(&Requester::Anonymous, pothole()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated));
        assert!(matches!(
            service.my_alerts(&Requester::Anonymous).await,
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn unknown_user_handle_is_not_found() {
        let service = service();
        let ghost = Requester::User(UserId::from("ghost"));
        assert!(matches!(
            service.create_alert(&ghost, pothole()).await,
            Err(ServiceError::NotFound { entity: "user", .. })
        ));
    }

    #[tokio::test]
    async fn view_carries_category_detail_and_viewer_reaction() {
        let service = service();
        let owner = register(&service, "owner").await;
        let voter = register(&service, "voter").await;
        let view = service.create_alert(&owner, pothole()).await.unwrap();
        assert_eq!(view.category_detail.as_ref().map(|c| c.key.as_str()), Some("road_hazard"));

        service.react(&voter, &view.alert.id, "like").await.unwrap();
        let seen_by_voter = service.get_alert(&voter, &view.alert.id).await.unwrap();
        let seen_by_anon = service.get_alert(&Requester::Anonymous, &view.alert.id).await.unwrap();
        assert_eq!(seen_by_voter.user_reaction, Some(ReactionKind::Like));
        assert_eq!(seen_by_anon.user_reaction, None);
        assert_eq!(seen_by_anon.alert.likes_count, 1);
    }

    #[tokio::test]
    async fn unknown_reaction_type_is_rejected_before_storage() {
        let service = service();
        let owner = register(&service, "owner").await;
        let view = service.create_alert(&owner, pothole()).await.unwrap();
        let err = service.react(&owner, &view.alert.id, "love").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.store().reaction_count(&view.alert.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn nearby_requires_both_coordinates() {
        let service = service();
        let err = service
            .nearby(
                &Requester::Anonymous,
                &NearbyQuery {
                    lat: Some(4.6),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(err) => assert_eq!(err.issues[0].field, "lng"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn nearby_returns_only_active_alerts() {
        let service = service();
        let owner = register(&service, "owner").await;
        let open = service.create_alert(&owner, pothole()).await.unwrap();
        let closed = service.create_alert(&owner, pothole()).await.unwrap();
        service.close_alert(&owner, &closed.alert.id).await.unwrap();

        let query = NearbyQuery {
            lat: Some(4.6),
            lng: Some(-74.0),
            radius: None,
        };
        let found = service.nearby(&Requester::Anonymous, &query).await.unwrap();
        let ids: Vec<&AlertId> = found.iter().map(|view| &view.alert.id).collect();
        assert_eq!(ids, vec![&open.alert.id]);
    }

    #[tokio::test]
    async fn edits_are_owner_only_and_leave_counters() {
        let service = service();
        let owner = register(&service, "owner").await;
        let voter = register(&service, "voter").await;
        let view = service.create_alert(&owner, pothole()).await.unwrap();
        service.react(&voter, &view.alert.id, "like").await.unwrap();

        let patch = AlertPatch {
            title: Some("Pothole fixed?".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_alert(&voter, &view.alert.id, patch.clone()).await,
            Err(ServiceError::PermissionDenied { .. })
        ));
        let edited = service.update_alert(&owner, &view.alert.id, patch).await.unwrap();
        assert_eq!(edited.alert.title, "Pothole fixed?");
        assert_eq!(edited.alert.likes_count, 1);
        assert_eq!(edited.alert.status, AlertStatus::Active);
    }

    #[tokio::test]
    async fn comments_are_trimmed_and_newest_first() {
        let service = service();
        let owner = register(&service, "owner").await;
        let view = service.create_alert(&owner, pothole()).await.unwrap();
        service.add_comment(&owner, &view.alert.id, "  first ").await.unwrap();
        service.add_comment(&owner, &view.alert.id, "second").await.unwrap();
        let texts: Vec<String> = service
            .comments(&view.alert.id)
            .await
            .unwrap()
            .into_iter()
            .map(|comment| comment.text)
            .collect();
        assert_eq!(texts, vec!["second", "first"]);
        assert!(matches!(
            service.add_comment(&owner, &view.alert.id, "   ").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.add_comment(&owner, &AlertId::from("missing"), "hello").await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn recompute_all_touches_everything() {
        let service = service();
        let owner = register(&service, "owner").await;
        register(&service, "bystander").await;
        service.create_alert(&owner, pothole()).await.unwrap();
        service.create_alert(&owner, pothole()).await.unwrap();
        let summary = service.recompute_all().await.unwrap();
        assert_eq!(summary, RecomputeSummary { alerts: 2, users: 2 });
        assert_eq!(service.profile(&owner).await.unwrap().reputation_points, 20);
    }
}
