//! Reaction state machine, aggregate counters, and the reputation formula.
//!
//! Everything here is a pure function of its inputs. Stores call into these
//! while holding their atomic unit; the Redis Lua scripts mirror the same rules
//! and receive [`ReputationWeights`] from here so the formula has one source.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    errors::ServiceError,
    id::UserId,
    types::{Alert, AlertStatus, ReactionKind, ReactionRequest, UserProfile},
};

/// Points awarded per activity when computing reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReputationWeights {
    pub report: i64,
    pub resolution: i64,
    pub like: i64,
    pub dislike: i64,
}

pub const REPUTATION_WEIGHTS: ReputationWeights = ReputationWeights {
    report: 10,
    resolution: 20,
    like: 5,
    dislike: 3,
};

/// What a reaction request did to the ledger row of one (user, alert) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum ReactionTransition {
    Created { kind: ReactionKind },
    Updated { from: ReactionKind, to: ReactionKind },
    Removed { kind: ReactionKind },
    Unchanged { current: Option<ReactionKind> },
}

impl ReactionTransition {
    /// The ledger row's kind after the transition, if a row remains.
    pub fn resulting_kind(&self) -> Option<ReactionKind> {
        match *self {
            ReactionTransition::Created { kind } => Some(kind),
            ReactionTransition::Updated { to, .. } => Some(to),
            ReactionTransition::Removed { .. } => None,
            ReactionTransition::Unchanged { current } => current,
        }
    }

    pub fn changed_ledger(&self) -> bool {
        !matches!(self, ReactionTransition::Unchanged { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReactionTransition::Created { .. } => "created",
            ReactionTransition::Updated { .. } => "updated",
            ReactionTransition::Removed { .. } => "removed",
            ReactionTransition::Unchanged { .. } => "unchanged",
        }
    }
}

/// Decides the ledger transition for `request` given the pair's current row.
pub fn plan_reaction(existing: Option<ReactionKind>, request: ReactionRequest) -> ReactionTransition {
    match (existing, request) {
        (None, ReactionRequest::Remove) => ReactionTransition::Unchanged { current: None },
        (Some(kind), ReactionRequest::Remove) => ReactionTransition::Removed { kind },
        (None, ReactionRequest::Set(kind)) => ReactionTransition::Created { kind },
        (Some(from), ReactionRequest::Set(to)) if from != to => ReactionTransition::Updated { from, to },
        (Some(current), ReactionRequest::Set(_)) => ReactionTransition::Unchanged { current: Some(current) },
    }
}

/// Like/dislike totals for one alert, counted from its ledger rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionTally {
    pub likes: i64,
    pub dislikes: i64,
}

impl ReactionTally {
    pub fn count<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = ReactionKind>,
    {
        kinds.into_iter().fold(Self::default(), |mut tally, kind| {
            match kind {
                ReactionKind::Like => tally.likes += 1,
                ReactionKind::Dislike => tally.dislikes += 1,
            }
            tally
        })
    }

    /// Overwrites the alert's cached counters.
    pub fn apply_to(&self, alert: &mut Alert) {
        alert.likes_count = self.likes;
        alert.dislikes_count = self.dislikes;
    }
}

/// Derived statistics for one user, computed from their alerts' cached counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStatistics {
    pub alerts_reported: i64,
    pub alerts_resolved: i64,
    pub total_likes: i64,
    pub total_dislikes: i64,
}

impl UserStatistics {
    /// Trusts the cached `likes_count`/`dislikes_count`; counters must be fresh.
    pub fn from_alerts<'a, I>(alerts: I) -> Self
    where
        I: IntoIterator<Item = &'a Alert>,
    {
        alerts.into_iter().fold(Self::default(), |mut stats, alert| {
            stats.alerts_reported += 1;
            if alert.status == AlertStatus::Resolved {
                stats.alerts_resolved += 1;
            }
            stats.total_likes += alert.likes_count;
            stats.total_dislikes += alert.dislikes_count;
            stats
        })
    }

    pub fn reputation_points(&self) -> i64 {
        self.reputation_points_with(REPUTATION_WEIGHTS)
    }

    pub fn reputation_points_with(&self, weights: ReputationWeights) -> i64 {
        self.alerts_reported * weights.report + self.alerts_resolved * weights.resolution
            + self.total_likes * weights.like
            - self.total_dislikes * weights.dislike
    }

    pub fn apply_to(&self, profile: &mut UserProfile, now: DateTime<Utc>) {
        profile.alerts_reported = self.alerts_reported;
        profile.alerts_resolved = self.alerts_resolved;
        profile.reputation_points = self.reputation_points();
        profile.updated_at = now;
    }
}

/// Only the owner may edit, delete, or close an alert.
pub fn ensure_owner(alert: &Alert, requester: &UserId, action: &str) -> Result<(), ServiceError> {
    if alert.is_owned_by(requester) {
        Ok(())
    } else {
        Err(ServiceError::permission_denied(format!(
            "only the owner can {action} this alert"
        )))
    }
}

/// Applies the `active -> resolved` transition in place.
pub fn close_alert(alert: &mut Alert, requester: &UserId, now: DateTime<Utc>) -> Result<(), ServiceError> {
    ensure_owner(alert, requester, "close")?;
    match alert.status {
        AlertStatus::Active => {
            alert.status = AlertStatus::Resolved;
            alert.closed_at = Some(now);
            alert.updated_at = now;
            Ok(())
        }
        AlertStatus::Resolved => Err(ServiceError::invalid_state("alert is already resolved")),
        AlertStatus::Expired => Err(ServiceError::invalid_state("alert has expired and cannot be closed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        id::AlertId,
        types::NewAlert,
    };

    use ReactionKind::{Dislike, Like};

    fn alert_with(likes: i64, dislikes: i64, status: AlertStatus) -> Alert {
        let mut alert = Alert::open(
            AlertId::generate(),
            UserId::from("owner"),
            NewAlert::default(),
            Utc::now(),
        );
        alert.likes_count = likes;
        alert.dislikes_count = dislikes;
        alert.status = status;
        alert
    }

    #[test]
    fn transitions_cover_every_pair() {
        assert_eq!(plan_reaction(None, ReactionRequest::Set(Like)), ReactionTransition::Created { kind: Like });
        assert_eq!(
            plan_reaction(Some(Like), ReactionRequest::Set(Dislike)),
            ReactionTransition::Updated { from: Like, to: Dislike }
        );
        assert_eq!(
            plan_reaction(Some(Dislike), ReactionRequest::Set(Dislike)),
            ReactionTransition::Unchanged { current: Some(Dislike) }
        );
        assert_eq!(plan_reaction(Some(Like), ReactionRequest::Remove), ReactionTransition::Removed { kind: Like });
        assert_eq!(
            plan_reaction(None, ReactionRequest::Remove),
            ReactionTransition::Unchanged { current: None }
        );
    }

    #[test]
    fn resulting_kind_follows_transition() {
        assert_eq!(plan_reaction(None, ReactionRequest::Set(Like)).resulting_kind(), Some(Like));
        assert_eq!(plan_reaction(Some(Like), ReactionRequest::Remove).resulting_kind(), None);
        assert_eq!(plan_reaction(Some(Like), ReactionRequest::Set(Like)).resulting_kind(), Some(Like));
        assert!(!plan_reaction(Some(Like), ReactionRequest::Set(Like)).changed_ledger());
    }

    #[test]
    fn tally_counts_by_kind() {
        let tally = ReactionTally::count([Like, Dislike, Like, Like]);
        assert_eq!(tally, ReactionTally { likes: 3, dislikes: 1 });
        let mut alert = alert_with(9, 9, AlertStatus::Active);
        tally.apply_to(&mut alert);
        assert_eq!((alert.likes_count, alert.dislikes_count), (3, 1));
    }

    #[test]
    fn reputation_formula() {
        let alerts = [
            alert_with(2, 1, AlertStatus::Active),
            alert_with(0, 4, AlertStatus::Resolved),
            alert_with(1, 0, AlertStatus::Expired),
        ];
        let stats = UserStatistics::from_alerts(&alerts);
        assert_eq!(stats.alerts_reported, 3);
        assert_eq!(stats.alerts_resolved, 1);
        // 3*10 + 1*20 + 3*5 - 5*3
        assert_eq!(stats.reputation_points(), 50);
    }

    #[test]
    fn reputation_may_go_negative() {
        let stats = UserStatistics::from_alerts(&[alert_with(0, 5, AlertStatus::Active)]);
        assert_eq!(stats.reputation_points(), -5);
    }

    #[test]
    fn applying_statistics_twice_is_stable() {
        let alerts = [alert_with(1, 1, AlertStatus::Resolved)];
        let now = Utc::now();
        let mut profile = UserProfile::new(UserId::from("owner"), now);
        UserStatistics::from_alerts(&alerts).apply_to(&mut profile, now);
        let first = profile.clone();
        UserStatistics::from_alerts(&alerts).apply_to(&mut profile, now);
        assert_eq!(profile, first);
        assert_eq!(profile.reputation_points, 10 + 20 + 5 - 3);
    }

    #[test]
    fn close_requires_owner_and_active_status() {
        let now = Utc::now();
        let mut alert = alert_with(0, 0, AlertStatus::Active);
        let stranger = UserId::from("stranger");
        assert!(matches!(
            close_alert(&mut alert, &stranger, now),
            Err(ServiceError::PermissionDenied { .. })
        ));
        assert_eq!(alert.status, AlertStatus::Active);

        let owner = UserId::from("owner");
        close_alert(&mut alert, &owner, now).expect("owner closes");
        assert_eq!(alert.status, AlertStatus::Resolved);
        assert_eq!(alert.closed_at, Some(now));

        let later = now + chrono::Duration::minutes(5);
        assert!(matches!(
            close_alert(&mut alert, &owner, later),
            Err(ServiceError::InvalidState { .. })
        ));
        assert_eq!(alert.closed_at, Some(now));
    }
}
