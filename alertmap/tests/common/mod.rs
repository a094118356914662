#![allow(dead_code)]

use std::sync::Arc;

use alertmap::{
    AlertService, AlertStatus, AlertView, CategoryCatalog, NewAlert, NewUser, ReactionTransition, Requester,
    ServiceError, Store,
};

pub fn service<S: Store>(store: S) -> AlertService<S> {
    AlertService::new(store, Arc::new(CategoryCatalog::builtin()))
}

pub async fn register<S: Store>(service: &AlertService<S>, username: &str) -> Requester {
    let (user, profile) = service
        .register_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            ..Default::default()
        })
        .await
        .expect("register user");
    assert_eq!(profile.reputation_points, 0);
    Requester::User(user.id)
}

pub fn flooded_street() -> NewAlert {
    NewAlert {
        category: "flooding".into(),
        title: "Street under water".into(),
        description: "Cars cannot pass between 5th and 6th".into(),
        latitude: 4.65,
        longitude: -74.05,
        address: "Calle 45 #5-20".into(),
        image: None,
    }
}

async fn reputation<S: Store>(service: &AlertService<S>, requester: &Requester) -> i64 {
    service.profile(requester).await.expect("profile").reputation_points
}

/// U reports an alert, V likes it, switches to dislike, removes the reaction,
/// and U resolves it. Reputation must read 10, 15, 7, 10, 30.
pub async fn reputation_scenario<S: Store>(service: &AlertService<S>) {
    let u = register(service, "reporter_u").await;
    let v = register(service, "neighbour_v").await;

    let created: AlertView = service.create_alert(&u, flooded_street()).await.expect("create");
    let alert_id = created.alert.id.clone();
    assert_eq!(created.alert.status, AlertStatus::Active);
    assert_eq!((created.alert.likes_count, created.alert.dislikes_count), (0, 0));
    assert_eq!(reputation(service, &u).await, 10);

    let (view, transition) = service.react(&v, &alert_id, "like").await.expect("like");
    assert!(matches!(transition, ReactionTransition::Created { .. }));
    assert_eq!((view.alert.likes_count, view.alert.dislikes_count), (1, 0));
    assert_eq!(view.user_reaction, Some(alertmap::ReactionKind::Like));
    assert_eq!(reputation(service, &u).await, 15);

    let (view, transition) = service.react(&v, &alert_id, "dislike").await.expect("dislike");
    assert!(matches!(transition, ReactionTransition::Updated { .. }));
    assert_eq!((view.alert.likes_count, view.alert.dislikes_count), (0, 1));
    assert_eq!(reputation(service, &u).await, 7);
    assert_eq!(service.store().reaction_count(&alert_id).await.unwrap(), 1);

    let (view, transition) = service.react(&v, &alert_id, "remove").await.expect("remove");
    assert!(matches!(transition, ReactionTransition::Removed { .. }));
    assert_eq!((view.alert.likes_count, view.alert.dislikes_count), (0, 0));
    assert_eq!(view.user_reaction, None);
    assert_eq!(reputation(service, &u).await, 10);

    assert!(matches!(
        service.close_alert(&v, &alert_id).await,
        Err(ServiceError::PermissionDenied { .. })
    ));

    let closed = service.close_alert(&u, &alert_id).await.expect("close");
    assert_eq!(closed.alert.status, AlertStatus::Resolved);
    let closed_at = closed.alert.closed_at.expect("closed_at set");
    let profile = service.profile(&u).await.unwrap();
    assert_eq!(profile.alerts_reported, 1);
    assert_eq!(profile.alerts_resolved, 1);
    assert_eq!(profile.reputation_points, 30);

    assert!(matches!(
        service.close_alert(&u, &alert_id).await,
        Err(ServiceError::InvalidState { .. })
    ));
    let unchanged = service.get_alert(&u, &alert_id).await.unwrap();
    assert_eq!(unchanged.alert.closed_at, Some(closed_at));

    // V's own statistics never moved.
    assert_eq!(reputation(service, &v).await, 0);
}

/// Repeating a reaction changes nothing; removing an absent one is not an error.
pub async fn idempotent_reactions<S: Store>(service: &AlertService<S>) {
    let owner = register(service, "idem_owner").await;
    let voter = register(service, "idem_voter").await;
    let alert_id = service.create_alert(&owner, flooded_street()).await.unwrap().alert.id;

    let (_, transition) = service.react(&voter, &alert_id, "remove").await.unwrap();
    assert_eq!(transition, ReactionTransition::Unchanged { current: None });

    service.react(&voter, &alert_id, "dislike").await.unwrap();
    let before = service.profile(&owner).await.unwrap();
    let (view, transition) = service.react(&voter, &alert_id, "dislike").await.unwrap();
    assert!(!transition.changed_ledger());
    assert_eq!(view.alert.dislikes_count, 1);
    assert_eq!(service.store().reaction_count(&alert_id).await.unwrap(), 1);
    assert_eq!(service.profile(&owner).await.unwrap().reputation_points, before.reputation_points);
}

/// Deleting an alert drops its ledger rows and the owner's derived statistics.
pub async fn delete_cascades<S: Store>(service: &AlertService<S>) {
    let owner = register(service, "cascade_owner").await;
    let voter = register(service, "cascade_voter").await;
    let alert_id = service.create_alert(&owner, flooded_street()).await.unwrap().alert.id;
    service.react(&voter, &alert_id, "like").await.unwrap();
    service.add_comment(&voter, &alert_id, "Still flooded at 8pm").await.unwrap();
    assert_eq!(service.profile(&owner).await.unwrap().reputation_points, 15);

    assert!(matches!(
        service.delete_alert(&voter, &alert_id).await,
        Err(ServiceError::PermissionDenied { .. })
    ));
    let profile = service.delete_alert(&owner, &alert_id).await.unwrap();
    assert_eq!(profile.alerts_reported, 0);
    assert_eq!(profile.reputation_points, 0);
    assert_eq!(service.store().reaction_count(&alert_id).await.unwrap(), 0);
    assert!(matches!(
        service.get_alert(&owner, &alert_id).await,
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(service.comments(&alert_id).await, Err(ServiceError::NotFound { .. })));
}

/// Many users reacting at once: counters always equal the ledger.
pub async fn concurrent_reactions<S: Store>(service: &AlertService<S>, voters: usize) {
    let owner = register(service, "busy_owner").await;
    let alert_id = service.create_alert(&owner, flooded_street()).await.unwrap().alert.id;
    let mut requesters = Vec::with_capacity(voters);
    for i in 0..voters {
        requesters.push(register(service, &format!("busy_voter_{i}")).await);
    }

    let mut handles = Vec::with_capacity(voters * 2);
    for (i, requester) in requesters.into_iter().enumerate() {
        for kind in ["like", if i % 3 == 0 { "remove" } else { "dislike" }] {
            let service = service.clone();
            let requester = requester.clone();
            let alert_id = alert_id.clone();
            handles.push(tokio::spawn(async move {
                service.react(&requester, &alert_id, kind).await.map(|_| ())
            }));
        }
    }
    for handle in handles {
        handle.await.expect("join").expect("react");
    }

    let alert = service.get_alert(&Requester::Anonymous, &alert_id).await.unwrap().alert;
    let rows = service.store().reaction_count(&alert_id).await.unwrap() as i64;
    assert_eq!(alert.likes_count + alert.dislikes_count, rows);
    assert!(rows <= voters as i64);

    let repaired = service.store().recompute_counters(&alert_id).await.unwrap();
    assert_eq!(repaired.likes_count, alert.likes_count);
    assert_eq!(repaired.dislikes_count, alert.dislikes_count);

    let profile = service.profile(&owner).await.unwrap();
    assert_eq!(profile.reputation_points, 10 + alert.likes_count * 5 - alert.dislikes_count * 3);
}
