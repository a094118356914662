use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::body::JsonBody;
use super::dto::*;
use super::error::ApiError;
use super::identity::Identity;
use super::state::AppState;
use crate::{
    catalog::Category,
    id::{AlertId, UserId},
    service::{AlertView, NearbyQuery},
    store::Store,
    types::{AlertComment, AlertPatch, NewAlert, NewUser, ProfileContact, UserProfile},
};

type Shared<S> = State<Arc<AppState<S>>>;

/// GET /health - Health check
pub async fn health<S: Store>(State(state): Shared<S>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.backend,
    })
}

pub async fn list_categories<S: Store>(State(state): Shared<S>) -> Json<Vec<Category>> {
    Json(state.service.categories().to_vec())
}

pub async fn get_category<S: Store>(
    State(state): Shared<S>,
    Path(key): Path<String>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.service.category(&key)?.clone()))
}

/// POST /users - Register a user together with their profile
pub async fn register_user<S: Store>(
    State(state): Shared<S>,
    JsonBody(input): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let (user, profile) = state.service.register_user(input).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user, profile })))
}

pub async fn get_user<S: Store>(
    State(state): Shared<S>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = UserId::from(id);
    let user = state.service.get_user(&user_id).await?;
    let profile = state.service.profile_of(&user_id).await?;
    Ok(Json(UserResponse { user, profile }))
}

/// GET /alerts - Newest first, optionally filtered by `owner` and `status`
pub async fn list_alerts<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    Query(query): Query<AlertListQuery>,
) -> Result<Json<Vec<AlertView>>, ApiError> {
    let filter = query.into_filter()?;
    Ok(Json(state.service.list_alerts(&requester, &filter).await?))
}

pub async fn create_alert<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    JsonBody(input): JsonBody<NewAlert>,
) -> Result<(StatusCode, Json<AlertView>), ApiError> {
    let view = state.service.create_alert(&requester, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /alerts/nearby?lat=..&lng=..&radius=..
pub async fn nearby<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<AlertView>>, ApiError> {
    Ok(Json(state.service.nearby(&requester, &query).await?))
}

pub async fn my_alerts<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
) -> Result<Json<Vec<AlertView>>, ApiError> {
    Ok(Json(state.service.my_alerts(&requester).await?))
}

pub async fn get_alert<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    Path(id): Path<String>,
) -> Result<Json<AlertView>, ApiError> {
    Ok(Json(state.service.get_alert(&requester, &AlertId::from(id)).await?))
}

pub async fn update_alert<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<AlertPatch>,
) -> Result<Json<AlertView>, ApiError> {
    Ok(Json(state.service.update_alert(&requester, &AlertId::from(id), patch).await?))
}

pub async fn delete_alert<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let alert_id = AlertId::from(id);
    let profile = state.service.delete_alert(&requester, &alert_id).await?;
    Ok(Json(DeletedResponse {
        deleted: alert_id,
        profile,
    }))
}

/// POST /alerts/{id}/react - Set, switch, or remove the requester's reaction
pub async fn react<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ReactRequest>,
) -> Result<Json<ReactResponse>, ApiError> {
    let (alert, transition) = state
        .service
        .react(&requester, &AlertId::from(id), &body.reaction_type)
        .await?;
    Ok(Json(ReactResponse {
        alert,
        transition: transition.label(),
    }))
}

/// POST /alerts/{id}/close - Owner marks the alert resolved
pub async fn close_alert<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    Path(id): Path<String>,
) -> Result<Json<AlertView>, ApiError> {
    Ok(Json(state.service.close_alert(&requester, &AlertId::from(id)).await?))
}

pub async fn list_comments<S: Store>(
    State(state): Shared<S>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AlertComment>>, ApiError> {
    Ok(Json(state.service.comments(&AlertId::from(id)).await?))
}

pub async fn add_comment<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CommentRequest>,
) -> Result<(StatusCode, Json<AlertComment>), ApiError> {
    let comment = state
        .service
        .add_comment(&requester, &AlertId::from(id), &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn my_profile<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.service.profile(&requester).await?))
}

/// PATCH /profiles/me - Only phone and avatar are editable
pub async fn update_my_profile<S: Store>(
    State(state): Shared<S>,
    Identity(requester): Identity,
    JsonBody(contact): JsonBody<ProfileContact>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.service.update_profile(&requester, contact).await?))
}

pub async fn profile_of<S: Store>(
    State(state): Shared<S>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.service.profile_of(&UserId::from(user_id)).await?))
}
