mod body;
mod dto;
mod error;
mod handlers;
mod identity;
mod state;

pub use body::JsonBody;
pub use error::ApiError;
pub use identity::{Identity, USER_ID_HEADER};
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::store::Store;

/// Build the application router
pub fn router<S: Store>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::<S>))
        .route("/categories", get(handlers::list_categories::<S>))
        .route("/categories/{key}", get(handlers::get_category::<S>))
        .route("/users", post(handlers::register_user::<S>))
        .route("/users/{id}", get(handlers::get_user::<S>))
        .route(
            "/alerts",
            get(handlers::list_alerts::<S>).post(handlers::create_alert::<S>),
        )
        .route("/alerts/nearby", get(handlers::nearby::<S>))
        .route("/alerts/mine", get(handlers::my_alerts::<S>))
        .route(
            "/alerts/{id}",
            get(handlers::get_alert::<S>)
                .patch(handlers::update_alert::<S>)
                .delete(handlers::delete_alert::<S>),
        )
        .route("/alerts/{id}/react", post(handlers::react::<S>))
        .route("/alerts/{id}/close", post(handlers::close_alert::<S>))
        .route(
            "/alerts/{id}/comments",
            get(handlers::list_comments::<S>).post(handlers::add_comment::<S>),
        )
        .route(
            "/profiles/me",
            get(handlers::my_profile::<S>).patch(handlers::update_my_profile::<S>),
        )
        .route("/profiles/{user_id}", get(handlers::profile_of::<S>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
