//! Route definitions for the roster web server

use crate::{handlers, users, AppState};
use axum::{
    routing::{get, patch, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // User directory
        .route("/users", post(users::handlers::create_user))
        .route("/users", get(users::handlers::list_users))
        .route("/users/{id}", get(users::handlers::get_user))
        .route("/users/{id}", axum::routing::delete(users::handlers::delete_user))
        // Capability mask management
        .route(
            "/users/{id}/permissions",
            patch(users::handlers::update_permissions),
        )
        .route(
            "/users/{id}/permissions/check/{names}",
            get(users::handlers::check_permissions),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use roster_core::RosterConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check_route() {
        let state = AppState::new(RosterConfig::default()).await.unwrap();
        let app = api_routes().with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
