//! HTTP handlers for the user directory

use super::{ApiError, CreateUserRequest, UpdatePermissionsRequest, UserInfo};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use roster_authz::MaskUpdate;
use roster_core::{validation_error, ErrorContext, RosterError};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

/// Query parameters for user listing
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub name: Option<String>,
}

/// Create user endpoint
///
/// Registers a new user with a name, password, and an optional list of
/// permission or group names for the initial capability mask.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserInfo>), ApiError> {
    info!("User creation attempt: {}", request.name);

    let user = state.user_service.create(request).await?;

    info!("User created successfully: {}", user.name);
    Ok((StatusCode::CREATED, Json(UserInfo::from_record(&user))))
}

/// List users, optionally filtered by a name substring
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserInfo>>, ApiError> {
    let users = match query.name.as_deref() {
        Some(name) if !name.is_empty() => state.user_service.search(name).await?,
        _ => state.user_service.list().await?,
    };

    Ok(Json(users.iter().map(UserInfo::from_record).collect()))
}

/// Fetch a single user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserInfo>, ApiError> {
    let id = parse_user_id(&id)?;
    let user = state.user_service.get_by_id(&id).await?;
    Ok(Json(UserInfo::from_record(&user)))
}

/// Delete a user by ID
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_user_id(&id)?;
    state.user_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Update a user's capability mask
///
/// Accepts `{set, add, remove}`; a non-empty `set` replaces the mask and the
/// other lists are ignored, otherwise adds are granted before removes are
/// revoked. Returns the updated user.
pub async fn update_permissions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePermissionsRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    let id = parse_user_id(&id)?;
    let update = MaskUpdate::from_parts(request.set, request.add, request.remove);

    let user = state.user_service.update_permissions(&id, update).await?;

    info!("Permissions updated for user: {}", user.id);
    Ok(Json(UserInfo::from_record(&user)))
}

/// Check whether a user holds every requirement in a comma-separated name list
pub async fn check_permissions(
    State(state): State<AppState>,
    Path((id, names)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_user_id(&id)?;
    let required: Vec<String> = names.split(',').map(|s| s.to_string()).collect();

    let satisfied = state.user_service.check_permissions(&id, &required).await?;

    Ok(Json(json!({ "has_permissions": satisfied })))
}

fn parse_user_id(id: &str) -> Result<String, ApiError> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.to_string())
        .map_err(|_| ApiError(validation_error!("Invalid user ID", "id", "users")))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use roster_core::RosterConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn create_test_app() -> Router {
        let state = crate::AppState::new(RosterConfig::default()).await.unwrap();
        crate::routes::api_routes().with_state(state)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn patch_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("PATCH")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn create_user(app: &Router, name: &str, permissions: Value) -> Value {
        let response = app
            .clone()
            .oneshot(post_json(
                "/users",
                json!({
                    "name": name,
                    "password": "password123",
                    "permissions": permissions,
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn test_create_user_defaults_to_default_group() {
        let app = create_test_app().await;

        let user = create_user(&app, "plainuser", json!([])).await;
        assert_eq!(user["permissions"], json!(["users.readone"]));
    }

    #[tokio::test]
    async fn test_create_user_with_admin_group() {
        let app = create_test_app().await;

        let user = create_user(&app, "adminuser", json!(["Admin"])).await;
        assert_eq!(
            user["permissions"],
            json!(["users.read", "users.write", "users.delete", "users.readone"])
        );
    }

    #[tokio::test]
    async fn test_create_user_drops_unknown_names() {
        let app = create_test_app().await;

        // Unknown names contribute nothing, so the mask falls back to Default.
        let user = create_user(&app, "bogususer", json!(["bogus.permission"])).await;
        assert_eq!(user["permissions"], json!(["users.readone"]));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let app = create_test_app().await;

        create_user(&app, "taken", json!([])).await;

        let response = app
            .oneshot(post_json(
                "/users",
                json!({"name": "taken", "password": "password123"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let app = create_test_app().await;

        let response = app
            .oneshot(post_json(
                "/users",
                json!({"name": "   ", "password": "password123"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_user_round_trip() {
        let app = create_test_app().await;

        let created = create_user(&app, "fetchme", json!(["Moderator"])).await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(get(&format!("/users/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user = json_body(response).await;
        assert_eq!(user["name"], "fetchme");
        assert_eq!(
            user["permissions"],
            json!(["users.read", "users.write", "users.readone"])
        );
    }

    #[tokio::test]
    async fn test_get_user_invalid_id() {
        let app = create_test_app().await;

        let response = app
            .oneshot(get("/users/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let app = create_test_app().await;

        let response = app
            .oneshot(get(&format!("/users/{}", uuid::Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_and_search_users() {
        let app = create_test_app().await;

        create_user(&app, "alice", json!([])).await;
        create_user(&app, "bob", json!([])).await;

        let response = app.clone().oneshot(get("/users")).await.unwrap();
        let users = json_body(response).await;
        assert_eq!(users.as_array().unwrap().len(), 2);

        // Substring match is case-insensitive.
        let response = app.oneshot(get("/users?name=ALI")).await.unwrap();
        let users = json_body(response).await;
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert_eq!(users[0]["name"], "alice");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let app = create_test_app().await;

        let created = create_user(&app, "shortlived", json!([])).await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/users/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(get(&format!("/users/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_permissions_add_then_remove() {
        let app = create_test_app().await;

        let created = create_user(&app, "updatable", json!(["Admin"])).await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .oneshot(patch_json(
                &format!("/users/{}/permissions", id),
                json!({"remove": ["users.delete"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user = json_body(response).await;
        assert_eq!(
            user["permissions"],
            json!(["users.read", "users.write", "users.readone"])
        );
    }

    #[tokio::test]
    async fn test_update_permissions_set_takes_precedence() {
        let app = create_test_app().await;

        let created = create_user(&app, "setwins", json!(["Admin"])).await;
        let id = created["id"].as_str().unwrap();

        // add/remove supplied alongside a non-empty set are ignored.
        let response = app
            .oneshot(patch_json(
                &format!("/users/{}/permissions", id),
                json!({
                    "set": ["Default"],
                    "add": ["users.delete"],
                    "remove": ["users.readone"],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user = json_body(response).await;
        assert_eq!(user["permissions"], json!(["users.readone"]));
    }

    #[tokio::test]
    async fn test_update_permissions_remove_wins_over_add() {
        let app = create_test_app().await;

        let created = create_user(&app, "tugofwar", json!(["Default"])).await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .oneshot(patch_json(
                &format!("/users/{}/permissions", id),
                json!({
                    "add": ["users.write"],
                    "remove": ["users.write"],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user = json_body(response).await;
        assert_eq!(user["permissions"], json!(["users.readone"]));
    }

    #[tokio::test]
    async fn test_check_permissions() {
        let app = create_test_app().await;

        let created = create_user(&app, "checked", json!(["Moderator"])).await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(get(&format!(
                "/users/{}/permissions/check/users.read,users.write",
                id
            )))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["has_permissions"], json!(true));

        let response = app
            .clone()
            .oneshot(get(&format!(
                "/users/{}/permissions/check/users.delete",
                id
            )))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["has_permissions"], json!(false));

        // Fully-unrecognized requirements are vacuously satisfied.
        let response = app
            .oneshot(get(&format!(
                "/users/{}/permissions/check/no.such.permission",
                id
            )))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["has_permissions"], json!(true));
    }
}
