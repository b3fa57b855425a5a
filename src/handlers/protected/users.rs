use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::api::{UserRequest, UserSummary};
use crate::error::ApiResult;
use crate::middleware::{AdminUser, JsonBody, PathId};
use crate::state::AppState;

/// GET /api/auth/users - list every account with its contacts (admin)
///
/// Expected Output (Success):
/// ```json
/// [
///   {
///     "id": 2,
///     "username": "alice",
///     "role": "ROLE_USER",
///     "contacts": [ { "id": 7, "firstName": "Jane", "...": "..." } ]
///   }
/// ]
/// ```
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.users.list(&actor).await?))
}

/// POST /api/auth/users - create an account (admin)
///
/// Expected Input:
/// ```json
/// {
///   "username": "carol",     // Required, unique
///   "password": "secret",    // Required
///   "role": "ROLE_USER"      // Optional, defaults to ROLE_USER
/// }
/// ```
///
/// Returns 201 with the new user summary, or 409 when the username is taken.
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    JsonBody(payload): JsonBody<UserRequest>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let user = state.users.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/auth/users/:id - update an account (admin)
///
/// Expected Input:
/// ```json
/// {
///   "username": "carol2",      // Optional
///   "password": "new-secret",  // Optional
///   "role": "ROLE_ADMIN",      // Optional
///   "adminPassword": "...",    // Required when changing username or password of another account
///   "oldPassword": "..."       // Required when changing one's own username or password
/// }
/// ```
///
/// Missing confirmation: 400. Wrong confirmation: 401. Unknown id: 404.
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<UserRequest>,
) -> ApiResult<Json<UserSummary>> {
    Ok(Json(state.users.update(&actor, id, payload).await?))
}

/// DELETE /api/auth/users/:id - delete an account and its contacts (admin)
///
/// Expected Output (Success):
/// ```json
/// { "message": "User deleted successfully" }
/// ```
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    PathId(id): PathId,
) -> ApiResult<Json<Value>> {
    state.users.delete(&actor, id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
