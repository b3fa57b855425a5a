use axum::{extract::State, Json};

use crate::api::{LoginRequest, LoginResponse};
use crate::error::ApiResult;
use crate::middleware::JsonBody;
use crate::state::AppState;

/// POST /api/auth/login - Exchange credentials for a JWT
///
/// Expected Input:
/// ```json
/// {
///   "username": "alice",   // Required
///   "password": "secret"   // Required
/// }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "token": "eyJhbGciOiJIUzI1NiI...",
///   "userId": 2,
///   "role": "ROLE_USER"
/// }
/// ```
///
/// Unknown username: 404. Wrong password: 401. The token expires after 24 hours.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(state.auth.login(payload).await?))
}
