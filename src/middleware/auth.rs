use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// JWT authentication middleware for the protected routes.
///
/// Without an `Authorization` header the request continues with no principal, and the
/// `AuthUser` extractor turns that into 401 in the handler. A header that is present
/// must carry a valid, unexpired token for an account that still exists with the same
/// id and role. Anything else is rejected here and the handler never runs.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_jwt_from_headers(request.headers()).map_err(ApiError::unauthorized)? else {
        return Ok(next.run(request).await);
    };

    let claims = state.tokens.verify(&token).map_err(|e| {
        warn!("Rejected bearer token on {}: {}", request.uri().path(), e);
        ApiError::from(e)
    })?;

    let principal = AuthUser::from(claims);
    state.auth.revalidate(&principal).await?;
    debug!("Authenticated {} ({})", principal.username, principal.role);

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header. `Ok(None)` when there is no header.
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(Some(token.to_string()))
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_not_an_error() {
        assert_eq!(extract_jwt_from_headers(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def.ghi")), Ok(Some("abc.def.ghi".into())));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_rejected() {
        assert!(extract_jwt_from_headers(&headers("Basic dXNlcjpwdw==")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer   ")).is_err());
    }
}
