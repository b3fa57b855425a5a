use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::requests::non_blank;
use crate::api::{LoginRequest, LoginResponse};
use crate::auth::{AuthUser, PasswordHasher, TokenService};
use crate::database::UserRepository;

use super::error::{FieldErrors, ServiceError, ServiceResult};

/// Credential exchange and principal revalidation.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    passwords: PasswordHasher,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>, passwords: PasswordHasher) -> Self {
        Self { users, tokens, passwords }
    }

    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        let mut missing = FieldErrors::new();
        let username = non_blank(&request.username);
        let password = request.password.as_deref().filter(|p| !p.is_empty());
        if username.is_none() {
            missing.insert("username".into(), "Username is required".into());
        }
        if password.is_none() {
            missing.insert("password".into(), "Password is required".into());
        }
        let (Some(username), Some(password)) = (username, password) else {
            return Err(ServiceError::Validation(missing));
        };

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User not found: {}", username)))?;

        if !self.passwords.verify(password, &user.password_hash).await? {
            warn!("Rejected login for '{}': bad password", username);
            return Err(ServiceError::unauthorized("Invalid username or password"));
        }

        let token = self.tokens.issue(&user.username, user.role, Some(user.id))?;
        debug!("Issued token for '{}' ({})", user.username, user.role);

        Ok(LoginResponse {
            token,
            user_id: user.id,
            role: user.role,
        })
    }

    /// Confirms a verified principal still matches a stored account. Deleted accounts,
    /// and tokens whose id or role disagree with the record, are rejected.
    pub async fn revalidate(&self, principal: &AuthUser) -> ServiceResult<()> {
        let Some(user) = self.users.find_by_username(&principal.username).await? else {
            warn!("Token subject '{}' no longer exists", principal.username);
            return Err(ServiceError::unauthorized("User no longer exists"));
        };

        if let Some(id) = principal.user_id {
            if id != user.id {
                warn!("Token for '{}' carries user id {} but account is {}", principal.username, id, user.id);
                return Err(ServiceError::unauthorized("Token does not match account"));
            }
        }
        if principal.role != user.role {
            warn!(
                "Token for '{}' carries role {} but account has {}",
                principal.username, principal.role, user.role
            );
            return Err(ServiceError::unauthorized("Token does not match account"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::testing::TestApp;

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn valid_credentials_yield_matching_token() {
        let app = TestApp::new().await;
        let response = app.auth.login(login("alice", "secret")).await.unwrap();

        assert_eq!(response.user_id, app.alice.id);
        assert_eq!(response.role, Role::User);

        let claims = app.tokens.verify(&response.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.user_id, Some(app.alice.id));
        assert_eq!(claims.role, Role::User);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = TestApp::new().await;
        let err = app.auth.login(login("alice", "wrong")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::new().await;
        let err = app.auth.login(login("nobody", "secret")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_fields_are_validation_errors() {
        let app = TestApp::new().await;
        let err = app.auth.login(LoginRequest::default()).await.unwrap_err();
        match err {
            ServiceError::Validation(fields) => {
                assert!(fields.contains_key("username"));
                assert!(fields.contains_key("password"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn revalidate_rejects_demoted_and_deleted_accounts() {
        let app = TestApp::new().await;
        assert!(app.auth.revalidate(&app.alice_principal()).await.is_ok());

        let mut forged = app.alice_principal();
        forged.role = Role::Admin;
        assert!(matches!(app.auth.revalidate(&forged).await, Err(ServiceError::Unauthorized(_))));

        let mut wrong_id = app.alice_principal();
        wrong_id.user_id = Some(app.admin.id);
        assert!(matches!(app.auth.revalidate(&wrong_id).await, Err(ServiceError::Unauthorized(_))));

        app.db.users().delete(app.alice.id).await.unwrap();
        assert!(matches!(
            app.auth.revalidate(&app.alice_principal()).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
