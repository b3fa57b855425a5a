use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

pub mod password;

pub use password::PasswordHasher;

/// Account role. Serialized with the `ROLE_` prefix used in tokens and API payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role '{0}', expected ROLE_USER or ROLE_ADMIN")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_USER" => Ok(Role::User),
            "ROLE_ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Token payload: `sub` is the username, `userId` the numeric account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(
        username: impl Into<String>,
        role: Role,
        user_id: Option<i64>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::TokenCreation("token expiry is out of range".to_string()))?;

        Ok(Self {
            sub: username.into(),
            role,
            user_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }
}

/// Authenticated principal derived once per request from verified claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub role: Role,
    /// `None` for tokens that carry no `userId`; such callers own nothing.
    pub user_id: Option<i64>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
            role: claims.role,
            user_id: claims.user_id,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when the caller's id matches the resource owner. Ownerless resources and
    /// ownerless callers never match.
    pub fn owns(&self, owner_id: Option<i64>) -> bool {
        matches!((self.user_id, owner_id), (Some(me), Some(owner)) if me == owner)
    }

    /// Admins reach everything; everyone else only what they own.
    pub fn can_access(&self, owner_id: Option<i64>) -> bool {
        self.is_admin() || self.owns(owner_id)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token generation failed: {0}")]
    TokenCreation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Issues and verifies HS256 bearer tokens.
///
/// Tokens are always signed with the current secret. Verification accepts the current
/// secret and, during a rotation window, the previous one.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: Vec<DecodingKey>,
    ttl: Duration,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8], previous_secret: Option<&[u8]>, ttl: Duration) -> Self {
        let mut decoding = vec![DecodingKey::from_secret(secret)];
        if let Some(previous) = previous_secret {
            decoding.push(DecodingKey::from_secret(previous));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding,
            ttl,
            validation,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(
            security.jwt_secret.expose().as_bytes(),
            security
                .jwt_previous_secret
                .as_ref()
                .map(|s| s.expose().as_bytes()),
            Duration::hours(i64::from(security.jwt_expiry_hours)),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, username: &str, role: Role, user_id: Option<i64>) -> Result<String, AuthError> {
        self.issue_at(username, role, user_id, Utc::now())
    }

    pub fn issue_at(
        &self,
        username: &str,
        role: Role,
        user_id: Option<i64>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims::new(username, role, user_id, issued_at, self.ttl)?;
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Verifies signature and expiry. Any failure is an error; there is no anonymous
    /// fallback.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut last_error = AuthError::InvalidToken("no verification key configured".to_string());

        for key in &self.decoding {
            match decode::<Claims>(token, key, &self.validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) => match e.kind() {
                    ErrorKind::InvalidSignature => {
                        last_error = AuthError::InvalidToken(e.to_string());
                    }
                    ErrorKind::ExpiredSignature => return Err(AuthError::TokenExpired),
                    _ => return Err(AuthError::InvalidToken(e.to_string())),
                },
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    const SECRET: &[u8] = b"unit-test-secret-unit-test-secret";
    const OTHER: &[u8] = b"another-secret-another-secret-xx";

    fn service() -> TokenService {
        TokenService::new(SECRET, None, Duration::hours(24))
    }

    #[test]
    fn role_parses_only_known_values() {
        assert_eq!("ROLE_ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("ROLE_USER".parse::<Role>().unwrap(), Role::User);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "ROLE_ADMIN");
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let tokens = service();
        let token = tokens.issue("alice", Role::User, Some(7)).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.user_id, Some(7));
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn payload_uses_wire_names() {
        let claims = Claims::new("bob", Role::Admin, Some(3), Utc::now(), Duration::hours(24)).unwrap();
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["sub"], "bob");
        assert_eq!(value["role"], "ROLE_ADMIN");
        assert_eq!(value["userId"], 3);
        assert!(value.get("iat").is_some());
        assert!(value.get("exp").is_some());
    }

    #[test]
    fn token_older_than_a_day_is_rejected() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(24) - Duration::seconds(5);
        let token = tokens.issue_at("alice", Role::User, Some(1), issued).unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn token_inside_lifetime_is_accepted() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(23);
        let token = tokens.issue_at("alice", Role::User, Some(1), issued).unwrap();

        assert!(tokens.verify(&token).is_ok());
    }

    #[test]
    fn out_of_range_expiry_is_an_error() {
        let tokens = TokenService::new(SECRET, None, Duration::days(365_000_000));
        let err = tokens.issue("alice", Role::User, Some(1)).unwrap_err();
        assert!(matches!(err, AuthError::TokenCreation(_)));
    }

    #[test]
    fn lifetime_comes_from_config() {
        let mut config = AppConfig::for_tests();
        config.security.jwt_expiry_hours = 2;
        let tokens = TokenService::from_config(&config.security);

        let claims = tokens.verify(&tokens.issue("alice", Role::User, Some(1)).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 7_200);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let forged = TokenService::new(OTHER, None, Duration::hours(24))
            .issue("mallory", Role::Admin, Some(1))
            .unwrap();

        assert!(matches!(service().verify(&forged), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(matches!(service().verify("not-a-jwt"), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn previous_secret_verifies_during_rotation() {
        let old = TokenService::new(OTHER, None, Duration::hours(24));
        let rotated = TokenService::new(SECRET, Some(OTHER), Duration::hours(24));

        let legacy = old.issue("alice", Role::User, Some(1)).unwrap();
        assert_eq!(rotated.verify(&legacy).unwrap().sub, "alice");

        // New tokens are signed with the current secret only.
        let fresh = rotated.issue("alice", Role::User, Some(1)).unwrap();
        assert!(old.verify(&fresh).is_err());
    }

    #[test]
    fn token_without_user_id_yields_ownerless_principal() {
        let tokens = service();
        let token = tokens.issue("legacy", Role::User, None).unwrap();
        let user = AuthUser::from(tokens.verify(&token).unwrap());

        assert_eq!(user.user_id, None);
        assert!(!user.owns(None));
        assert!(!user.can_access(Some(1)));
    }

    #[test]
    fn admin_reaches_everything_user_only_own() {
        let admin = AuthUser { username: "root".into(), role: Role::Admin, user_id: Some(1) };
        let user = AuthUser { username: "alice".into(), role: Role::User, user_id: Some(2) };

        assert!(admin.can_access(Some(2)));
        assert!(admin.can_access(None));
        assert!(user.can_access(Some(2)));
        assert!(!user.can_access(Some(1)));
        assert!(!user.can_access(None));
    }
}
