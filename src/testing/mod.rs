//! Test utilities: an application wired to the memory store with two seeded accounts.

use std::sync::Arc;

use axum::Router;

use crate::api::{AddressRequest, ContactRequest};
use crate::auth::{AuthUser, PasswordHasher, Role, TokenService};
use crate::config::AppConfig;
use crate::database::models::{AddressDraft, Contact, ContactDraft, User};
use crate::database::DatabaseManager;
use crate::services::{AuthService, ContactService, UserService};
use crate::state::AppState;

pub struct TestApp {
    pub state: AppState,
    pub db: DatabaseManager,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordHasher,
    pub auth: AuthService,
    pub users: UserService,
    pub contacts: ContactService,
    /// `admin` / `ADMIN_PASSWORD`, role admin
    pub admin: User,
    /// `alice` / `secret`, role user
    pub alice: User,
}

impl TestApp {
    pub const ADMIN_PASSWORD: &'static str = "admin-password";

    pub async fn new() -> Self {
        let config = AppConfig::for_tests();
        let passwords = PasswordHasher::new(config.security.bcrypt_cost);
        let db = DatabaseManager::memory();
        let state = AppState::new(config, db.clone());

        let admin = state
            .users
            .create_account("admin", Self::ADMIN_PASSWORD, Role::Admin)
            .await
            .expect("seed admin");
        let alice = state
            .users
            .create_account("alice", "secret", Role::User)
            .await
            .expect("seed alice");

        Self {
            db,
            tokens: Arc::clone(&state.tokens),
            passwords,
            auth: state.auth.clone(),
            users: state.users.clone(),
            contacts: state.contacts.clone(),
            state,
            admin,
            alice,
        }
    }

    pub fn router(&self) -> Router {
        crate::app::app(self.state.clone())
    }

    pub fn principal(user: &User) -> AuthUser {
        AuthUser {
            username: user.username.clone(),
            role: user.role,
            user_id: Some(user.id),
        }
    }

    pub fn admin_principal(&self) -> AuthUser {
        Self::principal(&self.admin)
    }

    pub fn alice_principal(&self) -> AuthUser {
        Self::principal(&self.alice)
    }

    pub fn token_for(&self, user: &User) -> String {
        self.tokens
            .issue(&user.username, user.role, Some(user.id))
            .expect("issue token")
    }

    /// Inserts a contact straight into the store, bypassing validation.
    pub async fn seed_contact(&self, owner: Option<i64>, first_name: &str) -> Contact {
        let draft = ContactDraft {
            first_name: first_name.to_string(),
            last_name: "Doe".to_string(),
            email: Some("jane@example.com".to_string()),
            taj_number: Some("123456789".to_string()),
            tax_id: Some("1234567890".to_string()),
            phone_numbers: vec!["1234567890".to_string()],
            addresses: vec![AddressDraft {
                street: "Main St".to_string(),
                city: "X".to_string(),
                zip_code: "00000".to_string(),
            }],
            ..Default::default()
        };
        self.db.contacts().insert(owner, draft).await.expect("seed contact")
    }
}

/// A contact body that passes validation.
pub fn contact_request(first_name: &str) -> ContactRequest {
    ContactRequest {
        first_name: Some(first_name.to_string()),
        last_name: Some("Doe".to_string()),
        email: Some("jane@example.com".to_string()),
        taj_number: Some("123456789".to_string()),
        tax_id: Some("1234567890".to_string()),
        mother_name: None,
        birth_date: None,
        phone_numbers: Some(vec!["1234567890".to_string()]),
        addresses: Some(vec![AddressRequest {
            street: Some("Main St".to_string()),
            city: Some("X".to_string()),
            zip_code: Some("00000".to_string()),
        }]),
    }
}
