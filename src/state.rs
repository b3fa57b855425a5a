use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::services::{AuthService, ContactService, UserService};

/// Shared application state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseManager,
    pub tokens: Arc<TokenService>,
    pub auth: AuthService,
    pub users: UserService,
    pub contacts: ContactService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseManager) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.security));
        let passwords = PasswordHasher::new(config.security.bcrypt_cost);

        Self {
            auth: AuthService::new(db.users(), Arc::clone(&tokens), passwords),
            users: UserService::new(db.users(), db.contacts(), passwords),
            contacts: ContactService::new(db.contacts()),
            config: Arc::new(config),
            db,
            tokens,
        }
    }
}
