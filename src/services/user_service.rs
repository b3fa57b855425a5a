use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::api::requests::non_blank;
use crate::api::{UserRequest, UserSummary};
use crate::auth::{AuthUser, PasswordHasher, Role};
use crate::database::models::{NewUser, User, UserChanges};
use crate::database::{ContactRepository, DatabaseError, UserRepository};

use super::error::{FieldErrors, ServiceError, ServiceResult};

const USERNAME_TAKEN: &str = "Username already exists";

/// Account management. Every operation here is admin-only.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    contacts: Arc<dyn ContactRepository>,
    passwords: PasswordHasher,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        contacts: Arc<dyn ContactRepository>,
        passwords: PasswordHasher,
    ) -> Self {
        Self {
            users,
            contacts,
            passwords,
        }
    }

    /// Every account with the contacts it owns.
    pub async fn list(&self, actor: &AuthUser) -> ServiceResult<Vec<UserSummary>> {
        require_admin(actor)?;

        let mut by_owner: HashMap<i64, Vec<_>> = HashMap::new();
        for contact in self.contacts.list_all().await? {
            if let Some(owner) = contact.user_id {
                by_owner.entry(owner).or_default().push(contact);
            }
        }

        Ok(self
            .users
            .list()
            .await?
            .into_iter()
            .map(|user| {
                let contacts = by_owner.remove(&user.id).unwrap_or_default();
                UserSummary::new(user, contacts)
            })
            .collect())
    }

    pub async fn create(&self, actor: &AuthUser, request: UserRequest) -> ServiceResult<UserSummary> {
        require_admin(actor)?;

        let mut errors = FieldErrors::new();
        let username = non_blank(&request.username);
        let password = request.password.as_deref().filter(|p| !p.is_empty());
        if username.is_none() {
            errors.insert("username".into(), "Username is required".into());
        }
        if password.is_none() {
            errors.insert("password".into(), "Password is required".into());
        }
        let role = match parse_role(&request.role) {
            Ok(role) => role.unwrap_or_default(),
            Err(message) => {
                errors.insert("role".into(), message);
                Role::User
            }
        };
        let (Some(username), Some(password)) = (username, password) else {
            return Err(ServiceError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let user = self.create_account(username, password, role).await?;
        info!("{} created user '{}' ({})", actor.username, user.username, user.role);
        Ok(UserSummary::new(user, Vec::new()))
    }

    /// Creates an account without an acting principal. Used by the admin CLI and the
    /// startup bootstrap as well as `create`.
    ///
    /// The username is trimmed the way `login` trims it; a blank username or an empty
    /// password is a field error.
    pub async fn create_account(&self, username: &str, password: &str, role: Role) -> ServiceResult<User> {
        let username = username.trim();
        let mut errors = FieldErrors::new();
        if username.is_empty() {
            errors.insert("username".into(), "Username is required".into());
        }
        if password.is_empty() {
            errors.insert("password".into(), "Password is required".into());
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        if self.users.find_by_username(username).await?.is_some() {
            return Err(ServiceError::conflict(USERNAME_TAKEN));
        }

        let password_hash = self.passwords.hash(password).await?;
        self.users
            .insert(NewUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await
            .map_err(username_conflict)
    }

    /// Creates the admin account if no account with this username exists yet. Returns
    /// `None` when it was already present; an existing account is never modified.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> ServiceResult<Option<User>> {
        if self.users.find_by_username(username).await?.is_some() {
            debug!("Bootstrap admin '{}' already exists", username);
            return Ok(None);
        }
        let user = self.create_account(username, password, Role::Admin).await?;
        info!("Created bootstrap admin '{}' (id {})", user.username, user.id);
        Ok(Some(user))
    }

    /// Updates username, password and role. Blank fields are left unchanged.
    ///
    /// Changing the username or password needs a confirmation password. When admins
    /// edit someone else it is their own password, sent as `adminPassword`. When they
    /// edit themselves it is the current password, sent as `oldPassword` (or
    /// `adminPassword`).
    pub async fn update(&self, actor: &AuthUser, id: i64, request: UserRequest) -> ServiceResult<UserSummary> {
        require_admin(actor)?;

        let target = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let new_username = non_blank(&request.username).filter(|u| *u != target.username);
        let new_password = request.password.as_deref().filter(|p| !p.is_empty());
        let role = parse_role(&request.role).map_err(|message| ServiceError::field("role", message))?;

        if new_username.is_some() || new_password.is_some() {
            self.confirm_change(actor, &target, &request).await?;
        }

        if let Some(username) = new_username {
            if let Some(existing) = self.users.find_by_username(username).await? {
                if existing.id != id {
                    return Err(ServiceError::conflict(USERNAME_TAKEN));
                }
            }
        }

        let password_hash = match new_password {
            Some(p) => Some(self.passwords.hash(p).await?),
            None => None,
        };

        let changes = UserChanges {
            username: new_username.map(str::to_string),
            password_hash,
            role,
        };

        let user = if changes.is_empty() {
            target
        } else {
            self.users
                .update(id, changes)
                .await
                .map_err(username_conflict)?
                .ok_or_else(|| ServiceError::not_found("User not found"))?
        };
        info!("{} updated user {} ('{}')", actor.username, user.id, user.username);

        let contacts = self.contacts.list_by_owner(user.id).await?;
        Ok(UserSummary::new(user, contacts))
    }

    async fn confirm_change(&self, actor: &AuthUser, target: &User, request: &UserRequest) -> ServiceResult<()> {
        let non_empty = |v: &Option<String>| v.clone().filter(|p| !p.is_empty());

        if actor.user_id == Some(target.id) {
            let Some(confirmation) = non_empty(&request.old_password).or_else(|| non_empty(&request.admin_password)) else {
                return Err(ServiceError::bad_request(
                    "Old password is required when changing username or password",
                ));
            };
            if !self.passwords.verify(&confirmation, &target.password_hash).await? {
                return Err(ServiceError::unauthorized("Old password is incorrect"));
            }
            return Ok(());
        }

        let admin = self
            .users
            .find_by_username(&actor.username)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Admin user not found"))?;
        let Some(confirmation) = non_empty(&request.admin_password) else {
            return Err(ServiceError::bad_request(
                "Admin password is required when changing username or password",
            ));
        };
        if !self.passwords.verify(&confirmation, &admin.password_hash).await? {
            return Err(ServiceError::unauthorized("Admin password is incorrect"));
        }
        Ok(())
    }

    /// Hard delete; owned contacts go with the account.
    pub async fn delete(&self, actor: &AuthUser, id: i64) -> ServiceResult<()> {
        require_admin(actor)?;

        if !self.users.delete(id).await? {
            return Err(ServiceError::not_found("User not found"));
        }
        info!("{} deleted user {}", actor.username, id);
        Ok(())
    }
}

fn require_admin(actor: &AuthUser) -> ServiceResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Admin role required"))
    }
}

/// Blank means "not given"; anything else must name a known role.
fn parse_role(value: &Option<String>) -> Result<Option<Role>, String> {
    non_blank(value)
        .map(|r| r.parse::<Role>().map_err(|e| e.to_string()))
        .transpose()
}

fn username_conflict(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::Conflict(_) => ServiceError::conflict(USERNAME_TAKEN),
        other => ServiceError::Database(other),
    }
}
