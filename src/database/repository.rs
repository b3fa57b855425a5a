use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{Contact, ContactDraft, NewUser, User, UserChanges};

/// Account storage. Implementations enforce username uniqueness and report a clash as
/// `DatabaseError::Conflict`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    /// All accounts ordered by id.
    async fn list(&self) -> Result<Vec<User>, DatabaseError>;

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Returns `None` when no account has this id.
    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError>;

    /// Deletes the account and every contact it owns. Returns `false` when nothing matched.
    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;
}

/// Contact storage. Phone numbers and addresses are owned by their contact and always
/// loaded, written and deleted together with it.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Contact>, DatabaseError>;

    /// Every contact regardless of owner, ordered by id.
    async fn list_all(&self) -> Result<Vec<Contact>, DatabaseError>;

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Contact>, DatabaseError>;

    async fn insert(&self, owner_id: Option<i64>, draft: ContactDraft) -> Result<Contact, DatabaseError>;

    /// Overwrites the contact's fields and replaces both child collections. Ownership is
    /// left unchanged. Returns `None` when no contact has this id.
    async fn replace(&self, id: i64, draft: ContactDraft) -> Result<Option<Contact>, DatabaseError>;

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;
}
