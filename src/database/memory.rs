use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Address, Contact, ContactDraft, NewUser, PhoneNumber, User, UserChanges};
use crate::database::repository::{ContactRepository, UserRepository};

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    contacts: BTreeMap<i64, Contact>,
    next_user_id: i64,
    next_contact_id: i64,
    next_phone_id: i64,
    next_address_id: i64,
}

impl State {
    fn next(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn children(&mut self, draft: &ContactDraft) -> (Vec<PhoneNumber>, Vec<Address>) {
        let phones = draft
            .phone_numbers
            .iter()
            .map(|number| PhoneNumber {
                id: Self::next(&mut self.next_phone_id),
                phone_number: number.clone(),
            })
            .collect();
        let addresses = draft
            .addresses
            .iter()
            .map(|a| Address {
                id: Self::next(&mut self.next_address_id),
                street: a.street.clone(),
                city: a.city.clone(),
                zip_code: a.zip_code.clone(),
            })
            .collect();
        (phones, addresses)
    }
}

/// In-process store implementing both repositories over one shared state, so user
/// deletion cascades into contacts the same way the Postgres schema does.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if state.username_taken(&user.username, None) {
            return Err(DatabaseError::Conflict(format!("username '{}'", user.username)));
        }

        let user = User {
            id: State::next(&mut state.next_user_id),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(username) = &changes.username {
            if state.username_taken(username, Some(id)) {
                return Err(DatabaseError::Conflict(format!("username '{}'", username)));
            }
        }

        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.contacts.retain(|_, c| c.user_id != Some(id));
        Ok(true)
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Contact>, DatabaseError> {
        Ok(self.state.read().await.contacts.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Contact>, DatabaseError> {
        Ok(self.state.read().await.contacts.values().cloned().collect())
    }

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Contact>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .contacts
            .values()
            .filter(|c| c.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn insert(&self, owner_id: Option<i64>, draft: ContactDraft) -> Result<Contact, DatabaseError> {
        let mut state = self.state.write().await;
        let id = State::next(&mut state.next_contact_id);
        let (phone_numbers, addresses) = state.children(&draft);

        let contact = Contact {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            taj_number: draft.taj_number,
            tax_id: draft.tax_id,
            mother_name: draft.mother_name,
            birth_date: draft.birth_date,
            user_id: owner_id,
            phone_numbers,
            addresses,
        };
        state.contacts.insert(id, contact.clone());
        Ok(contact)
    }

    async fn replace(&self, id: i64, draft: ContactDraft) -> Result<Option<Contact>, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.contacts.contains_key(&id) {
            return Ok(None);
        }
        let (phone_numbers, addresses) = state.children(&draft);

        let Some(contact) = state.contacts.get_mut(&id) else {
            return Ok(None);
        };
        contact.first_name = draft.first_name;
        contact.last_name = draft.last_name;
        contact.email = draft.email;
        contact.taj_number = draft.taj_number;
        contact.tax_id = draft.tax_id;
        contact.mother_name = draft.mother_name;
        contact.birth_date = draft.birth_date;
        contact.phone_numbers = phone_numbers;
        contact.addresses = addresses;
        Ok(Some(contact.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.state.write().await.contacts.remove(&id).is_some())
    }
}
