use std::sync::Arc;

use tracing::debug;

use crate::api::requests::non_blank;
use crate::api::{ContactRequest, ContactSummary};
use crate::auth::AuthUser;
use crate::database::models::{AddressDraft, Contact, ContactDraft};
use crate::database::ContactRepository;

use super::error::{ServiceError, ServiceResult};
use super::validation::Validator;

/// Contact CRUD scoped to the caller. Admins see and change everything; other callers
/// only contacts they own. A contact the caller may not see is reported as missing.
#[derive(Clone)]
pub struct ContactService {
    contacts: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(contacts: Arc<dyn ContactRepository>) -> Self {
        Self { contacts }
    }

    /// The caller's own contacts. Ownerless callers own nothing.
    pub async fn list_own(&self, actor: &AuthUser) -> ServiceResult<Vec<Contact>> {
        match actor.user_id {
            Some(id) => Ok(self.contacts.list_by_owner(id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Everything for admins, own contacts for everyone else.
    pub async fn list_visible(&self, actor: &AuthUser) -> ServiceResult<Vec<ContactSummary>> {
        let contacts = if actor.is_admin() {
            self.contacts.list_all().await?
        } else {
            self.list_own(actor).await?
        };
        Ok(contacts.into_iter().map(ContactSummary::from).collect())
    }

    pub async fn get(&self, actor: &AuthUser, id: i64) -> ServiceResult<Contact> {
        match self.contacts.find_by_id(id).await? {
            Some(contact) if actor.can_access(contact.user_id) => Ok(contact),
            Some(_) => {
                debug!("{} denied access to contact {}", actor.username, id);
                Err(not_found(id))
            }
            None => Err(not_found(id)),
        }
    }

    /// Creates a contact owned by the caller.
    pub async fn create(&self, actor: &AuthUser, request: ContactRequest) -> ServiceResult<Contact> {
        let draft = validate(request)?;
        let contact = self.contacts.insert(actor.user_id, draft).await?;
        debug!("{} created contact {}", actor.username, contact.id);
        Ok(contact)
    }

    /// Replaces every field of the contact. Phone numbers and addresses are replaced as
    /// whole lists; an omitted list clears them.
    pub async fn update(&self, actor: &AuthUser, id: i64, request: ContactRequest) -> ServiceResult<Contact> {
        self.get(actor, id).await?;
        let draft = validate(request)?;

        let contact = self
            .contacts
            .replace(id, draft)
            .await?
            .ok_or_else(|| not_found(id))?;
        debug!("{} replaced contact {}", actor.username, id);
        Ok(contact)
    }

    pub async fn delete(&self, actor: &AuthUser, id: i64) -> ServiceResult<()> {
        self.get(actor, id).await?;

        if !self.contacts.delete(id).await? {
            return Err(not_found(id));
        }
        debug!("{} deleted contact {}", actor.username, id);
        Ok(())
    }
}

fn not_found(id: i64) -> ServiceError {
    ServiceError::not_found(format!("Contact not found with id: {}", id))
}

/// Checks a contact body and turns it into storable content. Blank phone entries are
/// dropped.
pub fn validate(request: ContactRequest) -> ServiceResult<ContactDraft> {
    let phone_numbers = request.phone_numbers.unwrap_or_default();
    let addresses = request.addresses.unwrap_or_default();

    let mut v = Validator::new();
    v.required("firstName", request.first_name.as_deref(), "First name is required");
    v.required("lastName", request.last_name.as_deref(), "Last name is required");
    v.email("email", request.email.as_deref());
    v.taj_number("tajNumber", request.taj_number.as_deref());
    v.tax_id("taxId", request.tax_id.as_deref());
    v.phone_numbers("phoneNumbers", &phone_numbers);
    for (i, address) in addresses.iter().enumerate() {
        v.required(&format!("addresses[{}].street", i), address.street.as_deref(), "Street is required");
        v.required(&format!("addresses[{}].city", i), address.city.as_deref(), "City is required");
        v.required(&format!("addresses[{}].zipCode", i), address.zip_code.as_deref(), "Zip code is required");
    }
    v.finish().map_err(ServiceError::Validation)?;

    let owned = |value: &Option<String>| non_blank(value).map(str::to_string);

    Ok(ContactDraft {
        first_name: owned(&request.first_name).unwrap_or_default(),
        last_name: owned(&request.last_name).unwrap_or_default(),
        email: owned(&request.email),
        taj_number: owned(&request.taj_number),
        tax_id: owned(&request.tax_id),
        mother_name: owned(&request.mother_name),
        birth_date: request.birth_date,
        phone_numbers: phone_numbers.into_iter().filter(|p| !p.is_empty()).collect(),
        addresses: addresses
            .iter()
            .map(|a| AddressDraft {
                street: owned(&a.street).unwrap_or_default(),
                city: owned(&a.city).unwrap_or_default(),
                zip_code: owned(&a.zip_code).unwrap_or_default(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AddressRequest;
    use crate::testing::{contact_request, TestApp};

    #[tokio::test]
    async fn create_then_read_round_trips_children() {
        let app = TestApp::new().await;
        let alice = app.alice_principal();

        let created = app.contacts.create(&alice, contact_request("Jane")).await.unwrap();
        assert_eq!(created.user_id, Some(app.alice.id));

        let fetched = app.contacts.get(&alice, created.id).await.unwrap();
        let phones: Vec<_> = fetched.phone_numbers.iter().map(|p| p.phone_number.as_str()).collect();
        assert_eq!(phones, vec!["1234567890"]);
        assert_eq!(fetched.addresses.len(), 1);
        assert_eq!(fetched.addresses[0].street, "Main St");
        assert_eq!(fetched.addresses[0].city, "X");
        assert_eq!(fetched.addresses[0].zip_code, "00000");
    }

    #[tokio::test]
    async fn update_replaces_lists() {
        let app = TestApp::new().await;
        let alice = app.alice_principal();

        let mut request = contact_request("Jane");
        request.phone_numbers = Some(vec!["1234567890".into(), "+36 30 123 4567".into()]);
        let created = app.contacts.create(&alice, request).await.unwrap();
        assert_eq!(created.phone_numbers.len(), 2);

        let mut shorter = contact_request("Janet");
        shorter.phone_numbers = Some(vec!["+36 30 123 4567".into()]);
        shorter.addresses = None;
        let updated = app.contacts.update(&alice, created.id, shorter).await.unwrap();

        assert_eq!(updated.first_name, "Janet");
        assert_eq!(updated.phone_numbers.len(), 1);
        assert_eq!(updated.phone_numbers[0].phone_number, "+36 30 123 4567");
        assert!(updated.addresses.is_empty());
        assert_eq!(updated.user_id, Some(app.alice.id));
    }

    #[tokio::test]
    async fn foreign_contact_is_not_found() {
        let app = TestApp::new().await;
        let theirs = app.seed_contact(Some(app.admin.id), "Secret").await;
        let alice = app.alice_principal();

        assert!(matches!(app.contacts.get(&alice, theirs.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            app.contacts.update(&alice, theirs.id, contact_request("Hijack")).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(app.contacts.delete(&alice, theirs.id).await, Err(ServiceError::NotFound(_))));

        // Still there for its owner.
        assert!(app.contacts.get(&app.admin_principal(), theirs.id).await.is_ok());
    }

    #[tokio::test]
    async fn admin_reaches_every_contact() {
        let app = TestApp::new().await;
        let mine = app.seed_contact(Some(app.alice.id), "Jane").await;
        app.seed_contact(None, "Orphan").await;
        let admin = app.admin_principal();

        assert!(app.contacts.get(&admin, mine.id).await.is_ok());
        assert_eq!(app.contacts.list_visible(&admin).await.unwrap().len(), 2);
        app.contacts.delete(&admin, mine.id).await.unwrap();
        assert!(matches!(app.contacts.get(&admin, mine.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn user_lists_only_own() {
        let app = TestApp::new().await;
        app.seed_contact(Some(app.alice.id), "Jane").await;
        app.seed_contact(Some(app.admin.id), "Root's").await;
        let alice = app.alice_principal();

        let visible = app.contacts.list_visible(&alice).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].first_name, "Jane");
        assert_eq!(app.contacts.list_own(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ownerless_principal_sees_nothing() {
        let app = TestApp::new().await;
        app.seed_contact(Some(app.alice.id), "Jane").await;
        let mut ghost = app.alice_principal();
        ghost.user_id = None;

        assert!(app.contacts.list_own(&ghost).await.unwrap().is_empty());
        assert!(app.contacts.list_visible(&ghost).await.unwrap().is_empty());
    }

    #[test]
    fn validation_collects_every_field() {
        let request = ContactRequest {
            email: Some("not-an-email".into()),
            taj_number: Some("12345678".into()),
            tax_id: Some("123".into()),
            phone_numbers: Some(vec!["12".into()]),
            addresses: Some(vec![AddressRequest {
                street: Some("Main St".into()),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let ServiceError::Validation(fields) = validate(request).unwrap_err() else {
            panic!("expected a validation error");
        };
        assert_eq!(fields["firstName"], "First name is required");
        assert_eq!(fields["lastName"], "Last name is required");
        assert_eq!(fields["email"], "Email should be valid");
        assert_eq!(fields["tajNumber"], "TAJ number should be exactly 9 digits.");
        assert_eq!(fields["taxId"], "Tax ID should be exactly 10 digits.");
        assert!(fields.contains_key("phoneNumbers[0]"));
        assert!(fields.contains_key("addresses[0].city"));
        assert!(fields.contains_key("addresses[0].zipCode"));
        assert!(!fields.contains_key("addresses[0].street"));
    }

    #[test]
    fn blank_phone_entries_are_dropped() {
        let mut request = contact_request("Jane");
        request.phone_numbers = Some(vec![String::new(), "1234567890".into()]);

        let draft = validate(request).unwrap();
        assert_eq!(draft.phone_numbers, vec!["1234567890"]);
    }
}
