use chrono::NaiveDate;
use serde::Serialize;

use crate::auth::Role;
use crate::database::models::{Contact, User};

/// Contact as shown in list views: no owner and no child ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub mother_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub taj_number: Option<String>,
    pub tax_id: Option<String>,
    pub phone_numbers: Vec<PhoneNumberSummary>,
    pub addresses: Vec<AddressSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumberSummary {
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSummary {
    pub street: String,
    pub city: String,
    pub zip_code: String,
}

impl From<Contact> for ContactSummary {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            mother_name: contact.mother_name,
            birth_date: contact.birth_date,
            taj_number: contact.taj_number,
            tax_id: contact.tax_id,
            phone_numbers: contact
                .phone_numbers
                .into_iter()
                .map(|p| PhoneNumberSummary { phone_number: p.phone_number })
                .collect(),
            addresses: contact
                .addresses
                .into_iter()
                .map(|a| AddressSummary {
                    street: a.street,
                    city: a.city,
                    zip_code: a.zip_code,
                })
                .collect(),
        }
    }
}

/// Account as returned by the admin endpoints. The password hash is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub contacts: Vec<ContactSummary>,
}

impl UserSummary {
    pub fn new(user: User, contacts: Vec<Contact>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            contacts: contacts.into_iter().map(ContactSummary::from).collect(),
        }
    }
}

/// Body returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Address, PhoneNumber};
    use serde_json::json;

    fn contact() -> Contact {
        Contact {
            id: 4,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: Some("jane@example.com".into()),
            taj_number: Some("123456789".into()),
            tax_id: Some("1234567890".into()),
            mother_name: None,
            birth_date: None,
            user_id: Some(2),
            phone_numbers: vec![PhoneNumber { id: 10, phone_number: "1234567890".into() }],
            addresses: vec![Address {
                id: 11,
                street: "Main St".into(),
                city: "X".into(),
                zip_code: "00000".into(),
            }],
        }
    }

    #[test]
    fn full_contact_carries_owner_and_child_ids() {
        let value = serde_json::to_value(contact()).unwrap();
        assert_eq!(value["userId"], 2);
        assert_eq!(value["phoneNumbers"][0], json!({"id": 10, "phoneNumber": "1234567890"}));
        assert_eq!(value["addresses"][0]["zipCode"], "00000");
    }

    #[test]
    fn summary_drops_owner_and_child_ids() {
        let value = serde_json::to_value(ContactSummary::from(contact())).unwrap();
        assert!(value.get("userId").is_none());
        assert_eq!(value["phoneNumbers"][0], json!({"phoneNumber": "1234567890"}));
        assert_eq!(
            value["addresses"][0],
            json!({"street": "Main St", "city": "X", "zipCode": "00000"})
        );
    }

    #[test]
    fn user_summary_has_no_password() {
        let user = User {
            id: 2,
            username: "alice".into(),
            password_hash: "$2b$04$hash".into(),
            role: Role::User,
        };
        let value = serde_json::to_value(UserSummary::new(user, vec![contact()])).unwrap();

        assert_eq!(value["role"], "ROLE_USER");
        assert_eq!(value["contacts"][0]["firstName"], "Jane");
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
    }
}
