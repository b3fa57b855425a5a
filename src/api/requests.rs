use chrono::NaiveDate;
use serde::Deserialize;

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /api/auth/users` and `PUT /api/auth/users/:id`.
///
/// On update every field is optional: a blank `username`, `password` or `role` leaves
/// the stored value alone. `adminPassword` (or `oldPassword` when editing one's own
/// account) confirms a username or password change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub admin_password: Option<String>,
    pub old_password: Option<String>,
    pub role: Option<String>,
}

/// Body of `POST /api/contacts` and `PUT /api/contacts/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub taj_number: Option<String>,
    pub tax_id: Option<String>,
    pub mother_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub phone_numbers: Option<Vec<String>>,
    #[serde(default)]
    pub addresses: Option<Vec<AddressRequest>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
}

/// Treats `Some("")` and whitespace-only strings like `None`.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
