use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub taj_number: Option<String>,
    pub tax_id: Option<String>,
    pub mother_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub user_id: Option<i64>,
    pub phone_numbers: Vec<PhoneNumber>,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    pub id: i64,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub street: String,
    pub city: String,
    pub zip_code: String,
}

/// Complete contact content written on create and on update. Updates replace every
/// field and both child collections with what is given here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub taj_number: Option<String>,
    pub tax_id: Option<String>,
    pub mother_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone_numbers: Vec<String>,
    pub addresses: Vec<AddressDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressDraft {
    pub street: String,
    pub city: String,
    pub zip_code: String,
}
