use once_cell::sync::Lazy;
use regex::Regex;

use super::error::FieldErrors;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email pattern compiles"));
static TAJ_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{9}$").expect("TAJ pattern compiles"));
static TAX_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").expect("tax id pattern compiles"));
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9 ]+$").expect("phone pattern compiles"));

/// Collects per-field messages; the first message recorded for a field wins.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Records `message` when the value is absent or blank. Returns the trimmed value
    /// when it is present.
    pub fn required<'a>(&mut self, field: &str, value: Option<&'a str>, message: &str) -> Option<&'a str> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Some(v),
            None => {
                self.error(field, message);
                None
            }
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = self.required(field, value, "Email is required") {
            if !is_valid_email(v) {
                self.error(field, "Email should be valid");
            }
        }
    }

    pub fn taj_number(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = self.required(field, value, "TAJ number is required") {
            if !TAJ_NUMBER.is_match(v) {
                self.error(field, "TAJ number should be exactly 9 digits.");
            }
        }
    }

    pub fn tax_id(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = self.required(field, value, "Tax ID is required") {
            if !TAX_ID.is_match(v) {
                self.error(field, "Tax ID should be exactly 10 digits.");
            }
        }
    }

    /// Empty entries are allowed and skipped; callers drop them before storage.
    pub fn phone_numbers(&mut self, field: &str, values: &[String]) {
        for (i, value) in values.iter().enumerate() {
            if !value.is_empty() && !is_valid_phone_number(value) {
                self.error(
                    format!("{}[{}]", field, i),
                    "Phone number should contain 10 or 11 digits",
                );
            }
        }
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Optional leading `+`, then digits and spaces only, with 10 or 11 digits in total.
pub fn is_valid_phone_number(value: &str) -> bool {
    if !PHONE.is_match(value) {
        return false;
    }
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    digits == 10 || digits == 11
}
