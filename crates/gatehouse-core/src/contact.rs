//! Visitor contact details and unlock form validation.
//!
//! The access controller never inspects contact details; it only needs to know
//! that the form was filled out. Which fields are required is a property of
//! the form on each page, so validation lives here with the caller.
//!
//! # Security
//!
//! - **Debug Redaction**: `ContactInfo`'s `Debug` impl prints field names and
//!   value lengths only, so contact details never reach logs by accident.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field name for the visitor's name.
pub const FIELD_NAME: &str = "name";
/// Field name for the visitor's email address.
pub const FIELD_EMAIL: &str = "email";
/// Field name for the visitor's phone number.
pub const FIELD_PHONE: &str = "phone";
/// Field name for the visitor's company.
pub const FIELD_COMPANY: &str = "company";

/// Structurally-typed contact payload: field name to value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactInfo {
    fields: BTreeMap<String, String>,
}

impl std::fmt::Debug for ContactInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.fields {
            map.entry(key, &format!("<redacted {} chars>", value.chars().count()));
        }
        map.finish()
    }
}

impl ContactInfo {
    /// Empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Set `field` to `value` in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Value of `field`, if present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Visitor's name.
    pub fn name(&self) -> Option<&str> {
        self.get(FIELD_NAME)
    }

    /// Visitor's email address.
    pub fn email(&self) -> Option<&str> {
        self.get(FIELD_EMAIL)
    }

    /// Visitor's phone number.
    pub fn phone(&self) -> Option<&str> {
        self.get(FIELD_PHONE)
    }

    /// Visitor's company.
    pub fn company(&self) -> Option<&str> {
        self.get(FIELD_COMPANY)
    }

    /// Iterate over `(field, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ContactInfo {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Required fields missing from a submitted form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", missing.join(", "))]
pub struct ValidationError {
    /// Missing or blank fields, in the form's declared order.
    pub missing: Vec<String>,
}

/// Unlock form definition: the fields a visitor must fill out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockForm {
    required: Vec<String>,
}

impl UnlockForm {
    /// Form requiring name, email and phone.
    pub fn standard() -> Self {
        Self::requiring([FIELD_NAME, FIELD_EMAIL, FIELD_PHONE])
    }

    /// Form requiring name, email, phone and company.
    pub fn with_company() -> Self {
        Self::requiring([FIELD_NAME, FIELD_EMAIL, FIELD_PHONE, FIELD_COMPANY])
    }

    /// Form requiring an arbitrary field list.
    pub fn requiring<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { required: fields.into_iter().map(Into::into).collect() }
    }

    /// Required field names.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Check that every required field is present and not blank.
    ///
    /// Formats (email syntax, phone digits) are not checked.
    pub fn validate(&self, contact: &ContactInfo) -> Result<(), ValidationError> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|field| contact.get(field).is_none_or(|v| v.trim().is_empty()))
            .cloned()
            .collect();

        if missing.is_empty() { Ok(()) } else { Err(ValidationError { missing }) }
    }
}

impl Default for UnlockForm {
    fn default() -> Self {
        Self::with_company()
    }
}
