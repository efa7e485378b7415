//! Field-keyed form errors.

use crate::errors::HttpError;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Key used for errors that belong to the whole form rather than a field.
pub const SUBMIT: &str = "submit";

/// Field name to message map.
///
/// Produced locally before a request is sent, or from a server response's
/// `errors` object after it failed.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl ValidationErrors {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field, replacing any earlier one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.insert(field.into(), message.into());
    }

    /// Record `message` for `field` when `missing` holds.
    pub fn require(&mut self, missing: bool, field: &str, message: &str) {
        if missing {
            self.insert(field, message);
        }
    }

    /// Message for a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Form-level message.
    pub fn submit(&self) -> Option<&str> {
        self.get(SUBMIT)
    }

    /// Whether no field failed.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of failed fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Map a failed request onto form fields.
    ///
    /// `fields` lists each form field with the server keys that may carry
    /// its message, in order of preference. When no field matches, the
    /// error's message becomes the form-level error.
    pub fn from_http(err: &HttpError, fields: &[(&str, &[&str])]) -> Self {
        let mut out = Self::new();
        for (field, keys) in fields {
            if let Some(message) = err.field(keys) {
                out.insert(*field, message);
            }
        }
        if out.is_empty() {
            out.insert(SUBMIT, err.message.clone());
        }
        out
    }
}
