//! Submission form
//!
//! The form surface exposes raw field values and a reset. [`validate`] is
//! the only way to build a [`NewUpdate`].

use thiserror::Error;

use crate::models::NewUpdate;

/// Message shown when a required field is empty
pub const MISSING_FIELDS_MESSAGE: &str = "Please enter your name and update text.";

/// Validation failures, reported to the user before any network call
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your name and update text.")]
    MissingFields,
}

/// Input surface for a new update
pub trait UpdateForm {
    fn text(&self) -> String;
    fn site(&self) -> String;
    fn user_name(&self) -> String;
    /// Clear every input field
    fn reset(&mut self);
}

/// Synchronous, user-facing interruption
pub trait Alert {
    fn alert(&mut self, message: &str);
}

/// Plain form fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub text: String,
    pub site: String,
    pub user_name: String,
}

impl FormFields {
    pub fn new(
        user_name: impl Into<String>,
        site: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            site: site.into(),
            user_name: user_name.into(),
        }
    }

    /// Whether every field is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.site.is_empty() && self.user_name.is_empty()
    }
}

impl UpdateForm for FormFields {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn site(&self) -> String {
        self.site.clone()
    }

    fn user_name(&self) -> String {
        self.user_name.clone()
    }

    fn reset(&mut self) {
        self.text.clear();
        self.site.clear();
        self.user_name.clear();
    }
}

/// Trim the form's fields and build the row to insert
///
/// Name and text must be non-empty after trimming. A blank site becomes
/// `None`; a non-blank site keeps its internal whitespace.
pub fn validate(form: &dyn UpdateForm) -> Result<NewUpdate, ValidationError> {
    let text = form.text().trim().to_string();
    let site = form.site().trim().to_string();
    let user_name = form.user_name().trim().to_string();

    if text.is_empty() || user_name.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    Ok(NewUpdate {
        user_name,
        site: if site.is_empty() { None } else { Some(site) },
        text,
    })
}
