//! Form binding and validation.
//!
//! Every form is described by an ordered list of [`Field`]s. Each field runs
//! its validators in order and records every failure under its own name. A
//! form then applies one cross-field check. The result is either the cleaned
//! data or a [`FormErrors`] value; validation itself never returns `Err`.

pub mod login;
pub mod registration;
pub mod validators;

pub use login::{LoginForm, LoginInput};
pub use registration::{RegistrationForm, RegistrationInput, SaveOutcome};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const REQUIRED: &str = "This field is required.";

/// A single validator: `Ok(())` or the message to show for the field.
pub type Validator = fn(&str) -> Result<(), String>;

/// Declarative description of one form field.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub required: bool,
    /// Trim surrounding whitespace before validating. Off for passwords.
    pub strip: bool,
    /// Echo the submitted value back when the form is rendered again.
    pub render_value: bool,
    pub validators: &'static [Validator],
}

impl Field {
    /// Run the field pipeline on a raw submitted value.
    ///
    /// Returns the cleaned value, or `None` after recording at least one
    /// error. An empty optional field cleans to an empty string without
    /// running validators.
    pub fn clean(&self, raw: Option<&str>, errors: &mut FormErrors) -> Option<String> {
        let raw = raw.unwrap_or_default();
        let value = if self.strip { raw.trim() } else { raw };

        if value.is_empty() {
            if self.required {
                errors.add(self.name, REQUIRED);
                return None;
            }
            return Some(String::new());
        }

        let mut valid = true;
        for validator in self.validators {
            if let Err(message) = validator(value) {
                errors.add(self.name, message);
                valid = false;
            }
        }

        valid.then(|| value.to_string())
    }
}

/// Validation errors keyed by field, plus errors that belong to the form as a
/// whole.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub non_field_errors: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field_errors.is_empty()
    }

    /// Merge `other` into `self`, keeping the order of messages.
    pub fn extend(&mut self, other: Self) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
        self.non_field_errors.extend(other.non_field_errors);
    }
}

/// What a template needs to draw a form: the values to prefill and the errors
/// to show next to them.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct FormView {
    pub values: BTreeMap<String, String>,
    pub errors: FormErrors,
}

impl FormView {
    /// Build the view of `fields`, prefilling from `lookup` where the field
    /// allows it.
    pub fn new<'a>(
        fields: &[Field],
        lookup: impl Fn(&str) -> Option<&'a str>,
        errors: FormErrors,
    ) -> Self {
        let values = fields
            .iter()
            .map(|field| {
                let value = if field.render_value {
                    lookup(field.name).unwrap_or_default().to_string()
                } else {
                    String::new()
                };
                (field.name.to_string(), value)
            })
            .collect();
        Self { values, errors }
    }
}
