//! Registration form: account fields, password confirmation and account
//! creation.

use super::validators::{self, DISPLAY_NAME_MAX_LENGTH, EMAIL_MAX_LENGTH, USERNAME_MAX_LENGTH};
use super::{Field, FormErrors, FormView};
use crate::accounts::{
    Account, AccountStore, CreateOutcome, Hasher, NewAccount, UniqueField, normalize_email,
};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};
use utoipa::ToSchema;

pub const TEMPLATE: &str = "auth/register.html";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub const EMAIL_TAKEN: &str = "An account with this email already exists.";
pub const USERNAME_TAKEN: &str = "An account with this username already exists.";

pub const EMAIL: Field = Field {
    name: "email",
    required: true,
    strip: true,
    render_value: true,
    validators: &[
        validators::no_null_characters,
        validators::max_length::<EMAIL_MAX_LENGTH>,
        validators::email,
    ],
};

pub const USERNAME: Field = Field {
    name: "username",
    required: true,
    strip: true,
    render_value: true,
    validators: &[
        validators::no_null_characters,
        validators::max_length::<USERNAME_MAX_LENGTH>,
        validators::username,
    ],
};

pub const DISPLAY_NAME: Field = Field {
    name: "display_name",
    required: false,
    strip: true,
    render_value: true,
    validators: &[
        validators::no_null_characters,
        validators::max_length::<DISPLAY_NAME_MAX_LENGTH>,
    ],
};

pub const PASSWORD1: Field = Field {
    name: "password1",
    required: true,
    strip: false,
    render_value: false,
    validators: &[validators::no_null_characters],
};

pub const PASSWORD2: Field = Field {
    name: "password2",
    required: true,
    strip: false,
    render_value: false,
    validators: &[validators::no_null_characters],
};

pub const FIELDS: [Field; 5] = [EMAIL, USERNAME, DISPLAY_NAME, PASSWORD1, PASSWORD2];

/// Submitted registration data. Every field is optional so a partial
/// submission still binds and reports per-field errors.
#[derive(ToSchema, Serialize, Deserialize, Default, Clone)]
pub struct RegistrationInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

impl fmt::Debug for RegistrationInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationInput")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("password1", &"***")
            .field("password2", &"***")
            .finish()
    }
}

impl RegistrationInput {
    fn get(&self, name: &str) -> Option<&str> {
        match name {
            "email" => self.email.as_deref(),
            "username" => self.username.as_deref(),
            "display_name" => self.display_name.as_deref(),
            "password1" => self.password1.as_deref(),
            "password2" => self.password2.as_deref(),
            _ => None,
        }
    }
}

/// Registration data that passed validation.
pub struct CleanedRegistration {
    pub email: String,
    pub username: String,
    pub display_name: String,
    password: SecretString,
}

impl fmt::Debug for CleanedRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanedRegistration")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`CleanedRegistration::save`].
#[derive(Debug)]
pub enum SaveOutcome {
    /// The account was inserted.
    Created(Account),
    /// `commit` was false; the hashed account is returned for the caller to
    /// store or discard.
    Unsaved(NewAccount),
    /// The store rejected the account on a uniqueness constraint that was
    /// free when the form validated.
    Rejected(FormErrors),
}

/// Partially cleaned values; `None` where the field had errors.
struct Partial {
    email: Option<String>,
    username: Option<String>,
    display_name: Option<String>,
    password1: Option<String>,
    password2: Option<String>,
}

#[derive(Debug, Default)]
pub struct RegistrationForm {
    input: RegistrationInput,
}

impl RegistrationForm {
    #[must_use]
    pub fn new(input: RegistrationInput) -> Self {
        Self { input }
    }

    /// Run every field pipeline, then the password confirmation check.
    fn clean_fields(&self) -> (Partial, FormErrors) {
        let mut errors = FormErrors::default();
        let input = &self.input;

        let mut partial = Partial {
            email: EMAIL
                .clean(input.email.as_deref(), &mut errors)
                .map(|email| normalize_email(&email)),
            username: USERNAME.clean(input.username.as_deref(), &mut errors),
            display_name: DISPLAY_NAME.clean(input.display_name.as_deref(), &mut errors),
            password1: PASSWORD1.clean(input.password1.as_deref(), &mut errors),
            password2: PASSWORD2.clean(input.password2.as_deref(), &mut errors),
        };

        let mismatch = matches!(
            (&partial.password1, &partial.password2),
            (Some(password1), Some(password2)) if password1 != password2
        );
        if mismatch {
            errors.add(PASSWORD2.name, PASSWORD_MISMATCH);
            partial.password2 = None;
        }

        (partial, errors)
    }

    /// Validate without touching the store.
    ///
    /// # Errors
    /// Returns the field-tagged errors when any field is invalid or the
    /// passwords differ.
    pub fn clean(&self) -> Result<CleanedRegistration, FormErrors> {
        let (partial, errors) = self.clean_fields();
        finish(partial, errors)
    }

    /// Validate, including the uniqueness of email and username.
    ///
    /// The outer `Result` carries store failures; the inner one is the form
    /// outcome.
    ///
    /// # Errors
    /// Returns an error if a uniqueness lookup fails.
    #[instrument(skip_all)]
    pub async fn validate(
        &self,
        accounts: &dyn AccountStore,
    ) -> Result<Result<CleanedRegistration, FormErrors>> {
        let (mut partial, mut errors) = self.clean_fields();

        let email_taken = match partial.email.as_deref() {
            Some(email) => accounts.exists(UniqueField::Email, email).await?,
            None => false,
        };
        if email_taken {
            debug!("email already registered");
            errors.add(EMAIL.name, EMAIL_TAKEN);
            partial.email = None;
        }

        let username_taken = match partial.username.as_deref() {
            Some(username) => accounts.exists(UniqueField::Username, username).await?,
            None => false,
        };
        if username_taken {
            debug!("username already registered");
            errors.add(USERNAME.name, USERNAME_TAKEN);
            partial.username = None;
        }

        Ok(finish(partial, errors))
    }

    /// The form as a template would render it. Passwords are never echoed.
    #[must_use]
    pub fn view(&self, errors: FormErrors) -> FormView {
        FormView::new(&FIELDS, |name| self.input.get(name), errors)
    }
}

fn finish(partial: Partial, errors: FormErrors) -> Result<CleanedRegistration, FormErrors> {
    if !errors.is_empty() {
        return Err(errors);
    }

    match partial {
        Partial {
            email: Some(email),
            username: Some(username),
            display_name: Some(display_name),
            password1: Some(password),
            password2: Some(_),
        } => Ok(CleanedRegistration {
            email,
            username,
            display_name,
            password: SecretString::from(password),
        }),
        // Every `None` above is paired with a recorded error.
        _ => Err(errors),
    }
}

impl CleanedRegistration {
    /// Hash the password and build the account. With `commit` the account is
    /// inserted; otherwise it is returned unsaved.
    ///
    /// # Errors
    /// Returns an error if hashing or the insert fails for a reason other than
    /// a uniqueness conflict.
    #[instrument(skip(self, accounts, hasher), fields(username = %self.username))]
    pub async fn save(
        self,
        accounts: &dyn AccountStore,
        hasher: &Hasher,
        commit: bool,
    ) -> Result<SaveOutcome> {
        let password_hash = hasher.hash_blocking(self.password).await?;
        let account = NewAccount {
            email: self.email,
            username: self.username,
            display_name: self.display_name,
            password_hash,
        };

        if !commit {
            return Ok(SaveOutcome::Unsaved(account));
        }

        match accounts.create(&account).await? {
            CreateOutcome::Created(account) => Ok(SaveOutcome::Created(account)),
            CreateOutcome::Conflict(field) => {
                debug!("insert hit unique constraint on {}", field.as_str());
                let mut errors = FormErrors::default();
                match field {
                    UniqueField::Email => errors.add(EMAIL.name, EMAIL_TAKEN),
                    UniqueField::Username => errors.add(USERNAME.name, USERNAME_TAKEN),
                }
                Ok(SaveOutcome::Rejected(errors))
            }
        }
    }

    /// The password as submitted; only exposed to compare or hash it.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}
