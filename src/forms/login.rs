//! Login form: email/password checked through [`authenticate`].

use super::validators::{self, EMAIL_MAX_LENGTH};
use super::{Field, FormErrors, FormView};
use crate::accounts::{Account, AccountStore, Hasher, authenticate};
use anyhow::Result;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};
use utoipa::ToSchema;

pub const TEMPLATE: &str = "auth/login.html";
/// Shared by "no such account" and "wrong password".
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub const INACTIVE_ACCOUNT: &str = "This account is inactive.";

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

pub const PASSWORD: Field = Field {
    name: "password",
    required: true,
    strip: false,
    render_value: false,
    validators: &[validators::no_null_characters],
};

pub const FIELDS: [Field; 2] = [EMAIL, PASSWORD];

#[derive(ToSchema, Serialize, Deserialize, Default, Clone)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// A successful login: the account the credentials resolved to.
#[derive(Debug)]
pub struct CleanedLogin {
    pub account: Account,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    input: LoginInput,
}

impl LoginForm {
    #[must_use]
    pub fn new(input: LoginInput) -> Self {
        Self { input }
    }

    /// Validate the fields, then authenticate. Credentials are only checked
    /// when both fields are clean.
    ///
    /// # Errors
    /// Returns an error if the account lookup or password hashing fails.
    #[instrument(skip_all)]
    pub async fn validate(
        &self,
        accounts: &dyn AccountStore,
        hasher: &Hasher,
    ) -> Result<Result<CleanedLogin, FormErrors>> {
        let mut errors = FormErrors::default();
        let email = EMAIL.clean(self.input.email.as_deref(), &mut errors);
        let password = PASSWORD.clean(self.input.password.as_deref(), &mut errors);

        let (Some(email), Some(password)) = (email, password) else {
            return Ok(Err(errors));
        };

        let Some(account) =
            authenticate(accounts, hasher, &email, SecretString::from(password)).await?
        else {
            errors.add_non_field(INVALID_CREDENTIALS);
            return Ok(Err(errors));
        };

        if !account.is_active {
            debug!(account_id = %account.id, "login attempt on inactive account");
            errors.add_non_field(INACTIVE_ACCOUNT);
            return Ok(Err(errors));
        }

        Ok(Ok(CleanedLogin { account }))
    }

    /// The form as a template would render it. The password is never echoed.
    #[must_use]
    pub fn view(&self, errors: FormErrors) -> FormView {
        FormView::new(
            &FIELDS,
            |name| match name {
                "email" => self.input.email.as_deref(),
                _ => None,
            },
            errors,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::accounts::{CreateOutcome, NewAccount};
    use crate::forms::REQUIRED;
    use crate::store::MemoryStore;

    fn input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    async fn seeded() -> (MemoryStore, Hasher, Account) {
        let store = MemoryStore::new();
        let hasher = Hasher::new(1024, 1, 1).unwrap();
        let new = NewAccount {
            email: "a@b.com".to_string(),
            username: "ab".to_string(),
            display_name: "Alice".to_string(),
            password_hash: hasher.hash("Secret123").unwrap(),
        };
        let CreateOutcome::Created(account) = store.create(&new).await.unwrap() else {
            panic!("expected account to be created");
        };
        (store, hasher, account)
    }

    #[tokio::test]
    async fn valid_credentials_resolve_the_account() {
        let (store, hasher, account) = seeded().await;
        let cleaned = LoginForm::new(input("a@b.com", "Secret123"))
            .validate(&store, &hasher)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleaned.account, account);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_share_one_message() {
        let (store, hasher, _) = seeded().await;
        let unknown = LoginForm::new(input("nobody@b.com", "Secret123"))
            .validate(&store, &hasher)
            .await
            .unwrap()
            .unwrap_err();
        let wrong = LoginForm::new(input("a@b.com", "Wrong123"))
            .validate(&store, &hasher)
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(unknown.non_field_errors, vec![INVALID_CREDENTIALS.to_string()]);
        assert_eq!(unknown, wrong);
    }

    #[tokio::test]
    async fn inactive_account_is_rejected() {
        let (store, hasher, account) = seeded().await;
        store.set_active(account.id, false).await;
        let errors = LoginForm::new(input("a@b.com", "Secret123"))
            .validate(&store, &hasher)
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(errors.non_field_errors, vec![INACTIVE_ACCOUNT.to_string()]);
    }

    #[tokio::test]
    async fn field_errors_skip_authentication() {
        let (store, hasher, _) = seeded().await;
        let errors = LoginForm::new(LoginInput {
            email: Some("not-an-email".to_string()),
            password: None,
        })
        .validate(&store, &hasher)
        .await
        .unwrap()
        .unwrap_err();
        assert_eq!(errors.field("email"), [validators::INVALID_EMAIL]);
        assert_eq!(errors.field("password"), [REQUIRED]);
        assert!(errors.non_field_errors.is_empty());
    }

    #[tokio::test]
    async fn null_characters_are_field_errors() {
        let (store, hasher, _) = seeded().await;
        let errors = LoginForm::new(input("a\0@b.com", "Secret\0"))
            .validate(&store, &hasher)
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(errors.field("email"), [validators::NULL_CHARACTERS]);
        assert_eq!(errors.field("password"), [validators::NULL_CHARACTERS]);
        assert!(errors.non_field_errors.is_empty());
    }

    #[test]
    fn view_keeps_email_and_drops_password() {
        let view = LoginForm::new(input("a@b.com", "Secret123")).view(FormErrors::default());
        assert_eq!(view.values.get("email").map(String::as_str), Some("a@b.com"));
        assert_eq!(view.values.get("password").map(String::as_str), Some(""));
    }
}
