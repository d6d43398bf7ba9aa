use super::page::{FormPage, redirect, render, server_error};
use crate::api::AuthState;
use crate::forms::{FormErrors, RegistrationForm, RegistrationInput, SaveOutcome, registration};
use crate::messages::Messages;
use crate::sessions;
use axum::{
    Form,
    extract::Extension,
    http::HeaderMap,
    response::Response,
};
use std::sync::Arc;
use tracing::{info, instrument};

pub const REGISTERED: &str = "Registration successful. Welcome!";

#[utoipa::path(
    get,
    path = "/register",
    responses(
        (status = 200, description = "Empty registration form", body = FormPage)
    ),
    tag = "auth"
)]
pub async fn register_form(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    let form = RegistrationForm::default();
    render(
        registration::TEMPLATE,
        form.view(FormErrors::default()),
        Messages::from_headers(&headers),
        state.config(),
    )
}

#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegistrationInput, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created and signed in"),
        (status = 200, description = "Form rendered again with errors", body = FormPage),
        (status = 500, description = "Store or hashing failure")
    ),
    tag = "auth"
)]
#[instrument(skip(headers, state, payload))]
pub async fn register(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Form<RegistrationInput>>,
) -> Response {
    let input = payload.map(|Form(input)| input).unwrap_or_default();
    let form = RegistrationForm::new(input);
    let mut messages = Messages::from_headers(&headers);

    let cleaned = match form.validate(state.accounts()).await {
        Ok(Ok(cleaned)) => cleaned,
        Ok(Err(errors)) => {
            return render(registration::TEMPLATE, form.view(errors), messages, state.config());
        }
        Err(err) => return server_error(&err, "Failed to validate registration"),
    };

    let account = match cleaned.save(state.accounts(), state.hasher(), true).await {
        Ok(SaveOutcome::Created(account)) => account,
        Ok(SaveOutcome::Rejected(errors)) => {
            return render(registration::TEMPLATE, form.view(errors), messages, state.config());
        }
        Ok(SaveOutcome::Unsaved(_)) => {
            return server_error(
                &anyhow::anyhow!("save returned an unsaved account"),
                "Failed to create account",
            );
        }
        Err(err) => return server_error(&err, "Failed to create account"),
    };

    let cookie = match sessions::establish(
        state.sessions(),
        state.accounts(),
        state.config(),
        &headers,
        &account,
    )
    .await
    {
        Ok(cookie) => cookie,
        Err(err) => return server_error(&err, "Failed to establish session"),
    };

    info!(account_id = %account.id, "account registered");
    messages.success(REGISTERED);
    redirect(state.config().landing_path(), [cookie], &messages, state.config())
}
