use super::page::{FormPage, redirect, render, server_error};
use crate::api::AuthState;
use crate::forms::{FormErrors, LoginForm, LoginInput, login};
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

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Empty login form", body = FormPage)
    ),
    tag = "auth"
)]
pub async fn login_form(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    let form = LoginForm::default();
    render(
        login::TEMPLATE,
        form.view(FormErrors::default()),
        Messages::from_headers(&headers),
        state.config(),
    )
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginInput, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in"),
        (status = 200, description = "Form rendered again with errors", body = FormPage),
        (status = 500, description = "Store or hashing failure")
    ),
    tag = "auth"
)]
#[instrument(skip(headers, state, payload))]
pub async fn login(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Form<LoginInput>>,
) -> Response {
    let input = payload.map(|Form(input)| input).unwrap_or_default();
    let form = LoginForm::new(input);
    let mut messages = Messages::from_headers(&headers);

    let account = match form.validate(state.accounts(), state.hasher()).await {
        Ok(Ok(cleaned)) => cleaned.account,
        Ok(Err(errors)) => {
            return render(login::TEMPLATE, form.view(errors), messages, state.config());
        }
        Err(err) => return server_error(&err, "Failed to authenticate"),
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

    info!(account_id = %account.id, "signed in");
    messages.success(format!("Welcome back, {}!", account.greeting_name()));
    redirect(state.config().landing_path(), [cookie], &messages, state.config())
}
