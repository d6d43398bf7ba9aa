use super::page::{redirect, server_error};
use crate::api::AuthState;
use crate::messages::Messages;
use crate::sessions;
use axum::{extract::Extension, http::HeaderMap, response::Response};
use std::sync::Arc;
use tracing::instrument;

pub const LOGGED_OUT: &str = "You have been logged out.";

#[utoipa::path(
    method(get, post),
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared, redirected to the login page"),
        (status = 500, description = "Session could not be deleted")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    // Always clear the cookie, even if the session record was missing.
    let cookie = match sessions::teardown(state.sessions(), state.config(), &headers).await {
        Ok(cookie) => cookie,
        Err(err) => return server_error(&err, "Failed to clear session"),
    };

    let mut messages = Messages::from_headers(&headers);
    messages.info(LOGGED_OUT);
    redirect(state.config().login_path(), [cookie], &messages, state.config())
}
