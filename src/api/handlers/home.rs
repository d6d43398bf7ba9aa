use super::page::{append_messages_cookie, server_error};
use crate::accounts::AccountSummary;
use crate::api::AuthState;
use crate::messages::{Message, Messages};
use crate::sessions;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Landing page: who is signed in and what happened last.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HomePage {
    pub account: Option<AccountSummary>,
    pub messages: Vec<Message>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Current account and pending messages", body = HomePage)
    ),
    tag = "auth"
)]
pub async fn home(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    let account = match sessions::resolve(state.sessions(), state.accounts(), &headers).await {
        Ok(account) => account,
        Err(err) => return server_error(&err, "Failed to resolve session"),
    };

    let mut messages = Messages::from_headers(&headers);
    let page = HomePage {
        account: account.as_ref().map(|account| account.summary()),
        messages: messages.take(),
    };

    let mut response = (StatusCode::OK, Json(page)).into_response();
    append_messages_cookie(&mut response, &messages, state.config());
    response
}
