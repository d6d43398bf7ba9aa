//! Response helpers shared by the account flows.

use crate::api::AuthConfig;
use crate::forms::FormView;
use crate::messages::{Message, Messages};
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

/// The context a template would receive to draw a form.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FormPage {
    pub template: String,
    pub form: FormView,
    pub messages: Vec<Message>,
}

/// Render `form` with every pending message. Reading the messages clears
/// them on the client.
pub(crate) fn render(
    template: &str,
    form: FormView,
    mut messages: Messages,
    config: &AuthConfig,
) -> Response {
    let page = FormPage {
        template: template.to_string(),
        form,
        messages: messages.take(),
    };
    let mut response = (StatusCode::OK, Json(page)).into_response();
    append_messages_cookie(&mut response, &messages, config);
    response
}

/// 303 to `location`, setting `cookies` and persisting `messages` for the next
/// page.
pub(crate) fn redirect(
    location: &str,
    cookies: impl IntoIterator<Item = HeaderValue>,
    messages: &Messages,
    config: &AuthConfig,
) -> Response {
    let mut response = Redirect::to(location).into_response();
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    append_messages_cookie(&mut response, messages, config);
    response
}

pub(crate) fn append_messages_cookie(
    response: &mut Response,
    messages: &Messages,
    config: &AuthConfig,
) {
    match messages.cookie(config.cookie_secure()) {
        Ok(Some(cookie)) => {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        Ok(None) => (),
        Err(err) => error!("Failed to encode messages cookie: {err}"),
    }
}

/// Log an infrastructure failure and answer 500.
pub(crate) fn server_error(err: &anyhow::Error, what: &str) -> Response {
    error!("{what}: {err:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, what.to_string()).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    fn config() -> AuthConfig {
        AuthConfig::new("http://localhost:8080".to_string())
    }

    #[test]
    fn redirect_is_see_other_with_every_cookie() {
        let mut messages = Messages::default();
        messages.info("bye");
        let response = redirect(
            "/login",
            [HeaderValue::from_static("a=1"), HeaderValue::from_static("b=2")],
            &messages,
            &config(),
        );
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/login");
        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 3);
        assert!(cookies[2].starts_with("ingresso_messages="));
    }

    #[test]
    fn render_consumes_messages() {
        let mut messages = Messages::default();
        messages.success("hello");
        let response = render("auth/login.html", FormView::default(), messages, &config());
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn server_error_is_500() {
        let response = server_error(&anyhow::anyhow!("boom"), "Failed to do it");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
