//! Session cookie encoding and token extraction.

use crate::api::AuthConfig;
use axum::http::{
    HeaderMap, HeaderValue,
    header::{AUTHORIZATION, COOKIE, InvalidHeaderValue},
};

pub const SESSION_COOKIE_NAME: &str = "ingresso_session";

/// Build a secure `HttpOnly` cookie for the session token.
///
/// # Errors
/// Returns an error if the token contains characters invalid in a header.
pub fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    // Only mark cookies secure when the frontend is served over HTTPS.
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// # Errors
/// Returns an error if the cookie cannot be encoded as a header value.
pub fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Find the session token in the `Authorization` header or the session cookie.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    cookie_value(headers, SESSION_COOKIE_NAME).filter(|value| !value.is_empty())
}

/// Read a single cookie by name from every `Cookie` header on the request.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == name {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> AuthConfig {
        AuthConfig::new(base.to_string()).with_session_ttl_seconds(60)
    }

    #[test]
    fn session_cookie_is_http_only_with_ttl() {
        let cookie = session_cookie(&config("http://localhost:8080"), "abc").ok();
        assert_eq!(
            cookie.as_ref().and_then(|c| c.to_str().ok()),
            Some("ingresso_session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=60")
        );
    }

    #[test]
    fn session_cookie_secure_over_https() {
        let cookie = session_cookie(&config("https://ingresso.dev"), "abc").ok();
        let value = cookie.as_ref().and_then(|c| c.to_str().ok()).unwrap_or("");
        assert!(value.ends_with("; Secure"));
    }

    #[test]
    fn clear_session_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&config("http://localhost:8080")).ok();
        let value = cookie.as_ref().and_then(|c| c.to_str().ok()).unwrap_or("");
        assert!(value.starts_with("ingresso_session=;"));
        assert!(value.contains("Max-Age=0"));
    }

    #[test]
    fn extract_session_token_reads_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; ingresso_session=tok123; other=1"),
        );
        assert_eq!(extract_session_token(&headers), Some("tok123".to_string()));
    }

    #[test]
    fn extract_session_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("ingresso_session=cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(extract_session_token(&headers), Some("header".to_string()));
    }

    #[test]
    fn extract_session_token_ignores_empty_values() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("ingresso_session="));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn cookie_value_scans_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(cookie_value(&headers, "b"), Some("2".to_string()));
        assert_eq!(cookie_value(&headers, "c"), None);
    }
}
