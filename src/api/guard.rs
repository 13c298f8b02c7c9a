use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::{
    services::{auth, browser},
    AppState,
};

pub const SESSION_COOKIE: &str = "flixgate_session";
pub const BROWSER_COOKIE: &str = "flixgate_browser_ok";

/// Authenticated identity, inserted into request extensions by the login and
/// admin gates.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub crate::models::User);

/// Pull a named cookie out of the Cookie header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        if let Some((key, value)) = part.trim().split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Session token from the cookie, with a bearer-header fallback for
/// non-browser clients.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, SESSION_COOKIE) {
        return Some(token);
    }
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.to_string())
}

/// Login gate: anonymous or stale sessions are sent back to the login page.
pub async fn require_login(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(req.headers()) else {
        return Redirect::to("/").into_response();
    };

    match auth::validate_session(&state.db, &token).await {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Err(_) => Redirect::to("/").into_response(),
    }
}

/// Admin gate: anonymous users go to the login page; signed-in non-admins are
/// bounced to the catalog without a word, before any handler runs.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(req.headers()) else {
        return Redirect::to("/").into_response();
    };

    match auth::validate_session(&state.db, &token).await {
        Ok(user) if user.is_admin => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Ok(_) => Redirect::to("/films").into_response(),
        Err(_) => Redirect::to("/").into_response(),
    }
}

/// Capability gate for player pages. A bypass cookie set from the
/// browser-check page skips the sniff for 24 hours.
pub async fn browser_gate(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if !state.config.browser_check {
        return next.run(req).await;
    }
    if cookie_value(req.headers(), BROWSER_COOKIE).is_some() {
        return next.run(req).await;
    }

    let ua = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if browser::supported_browser(ua) {
        next.run(req).await
    } else {
        Redirect::to("/browser-check").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let headers = headers_with(
            header::COOKIE,
            "other=1; flixgate_session=abc-123; trailing=x",
        );
        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE).as_deref(),
            Some("abc-123")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_session_token_prefers_cookie() {
        let mut headers = headers_with(header::COOKIE, "flixgate_session=from-cookie");
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_session_token_bearer_fallback() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer tok-42");
        assert_eq!(session_token(&headers).as_deref(), Some("tok-42"));

        let headers = headers_with(header::AUTHORIZATION, "Basic dXNlcg==");
        assert_eq!(session_token(&headers), None);
    }
}
