use crate::state;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Serialize)]
struct SessionErrorResponse {
    error: &'static str,
}

/// Resolves the caller's session from the bearer header or the session
/// cookie and attaches it to the request. Everything except registration,
/// login, and the health probe requires one.
pub(crate) async fn session_middleware(
    State(state): State<state::AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if is_session_bypass_path(path) {
        return next.run(req).await;
    }

    let token = bearer_token(req.headers())
        .or_else(|| session_cookie(req.headers(), state.auth.cookie_name()));
    if let Some(token) = token
        && let Ok(session) = state.auth.verify_token(token)
    {
        req.extensions_mut().insert(session);
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(SessionErrorResponse {
            error: "unauthorized",
        }),
    )
        .into_response()
}

fn is_session_bypass_path(path: &str) -> bool {
    path == "/health" || path == "/api/register" || path == "/api/login"
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn session_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for header in headers.get_all(COOKIE).iter() {
        if let Ok(raw) = header.to_str()
            && let Some(value) = cookie_from_header(raw, name)
        {
            return Some(value);
        }
    }
    None
}

fn cookie_from_header<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let trimmed = part.trim();
        if let Some((cookie_name, cookie_value)) = trimmed.split_once('=')
            && cookie_name == name
        {
            return Some(cookie_value);
        }
    }
    None
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token__should_strip_the_scheme() {
        // Given
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));

        // Then
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn session_cookie__should_find_the_named_cookie_among_many() {
        // Given
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session=tok; lang=en"),
        );

        // Then
        assert_eq!(session_cookie(&headers, "session"), Some("tok"));
        assert_eq!(session_cookie(&headers, "missing"), None);
    }
}
