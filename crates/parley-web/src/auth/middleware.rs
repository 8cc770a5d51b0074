use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the login-session id.
pub const SESSION_COOKIE: &str = "parley_session";

/// Extractor for handlers that require an established login session.
pub struct SessionUser {
    pub username: String,
    pub session_id: String,
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_header = parts
            .headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))?;

        let session_id = session_cookie_value(cookie_header)
            .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))?;

        let session = state
            .sessions
            .get(session_id)
            .ok_or_else(|| AppError::Auth("Session expired, log in again".to_string()))?;

        Ok(SessionUser {
            username: session.username,
            session_id: session_id.to_string(),
        })
    }
}

/// Pulls the session id out of a `Cookie` header value.
fn session_cookie_value(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}

/// Builds the `Set-Cookie` value for a fresh login session. `secure` is set
/// when the server terminates TLS, so the browser never sends the session id
/// over plaintext.
pub fn session_cookie(session_id: &str, secure: bool) -> String {
    let cookie = format!("{SESSION_COOKIE}={session_id}; HttpOnly; SameSite=Strict; Path=/");
    if secure {
        cookie + "; Secure"
    } else {
        cookie
    }
}
