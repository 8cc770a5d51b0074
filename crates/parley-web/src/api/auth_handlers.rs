use axum::extract::State;
use axum::http::header;
use axum::response::AppendHeaders;
use axum::Json;

use crate::auth::middleware::session_cookie;
use crate::dto::*;
use crate::error::AppError;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<&'static str, AppError> {
    let accounts = state.accounts.clone();

    // Argon2 hashing (and the accounts-file rewrite) off the async runtime.
    tokio::task::spawn_blocking(move || {
        accounts.register(&body.username, &body.password, &body.email)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok("OK")
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(AppendHeaders<[(header::HeaderName, String); 1]>, &'static str), AppError> {
    let accounts = state.accounts.clone();
    let username = body.username.clone();
    let password = body.password;

    let account = tokio::task::spawn_blocking(move || accounts.verify(&username, &password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| {
            tracing::warn!("Failed login attempt for user: {} ({e})", body.username);
            AppError::from(e)
        })?;

    let session_id = state.sessions.create(account.username.clone());
    tracing::info!("Login successful for user: {}", account.username);

    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session_cookie(&session_id, state.config.tls_enabled()),
        )]),
        "OK",
    ))
}
