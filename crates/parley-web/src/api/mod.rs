mod auth_handlers;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::middleware::SessionUser;
use crate::error::AppError;
use crate::state::AppState;

/// Routes that take credentials; rate limiting and the bot guard are layered
/// on top of this router in `main`.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
}

pub fn ticket_router() -> Router<AppState> {
    Router::new().route("/ticket", get(issue_ticket))
}

/// Mints a single-use, short-lived ticket for WebSocket authentication.
/// Requires the login session established by `/login`; the opaque ticket
/// string is the entire response body.
async fn issue_ticket(
    user: SessionUser,
    State(state): State<AppState>,
) -> Result<String, AppError> {
    let ticket = state.tickets.issue(&user.username);
    tracing::debug!("Ticket issued for {}", user.username);
    Ok(ticket)
}
