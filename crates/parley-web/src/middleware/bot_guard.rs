use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

const BOT_PATTERNS: &[&str] = &[
    "bot", "crawl", "spider", "scrape", "curl", "wget", "python-requests", "httpie", "go-http",
];

/// True when the User-Agent is missing or matches a known automation
/// pattern. Browsers always send one, and the credential endpoints only
/// serve browsers.
fn looks_automated(user_agent: Option<&str>) -> bool {
    let Some(ua) = user_agent else {
        return true;
    };
    let ua_lower = ua.to_lowercase();
    BOT_PATTERNS.iter().any(|pattern| ua_lower.contains(pattern))
}

/// Screens automated clients off the registration and login endpoints.
pub async fn bot_guard(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    if looks_automated(user_agent.as_deref()) {
        tracing::warn!(
            "Blocked automated client: {}",
            user_agent.as_deref().unwrap_or("<no User-Agent>")
        );
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
