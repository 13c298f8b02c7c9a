use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::{api::guard, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/browser-check", get(browser_check))
        .route("/browser-check/bypass", post(browser_bypass))
}

async fn browser_check() -> impl IntoResponse {
    (
        StatusCode::UPGRADE_REQUIRED,
        Json(json!({
            "error": "browser not supported",
            "hint": "Open flixgate in a regular browser, or confirm at POST /browser-check/bypass to continue anyway.",
        })),
    )
}

/// Sets the 24h bypass cookie and returns to the catalog.
async fn browser_bypass() -> impl IntoResponse {
    let cookie = format!(
        "{}=1; Path=/; Max-Age=86400; SameSite=Lax",
        guard::BROWSER_COOKIE
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to("/catalog"))
}
