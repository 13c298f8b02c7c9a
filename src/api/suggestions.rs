use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{api::guard::CurrentUser, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/suggestion", post(send_suggestion))
}

/// Wire contract of the suggestion box; field names are what the frontend
/// has always posted.
#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    #[serde(default)]
    pub contenu: String,
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default)]
    pub titre_ref: String,
}

fn default_section() -> String {
    "?".to_string()
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/suggestion - the one notifier call whose outcome reaches the
/// response body.
async fn send_suggestion(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<SuggestionRequest>,
) -> (StatusCode, Json<SuggestionResponse>) {
    let contenu = req.contenu.trim();

    if contenu.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(SuggestionResponse {
                ok: false,
                error: Some("Empty suggestion".to_string()),
            }),
        );
    }

    if state.notifier.suggestion_target().is_none() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SuggestionResponse {
                ok: false,
                error: Some("Webhook not configured".to_string()),
            }),
        );
    }

    let description = build_description(&user.name, &req.section, &req.titre_ref, contenu);
    let ok = state.notifier.send_suggestion(&description).await;

    (StatusCode::OK, Json(SuggestionResponse { ok, error: None }))
}

fn build_description(user: &str, section: &str, titre_ref: &str, contenu: &str) -> String {
    let title_line = if titre_ref.is_empty() {
        String::new()
    } else {
        format!("**Current title:** {}\n", titre_ref)
    };

    format!(
        "**User:** `{}`\n**Section:** {}\n{}\n💬 {}",
        user, section, title_line, contenu
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_with_title_reference() {
        let description = build_description("alice", "films", "Inception", "add the sequel");
        assert!(description.contains("**User:** `alice`"));
        assert!(description.contains("**Section:** films"));
        assert!(description.contains("**Current title:** Inception"));
        assert!(description.contains("💬 add the sequel"));
    }

    #[test]
    fn test_description_without_title_reference() {
        let description = build_description("bob", "?", "", "more animes");
        assert!(!description.contains("Current title"));
        assert!(description.contains("💬 more animes"));
    }
}
