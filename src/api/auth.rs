use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    api::guard,
    services::{auth, notify},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: String,
    pub is_admin: bool,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // One generic message for every failure mode
    let (user, session) = auth::authenticate(&state.db, &req.username, &req.password)
        .await
        .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid credentials.".to_string()))?;

    state.notifier.dispatch(
        "🔗 New login",
        &format!("`{}` is now online.", user.name),
        notify::COLOR_LOGIN,
    );

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        guard::SESSION_COOKIE,
        session.token
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user: user.name,
            is_admin: user.is_admin,
        }),
    ))
}

async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = guard::session_token(&headers) {
        if let Ok(user) = auth::validate_session(&state.db, &token).await {
            state.notifier.dispatch(
                "⛓️ Logout",
                &format!("`{}` signed out.", user.name),
                notify::COLOR_LOGOUT,
            );
        }
        if let Err(e) = auth::destroy_session(&state.db, &token).await {
            tracing::warn!("Failed to clear session: {:#}", e);
        }
    }

    let cookie = format!("{}=; Path=/; Max-Age=0", guard::SESSION_COOKIE);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/"))
}
