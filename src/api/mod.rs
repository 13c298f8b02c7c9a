use axum::{
    middleware,
    response::{IntoResponse, Redirect, Response},
    Router,
};
use std::sync::Arc;

use crate::AppState;

mod animes;
mod auth;
mod browser;
mod catalog;
mod films;
pub mod guard;
mod search;
mod series;
mod suggestions;
mod watch;

/// Bounce back to the catalog with a user-visible transient message.
pub(crate) fn notice_redirect(message: &str) -> Response {
    Redirect::to(&format!("/catalog?notice={}", urlencoding::encode(message))).into_response()
}

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Player-facing pages sit behind both gates; the browser sniff runs after
    // the login check.
    let pages = Router::new()
        .merge(catalog::routes())
        .merge(watch::routes())
        .merge(films::routes())
        .merge(series::routes())
        .merge(animes::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::browser_gate,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_login,
        ));

    // JSON APIs only need a session.
    let apis = Router::new()
        .merge(search::routes())
        .merge(suggestions::routes())
        .merge(animes::api_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_login,
        ));

    // Catalog mutations; non-admins never reach a handler.
    let admin = Router::new()
        .merge(films::admin_routes())
        .merge(series::admin_routes())
        .layer(middleware::from_fn_with_state(state, guard::require_admin));

    Router::new()
        .merge(auth::routes())
        .merge(browser::routes())
        .merge(pages)
        .merge(apis)
        .nest("/admin", admin)
}
