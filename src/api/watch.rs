use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    api::notice_redirect,
    models::MediaKind,
    services::resolver::{self, ResolveError},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/watch", get(watch))
}

#[derive(Debug, Deserialize)]
pub struct WatchQuery {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub imdb: Option<String>,
    pub season: Option<i64>,
    pub episode: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct WatchResponse {
    pub media_type: &'static str,
    pub embed_url: String,
}

/// GET /watch - resolve a title or IMDb id and hand out the embed URL.
/// Every resolution failure bounces back to the catalog with a notice; no
/// embed URL is issued in that case.
async fn watch(State(state): State<Arc<AppState>>, Query(query): Query<WatchQuery>) -> Response {
    let kind = MediaKind::from_param(query.media_type.as_deref());
    let raw = query.imdb.as_deref().unwrap_or("").trim();

    if raw.is_empty() {
        return notice_redirect("A title or IMDb id is required.");
    }

    let season = query.season.unwrap_or(1);
    let episode = query.episode.unwrap_or(1);

    match resolver::resolve_identifier(&state.db, state.omdb.as_ref(), kind, raw).await {
        Ok(imdb_id) => {
            let embed_url =
                resolver::build_embed_url(&state.config.embed_base, kind, &imdb_id, season, episode);
            Json(WatchResponse {
                media_type: kind.as_str(),
                embed_url,
            })
            .into_response()
        }
        Err(ResolveError::Db(e)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => notice_redirect(&e.to_string()),
    }
}
