use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    services::catalog::{self, SortMode},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/catalog", get(get_catalog))
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub page: Option<i64>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub items: Vec<CatalogItemDto>,
    pub page: i64,
    pub total_pages: i64,
    pub movie_count: i64,
    pub series_count: i64,
    pub sort: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CatalogItemDto {
    pub id: String,
    pub title: String,
    pub release_date: String,
    pub cover: Option<String>,
    pub media_type: String,
}

/// The unified films+series feed: known records first, then whatever still
/// carries the 'Unknown' sentinel, 24 per page.
async fn get_catalog(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogResponse>, (StatusCode, String)> {
    let page = query.page.unwrap_or(1).max(1);
    let sort = SortMode::from_param(query.sort.as_deref());

    let rows = catalog::fetch_page(&state.db, page, sort)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let (movie_count, series_count) = catalog::section_counts(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let items = rows
        .into_iter()
        .map(|r| CatalogItemDto {
            id: r.id,
            title: catalog::format_title_flags(&r.title),
            release_date: r.release_date,
            cover: r.cover,
            media_type: r.media_type,
        })
        .collect();

    Ok(Json(CatalogResponse {
        items,
        page,
        total_pages: catalog::total_pages(movie_count, series_count),
        movie_count,
        series_count,
        sort: sort.as_str(),
    }))
}
