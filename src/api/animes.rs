use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    models::{self, Anime},
    AppState,
};

use super::series::{find_episode, season_tree, SeasonDto};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/animes", get(list_animes))
        .route("/animes/search", get(search_animes))
        .route("/animes/genre/:genre", get(animes_by_genre))
        .route("/animes/:name", get(get_anime))
        .route("/animes/:name/watch/:season/:episode", get(watch_episode))
}

/// GET /api/animes - flat listing for client-side pickers
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/animes", get(api_list))
}

#[derive(Debug, Serialize)]
pub struct AnimeDto {
    pub id: String,
    pub name: String,
    pub cover_url: Option<String>,
    pub genres: Vec<String>,
    pub status: Option<String>,
}

fn anime_to_dto(anime: &Anime) -> AnimeDto {
    AnimeDto {
        id: anime.id.clone(),
        name: anime.name.clone(),
        cover_url: anime.cover_url.clone(),
        genres: anime.genres_vec(),
        status: anime.status.clone(),
    }
}

/// GET /animes - most recently updated first
async fn list_animes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AnimeDto>>, (StatusCode, String)> {
    let animes: Vec<Anime> = sqlx::query_as("SELECT * FROM animes ORDER BY updated_at DESC")
        .fetch_all(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(animes.iter().map(anime_to_dto).collect()))
}

#[derive(Debug, Deserialize)]
pub struct SectionSearchQuery {
    pub q: Option<String>,
}

/// GET /animes/search
async fn search_animes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SectionSearchQuery>,
) -> Result<Json<Vec<AnimeDto>>, (StatusCode, String)> {
    let q = query.q.as_deref().unwrap_or("").trim().to_string();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let pattern = format!("%{}%", q.to_lowercase());
    let animes: Vec<Anime> = sqlx::query_as("SELECT * FROM animes WHERE LOWER(name) LIKE ?")
        .bind(&pattern)
        .fetch_all(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(animes.iter().map(anime_to_dto).collect()))
}

/// GET /animes/genre/:genre - membership test against the stored genre list
async fn animes_by_genre(
    State(state): State<Arc<AppState>>,
    Path(genre): Path<String>,
) -> Result<Json<Vec<AnimeDto>>, (StatusCode, String)> {
    let animes: Vec<Anime> = sqlx::query_as(
        "SELECT * FROM animes WHERE EXISTS \
         (SELECT 1 FROM json_each(animes.genres) WHERE json_each.value = ?) \
         ORDER BY name ASC",
    )
    .bind(&genre)
    .fetch_all(&state.db)
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(animes.iter().map(anime_to_dto).collect()))
}

async fn fetch_anime(state: &AppState, name: &str) -> Result<Anime, (StatusCode, String)> {
    sqlx::query_as("SELECT * FROM animes WHERE name = ?")
        .bind(name)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Anime not found".to_string()))
}

#[derive(Debug, Serialize)]
pub struct AnimeDetailDto {
    pub id: String,
    pub name: String,
    pub cover_url: Option<String>,
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub seasons: Vec<SeasonDto>,
}

/// GET /animes/:name - animes are addressed by name, not id
async fn get_anime(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AnimeDetailDto>, (StatusCode, String)> {
    let anime = fetch_anime(&state, &name).await?;
    let seasons = season_tree(&state.db, &anime.id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(AnimeDetailDto {
        id: anime.id,
        name: anime.name,
        cover_url: anime.cover_url,
        genres: models::decode_string_list(&anime.genres),
        status: anime.status,
        seasons,
    }))
}

#[derive(Debug, Serialize)]
pub struct AnimeEpisodeWatchDto {
    pub anime: String,
    pub season: i64,
    pub episode: i64,
    pub episode_title: String,
    pub sources: Vec<String>,
    pub all_seasons: Vec<SeasonDto>,
}

/// GET /animes/:name/watch/:season/:episode
async fn watch_episode(
    State(state): State<Arc<AppState>>,
    Path((name, season, episode)): Path<(String, i64, i64)>,
) -> Result<Json<AnimeEpisodeWatchDto>, (StatusCode, String)> {
    let anime = fetch_anime(&state, &name).await?;

    let found = find_episode(&state.db, &anime.id, season, episode)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Episode not found".to_string()))?;

    let all_seasons = season_tree(&state.db, &anime.id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(AnimeEpisodeWatchDto {
        anime: anime.name,
        season,
        episode,
        sources: found.sources_vec(),
        episode_title: found.title,
        all_seasons,
    }))
}

/// GET /api/animes
async fn api_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AnimeDto>>, (StatusCode, String)> {
    let animes: Vec<Anime> = sqlx::query_as("SELECT * FROM animes ORDER BY name ASC")
        .fetch_all(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(animes.iter().map(anime_to_dto).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn seeded_pool() -> SqlitePool {
        let pool = crate::db::test_pool().await;
        sqlx::query(
            "INSERT INTO animes (id, name, genres) VALUES \
             ('a1', 'Steel Alchemist', '[\"Action\",\"Drama\"]'), \
             ('a2', 'Cooking Quest', '[\"Comedy\"]')",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_genre_filter_matches_list_membership() {
        let pool = seeded_pool().await;

        let hits: Vec<Anime> = sqlx::query_as(
            "SELECT * FROM animes WHERE EXISTS \
             (SELECT 1 FROM json_each(animes.genres) WHERE json_each.value = ?) \
             ORDER BY name ASC",
        )
        .bind("Action")
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Steel Alchemist");
    }

    #[tokio::test]
    async fn test_genre_filter_misses_partial_values() {
        let pool = seeded_pool().await;

        let hits: Vec<Anime> = sqlx::query_as(
            "SELECT * FROM animes WHERE EXISTS \
             (SELECT 1 FROM json_each(animes.genres) WHERE json_each.value = ?)",
        )
        .bind("Act")
        .fetch_all(&pool)
        .await
        .unwrap();

        assert!(hits.is_empty());
    }
}
