use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    models::{self, Episode, Series},
    services::catalog,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/series", get(list_series))
        .route("/series/search", get(search_series))
        .route("/series/:id", get(get_series))
        .route("/series/:id/watch/:season/:episode", get(watch_episode))
}

/// Mounted under /admin behind the admin gate.
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/series", post(create_series))
        .route("/series/:id", put(update_series))
        .route("/series/:id", delete(delete_series))
        .route("/series/:id/seasons", post(add_season))
}

// =============================================================================
// Season/episode traversal, shared with the anime routes
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SeasonDto {
    pub season_number: i64,
    pub episodes: Vec<EpisodeSummaryDto>,
}

#[derive(Debug, Serialize)]
pub struct EpisodeSummaryDto {
    pub episode_number: i64,
    pub title: String,
}

/// Seasons of a series/anime in order, each with its ordered episode list.
pub(crate) async fn season_tree(
    pool: &SqlitePool,
    parent_id: &str,
) -> sqlx::Result<Vec<SeasonDto>> {
    let rows: Vec<(i64, Option<i64>, Option<String>)> = sqlx::query_as(
        "SELECT s.season_number, e.episode_number, e.title \
         FROM seasons s LEFT JOIN episodes e ON e.season_id = s.id \
         WHERE s.parent_id = ? \
         ORDER BY s.season_number ASC, e.episode_number ASC",
    )
    .bind(parent_id)
    .fetch_all(pool)
    .await?;

    let mut seasons: Vec<SeasonDto> = Vec::new();
    for (season_number, episode_number, title) in rows {
        if seasons.last().map(|s| s.season_number) != Some(season_number) {
            seasons.push(SeasonDto {
                season_number,
                episodes: Vec::new(),
            });
        }
        if let (Some(episode_number), Some(title)) = (episode_number, title) {
            if let Some(season) = seasons.last_mut() {
                season.episodes.push(EpisodeSummaryDto {
                    episode_number,
                    title,
                });
            }
        }
    }

    Ok(seasons)
}

/// Resolve a (parent, season, episode) triple. A miss anywhere is None.
pub(crate) async fn find_episode(
    pool: &SqlitePool,
    parent_id: &str,
    season: i64,
    episode: i64,
) -> sqlx::Result<Option<Episode>> {
    sqlx::query_as(
        "SELECT e.* FROM episodes e \
         JOIN seasons s ON e.season_id = s.id \
         WHERE s.parent_id = ? AND s.season_number = ? AND e.episode_number = ?",
    )
    .bind(parent_id)
    .bind(season)
    .bind(episode)
    .fetch_optional(pool)
    .await
}

// =============================================================================
// Read surface
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SeriesListRow {
    id: String,
    title: String,
    cover: Option<String>,
    genres: String,
    status: Option<String>,
    release_date: String,
    season_count: i64,
    episode_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SeriesListDto {
    pub id: String,
    pub title: String,
    pub cover: Option<String>,
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub release_date: String,
    pub season_count: i64,
    pub episode_count: i64,
}

/// GET /series - newest first, with season/episode tallies
async fn list_series(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SeriesListDto>>, (StatusCode, String)> {
    let rows: Vec<SeriesListRow> = sqlx::query_as(
        "SELECT id, title, cover, genres, status, release_date, \
           (SELECT COUNT(*) FROM seasons WHERE parent_id = series.id) AS season_count, \
           (SELECT COUNT(*) FROM episodes e JOIN seasons se ON e.season_id = se.id \
             WHERE se.parent_id = series.id) AS episode_count \
         FROM series ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let dtos = rows
        .into_iter()
        .map(|r| SeriesListDto {
            id: r.id,
            title: catalog::format_title_flags(&r.title),
            cover: r.cover,
            genres: models::decode_string_list(&r.genres),
            status: r.status,
            release_date: r.release_date,
            season_count: r.season_count,
            episode_count: r.episode_count,
        })
        .collect();

    Ok(Json(dtos))
}

#[derive(Debug, Deserialize)]
pub struct SectionSearchQuery {
    pub q: Option<String>,
}

/// GET /series/search
async fn search_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SectionSearchQuery>,
) -> Result<Json<Vec<SeriesDetailDto>>, (StatusCode, String)> {
    let q = query.q.as_deref().unwrap_or("").trim().to_string();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let pattern = format!("%{}%", q.to_lowercase());
    let rows: Vec<Series> = sqlx::query_as("SELECT * FROM series WHERE LOWER(title) LIKE ?")
        .bind(&pattern)
        .fetch_all(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut dtos = Vec::with_capacity(rows.len());
    for series in rows {
        let seasons = season_tree(&state.db, &series.id)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        dtos.push(series_to_dto(series, seasons));
    }

    Ok(Json(dtos))
}

#[derive(Debug, Serialize)]
pub struct SeriesDetailDto {
    pub id: String,
    pub title: String,
    pub cover: Option<String>,
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub release_date: String,
    pub description: Option<String>,
    pub seasons: Vec<SeasonDto>,
}

fn series_to_dto(series: Series, seasons: Vec<SeasonDto>) -> SeriesDetailDto {
    SeriesDetailDto {
        id: series.id,
        title: catalog::format_title_flags(&series.title),
        cover: series.cover,
        genres: models::decode_string_list(&series.genres),
        status: series.status,
        release_date: series.release_date,
        description: series.description,
        seasons,
    }
}

async fn fetch_series(state: &AppState, id: &str) -> Result<Series, (StatusCode, String)> {
    sqlx::query_as("SELECT * FROM series WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Series not found".to_string()))
}

/// GET /series/:id
async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SeriesDetailDto>, (StatusCode, String)> {
    let series = fetch_series(&state, &id).await?;
    let seasons = season_tree(&state.db, &series.id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(series_to_dto(series, seasons)))
}

#[derive(Debug, Serialize)]
pub struct EpisodeWatchDto {
    pub series: String,
    pub season: i64,
    pub episode: i64,
    pub episode_title: String,
    pub sources: Vec<String>,
    pub all_seasons: Vec<SeasonDto>,
}

/// GET /series/:id/watch/:season/:episode - any missing link in the triple
/// is a plain 404
async fn watch_episode(
    State(state): State<Arc<AppState>>,
    Path((id, season, episode)): Path<(String, i64, i64)>,
) -> Result<Json<EpisodeWatchDto>, (StatusCode, String)> {
    let series = fetch_series(&state, &id).await?;

    let found = find_episode(&state.db, &series.id, season, episode)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Episode not found".to_string()))?;

    let all_seasons = season_tree(&state.db, &series.id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(EpisodeWatchDto {
        series: catalog::format_title_flags(&series.title),
        season,
        episode,
        sources: found.sources_vec(),
        episode_title: found.title,
        all_seasons,
    }))
}

// =============================================================================
// Admin surface
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSeriesRequest {
    pub title: String,
    pub cover: Option<String>,
    /// Comma-separated genre list, as submitted by the add form
    #[serde(default)]
    pub genres: String,
    pub status: Option<String>,
    pub description: Option<String>,
    pub imdb_id: Option<String>,
    pub release_date: Option<String>,
}

/// POST /admin/series
async fn create_series(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSeriesRequest>,
) -> Result<Redirect, (StatusCode, String)> {
    let id = Uuid::new_v4().to_string();
    let genres: Vec<String> = req
        .genres
        .split(',')
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect();

    sqlx::query(
        "INSERT INTO series (id, title, imdb_id, release_date, cover, genres, status, description) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.imdb_id)
    .bind(req.release_date.as_deref().unwrap_or("Unknown"))
    .bind(&req.cover)
    .bind(models::encode_string_list(&genres))
    .bind(req.status.as_deref().unwrap_or("Ongoing"))
    .bind(req.description.as_deref().unwrap_or(""))
    .execute(&state.db)
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Redirect::to("/series"))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSeriesRequest {
    pub title: String,
    pub cover: Option<String>,
}

/// PUT /admin/series/:id
async fn update_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSeriesRequest>,
) -> Result<Redirect, (StatusCode, String)> {
    sqlx::query(
        "UPDATE series SET title = ?, cover = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(&req.title)
    .bind(&req.cover)
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Redirect::to("/series"))
}

/// DELETE /admin/series/:id - removes the season/episode tree with it;
/// a missing id is a no-op
async fn delete_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Redirect, (StatusCode, String)> {
    sqlx::query(
        "DELETE FROM episodes WHERE season_id IN (SELECT id FROM seasons WHERE parent_id = ?)",
    )
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    sqlx::query("DELETE FROM seasons WHERE parent_id = ?")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    sqlx::query("DELETE FROM series WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Redirect::to("/series"))
}

#[derive(Debug, Deserialize)]
pub struct AddSeasonRequest {
    pub season_number: i64,
    #[serde(default)]
    pub episodes: Vec<AddEpisodeRequest>,
}

#[derive(Debug, Deserialize)]
pub struct AddEpisodeRequest {
    pub episode_number: i64,
    pub title: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// POST /admin/series/:id/seasons - season and episode numbers must be new
/// within their parent
async fn add_season(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddSeasonRequest>,
) -> Result<Redirect, (StatusCode, String)> {
    let series = fetch_series(&state, &id).await?;

    let season_id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO seasons (id, parent_id, season_number) VALUES (?, ?, ?)")
        .bind(&season_id)
        .bind(&series.id)
        .bind(req.season_number)
        .execute(&state.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => (
                StatusCode::CONFLICT,
                format!("Season {} already exists", req.season_number),
            ),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        })?;

    for episode in &req.episodes {
        sqlx::query(
            "INSERT INTO episodes (id, season_id, episode_number, title, sources) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&season_id)
        .bind(episode.episode_number)
        .bind(&episode.title)
        .bind(models::encode_string_list(&episode.sources))
        .execute(&state.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => (
                StatusCode::CONFLICT,
                format!("Episode {} already exists", episode.episode_number),
            ),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        })?;
    }

    Ok(Redirect::to("/series"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_tree(pool: &SqlitePool) {
        sqlx::query("INSERT INTO series (id, title) VALUES ('s1', 'Dark Matters')")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO seasons (id, parent_id, season_number) VALUES ('se1', 's1', 1)")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO seasons (id, parent_id, season_number) VALUES ('se2', 's1', 2)")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO episodes (id, season_id, episode_number, title, sources) \
             VALUES ('e1', 'se1', 1, 'Pilot', '[\"https://cdn.example/e1.mp4\"]')",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO episodes (id, season_id, episode_number, title) \
             VALUES ('e2', 'se2', 5, 'Finale')",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_season_tree_orders_and_groups() {
        let pool = crate::db::test_pool().await;
        seed_tree(&pool).await;

        let tree = season_tree(&pool, "s1").await.unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].season_number, 1);
        assert_eq!(tree[0].episodes.len(), 1);
        assert_eq!(tree[0].episodes[0].title, "Pilot");
        assert_eq!(tree[1].season_number, 2);
        assert_eq!(tree[1].episodes[0].episode_number, 5);
    }

    #[tokio::test]
    async fn test_find_episode_hits_and_misses() {
        let pool = crate::db::test_pool().await;
        seed_tree(&pool).await;

        let hit = find_episode(&pool, "s1", 2, 5).await.unwrap().unwrap();
        assert_eq!(hit.title, "Finale");

        // wrong season, wrong episode, wrong parent: all plain misses
        assert!(find_episode(&pool, "s1", 3, 1).await.unwrap().is_none());
        assert!(find_episode(&pool, "s1", 1, 9).await.unwrap().is_none());
        assert!(find_episode(&pool, "nope", 1, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_episode_sources_decode() {
        let pool = crate::db::test_pool().await;
        seed_tree(&pool).await;

        let episode = find_episode(&pool, "s1", 1, 1).await.unwrap().unwrap();
        assert_eq!(
            episode.sources_vec(),
            vec!["https://cdn.example/e1.mp4".to_string()]
        );
    }
}
