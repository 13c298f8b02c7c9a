use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::notice_redirect,
    models::{self, MediaKind, Movie},
    services::{catalog, resolver},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/films", get(list_movies))
        .route("/films/search", get(search_movies))
        .route("/films/:id", get(get_movie))
        .route("/films/:id/watch", get(watch_movie))
}

/// Mounted under /admin behind the admin gate.
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/films", post(create_movie))
        .route("/films/:id", put(update_movie))
        .route("/films/:id", delete(delete_movie))
}

#[derive(Debug, Serialize)]
pub struct MovieDto {
    pub id: String,
    pub title: String,
    pub imdb_id: Option<String>,
    pub release_date: String,
    pub cover: Option<String>,
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub source: Option<String>,
}

fn movie_to_dto(movie: &Movie) -> MovieDto {
    MovieDto {
        id: movie.id.clone(),
        title: catalog::format_title_flags(&movie.title),
        imdb_id: movie.imdb_id.clone(),
        release_date: movie.release_date.clone(),
        cover: movie.cover.clone(),
        genres: movie.genres_vec(),
        status: movie.status.clone(),
        source: movie.source.clone(),
    }
}

/// GET /films - newest first
async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MovieDto>>, (StatusCode, String)> {
    let movies: Vec<Movie> = sqlx::query_as("SELECT * FROM movies ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(movies.iter().map(movie_to_dto).collect()))
}

#[derive(Debug, Deserialize)]
pub struct SectionSearchQuery {
    pub q: Option<String>,
}

/// GET /films/search - substring title match; an empty query returns nothing
async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SectionSearchQuery>,
) -> Result<Json<Vec<MovieDto>>, (StatusCode, String)> {
    let q = query.q.as_deref().unwrap_or("").trim().to_string();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let pattern = format!("%{}%", q.to_lowercase());
    let movies: Vec<Movie> = sqlx::query_as("SELECT * FROM movies WHERE LOWER(title) LIKE ?")
        .bind(&pattern)
        .fetch_all(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(movies.iter().map(movie_to_dto).collect()))
}

async fn fetch_movie(
    state: &AppState,
    id: &str,
) -> Result<Movie, (StatusCode, String)> {
    sqlx::query_as("SELECT * FROM movies WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Movie not found".to_string()))
}

/// GET /films/:id
async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MovieDto>, (StatusCode, String)> {
    let movie = fetch_movie(&state, &id).await?;
    Ok(Json(movie_to_dto(&movie)))
}

#[derive(Debug, Serialize)]
pub struct MovieWatchResponse {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
}

/// GET /films/:id/watch - a hosted source plays directly; anything else goes
/// through the resolver to the embed player.
async fn watch_movie(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let movie = match fetch_movie(&state, &id).await {
        Ok(movie) => movie,
        Err(e) => return e.into_response(),
    };

    if movie.source.is_some() {
        return Json(MovieWatchResponse {
            title: catalog::format_title_flags(&movie.title),
            video_url: movie.source,
            embed_url: None,
        })
        .into_response();
    }

    match resolver::resolve_identifier(&state.db, state.omdb.as_ref(), MediaKind::Movie, &movie.id)
        .await
    {
        Ok(imdb_id) => {
            let embed_url =
                resolver::build_embed_url(&state.config.embed_base, MediaKind::Movie, &imdb_id, 1, 1);
            Json(MovieWatchResponse {
                title: catalog::format_title_flags(&movie.title),
                video_url: None,
                embed_url: Some(embed_url),
            })
            .into_response()
        }
        Err(resolver::ResolveError::Db(e)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => notice_redirect(&e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub title: String,
    pub cover: Option<String>,
    pub source: Option<String>,
    pub imdb_id: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub status: Option<String>,
}

/// POST /admin/films
async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMovieRequest>,
) -> Result<Redirect, (StatusCode, String)> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO movies (id, title, imdb_id, release_date, cover, genres, status, source) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.imdb_id)
    .bind(req.release_date.as_deref().unwrap_or("Unknown"))
    .bind(&req.cover)
    .bind(models::encode_string_list(&req.genres))
    .bind(&req.status)
    .bind(&req.source)
    .execute(&state.db)
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Redirect::to("/films"))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: String,
    pub cover: Option<String>,
    pub source: Option<String>,
}

/// PUT /admin/films/:id
async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMovieRequest>,
) -> Result<Redirect, (StatusCode, String)> {
    sqlx::query(
        "UPDATE movies SET title = ?, cover = ?, source = ?, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?",
    )
    .bind(&req.title)
    .bind(&req.cover)
    .bind(&req.source)
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Redirect::to("/films"))
}

/// DELETE /admin/films/:id - deleting a missing id is a no-op
async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Redirect, (StatusCode, String)> {
    sqlx::query("DELETE FROM movies WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Redirect::to("/films"))
}
