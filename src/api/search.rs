use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    services::catalog::{self, Suggestion},
    AppState,
};

/// Per-collection cap for the type-ahead dropdown.
const AUTOCOMPLETE_LIMIT: usize = 8;
/// Per-collection cap for the full search endpoint.
const SEARCH_LIMIT: usize = 5;

const AUTOCOMPLETE_MIN_QUERY: usize = 1;
const SEARCH_MIN_QUERY: usize = 2;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/autocomplete", get(autocomplete))
        .route("/api/search", get(search))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub section: Option<String>,
}

/// GET /api/autocomplete - ranked type-ahead suggestions
async fn autocomplete(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Suggestion>>, (StatusCode, String)> {
    ranked_matches(&state.db, &query, AUTOCOMPLETE_MIN_QUERY, AUTOCOMPLETE_LIMIT)
        .await
        .map(Json)
}

/// GET /api/search - same ranking, tighter cap
async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Suggestion>>, (StatusCode, String)> {
    ranked_matches(&state.db, &query, SEARCH_MIN_QUERY, SEARCH_LIMIT)
        .await
        .map(Json)
}

async fn ranked_matches(
    pool: &SqlitePool,
    query: &SearchQuery,
    min_query: usize,
    limit: usize,
) -> Result<Vec<Suggestion>, (StatusCode, String)> {
    let q = query.q.as_deref().unwrap_or("").trim().to_string();

    // Too-short queries short-circuit without touching the store
    if q.chars().count() < min_query {
        return Ok(Vec::new());
    }

    let section = query.section.as_deref().unwrap_or("all");
    let results = collect_matches(pool, &q, section, limit as i64).await?;
    Ok(catalog::rank_by_label(results, &q, limit, |s| s.label.as_str()))
}

/// Case-insensitive substring match per applicable collection, each hit
/// tagged with its media type, navigation target and icon glyph.
async fn collect_matches(
    pool: &SqlitePool,
    q: &str,
    section: &str,
    limit: i64,
) -> Result<Vec<Suggestion>, (StatusCode, String)> {
    let pattern = format!("%{}%", q.to_lowercase());
    let mut results = Vec::new();

    if matches!(section, "films" | "all") {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, title FROM movies WHERE LOWER(title) LIKE ? LIMIT ?")
                .bind(&pattern)
                .bind(limit)
                .fetch_all(pool)
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

        for (id, title) in rows {
            results.push(Suggestion {
                label: catalog::format_title_flags(&title),
                url: format!("/films/{}/watch", id),
                kind: "Film".to_string(),
                icon: "🎬".to_string(),
            });
        }
    }

    if matches!(section, "series" | "all") {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, title FROM series WHERE LOWER(title) LIKE ? LIMIT ?")
                .bind(&pattern)
                .bind(limit)
                .fetch_all(pool)
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

        for (id, title) in rows {
            results.push(Suggestion {
                label: catalog::format_title_flags(&title),
                url: format!("/series/{}", id),
                kind: "Series".to_string(),
                icon: "📺".to_string(),
            });
        }
    }

    if matches!(section, "animes" | "all") {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, name FROM animes WHERE LOWER(name) LIKE ? LIMIT ?")
                .bind(&pattern)
                .bind(limit)
                .fetch_all(pool)
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

        for (_id, name) in rows {
            results.push(Suggestion {
                url: format!("/animes/{}", urlencoding::encode(&name)),
                label: name,
                kind: "Anime".to_string(),
                icon: "⚡".to_string(),
            });
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_pool() -> SqlitePool {
        let pool = crate::db::test_pool().await;
        sqlx::query("INSERT INTO movies (id, title) VALUES ('m1', 'The Matrix [VF]')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO series (id, title) VALUES ('s1', 'Matrix Tales')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO animes (id, name) VALUES ('a1', 'Matrixia')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    fn query(q: &str, section: Option<&str>) -> SearchQuery {
        SearchQuery {
            q: Some(q.to_string()),
            section: section.map(|s| s.to_string()),
        }
    }

    #[tokio::test]
    async fn test_short_query_short_circuits() {
        let pool = seeded_pool().await;
        let none = ranked_matches(&pool, &query("", None), 1, 8).await.unwrap();
        assert!(none.is_empty());

        let one_char = ranked_matches(&pool, &query("m", None), 2, 5).await.unwrap();
        assert!(one_char.is_empty());
    }

    #[tokio::test]
    async fn test_all_sections_merge_and_rank() {
        let pool = seeded_pool().await;
        let results = ranked_matches(&pool, &query("mat", None), 1, 8)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        // prefix hits lead, the substring-only movie trails
        assert_eq!(results[0].label, "Matrix Tales");
        assert_eq!(results[1].label, "Matrixia");
        assert_eq!(results[2].label, "The Matrix 🇫🇷");
        assert_eq!(results[2].kind, "Film");
        assert_eq!(results[2].url, "/films/m1/watch");
    }

    #[tokio::test]
    async fn test_section_filter_restricts_collections() {
        let pool = seeded_pool().await;
        let results = ranked_matches(&pool, &query("mat", Some("animes")), 1, 8)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, "Anime");
        assert_eq!(results[0].icon, "⚡");
    }

    #[tokio::test]
    async fn test_combined_results_respect_limit() {
        let pool = crate::db::test_pool().await;
        for i in 0..10 {
            sqlx::query("INSERT INTO movies (id, title) VALUES (?, ?)")
                .bind(format!("m{}", i))
                .bind(format!("Matrix {}", i))
                .execute(&pool)
                .await
                .unwrap();
            sqlx::query("INSERT INTO series (id, title) VALUES (?, ?)")
                .bind(format!("s{}", i))
                .bind(format!("Matrix Show {}", i))
                .execute(&pool)
                .await
                .unwrap();
        }

        let results = ranked_matches(&pool, &query("matrix", None), 1, 8)
            .await
            .unwrap();
        assert_eq!(results.len(), 8);
    }
}
