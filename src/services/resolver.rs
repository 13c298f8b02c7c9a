use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::MediaKind;
use crate::services::omdb::{LookupOutcome, OmdbClient};

/// Resolution failures, split the way they are surfaced: a bad lookup
/// credential is for an admin to fix, a miss is for the user to retry.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Title lookup is misconfigured. Contact an admin.")]
    InvalidApiKey,

    #[error("'{0}' not found. Check the English/IMDb title.")]
    TitleNotFound(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Canonical IMDb identifiers carry the `tt` prefix.
pub fn is_canonical_id(raw: &str) -> bool {
    raw.starts_with("tt")
}

/// Exact embed-player URL contract: path segment by kind, season/episode
/// appended for episodic playback.
pub fn build_embed_url(
    base: &str,
    kind: MediaKind,
    imdb_id: &str,
    season: i64,
    episode: i64,
) -> String {
    let base = base.trim_end_matches('/');
    match kind {
        MediaKind::Movie => format!("{}/embed/movie?imdb={}", base, imdb_id),
        MediaKind::Series => format!(
            "{}/embed/tv?imdb={}&season={}&episode={}",
            base, imdb_id, season, episode
        ),
    }
}

/// Turn a user-supplied identifier into a canonical IMDb id.
///
/// A `tt`-prefixed identifier passes through verbatim. Otherwise a stored
/// catalog record wins over the external lookup: its imdb id is used
/// directly, or its display title becomes the lookup query. Anything else
/// goes to OMDb as a free-text title.
pub async fn resolve_identifier(
    pool: &SqlitePool,
    omdb: Option<&OmdbClient>,
    kind: MediaKind,
    raw: &str,
) -> Result<String, ResolveError> {
    let raw = raw.trim();
    if is_canonical_id(raw) {
        return Ok(raw.to_string());
    }

    let mut query = raw.to_string();
    if let Some((imdb_id, title)) = stored_record(pool, kind, raw).await? {
        if let Some(id) = imdb_id {
            if is_canonical_id(&id) {
                return Ok(id);
            }
        }
        query = title;
    }

    let client = omdb.ok_or(ResolveError::InvalidApiKey)?;
    match client.lookup_title(&query).await {
        LookupOutcome::Found(id) => Ok(id),
        LookupOutcome::NotFound => Err(ResolveError::TitleNotFound(query)),
        LookupOutcome::InvalidKey => Err(ResolveError::InvalidApiKey),
    }
}

async fn stored_record(
    pool: &SqlitePool,
    kind: MediaKind,
    id: &str,
) -> sqlx::Result<Option<(Option<String>, String)>> {
    let sql = match kind {
        MediaKind::Movie => "SELECT imdb_id, title FROM movies WHERE id = ?",
        MediaKind::Series => "SELECT imdb_id, title FROM series WHERE id = ?",
    };
    sqlx::query_as(sql).bind(id).fetch_optional(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_canonical_id() {
        assert!(is_canonical_id("tt1234567"));
        assert!(!is_canonical_id("inception"));
        assert!(!is_canonical_id("zzzznotreal"));
        assert!(!is_canonical_id(""));
    }

    #[test]
    fn test_movie_embed_url() {
        let url = build_embed_url("https://vidsrc.example", MediaKind::Movie, "tt1375666", 1, 1);
        assert_eq!(url, "https://vidsrc.example/embed/movie?imdb=tt1375666");
    }

    #[test]
    fn test_series_embed_url_carries_season_and_episode() {
        let url = build_embed_url("https://vidsrc.example/", MediaKind::Series, "tt000111", 2, 5);
        assert_eq!(
            url,
            "https://vidsrc.example/embed/tv?imdb=tt000111&season=2&episode=5"
        );
    }

    #[tokio::test]
    async fn test_canonical_id_passes_through_without_lookup() {
        let pool = crate::db::test_pool().await;
        // no OMDb client configured; a canonical id must not need one
        let id = resolve_identifier(&pool, None, MediaKind::Movie, " tt1234567 ")
            .await
            .unwrap();
        assert_eq!(id, "tt1234567");
    }

    #[tokio::test]
    async fn test_stored_record_resolves_without_lookup() {
        let pool = crate::db::test_pool().await;
        sqlx::query("INSERT INTO movies (id, title, imdb_id) VALUES ('m1', 'Inception', 'tt1375666')")
            .execute(&pool)
            .await
            .unwrap();

        let id = resolve_identifier(&pool, None, MediaKind::Movie, "m1")
            .await
            .unwrap();
        assert_eq!(id, "tt1375666");
    }

    #[tokio::test]
    async fn test_missing_client_reports_misconfiguration() {
        let pool = crate::db::test_pool().await;
        let err = resolve_identifier(&pool, None, MediaKind::Movie, "inception")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidApiKey));
    }
}
