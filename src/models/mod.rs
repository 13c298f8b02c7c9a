use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
}

/// A film. `source` is a direct stream URL when one is hosted for the title;
/// otherwise `imdb_id` (or the title itself) feeds the embed resolver.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub imdb_id: Option<String>,
    pub release_date: String,
    pub cover: Option<String>,
    pub genres: String,
    pub status: Option<String>,
    pub source: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Series {
    pub id: String,
    pub title: String,
    pub imdb_id: Option<String>,
    pub release_date: String,
    pub cover: Option<String>,
    pub genres: String,
    pub status: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Animes keep their own shape: the catalog they are imported from names
/// things `name`/`cover_url` rather than `title`/`cover`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Anime {
    pub id: String,
    pub name: String,
    pub cover_url: Option<String>,
    pub genres: String,
    pub status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Season {
    pub id: String,
    pub parent_id: String,
    pub season_number: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Episode {
    pub id: String,
    pub season_id: String,
    pub episode_number: i64,
    pub title: String,
    pub sources: String,
}

impl Movie {
    pub fn genres_vec(&self) -> Vec<String> {
        decode_string_list(&self.genres)
    }
}

impl Series {
    pub fn genres_vec(&self) -> Vec<String> {
        decode_string_list(&self.genres)
    }
}

impl Anime {
    pub fn genres_vec(&self) -> Vec<String> {
        decode_string_list(&self.genres)
    }
}

impl Episode {
    pub fn sources_vec(&self) -> Vec<String> {
        decode_string_list(&self.sources)
    }
}

/// One row of the unified films+series feed. `media_type` is the tag computed
/// by the union query; `sort_priority` is 1 for records still carrying the
/// 'Unknown' title/date sentinel, which sort after everything else.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogRow {
    pub id: String,
    pub title: String,
    pub release_date: String,
    pub cover: Option<String>,
    pub media_type: String,
    pub sort_priority: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Accepts the `type` query parameter. `tv` is an alias for series;
    /// anything unrecognized falls back to movie, matching the catalog rule
    /// that an untagged record is a movie.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("series") | Some("tv") => MediaKind::Series,
            _ => MediaKind::Movie,
        }
    }

    pub fn embed_segment(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

/// Genres and episode sources are stored as JSON array text; a column that
/// fails to parse decodes as empty rather than failing the request.
pub fn decode_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub fn encode_string_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_from_param() {
        assert_eq!(MediaKind::from_param(Some("movie")), MediaKind::Movie);
        assert_eq!(MediaKind::from_param(Some("series")), MediaKind::Series);
        assert_eq!(MediaKind::from_param(Some("tv")), MediaKind::Series);
        assert_eq!(MediaKind::from_param(Some("garbage")), MediaKind::Movie);
        assert_eq!(MediaKind::from_param(None), MediaKind::Movie);
    }

    #[test]
    fn test_embed_segment() {
        assert_eq!(MediaKind::Movie.embed_segment(), "movie");
        assert_eq!(MediaKind::Series.embed_segment(), "tv");
    }

    #[test]
    fn test_string_list_round_trip() {
        let genres = vec!["Action".to_string(), "Drama".to_string()];
        let encoded = encode_string_list(&genres);
        assert_eq!(decode_string_list(&encoded), genres);
    }

    #[test]
    fn test_string_list_tolerates_garbage() {
        assert!(decode_string_list("not json").is_empty());
        assert!(decode_string_list("").is_empty());
    }
}
