use serde::Serialize;
use sqlx::SqlitePool;

use crate::models::CatalogRow;

/// Fixed feed page size.
pub const PAGE_SIZE: i64 = 24;

/// Hard ceiling on the reported page count, whatever the tables hold.
pub const MAX_PAGES: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Date,
    Alpha,
}

impl SortMode {
    /// Accepts the `sort` query parameter; anything unrecognized is the
    /// default date ordering.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("alpha") => SortMode::Alpha,
            _ => SortMode::Date,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Date => "date",
            SortMode::Alpha => "alpha",
        }
    }

    /// Secondary ORDER BY clause; the priority bit always sorts first.
    fn order_clause(&self) -> &'static str {
        match self {
            SortMode::Alpha => "title COLLATE NOCASE ASC",
            SortMode::Date => "release_date DESC",
        }
    }
}

/// Films and series merged into one virtual collection. Each branch tags its
/// rows with a media type and a priority bit: records still carrying the
/// 'Unknown' title/date sentinel rank after everything else.
const FEED_SQL: &str = "\
    SELECT id, title, release_date, cover, media_type, sort_priority FROM ( \
        SELECT id, title, release_date, cover, 'movie' AS media_type, \
               CASE WHEN title = 'Unknown' OR release_date = 'Unknown' \
                    THEN 1 ELSE 0 END AS sort_priority \
          FROM movies \
        UNION ALL \
        SELECT id, title, release_date, cover, 'series' AS media_type, \
               CASE WHEN title = 'Unknown' OR release_date = 'Unknown' \
                    THEN 1 ELSE 0 END AS sort_priority \
          FROM series \
    )";

/// Fetch one page of the unified feed. An out-of-range page yields an empty
/// list, not an error.
pub async fn fetch_page(
    pool: &SqlitePool,
    page: i64,
    sort: SortMode,
) -> sqlx::Result<Vec<CatalogRow>> {
    let sql = format!(
        "{} ORDER BY sort_priority ASC, {} LIMIT ? OFFSET ?",
        FEED_SQL,
        sort.order_clause()
    );

    sqlx::query_as(&sql)
        .bind(PAGE_SIZE)
        .bind(page_offset(page))
        .fetch_all(pool)
        .await
}

/// Movie and series counts for the feed header.
pub async fn section_counts(pool: &SqlitePool) -> sqlx::Result<(i64, i64)> {
    let (movies,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies")
        .fetch_one(pool)
        .await?;
    let (series,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM series")
        .fetch_one(pool)
        .await?;
    Ok((movies, series))
}

/// Combined page count, never past the cap.
pub fn total_pages(movie_count: i64, series_count: i64) -> i64 {
    let total = movie_count + series_count;
    let pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;
    pages.min(MAX_PAGES)
}

fn page_offset(page: i64) -> i64 {
    (page.max(1) - 1) * PAGE_SIZE
}

/// One autocomplete/search hit: a display label, where to navigate, and how
/// to badge it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub label: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: String,
}

/// Rank merged results: labels starting with the query (case-insensitive)
/// come before plain substring hits, alphabetical within each band. The
/// combined list is cut to `limit` after ranking.
pub fn rank_by_label<T, F>(mut items: Vec<T>, query: &str, limit: usize, label: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let q = query.to_lowercase();
    items.sort_by(|a, b| {
        let a_substring_only = !label(a).to_lowercase().starts_with(&q);
        let b_substring_only = !label(b).to_lowercase().starts_with(&q);
        a_substring_only
            .cmp(&b_substring_only)
            .then_with(|| label(a).cmp(label(b)))
    });
    items.truncate(limit);
    items
}

/// Release-group language tags become flag emoji in display labels.
pub fn format_title_flags(title: &str) -> String {
    title.replace("[VF]", "🇫🇷").replace("[VOSTFR]", "🇺🇸")
}
