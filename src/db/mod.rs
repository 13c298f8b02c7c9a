use anyhow::Result;
use sqlx::SqlitePool;

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            expires_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS movies (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            imdb_id TEXT,
            release_date TEXT NOT NULL DEFAULT 'Unknown',
            cover TEXT,
            genres TEXT NOT NULL DEFAULT '[]',
            status TEXT,
            source TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS series (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            imdb_id TEXT,
            release_date TEXT NOT NULL DEFAULT 'Unknown',
            cover TEXT,
            genres TEXT NOT NULL DEFAULT '[]',
            status TEXT,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS animes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            cover_url TEXT,
            genres TEXT NOT NULL DEFAULT '[]',
            status TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        -- Seasons hang off a series or an anime id. parent_id carries no FK:
        -- a playback triple that does not resolve is "not found", never a
        -- constraint error.
        CREATE TABLE IF NOT EXISTS seasons (
            id TEXT PRIMARY KEY,
            parent_id TEXT NOT NULL,
            season_number INTEGER NOT NULL,
            UNIQUE(parent_id, season_number)
        );

        CREATE TABLE IF NOT EXISTS episodes (
            id TEXT PRIMARY KEY,
            season_id TEXT NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
            episode_number INTEGER NOT NULL,
            title TEXT NOT NULL,
            sources TEXT NOT NULL DEFAULT '[]',
            UNIQUE(season_id, episode_number)
        );
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    Ok(())
}

/// Create all database indexes for the common query paths
async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    let indexes = [
        // Substring search and alpha sort on titles
        "CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title)",
        "CREATE INDEX IF NOT EXISTS idx_series_title ON series(title)",
        "CREATE INDEX IF NOT EXISTS idx_animes_name ON animes(name)",
        // Section listings: newest first
        "CREATE INDEX IF NOT EXISTS idx_movies_created ON movies(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_series_created ON series(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_animes_updated ON animes(updated_at)",
        // Session validation and expiry sweep
        "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at)",
        // Season/episode traversal for playback
        "CREATE INDEX IF NOT EXISTS idx_seasons_parent ON seasons(parent_id)",
        "CREATE INDEX IF NOT EXISTS idx_episodes_season ON episodes(season_id)",
    ];

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = test_pool().await;
        migrate(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_season_number_rejected() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO series (id, title) VALUES ('s1', 'Show')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO seasons (id, parent_id, season_number) VALUES ('a', 's1', 1)")
            .execute(&pool)
            .await
            .unwrap();
        let dup = sqlx::query("INSERT INTO seasons (id, parent_id, season_number) VALUES ('b', 's1', 1)")
            .execute(&pool)
            .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_episode_number_rejected() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO seasons (id, parent_id, season_number) VALUES ('se1', 's1', 1)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO episodes (id, season_id, episode_number, title) VALUES ('e1', 'se1', 1, 'Pilot')",
        )
        .execute(&pool)
        .await
        .unwrap();
        let dup = sqlx::query(
            "INSERT INTO episodes (id, season_id, episode_number, title) VALUES ('e2', 'se1', 1, 'Again')",
        )
        .execute(&pool)
        .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_delete_of_missing_row_is_noop() {
        let pool = test_pool().await;
        let res = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind("does-not-exist")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(res.rows_affected(), 0);
    }
}
