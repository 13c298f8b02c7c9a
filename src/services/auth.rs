use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{SecondsFormat, Utc};
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{Session, User};

/// Server-side session lifetime. The cookie itself is browser-session scoped;
/// this bounds how long a leaked token stays valid.
const SESSION_TTL_HOURS: i64 = 24 * 7;

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow!("Failed to parse password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Create a new user
pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    password: &str,
    is_admin: bool,
) -> Result<User> {
    let id = Uuid::new_v4().to_string();
    let password_hash = hash_password(password)?;

    sqlx::query("INSERT INTO users (id, name, password_hash, is_admin) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(&password_hash)
        .bind(is_admin)
        .execute(pool)
        .await?;

    Ok(User {
        id,
        name: name.to_string(),
        password_hash,
        is_admin,
        created_at: Utc::now().to_rfc3339(),
    })
}

/// Authenticate a username/password pair and open a session.
/// The error is identical for unknown users and wrong passwords, so nothing
/// leaks about which half was incorrect.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<(User, Session)> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE name = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    let user = user.ok_or_else(|| anyhow!("invalid credentials"))?;

    if !verify_password(password, &user.password_hash).unwrap_or(false) {
        return Err(anyhow!("invalid credentials"));
    }

    let token = Uuid::new_v4().to_string();
    let expires_at = (Utc::now() + chrono::Duration::hours(SESSION_TTL_HOURS))
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(&user.id)
        .bind(&expires_at)
        .execute(pool)
        .await?;

    let session = Session {
        token,
        user_id: user.id.clone(),
        created_at: Utc::now().to_rfc3339(),
        expires_at,
    };

    Ok((user, session))
}

/// Validate session token and get user
pub async fn validate_session(pool: &SqlitePool, token: &str) -> Result<User> {
    let session: Session = sqlx::query_as("SELECT * FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow!("Invalid session"))?;

    let expires = chrono::DateTime::parse_from_rfc3339(&session.expires_at)
        .map_err(|e| anyhow!("Corrupt session expiry: {}", e))?;
    if expires < Utc::now() {
        destroy_session(pool, token).await?;
        return Err(anyhow!("Session expired"));
    }

    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&session.user_id)
        .fetch_one(pool)
        .await?;

    Ok(user)
}

/// Remove a session token (logout). Unknown tokens are a no-op.
pub async fn destroy_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete sessions past their expiry. Returns the number removed.
pub async fn cleanup_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(now_stamp())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[tokio::test]
    async fn test_authenticate_and_validate() {
        let pool = crate::db::test_pool().await;
        create_user(&pool, "alice", "s3cret", false).await.unwrap();

        let (user, session) = authenticate(&pool, "alice", "s3cret").await.unwrap();
        assert_eq!(user.name, "alice");
        assert!(!user.is_admin);

        let validated = validate_session(&pool, &session.token).await.unwrap();
        assert_eq!(validated.id, user.id);

        destroy_session(&pool, &session.token).await.unwrap();
        assert!(validate_session(&pool, &session.token).await.is_err());
    }

    #[tokio::test]
    async fn test_authenticate_error_does_not_leak_field() {
        let pool = crate::db::test_pool().await;
        create_user(&pool, "bob", "pw", false).await.unwrap();

        let unknown_user = authenticate(&pool, "nobody", "pw").await.unwrap_err();
        let wrong_password = authenticate(&pool, "bob", "wrong").await.unwrap_err();
        assert_eq!(unknown_user.to_string(), wrong_password.to_string());
    }
}
