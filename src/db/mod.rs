//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create tables if they don't exist
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            admin INTEGER NOT NULL DEFAULT 0,
            moderator INTEGER NOT NULL DEFAULT 0,
            api_key TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL,
            text_color TEXT NOT NULL,
            topics_week INTEGER,
            topics_month INTEGER,
            topics_year INTEGER,
            read_restricted INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            category_id TEXT REFERENCES categories(id),
            created_at TEXT NOT NULL,
            bumped_at TEXT NOT NULL,
            posts_count INTEGER NOT NULL DEFAULT 1,
            visible INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category_featured_topics (
            category_id TEXT NOT NULL REFERENCES categories(id),
            topic_id TEXT NOT NULL REFERENCES topics(id),
            rank INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (category_id, topic_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topic_users (
            topic_id TEXT NOT NULL REFERENCES topics(id),
            user_id TEXT NOT NULL REFERENCES users(id),
            last_read_post_number INTEGER,
            notification_level INTEGER NOT NULL DEFAULT 1,
            posted INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (topic_id, user_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS drafts (
            user_id TEXT NOT NULL REFERENCES users(id),
            draft_key TEXT NOT NULL,
            sequence INTEGER NOT NULL DEFAULT 0,
            data TEXT NOT NULL,
            PRIMARY KEY (user_id, draft_key)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_topics_category_id ON topics(category_id);
        CREATE INDEX IF NOT EXISTS idx_topics_bumped_at ON topics(bumped_at);
        CREATE INDEX IF NOT EXISTS idx_cft_rank ON category_featured_topics(category_id, rank);
        CREATE INDEX IF NOT EXISTS idx_topic_users_user ON topic_users(user_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
