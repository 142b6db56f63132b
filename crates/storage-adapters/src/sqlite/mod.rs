//! # SQLite primary store
//!
//! Relational mapping for post aggregates and the identity directory.
//! Comments and votes live in child tables keyed by `(post_id, id)`; each
//! post row carries its own next comment/vote id so ids are never reused,
//! even after the highest one is removed.

mod identities;
mod posts;

use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use identities::SqliteIdentityDirectory;
pub use posts::SqlitePostRepository;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    username    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    avatar      TEXT
);

CREATE TABLE IF NOT EXISTS posts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    title           TEXT NOT NULL,
    summary         TEXT NOT NULL DEFAULT '',
    content         TEXT NOT NULL DEFAULT '',
    tags            TEXT NOT NULL DEFAULT '',
    owner           TEXT NOT NULL,
    category_id     INTEGER,
    created_at      TEXT NOT NULL,
    read_count      INTEGER NOT NULL DEFAULT 0,
    next_comment_id INTEGER NOT NULL DEFAULT 1,
    next_vote_id    INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS comments (
    post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    id          INTEGER NOT NULL,
    author      TEXT NOT NULL,
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (post_id, id)
);

CREATE TABLE IF NOT EXISTS votes (
    post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    id          INTEGER NOT NULL,
    voter       TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (post_id, id),
    UNIQUE (post_id, voter)
);

CREATE INDEX IF NOT EXISTS idx_posts_owner ON posts(owner);
CREATE INDEX IF NOT EXISTS idx_posts_category ON posts(category_id);
"#;

/// Opens a pool for `url` and creates the schema if missing.
///
/// An in-memory database exists per connection, so for `:memory:` urls the
/// pool is pinned to a single connection that is never recycled.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid sqlite url {url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = url.contains(":memory:") || url.contains("mode=memory");
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?
    };

    init_schema(&pool).await?;
    tracing::debug!(in_memory, "sqlite pool ready");
    Ok(pool)
}

pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    connect("sqlite::memory:", 1).await
}

/// Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("failed to apply sqlite schema")?;
    Ok(())
}
