use async_trait::async_trait;
use domains::{Identity, IdentityLookup, Username};
use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Row, Sqlite};

/// User directory backed by the `users` table.
pub struct SqliteIdentityDirectory {
    pool: SqlitePool,
}

impl SqliteIdentityDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts the user or refreshes their profile fields.
    pub async fn upsert_identity(&self, identity: &Identity) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO users (username, name, email, avatar) VALUES (?, ?, ?, ?)
             ON CONFLICT(username) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                avatar = excluded.avatar",
        )
        .bind(identity.username.as_str())
        .bind(identity.name.as_str())
        .bind(identity.email.as_str())
        .bind(identity.avatar.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityLookup for SqliteIdentityDirectory {
    async fn resolve_by_usernames(&self, usernames: &[Username]) -> anyhow::Result<Vec<Identity>> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT username, name, email, avatar FROM users WHERE username IN (");
        let mut names = builder.separated(", ");
        for username in usernames {
            names.push_bind(username.as_str().to_owned());
        }
        names.push_unseparated(")");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(Identity {
                    username: Username::new(row.try_get::<String, _>("username")?),
                    name: row.try_get("name")?,
                    email: row.try_get("email")?,
                    avatar: row.try_get("avatar")?,
                })
            })
            .collect()
    }
}
