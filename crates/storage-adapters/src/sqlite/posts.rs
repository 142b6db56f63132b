use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    CategoryId, Comment, CommentId, PersistedPost, Post, PostId, PostRepository, Tags, Username,
    Vote, VoteId,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};

pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: CommentId(row.try_get("id")?),
        author: Username::new(row.try_get::<String, _>("author")?),
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

fn vote_from_row(row: &SqliteRow) -> Result<Vote, sqlx::Error> {
    Ok(Vote {
        id: VoteId(row.try_get("id")?),
        voter: Username::new(row.try_get::<String, _>("voter")?),
        created_at: row.try_get("created_at")?,
    })
}

/// Rewrites the child rows of `post_id` to match the aggregate.
async fn replace_children(
    tx: &mut Transaction<'_, Sqlite>,
    post_id: PostId,
    post: &Post,
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(post_id.get())
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM votes WHERE post_id = ?")
        .bind(post_id.get())
        .execute(&mut **tx)
        .await?;

    for comment in post.comments().iter() {
        sqlx::query(
            "INSERT INTO comments (post_id, id, author, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post_id.get())
        .bind(comment.id.get())
        .bind(comment.author.as_str())
        .bind(comment.content.as_str())
        .bind(comment.created_at)
        .execute(&mut **tx)
        .await?;
    }

    for vote in post.votes().iter() {
        sqlx::query("INSERT INTO votes (post_id, id, voter, created_at) VALUES (?, ?, ?, ?)")
            .bind(post_id.get())
            .bind(vote.id.get())
            .bind(vote.voter.as_str())
            .bind(vote.created_at)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    /// Writes the post row and replaces its comments and votes in one
    /// transaction, so a reader never sees a half-written aggregate.
    async fn insert_or_update(&self, post: &Post) -> anyhow::Result<PostId> {
        let read_count = i64::try_from(post.read_count())?;
        let tags = post.tags().joined();
        let category = post.category().map(CategoryId::get);
        let mut tx = self.pool.begin().await?;

        let post_id = match post.id() {
            Some(id) => {
                sqlx::query(
                    "INSERT INTO posts (id, title, summary, content, tags, owner, category_id, created_at, read_count, next_comment_id, next_vote_id)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(id) DO UPDATE SET
                        title = excluded.title,
                        summary = excluded.summary,
                        content = excluded.content,
                        tags = excluded.tags,
                        owner = excluded.owner,
                        category_id = excluded.category_id,
                        read_count = excluded.read_count,
                        next_comment_id = excluded.next_comment_id,
                        next_vote_id = excluded.next_vote_id",
                )
                .bind(id.get())
                .bind(post.title())
                .bind(post.summary())
                .bind(post.content())
                .bind(tags.as_str())
                .bind(post.owner().as_str())
                .bind(category)
                .bind(post.created_at())
                .bind(read_count)
                .bind(post.comments().next_id())
                .bind(post.votes().next_id())
                .execute(&mut *tx)
                .await?;
                id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO posts (title, summary, content, tags, owner, category_id, created_at, read_count, next_comment_id, next_vote_id)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(post.title())
                .bind(post.summary())
                .bind(post.content())
                .bind(tags.as_str())
                .bind(post.owner().as_str())
                .bind(category)
                .bind(post.created_at())
                .bind(read_count)
                .bind(post.comments().next_id())
                .bind(post.votes().next_id())
                .execute(&mut *tx)
                .await?;
                PostId(result.last_insert_rowid())
            }
        };

        replace_children(&mut tx, post_id, post).await?;
        tx.commit().await?;
        Ok(post_id)
    }

    async fn find_by_id(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT id, title, summary, content, tags, owner, category_id, created_at, read_count, next_comment_id, next_vote_id
             FROM posts WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let comments = sqlx::query(
            "SELECT id, author, content, created_at FROM comments WHERE post_id = ? ORDER BY id ASC",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(comment_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        let votes = sqlx::query(
            "SELECT id, voter, created_at FROM votes WHERE post_id = ? ORDER BY id ASC",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(vote_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let persisted = PersistedPost {
            id: PostId(row.try_get("id")?),
            title: row.try_get("title")?,
            summary: row.try_get("summary")?,
            content: row.try_get("content")?,
            tags: Tags::parse(&row.try_get::<String, _>("tags")?),
            owner: Username::new(row.try_get::<String, _>("owner")?),
            category: row.try_get::<Option<i64>, _>("category_id")?.map(CategoryId),
            created_at,
            read_count: u64::try_from(row.try_get::<i64, _>("read_count")?)?,
            comments,
            next_comment_id: row.try_get("next_comment_id")?,
            votes,
            next_vote_id: row.try_get("next_vote_id")?,
        };
        Ok(Some(Post::restore(persisted)))
    }

    async fn delete_by_id(&self, id: PostId) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM votes WHERE post_id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_ids(&self, limit: usize, offset: usize) -> anyhow::Result<Vec<PostId>> {
        let rows = sqlx::query("SELECT id FROM posts ORDER BY id ASC LIMIT ? OFFSET ?")
            .bind(i64::try_from(limit)?)
            .bind(i64::try_from(offset)?)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| Ok(PostId(row.try_get("id")?)))
            .collect()
    }
}
