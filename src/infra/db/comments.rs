use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CommentsRepo, RepoError};
use crate::domain::entities::CommentRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author_username: String,
    body: String,
    published_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct CommentCountRow {
    post_id: Uuid,
    comments_count: i64,
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        // Comments read oldest-first, the opposite of the posts' default.
        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT c.id, c.post_id, a.username AS author_username, \
                    c.body, c.published_at \
             FROM comments c \
             INNER JOIN authors a ON a.id = c.author_id \
             WHERE c.post_id = $1 \
             ORDER BY c.published_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| CommentRecord {
                id: row.id,
                post_id: row.post_id,
                author_username: row.author_username,
                body: row.body,
                published_at: row.published_at,
            })
            .collect())
    }

    async fn count_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<CommentCountRow> = sqlx::query_as(
            "SELECT post_id, COUNT(*) AS comments_count \
             FROM comments \
             WHERE post_id = ANY($1) \
             GROUP BY post_id",
        )
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| (row.post_id, row.comments_count))
            .collect())
    }
}
