use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{RepoError, TagsRepo};
use crate::domain::entities::{TagRecord, TagSummary};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TagRow {
    id: Uuid,
    slug: String,
    title: String,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagCountRow {
    id: Uuid,
    slug: String,
    title: String,
    posts_count: i64,
}

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn list_with_counts(&self, limit: usize) -> Result<Vec<TagSummary>, RepoError> {
        // Annotate-then-slice: the count and ordering cover the full
        // aggregate, LIMIT runs last.
        let rows: Vec<TagCountRow> = sqlx::query_as(
            "SELECT t.id, t.slug, t.title, \
                    COUNT(DISTINCT pt.post_id) AS posts_count \
             FROM tags t \
             LEFT JOIN post_tags pt ON pt.tag_id = t.id \
             GROUP BY t.id \
             ORDER BY posts_count DESC, LOWER(t.title), t.slug \
             LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                TagSummary::annotated(
                    TagRecord {
                        id: row.id,
                        slug: row.slug,
                        title: row.title,
                    },
                    row.posts_count,
                )
            })
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError> {
        let row: Option<TagRow> =
            sqlx::query_as("SELECT id, slug, title FROM tags WHERE slug = $1")
                .bind(slug)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(TagRecord::from))
    }
}
