use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{PostFilter, PostOrder, PostQuery, PostsRepo, RepoError};
use crate::domain::entities::{PostRecord, PostSummary, TagRecord, TagSummary};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PostListRow {
    id: Uuid,
    slug: String,
    title: String,
    body: String,
    image_url: Option<String>,
    published_at: OffsetDateTime,
    author_id: Uuid,
    author_username: String,
    likes_count: i64,
    comments_count: Option<i64>,
}

impl From<PostListRow> for PostSummary {
    fn from(row: PostListRow) -> Self {
        Self {
            post: PostRecord {
                id: row.id,
                slug: row.slug,
                title: row.title,
                body: row.body,
                image_url: row.image_url,
                published_at: row.published_at,
                author_id: row.author_id,
            },
            author_username: row.author_username,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            tags: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: Uuid,
    id: Uuid,
    slug: String,
    title: String,
    posts_count: i64,
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostSummary>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT p.id, p.slug, p.title, p.body, p.image_url, p.published_at, p.author_id, \
                    a.username AS author_username, \
                    COUNT(DISTINCT pl.author_id) AS likes_count, ",
        );

        if query.with_comment_counts {
            qb.push("COUNT(DISTINCT c.id) AS comments_count ");
        } else {
            qb.push("NULL::BIGINT AS comments_count ");
        }

        qb.push(
            "FROM posts p \
             INNER JOIN authors a ON a.id = p.author_id \
             LEFT JOIN post_likes pl ON pl.post_id = p.id ",
        );

        if query.with_comment_counts {
            qb.push("LEFT JOIN comments c ON c.post_id = p.id ");
        }

        qb.push("WHERE 1=1 ");
        apply_post_filter(&mut qb, &query.filter);

        qb.push(" GROUP BY p.id, a.username ");

        match query.order {
            PostOrder::MostLiked => {
                qb.push(" ORDER BY likes_count DESC, p.published_at DESC, p.id DESC ");
            }
            PostOrder::Freshest => {
                qb.push(" ORDER BY p.published_at DESC, p.id DESC ");
            }
        }

        // Slices wider than i64 clamp rather than binding a negative value.
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));

        let rows: Vec<PostListRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut summaries: Vec<PostSummary> = rows.into_iter().map(PostSummary::from).collect();

        if query.with_tags {
            self.attach_tags(&mut summaries).await?;
        }

        Ok(summaries)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostSummary>, RepoError> {
        let query = PostQuery::new(PostFilter::Slug(slug.to_string()), PostOrder::Freshest, 1)
            .with_tags();
        Ok(self.list_posts(&query).await?.into_iter().next())
    }

    async fn count_posts(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        u64::try_from(count).map_err(|_| RepoError::from_persistence("negative row count"))
    }
}

impl PostgresRepositories {
    /// Eager-load tag collections for a page of posts in one round-trip, each
    /// tag annotated with its distinct-post count so the serializer never has
    /// to recompute it.
    async fn attach_tags(&self, summaries: &mut [PostSummary]) -> Result<(), RepoError> {
        if summaries.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = summaries.iter().map(|summary| summary.post.id).collect();

        let rows: Vec<PostTagRow> = sqlx::query_as(
            "SELECT pt.post_id, t.id, t.slug, t.title, \
                    (SELECT COUNT(DISTINCT pt2.post_id) \
                     FROM post_tags pt2 \
                     WHERE pt2.tag_id = t.id) AS posts_count \
             FROM post_tags pt \
             INNER JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.post_id = ANY($1) \
             ORDER BY LOWER(t.title), t.slug",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut by_post: HashMap<Uuid, Vec<TagSummary>> = HashMap::new();
        for row in rows {
            by_post.entry(row.post_id).or_default().push(TagSummary::annotated(
                TagRecord {
                    id: row.id,
                    slug: row.slug,
                    title: row.title,
                },
                row.posts_count,
            ));
        }

        for summary in summaries {
            summary.tags = by_post.remove(&summary.post.id).unwrap_or_default();
        }

        Ok(())
    }
}

fn apply_post_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Tag(slug) => {
            qb.push(
                " AND EXISTS (SELECT 1 FROM post_tags pt \
                  INNER JOIN tags t ON t.id = pt.tag_id \
                  WHERE pt.post_id = p.id AND t.slug = ",
            );
            qb.push_bind(slug);
            qb.push(")");
        }
        PostFilter::Slug(slug) => {
            qb.push(" AND p.slug = ");
            qb.push_bind(slug);
        }
    }
}
