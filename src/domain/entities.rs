//! Domain entities mirrored from persistent storage, plus the annotated
//! projections produced by the aggregation layer.
//!
//! Derived counts are never stored. They travel on the projection types as
//! explicit fields: `likes_count` is always present on a [`PostSummary`]
//! (every listing is annotated with it), while `comments_count` and
//! `posts_count` are `Option` and default to zero at serialization time when
//! a query did not request them.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub published_at: OffsetDateTime,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_username: String,
    pub body: String,
    pub published_at: OffsetDateTime,
}

/// A tag together with its (optional) distinct-post count annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagSummary {
    pub tag: TagRecord,
    pub posts_count: Option<i64>,
}

impl TagSummary {
    pub fn annotated(tag: TagRecord, posts_count: i64) -> Self {
        Self {
            tag,
            posts_count: Some(posts_count),
        }
    }
}

/// A post with its author resolved, its like count annotated, and the
/// eager-loaded tag collection attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub post: PostRecord,
    pub author_username: String,
    pub likes_count: i64,
    pub comments_count: Option<i64>,
    pub tags: Vec<TagSummary>,
}
