//! Repository traits describing persistence adapters, and the query
//! specification objects they consume.
//!
//! Listings are requested through [`PostQuery`] values rather than ad-hoc
//! method chains: a query names its filter, order, slice and required
//! annotations up front, so its contract is inspectable and testable without
//! a live database. Each repository exposes a single execution entry point
//! per specification type.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, PostSummary, TagRecord, TagSummary};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PostFilter {
    #[default]
    All,
    /// Posts linked to the tag with this slug.
    Tag(String),
    /// The single post with this slug.
    Slug(String),
}

/// Listing order. `MostLiked` sorts by the `likes_count` annotation
/// descending, ties broken by publication time descending; `Freshest` is the
/// posts' default order (publication time descending).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrder {
    #[default]
    Freshest,
    MostLiked,
}

/// A complete post-listing specification.
///
/// `likes_count` is always annotated — a popular listing must carry the count
/// it sorts by. `with_comment_counts` and `with_tags` opt in to the heavier
/// annotations; tag collections are eager-loaded in one batched query and
/// each loaded tag arrives with its own `posts_count` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub filter: PostFilter,
    pub order: PostOrder,
    pub limit: usize,
    pub offset: usize,
    pub with_comment_counts: bool,
    pub with_tags: bool,
}

impl PostQuery {
    pub fn new(filter: PostFilter, order: PostOrder, limit: usize) -> Self {
        Self {
            filter,
            order,
            limit,
            offset: 0,
            with_comment_counts: false,
            with_tags: false,
        }
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_comment_counts(mut self) -> Self {
        self.with_comment_counts = true;
        self
    }

    pub fn with_tags(mut self) -> Self {
        self.with_tags = true;
        self
    }
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Execute a listing specification. Results arrive annotated with
    /// `likes_count` (and `comments_count`/tags when requested), in the
    /// specified order.
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostSummary>, RepoError>;

    /// Look up a single post by slug, annotated with `likes_count` and its
    /// eager-loaded tags.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostSummary>, RepoError>;

    async fn count_posts(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    /// All tags annotated with their distinct published-post counts, ordered
    /// by that count descending. The annotation is computed over the full
    /// aggregate before `limit` slices it.
    async fn list_with_counts(&self, limit: usize) -> Result<Vec<TagSummary>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments for one post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;

    /// Comment counts for a batch of posts in one round-trip. Posts without
    /// comments are simply absent from the map.
    async fn count_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>, RepoError>;
}
