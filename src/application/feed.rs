//! Aggregation layer: popularity rankings, derived counts and the page
//! contexts composed from them.
//!
//! `FeedService` owns the read path. Repositories and the cache handle are
//! injected at construction; the two expensive aggregates (popular posts,
//! popular tags) are looked up cache-first and stored in serialized form.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::application::repos::{
    CommentsRepo, PostFilter, PostOrder, PostQuery, PostsRepo, RepoError, TagsRepo,
};
use crate::application::serialize::{
    SerializedPost, SerializedTag, serialize_post, serialize_tag,
};
use crate::cache::{self, ReadCache};
use crate::domain::entities::{CommentRecord, PostSummary};
use crate::domain::slug::normalize_slug;

/// Popular listings are fixed-size regardless of pagination.
pub const POPULAR_LIMIT: usize = 5;

/// Posts shown on a tag-filtered listing.
pub const TAG_PAGE_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown tag")]
    UnknownTag,
    #[error("unknown post")]
    UnknownPost,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct HomePage {
    pub most_popular_posts: Vec<SerializedPost>,
    pub page_posts: Vec<SerializedPost>,
    pub popular_tags: Vec<SerializedTag>,
    pub page: usize,
    pub has_next_page: bool,
}

#[derive(Debug, Clone)]
pub struct TagPage {
    pub tag_title: String,
    pub posts: Vec<SerializedPost>,
    pub most_popular_posts: Vec<SerializedPost>,
    pub popular_tags: Vec<SerializedTag>,
}

#[derive(Debug, Clone)]
pub struct PostDetailPage {
    pub post: SerializedPost,
    pub comments: Vec<CommentRecord>,
    pub most_popular_posts: Vec<SerializedPost>,
    pub popular_tags: Vec<SerializedTag>,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    tags: Arc<dyn TagsRepo>,
    comments: Arc<dyn CommentsRepo>,
    cache: Option<Arc<dyn ReadCache>>,
    cache_ttl: Duration,
    page_size: usize,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        tags: Arc<dyn TagsRepo>,
        comments: Arc<dyn CommentsRepo>,
        cache: Option<Arc<dyn ReadCache>>,
        cache_ttl: Duration,
        page_size: usize,
    ) -> Self {
        Self {
            posts,
            tags,
            comments,
            cache,
            cache_ttl,
            page_size: page_size.max(1),
        }
    }

    /// Posts annotated with `likes_count`, ordered by it descending, ties by
    /// publication time descending. Served from the cache when fresh.
    pub async fn popular_posts(&self, limit: usize) -> Result<Vec<SerializedPost>, FeedError> {
        let compute = || async {
            let query = PostQuery::new(PostFilter::All, PostOrder::MostLiked, limit)
                .with_comment_counts()
                .with_tags();
            let summaries = self.posts.list_posts(&query).await?;
            Ok::<_, FeedError>(summaries.iter().map(serialize_post).collect())
        };

        match &self.cache {
            Some(store) => {
                cache::get_or_compute(
                    store.as_ref(),
                    cache::POPULAR_POSTS_KEY,
                    self.cache_ttl,
                    compute,
                )
                .await
            }
            None => compute().await,
        }
    }

    /// Tags annotated with their distinct-post counts, non-increasing in
    /// `posts_count`. The annotation is computed before the limit slices the
    /// listing. Served from the cache when fresh.
    pub async fn popular_tags(&self, limit: usize) -> Result<Vec<SerializedTag>, FeedError> {
        let compute = || async {
            let summaries = self.tags.list_with_counts(limit).await?;
            Ok::<_, FeedError>(summaries.iter().map(serialize_tag).collect())
        };

        match &self.cache {
            Some(store) => {
                cache::get_or_compute(
                    store.as_ref(),
                    cache::POPULAR_TAGS_KEY,
                    self.cache_ttl,
                    compute,
                )
                .await
            }
            None => compute().await,
        }
    }

    /// Annotate a collection with `comments_count` in one batched round-trip,
    /// preserving its order and cardinality exactly.
    pub async fn with_comments_count(
        &self,
        mut posts: Vec<PostSummary>,
    ) -> Result<Vec<PostSummary>, FeedError> {
        if posts.is_empty() {
            return Ok(posts);
        }

        let ids: Vec<_> = posts.iter().map(|summary| summary.post.id).collect();
        let counts: HashMap<_, _> = self.comments.count_for_posts(&ids).await?;

        for summary in &mut posts {
            summary.comments_count = Some(counts.get(&summary.post.id).copied().unwrap_or(0));
        }

        Ok(posts)
    }

    /// Posts associated with the tag, annotated with both counts.
    pub async fn posts_for_tag(
        &self,
        slug: &str,
        limit: usize,
    ) -> Result<Vec<SerializedPost>, FeedError> {
        let slug = normalize_slug(slug).map_err(|_| FeedError::UnknownTag)?;
        let tag = self
            .tags
            .find_by_slug(&slug)
            .await?
            .ok_or(FeedError::UnknownTag)?;

        let query = PostQuery::new(PostFilter::Tag(tag.slug), PostOrder::Freshest, limit)
            .with_comment_counts()
            .with_tags();
        let summaries = self.posts.list_posts(&query).await?;
        Ok(summaries.iter().map(serialize_post).collect())
    }

    /// Context for the home page: popular tags and posts plus one page of the
    /// fresh listing (descending publication time, 1-based page number).
    ///
    /// Page numbers whose offset is not representable render as an empty page
    /// past the end of the listing rather than failing the request.
    pub async fn home_page(&self, page: usize) -> Result<HomePage, FeedError> {
        let page = page.max(1);
        let Some(offset) = (page - 1).checked_mul(self.page_size) else {
            return Ok(HomePage {
                most_popular_posts: self.popular_posts(POPULAR_LIMIT).await?,
                page_posts: Vec::new(),
                popular_tags: self.popular_tags(POPULAR_LIMIT).await?,
                page,
                has_next_page: false,
            });
        };

        let query = PostQuery::new(PostFilter::All, PostOrder::Freshest, self.page_size)
            .offset(offset)
            .with_tags();
        let fresh = self.posts.list_posts(&query).await?;
        let fresh = self.with_comments_count(fresh).await?;

        let total = self.posts.count_posts().await? as usize;
        let has_next_page = offset + fresh.len() < total;

        debug!(page, fresh = fresh.len(), total, "assembled home page");

        Ok(HomePage {
            most_popular_posts: self.popular_posts(POPULAR_LIMIT).await?,
            page_posts: fresh.iter().map(serialize_post).collect(),
            popular_tags: self.popular_tags(POPULAR_LIMIT).await?,
            page,
            has_next_page,
        })
    }

    /// Context for a tag-filtered listing. Unknown slugs surface as
    /// [`FeedError::UnknownTag`].
    pub async fn tag_page(&self, slug: &str) -> Result<TagPage, FeedError> {
        let normalized = normalize_slug(slug).map_err(|_| FeedError::UnknownTag)?;
        let tag = self
            .tags
            .find_by_slug(&normalized)
            .await?
            .ok_or(FeedError::UnknownTag)?;

        Ok(TagPage {
            posts: self.posts_for_tag(&tag.slug, TAG_PAGE_LIMIT).await?,
            tag_title: tag.title,
            most_popular_posts: self.popular_posts(POPULAR_LIMIT).await?,
            popular_tags: self.popular_tags(POPULAR_LIMIT).await?,
        })
    }

    /// Context for a single post page. Unknown slugs surface as
    /// [`FeedError::UnknownPost`].
    pub async fn post_detail(&self, slug: &str) -> Result<PostDetailPage, FeedError> {
        let summary = self
            .posts
            .find_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownPost)?;
        let annotated = self.with_comments_count(vec![summary]).await?;
        let summary = annotated
            .into_iter()
            .next()
            .ok_or(FeedError::UnknownPost)?;

        let comments = self.comments.list_for_post(summary.post.id).await?;

        Ok(PostDetailPage {
            post: serialize_post(&summary),
            comments,
            most_popular_posts: self.popular_posts(POPULAR_LIMIT).await?,
            popular_tags: self.popular_tags(POPULAR_LIMIT).await?,
        })
    }
}
