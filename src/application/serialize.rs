//! Presentation serializer.
//!
//! Flattens annotated projections into plain nested structures of primitives.
//! The output is template-agnostic and fully serializable, which is what
//! allows the read-path cache to store it: cache entries hold this data, not
//! live database rows.
//!
//! A missing annotation is recovered locally — `comments_amount` and
//! `posts_with_tag` default to zero — and never surfaces to the caller.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;

use crate::domain::entities::{PostSummary, TagSummary};

const TEASER_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedTag {
    pub title: String,
    pub slug: String,
    pub posts_with_tag: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedPost {
    pub title: String,
    pub teaser_text: String,
    pub author: String,
    pub comments_amount: i64,
    pub likes_amount: i64,
    pub image_url: Option<String>,
    pub published_at: String,
    pub slug: String,
    pub tags: Vec<SerializedTag>,
    pub first_tag_title: Option<String>,
}

/// Serialize an annotated post.
///
/// Requires the tag collection to already be loaded; never triggers further
/// lookups. A post with zero tags serializes `first_tag_title` as `None`, a
/// post without an image serializes `image_url` as `None`.
pub fn serialize_post(summary: &PostSummary) -> SerializedPost {
    let tags: Vec<SerializedTag> = summary.tags.iter().map(serialize_tag).collect();
    let first_tag_title = tags.first().map(|tag| tag.title.clone());

    SerializedPost {
        title: summary.post.title.clone(),
        teaser_text: teaser(&summary.post.body),
        author: summary.author_username.clone(),
        comments_amount: summary.comments_count.unwrap_or(0),
        likes_amount: summary.likes_count,
        image_url: summary.post.image_url.clone(),
        published_at: summary
            .post
            .published_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| summary.post.published_at.to_string()),
        slug: summary.post.slug.clone(),
        tags,
        first_tag_title,
    }
}

/// Serialize a tag, defaulting the count when the annotation is absent.
pub fn serialize_tag(summary: &TagSummary) -> SerializedTag {
    SerializedTag {
        title: summary.tag.title.clone(),
        slug: summary.tag.slug.clone(),
        posts_with_tag: summary.posts_count.unwrap_or(0),
    }
}

fn teaser(body: &str) -> String {
    body.chars().take(TEASER_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::domain::entities::{PostRecord, TagRecord};

    fn sample_summary() -> PostSummary {
        PostSummary {
            post: PostRecord {
                id: Uuid::new_v4(),
                slug: "hello-world".to_string(),
                title: "Hello, world".to_string(),
                body: "Body text".to_string(),
                image_url: None,
                published_at: datetime!(2024-03-01 12:00 UTC),
                author_id: Uuid::new_v4(),
            },
            author_username: "lena".to_string(),
            likes_count: 0,
            comments_count: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn post_with_no_tags_no_image_no_counts() {
        let serialized = serialize_post(&sample_summary());

        assert_eq!(serialized.likes_amount, 0);
        assert_eq!(serialized.comments_amount, 0);
        assert!(serialized.tags.is_empty());
        assert_eq!(serialized.first_tag_title, None);
        assert_eq!(serialized.image_url, None);
        assert_eq!(serialized.slug, "hello-world");
        assert_eq!(serialized.published_at, "2024-03-01T12:00:00Z");
    }

    #[test]
    fn serialization_is_idempotent() {
        let summary = sample_summary();
        assert_eq!(serialize_post(&summary), serialize_post(&summary));
    }

    #[test]
    fn teaser_is_truncated_at_200_characters() {
        let mut summary = sample_summary();
        summary.post.body = "x".repeat(500);
        assert_eq!(serialize_post(&summary).teaser_text.chars().count(), 200);
    }

    #[test]
    fn teaser_respects_multibyte_boundaries() {
        let mut summary = sample_summary();
        summary.post.body = "é".repeat(300);
        let teaser = serialize_post(&summary).teaser_text;
        assert_eq!(teaser.chars().count(), 200);
        assert!(teaser.chars().all(|ch| ch == 'é'));
    }

    #[test]
    fn first_tag_title_comes_from_the_loaded_order() {
        let mut summary = sample_summary();
        summary.tags = vec![
            TagSummary::annotated(
                TagRecord {
                    id: Uuid::new_v4(),
                    slug: "python".to_string(),
                    title: "Python".to_string(),
                },
                3,
            ),
            TagSummary {
                tag: TagRecord {
                    id: Uuid::new_v4(),
                    slug: "go".to_string(),
                    title: "Go".to_string(),
                },
                posts_count: None,
            },
        ];

        let serialized = serialize_post(&summary);
        assert_eq!(serialized.first_tag_title.as_deref(), Some("Python"));
        assert_eq!(serialized.tags[0].posts_with_tag, 3);
        // Missing annotation recovers to zero rather than failing.
        assert_eq!(serialized.tags[1].posts_with_tag, 0);
    }
}
