//! Cache key definitions.

use std::time::Duration;

/// Serialized `popular_posts` aggregate.
pub const POPULAR_POSTS_KEY: &str = "feed:popular_posts";

/// Serialized `popular_tags` aggregate.
pub const POPULAR_TAGS_KEY: &str = "feed:popular_tags";

/// Staleness window for both aggregate keys.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
