//! Liking one follower's recent posts.
//!
//! Post keys (the record key at the end of a post URI) sort lexically in
//! creation order for a given author, so the stored watermark is a plain
//! string and "newer" means "sorts after".
//!
//! Author feeds also carry reposts of other accounts' posts. Only posts
//! whose URI names the follower's own repository are considered.

use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::client::{FeedPost, SocialApi};

/// Tunables for the per-user liker.
#[derive(Debug, Clone, PartialEq)]
pub struct LikerOptions {
    /// How many of the newest posts to inspect per follower.
    pub posts_per_user: u32,
    /// Pause after every successful like.
    pub sleep_per_like: Duration,
}

impl Default for LikerOptions {
    fn default() -> Self {
        Self {
            posts_per_user: 5,
            sleep_per_like: Duration::from_millis(500),
        }
    }
}

/// Result of processing one follower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeOutcome {
    /// Likes issued successfully.
    pub liked: u32,
    /// Newest liked post key, or the previous watermark if nothing was liked.
    pub newest: String,
}

impl LikeOutcome {
    fn unchanged(last_seen: &str) -> Self {
        Self {
            liked: 0,
            newest: last_seen.to_string(),
        }
    }
}

/// Non-reply posts newer than `last_seen`, oldest first.
///
/// An empty `last_seen` means the follower was never processed and every
/// non-reply post qualifies.
pub fn select_candidates(posts: Vec<FeedPost>, last_seen: &str) -> Vec<FeedPost> {
    let mut candidates: Vec<FeedPost> = posts
        .into_iter()
        .filter(|post| !post.is_reply)
        .filter(|post| last_seen.is_empty() || post.post_key() > last_seen)
        .collect();
    candidates.sort_by(|a, b| a.post_key().cmp(b.post_key()));
    candidates
}

/// Like the follower's posts that are newer than `last_seen`.
///
/// Feed and like failures are logged and absorbed; the returned watermark
/// only reflects posts that were liked successfully.
pub fn like_for_user<C: SocialApi + ?Sized>(
    api: &C,
    did: &str,
    last_seen: &str,
    options: &LikerOptions,
) -> LikeOutcome {
    let posts = match api.get_author_feed(did, options.posts_per_user) {
        Ok(posts) => posts,
        Err(e) => {
            warn!("Failed to fetch feed for {did}: {e}");
            return LikeOutcome::unchanged(last_seen);
        }
    };

    let (own, reposts): (Vec<FeedPost>, Vec<FeedPost>) =
        posts.into_iter().partition(|post| post.author() == Some(did));
    if !reposts.is_empty() {
        debug!("{did}: skipping {} repost(s)", reposts.len());
    }

    let candidates = select_candidates(own, last_seen);
    debug!("{did}: {} post(s) to like", candidates.len());

    let mut outcome = LikeOutcome::unchanged(last_seen);
    for post in candidates {
        if let Err(e) = api.like(&post.uri, &post.cid) {
            error!("Failed to like {}: {e}", post.uri);
            continue;
        }

        outcome.liked += 1;
        if post.post_key() > outcome.newest.as_str() {
            outcome.newest = post.post_key().to_string();
        }
        info!("Liked follower post: {}", post.uri);

        if !options.sleep_per_like.is_zero() {
            thread::sleep(options.sleep_per_like);
        }
    }

    outcome
}
