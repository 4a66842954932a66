//! Follower enumeration for the source account.
//!
//! Followers are walked page by page through `app.bsky.graph.getFollowers`.
//! Every call to [`enumerate`] starts a fresh walk from the first page, so
//! shard assignment depends on the provider returning a stable order.

use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::client::{ClientError, FollowerRecord, SocialApi};

/// Maximum page size accepted by `getFollowers`.
pub const PAGE_LIMIT: usize = 100;

/// Maximum length of a handle.
const MAX_HANDLE_LEN: usize = 253;

static HANDLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$",
    )
    .expect("HANDLE_PATTERN regex is valid")
});

/// Strip the `@` and `at://` prefixes people paste in front of handles.
pub fn normalize_handle(input: &str) -> &str {
    let input = input.trim();
    let input = input.strip_prefix("at://").unwrap_or(input);
    input.strip_prefix('@').unwrap_or(input)
}

/// Check that `handle` looks like a domain handle (`alice.bsky.social`).
pub fn validate_handle_format(handle: &str) -> Result<(), ClientError> {
    let invalid = |reason| ClientError::InvalidHandle {
        handle: handle.to_string(),
        reason,
    };

    if handle.is_empty() {
        return Err(invalid("handle is empty"));
    }
    if handle.len() > MAX_HANDLE_LEN {
        return Err(invalid("handle is longer than 253 characters"));
    }
    if !handle.contains('.') {
        return Err(invalid("handle must be a domain such as user.bsky.social"));
    }
    if !HANDLE_PATTERN.is_match(handle) {
        return Err(invalid("handle contains invalid characters"));
    }
    Ok(())
}

/// Resolve the source account to a DID.
///
/// DIDs pass through untouched; handles are normalised, validated and
/// resolved once through the provider.
pub fn resolve_source<C: SocialApi + ?Sized>(api: &C, source: &str) -> Result<String, ClientError> {
    let source = source.trim();
    if source.starts_with("did:") {
        return Ok(source.to_string());
    }

    let handle = normalize_handle(source);
    validate_handle_format(handle)?;
    let did = api.resolve_handle(handle)?;
    debug!("Resolved {handle} to {did}");
    Ok(did)
}

/// Lazily walk up to `max_count` followers of `actor_did`.
pub fn enumerate<'a, C: SocialApi + ?Sized>(
    api: &'a C,
    actor_did: &str,
    max_count: usize,
) -> Followers<'a, C> {
    Followers {
        api,
        actor: actor_did.to_string(),
        remaining: max_count,
        cursor: None,
        buffer: VecDeque::new(),
        seen: HashSet::new(),
        exhausted: false,
    }
}

/// Iterator over the followers of one account.
///
/// Yields each DID at most once. A page error is yielded once and ends the
/// walk.
pub struct Followers<'a, C: SocialApi + ?Sized> {
    api: &'a C,
    actor: String,
    remaining: usize,
    cursor: Option<String>,
    buffer: VecDeque<FollowerRecord>,
    seen: HashSet<String>,
    exhausted: bool,
}

impl<C: SocialApi + ?Sized> Followers<'_, C> {
    fn fetch_page(&mut self) -> Result<(), ClientError> {
        let limit = self.remaining.min(PAGE_LIMIT) as u32;
        let page = self
            .api
            .get_followers(&self.actor, limit, self.cursor.as_deref())?;

        if page.skipped > 0 {
            debug!("Skipped {} follower entries without a DID", page.skipped);
        }
        // A page with no entries at all cannot make progress.
        if page.followers.is_empty() && page.skipped == 0 {
            self.exhausted = true;
        }

        self.buffer.extend(page.followers);
        self.cursor = page.cursor;
        if self.cursor.is_none() {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl<C: SocialApi + ?Sized> Iterator for Followers<'_, C> {
    type Item = Result<FollowerRecord, ClientError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining == 0 {
                return None;
            }

            if let Some(record) = self.buffer.pop_front() {
                if !self.seen.insert(record.did.clone()) {
                    continue;
                }
                self.remaining -= 1;
                return Some(Ok(record));
            }

            if self.exhausted {
                return None;
            }

            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
    }
}
