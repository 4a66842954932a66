//! Canonical records produced at the provider boundary.
//!
//! Response bodies are normalised here so the rest of the crate never
//! branches on the shape the provider happened to return.

use serde::Deserialize;
use serde_json::Value;

/// An account following the source account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerRecord {
    /// Stable decentralised identifier.
    pub did: String,
    /// Current handle, if the provider reported one.
    pub handle: Option<String>,
}

impl FollowerRecord {
    /// Create a record from a DID and optional handle.
    pub fn new(did: impl Into<String>, handle: Option<String>) -> Self {
        Self {
            did: did.into(),
            handle,
        }
    }

    /// Build from one entry of a followers listing.
    ///
    /// Returns `None` when the entry is not an object or has no usable DID.
    pub fn from_json_value(data: &Value) -> Option<Self> {
        let did = data
            .get("did")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|did| !did.is_empty())?;

        let handle = data
            .get("handle")
            .and_then(|v| v.as_str())
            .filter(|h| !h.is_empty())
            .map(String::from);

        Some(Self::new(did, handle))
    }
}

/// One page of `app.bsky.graph.getFollowers`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowersPage {
    /// Followers with a usable DID, in server order.
    pub followers: Vec<FollowerRecord>,
    /// Continuation cursor; `None` when the listing is exhausted.
    pub cursor: Option<String>,
    /// Entries dropped because they carried no DID.
    pub skipped: usize,
}

impl FollowersPage {
    /// Normalise a followers response body.
    ///
    /// Accepts the full lexicon output (`subject`, `followers`, `cursor`) as
    /// well as a bare mapping holding only `followers` and `cursor`. A missing
    /// `followers` array is an empty page and an empty cursor ends the walk.
    pub fn from_json_value(data: &Value) -> Self {
        let entries = data
            .get("followers")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut followers = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for entry in entries {
            match FollowerRecord::from_json_value(entry) {
                Some(record) => followers.push(record),
                None => skipped += 1,
            }
        }

        let cursor = data
            .get("cursor")
            .and_then(|v| v.as_str())
            .filter(|c| !c.is_empty())
            .map(String::from);

        Self {
            followers,
            cursor,
            skipped,
        }
    }
}

/// A post from an author feed, reduced to what liking needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPost {
    /// `at://` URI of the post record.
    pub uri: String,
    /// Content identifier of the post record.
    pub cid: String,
    /// Whether the record replies to another post.
    pub is_reply: bool,
}

impl FeedPost {
    /// Create a non-reply post.
    pub fn new(uri: impl Into<String>, cid: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            cid: cid.into(),
            is_reply: false,
        }
    }

    /// Create a reply post.
    pub fn reply(uri: impl Into<String>, cid: impl Into<String>) -> Self {
        Self {
            is_reply: true,
            ..Self::new(uri, cid)
        }
    }

    /// Repository (author DID) of the post, taken from its URI.
    pub fn author(&self) -> Option<&str> {
        self.uri
            .strip_prefix("at://")
            .and_then(|rest| rest.split('/').next())
            .filter(|repo| !repo.is_empty())
    }

    /// Record key of the post: the last path segment of its URI.
    pub fn post_key(&self) -> &str {
        post_key(&self.uri)
    }
}

/// Last `/`-separated segment of an `at://` URI.
pub fn post_key(uri: &str) -> &str {
    uri.rsplit_once('/').map_or(uri, |(_, key)| key)
}

#[derive(Debug, Deserialize)]
struct AuthorFeedOutput {
    #[serde(default)]
    feed: Vec<FeedViewPost>,
}

#[derive(Debug, Deserialize)]
struct FeedViewPost {
    post: PostView,
}

#[derive(Debug, Deserialize)]
struct PostView {
    uri: String,
    cid: String,
    #[serde(default)]
    record: Value,
}

/// Parse an `app.bsky.feed.getAuthorFeed` body into posts, newest first.
pub fn parse_author_feed(data: Value) -> Result<Vec<FeedPost>, serde_json::Error> {
    let output: AuthorFeedOutput = serde_json::from_value(data)?;
    Ok(output
        .feed
        .into_iter()
        .map(|item| {
            let is_reply = item
                .post
                .record
                .get("reply")
                .is_some_and(|reply| !reply.is_null());
            FeedPost {
                uri: item.post.uri,
                cid: item.post.cid,
                is_reply,
            }
        })
        .collect())
}

/// Output of `com.atproto.server.createSession`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// DID of the logged-in account; likes are written to this repo.
    pub did: String,
    /// Handle of the logged-in account.
    #[serde(default)]
    pub handle: String,
    /// Bearer token for authenticated calls.
    pub access_jwt: String,
}
