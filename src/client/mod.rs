//! Social-network provider binding.
//!
//! The core only talks to the provider through [`SocialApi`]. The real
//! implementation is [`XrpcClient`], a blocking AT Protocol XRPC client;
//! [`DryRun`] wraps any implementation and turns likes into log lines.

pub mod dry_run;
pub mod models;
pub mod xrpc;

pub use dry_run::DryRun;
pub use models::{post_key, FeedPost, FollowerRecord, FollowersPage, Session};
pub use xrpc::XrpcClient;

/// Error type for provider calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider answered with a non-success status.
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        /// XRPC method that failed.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// XRPC error name, e.g. `AuthenticationRequired`.
        error: Option<String>,
        /// Human-readable message from the provider.
        message: String,
    },
    /// The response body did not have the expected shape.
    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode {
        /// XRPC method whose response failed to decode.
        endpoint: String,
        /// Decoder message.
        reason: String,
    },
    /// An authenticated call was made before logging in.
    #[error("Not logged in")]
    NotAuthenticated,
    /// A handle that cannot be resolved because it is malformed.
    #[error("Invalid handle {handle:?}: {reason}")]
    InvalidHandle {
        /// The rejected input.
        handle: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl ClientError {
    /// HTTP status of a provider error, if there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Capabilities the autolike core needs from the provider.
pub trait SocialApi {
    /// Open a session for the bot identity.
    fn login(&mut self, identifier: &str, password: &str) -> Result<(), ClientError>;

    /// Resolve a handle such as `alice.bsky.social` to its DID.
    fn resolve_handle(&self, handle: &str) -> Result<String, ClientError>;

    /// Fetch one page of the accounts following `actor`.
    ///
    /// `limit` is at most 100.
    fn get_followers(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FollowersPage, ClientError>;

    /// Fetch up to `limit` of `actor`'s most recent posts, newest first,
    /// without pinned posts.
    fn get_author_feed(&self, actor: &str, limit: u32) -> Result<Vec<FeedPost>, ClientError>;

    /// Like the post identified by `uri` and `cid`.
    fn like(&self, uri: &str, cid: &str) -> Result<(), ClientError>;
}

impl<T: SocialApi + ?Sized> SocialApi for Box<T> {
    fn login(&mut self, identifier: &str, password: &str) -> Result<(), ClientError> {
        (**self).login(identifier, password)
    }

    fn resolve_handle(&self, handle: &str) -> Result<String, ClientError> {
        (**self).resolve_handle(handle)
    }

    fn get_followers(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FollowersPage, ClientError> {
        (**self).get_followers(actor, limit, cursor)
    }

    fn get_author_feed(&self, actor: &str, limit: u32) -> Result<Vec<FeedPost>, ClientError> {
        (**self).get_author_feed(actor, limit)
    }

    fn like(&self, uri: &str, cid: &str) -> Result<(), ClientError> {
        (**self).like(uri, cid)
    }
}
