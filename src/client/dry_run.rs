//! Read-only wrapper around a provider.

use tracing::info;

use super::{ClientError, FeedPost, FollowersPage, SocialApi};

/// Delegates every read to the wrapped client but only logs likes.
pub struct DryRun<C> {
    inner: C,
}

impl<C: SocialApi> DryRun<C> {
    /// Wrap `inner`.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Unwrap the inner client.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: SocialApi> SocialApi for DryRun<C> {
    fn login(&mut self, identifier: &str, password: &str) -> Result<(), ClientError> {
        self.inner.login(identifier, password)
    }

    fn resolve_handle(&self, handle: &str) -> Result<String, ClientError> {
        self.inner.resolve_handle(handle)
    }

    fn get_followers(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FollowersPage, ClientError> {
        self.inner.get_followers(actor, limit, cursor)
    }

    fn get_author_feed(&self, actor: &str, limit: u32) -> Result<Vec<FeedPost>, ClientError> {
        self.inner.get_author_feed(actor, limit)
    }

    fn like(&self, uri: &str, _cid: &str) -> Result<(), ClientError> {
        info!("[dry-run] Would like {uri}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeApi;

    #[test]
    fn test_dry_run_never_likes() {
        let mut fake = FakeApi::default();
        fake.feeds.insert(
            "did:plc:a".into(),
            vec![FeedPost::new("at://did:plc:a/app.bsky.feed.post/3ka", "c")],
        );
        let dry = DryRun::new(fake);

        let posts = dry.get_author_feed("did:plc:a", 5).unwrap();
        dry.like(&posts[0].uri, &posts[0].cid).unwrap();

        assert!(dry.into_inner().liked().is_empty());
    }

    #[test]
    fn test_dry_run_forwards_login() {
        let mut dry = DryRun::new(FakeApi::default());
        dry.login("bot", "pw").unwrap();
        assert!(dry.into_inner().logged_in);
    }
}
