//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use bsky_autolike::client::{ClientError, FeedPost, FollowerRecord, FollowersPage, SocialApi};
use bsky_autolike::config::{BotConfig, Secret};
use bsky_autolike::liker::LikerOptions;
use bsky_autolike::shard::ShardSpec;

pub const SOURCE_HANDLE: &str = "im.from.yt";
pub const SOURCE_DID: &str = "did:plc:source";

/// In-memory stand-in for the social network.
#[derive(Default)]
pub struct FakeNetwork {
    pub followers: Vec<String>,
    pub page_size: usize,
    pub feeds: HashMap<String, Vec<FeedPost>>,
    pub failing_likes: HashSet<String>,
    /// Fail the follower listing on this (0-based) page.
    pub fail_page: Option<usize>,
    pub pages_served: Cell<usize>,
    pub likes: RefCell<Vec<String>>,
}

pub fn did(i: usize) -> String {
    format!("did:plc:follower{i:03}")
}

pub fn post_uri(did: &str, rkey: &str) -> String {
    format!("at://{did}/app.bsky.feed.post/{rkey}")
}

impl FakeNetwork {
    /// `count` followers, each with the given post keys (newest first).
    pub fn new(count: usize, rkeys: &[&str]) -> Self {
        let followers: Vec<String> = (0..count).map(did).collect();
        let feeds = followers
            .iter()
            .map(|d| {
                let posts = rkeys
                    .iter()
                    .map(|k| FeedPost::new(post_uri(d, k), format!("cid-{k}")))
                    .collect();
                (d.clone(), posts)
            })
            .collect();
        Self {
            followers,
            page_size: 100,
            feeds,
            ..Default::default()
        }
    }

    pub fn liked(&self) -> Vec<String> {
        self.likes.borrow().clone()
    }

    /// Followers that received at least one like.
    pub fn liked_followers(&self) -> HashSet<String> {
        self.likes
            .borrow()
            .iter()
            .filter_map(|uri| uri.strip_prefix("at://"))
            .filter_map(|rest| rest.split('/').next())
            .map(String::from)
            .collect()
    }
}

fn failure(endpoint: &str, status: u16) -> ClientError {
    ClientError::Status {
        endpoint: endpoint.to_string(),
        status,
        error: Some("InternalServerError".to_string()),
        message: "injected failure".to_string(),
    }
}

impl SocialApi for FakeNetwork {
    fn login(&mut self, _identifier: &str, _password: &str) -> Result<(), ClientError> {
        Ok(())
    }

    fn resolve_handle(&self, handle: &str) -> Result<String, ClientError> {
        if handle == SOURCE_HANDLE {
            Ok(SOURCE_DID.to_string())
        } else {
            Err(failure("com.atproto.identity.resolveHandle", 400))
        }
    }

    fn get_followers(
        &self,
        _actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FollowersPage, ClientError> {
        let page = self.pages_served.get();
        self.pages_served.set(page + 1);
        if self.fail_page == Some(page) {
            return Err(failure("app.bsky.graph.getFollowers", 502));
        }

        let start = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        let end = (start + self.page_size.min(limit as usize)).min(self.followers.len());
        Ok(FollowersPage {
            followers: self.followers[start..end]
                .iter()
                .map(|d| FollowerRecord::new(d.clone(), None))
                .collect(),
            cursor: (end < self.followers.len()).then(|| end.to_string()),
            skipped: 0,
        })
    }

    fn get_author_feed(&self, actor: &str, limit: u32) -> Result<Vec<FeedPost>, ClientError> {
        let mut posts = self.feeds.get(actor).cloned().unwrap_or_default();
        posts.truncate(limit as usize);
        Ok(posts)
    }

    fn like(&self, uri: &str, _cid: &str) -> Result<(), ClientError> {
        if self.failing_likes.contains(uri) {
            return Err(failure("com.atproto.repo.createRecord", 500));
        }
        self.likes.borrow_mut().push(uri.to_string());
        Ok(())
    }
}

/// Configuration for a bot working in `workdir`.
pub fn bot_config(bot_id: &str, workdir: &Path, shard: ShardSpec) -> BotConfig {
    BotConfig {
        bot_id: bot_id.to_string(),
        source: SOURCE_HANDLE.to_string(),
        service: "http://127.0.0.1:9".to_string(),
        shard,
        handle: Some(format!("{}.bots.test", bot_id.to_lowercase())),
        identifier: Some(format!("{}.bots.test", bot_id.to_lowercase())),
        password: Some(Secret::new("app-password")),
        workdir: workdir.to_path_buf(),
        max_followers_per_run: 50,
        liker: LikerOptions {
            posts_per_user: 5,
            sleep_per_like: Duration::ZERO,
        },
    }
}
