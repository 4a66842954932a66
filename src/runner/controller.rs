//! Run controller.
//!
//! Drives a single autolike pass for one bot and, through
//! [`RunController::run`], the retried sequence of passes a scheduled
//! invocation makes.

use std::time::{Duration, Instant};

use tracing::{error, info, info_span, warn};

use crate::client::{ClientError, FollowerRecord, SocialApi};
use crate::config::BotConfig;
use crate::followers;
use crate::liker::like_for_user;
use crate::logging::SimpleLog;
use crate::state::StateStore;

use super::{run_with_retry, RetryExhausted, RetryPolicy, RunError, RunSummary};

/// Runs autolike passes for one bot.
pub struct RunController<'a> {
    config: &'a BotConfig,
    simple_log: SimpleLog,
    dry_run: bool,
}

impl<'a> RunController<'a> {
    /// Create a controller for `config`'s bot.
    pub fn new(config: &'a BotConfig) -> Self {
        Self {
            config,
            simple_log: SimpleLog::new(config.simple_log()),
            dry_run: false,
        }
    }

    /// Skip saving state. Pair with a [`DryRun`](crate::client::DryRun) client.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one pass against `api`.
    ///
    /// Nothing is persisted unless every follower page was listed; the state
    /// file is written once, after all followers were processed.
    pub fn run_once<C: SocialApi + ?Sized>(&self, api: &mut C) -> Result<RunSummary, RunError> {
        let config = self.config;
        let span = info_span!("bot", id = %config.bot_id);
        let _enter = span.enter();
        let started = Instant::now();

        let (identifier, password) = config.credentials()?;
        api.login(identifier, password).map_err(RunError::Auth)?;

        let source_did =
            followers::resolve_source(&*api, &config.source).map_err(|error| RunError::Resolve {
                source_handle: config.source.clone(),
                error,
            })?;

        let store = StateStore::open(&config.workdir)?;
        let mut state = store.load();

        let budget = config.shard.fetch_budget(config.max_followers_per_run);
        let all: Vec<FollowerRecord> = followers::enumerate(&*api, &source_did, budget)
            .collect::<Result<_, _>>()
            .map_err(RunError::Followers)?;
        info!(
            "Fetched {} follower(s) of {}, shard {}",
            all.len(),
            config.source,
            config.shard
        );

        let mut summary = RunSummary {
            bot_id: config.bot_id.clone(),
            source: config.source.clone(),
            total_fetched: all.len(),
            scanned: 0,
            processed: 0,
            new_likes: 0,
            shard: config.shard,
            saved: false,
        };

        for (idx, follower) in all.iter().enumerate() {
            if !config.shard.owns(idx) {
                continue;
            }
            summary.scanned += 1;

            let last_seen = state.last_seen(&follower.did).to_string();
            let outcome = like_for_user(&*api, &follower.did, &last_seen, &config.liker);
            summary.new_likes += outcome.liked;
            summary.processed += 1;

            state.advance(&follower.did, &outcome.newest);
        }

        if self.dry_run {
            info!("Dry run: not saving {}", store.path().display());
        } else {
            store.save(&state)?;
            summary.saved = true;
        }

        info!("{summary} ({:.1}s)", started.elapsed().as_secs_f64());
        if self.dry_run {
            self.simple_log
                .append(&format!("[dry-run] {}", summary.simple_line()));
        } else {
            self.simple_log.append(&summary.simple_line());
        }
        Ok(summary)
    }

    /// Run passes with fresh clients from `connect` until one succeeds.
    ///
    /// Each failure is written to both logs before the policy's pause.
    pub fn run<C, K, S>(
        &self,
        policy: &RetryPolicy,
        sleep: S,
        mut connect: K,
    ) -> Result<RunSummary, RetryExhausted<RunError>>
    where
        C: SocialApi,
        K: FnMut() -> Result<C, ClientError>,
        S: FnMut(Duration),
    {
        let bot_id = self.config.bot_id.as_str();
        run_with_retry(
            policy,
            sleep,
            |attempt, e: &RunError| {
                let _enter = info_span!("bot", id = %bot_id).entered();
                error!("Run error (attempt {attempt}/{}): {e}", policy.max_attempts);
                self.simple_log.append(&format!("{bot_id} | Run error: {e}"));
                if attempt < policy.max_attempts {
                    warn!("Retrying in {}s", policy.delay_after(attempt).as_secs());
                }
            },
            |_| {
                let mut api = connect().map_err(RunError::Connect)?;
                self.run_once(&mut api)
            },
        )
    }
}
