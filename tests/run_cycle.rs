//! End-to-end run tests against an in-memory network.

mod common;

use std::collections::HashSet;
use std::fs;

use bsky_autolike::runner::{RunController, RunError};
use bsky_autolike::shard::ShardSpec;
use bsky_autolike::state::StateStore;
use common::{bot_config, did, post_uri, FakeNetwork};
use tempfile::TempDir;

#[test]
fn test_first_run_then_idempotent_rerun() {
    let temp = TempDir::new().unwrap();
    let config = bot_config("BOT1", temp.path(), ShardSpec::single());
    let controller = RunController::new(&config);

    let mut network = FakeNetwork::new(5, &["3kc", "3kb", "3ka"]);
    let first = controller.run_once(&mut network).unwrap();
    assert_eq!(first.processed, 5);
    assert_eq!(first.new_likes, 15);
    let saved = fs::read_to_string(config.state_file()).unwrap();

    let mut network = FakeNetwork::new(5, &["3kc", "3kb", "3ka"]);
    let second = controller.run_once(&mut network).unwrap();
    assert_eq!(second.processed, 5);
    assert_eq!(second.new_likes, 0);
    assert!(network.liked().is_empty());
    assert_eq!(fs::read_to_string(config.state_file()).unwrap(), saved);
}

#[test]
fn test_only_new_posts_are_liked_on_later_runs() {
    let temp = TempDir::new().unwrap();
    let config = bot_config("BOT1", temp.path(), ShardSpec::single());
    let controller = RunController::new(&config);

    controller
        .run_once(&mut FakeNetwork::new(2, &["3kb", "3ka"]))
        .unwrap();

    let mut network = FakeNetwork::new(2, &["3kd", "3kc", "3kb"]);
    let summary = controller.run_once(&mut network).unwrap();

    assert_eq!(summary.new_likes, 4);
    let first = did(0);
    assert_eq!(
        network.liked()[..2],
        [post_uri(&first, "3kc"), post_uri(&first, "3kd")]
    );
    let state = StateStore::at(config.state_file()).load();
    assert_eq!(state.last_seen(&first), "3kd");
}

#[test]
fn test_shards_cover_every_follower_exactly_once() {
    let total = 3;
    let mut union = HashSet::new();
    let mut processed = 0;

    for index in 0..total {
        let temp = TempDir::new().unwrap();
        let config = bot_config(
            &format!("BOT{}", index + 1),
            temp.path(),
            ShardSpec::new(total, index).unwrap(),
        );
        let mut network = FakeNetwork::new(10, &["3ka"]);

        let summary = RunController::new(&config).run_once(&mut network).unwrap();

        assert_eq!(summary.total_fetched, 10);
        processed += summary.processed;
        let liked = network.liked_followers();
        assert!(union.is_disjoint(&liked), "shard {index} overlaps");
        union.extend(liked);
    }

    assert_eq!(processed, 10);
    let everyone: HashSet<String> = (0..10).map(did).collect();
    assert_eq!(union, everyone);
}

#[test]
fn test_like_failure_does_not_stop_the_run() {
    let temp = TempDir::new().unwrap();
    let config = bot_config("BOT1", temp.path(), ShardSpec::single());
    let mut network = FakeNetwork::new(3, &["3kb", "3ka"]);
    let unlucky = did(0);
    network.failing_likes.insert(post_uri(&unlucky, "3kb"));

    let summary = RunController::new(&config).run_once(&mut network).unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.new_likes, 5);
    let state = StateStore::at(config.state_file()).load();
    assert_eq!(state.last_seen(&unlucky), "3ka");
    assert_eq!(state.last_seen(&did(2)), "3kb");
}

#[test]
fn test_listing_failure_likes_and_saves_nothing() {
    let temp = TempDir::new().unwrap();
    let config = bot_config("BOT1", temp.path(), ShardSpec::single());
    let mut network = FakeNetwork::new(30, &["3ka"]);
    network.page_size = 10;
    network.fail_page = Some(2);

    let err = RunController::new(&config)
        .run_once(&mut network)
        .unwrap_err();

    assert!(matches!(err, RunError::Followers(_)));
    assert!(network.liked().is_empty());
    assert!(!config.state_file().exists());
}

#[test]
fn test_corrupt_state_is_replaced() {
    let temp = TempDir::new().unwrap();
    let config = bot_config("BOT1", temp.path(), ShardSpec::single());
    fs::write(config.state_file(), "{ not json").unwrap();
    let mut network = FakeNetwork::new(2, &["3ka"]);

    let summary = RunController::new(&config).run_once(&mut network).unwrap();

    assert_eq!(summary.new_likes, 2);
    let state = StateStore::at(config.state_file()).load();
    assert_eq!(state.len(), 2);
}

#[test]
fn test_unknown_state_keys_survive_a_run() {
    let temp = TempDir::new().unwrap();
    let config = bot_config("BOT1", temp.path(), ShardSpec::single());
    fs::write(
        config.state_file(),
        r#"{"followers": {}, "note": "kept by operator"}"#,
    )
    .unwrap();

    RunController::new(&config)
        .run_once(&mut FakeNetwork::new(1, &["3ka"]))
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.state_file()).unwrap()).unwrap();
    assert_eq!(raw["note"], "kept by operator");
    assert_eq!(raw["followers"][did(0)]["last_seen_rkey"], "3ka");
}
