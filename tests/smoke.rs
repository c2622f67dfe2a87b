//! Smoke tests: end-to-end validation from raw comment events to served
//! rankings. These are the gate between "code compiles" and "system works."

use async_trait::async_trait;
use std::collections::HashMap;
use tempfile::TempDir;

use botranks::api::Service;
use botranks::classify::VoteKind;
use botranks::config::Config;
use botranks::error::Error;
use botranks::feed::{CommentEvent, CommentSource, ParentInfo};
use botranks::ingest::ingest_batch;
use botranks::store::{Vote, VoteStore};
use botranks::window::now_ts;

fn open_store(dir: &TempDir) -> VoteStore {
    let path = dir.path().join("votes.db");
    let mut store = VoteStore::open(path.to_str().unwrap()).unwrap();
    store.init().unwrap();
    store
}

fn vote(event_id: &str, actor: &str, kind: VoteKind, ts: i64, sub: &str) -> Vote {
    Vote {
        actor: actor.to_string(),
        event_id: event_id.to_string(),
        subreddit: Some(sub.to_string()),
        timestamp: ts,
        kind,
        voter: format!("voter_{}", event_id),
    }
}

/// Seed the store with a small mixed population:
/// - helper_bot: 8 good / 2 bad, karma present
/// - spam_bot:   1 good / 4 bad, karma present
/// - tiny_bot:   1 good / 0 bad (below the vote floor)
/// - ghost_bot:  5 good, no karma row
fn seed(store: &mut VoteStore) {
    let now = now_ts();
    for i in 0..8 {
        store.insert_vote(&vote(&format!("h-g{}", i), "helper_bot", VoteKind::Good, now - 1_000 - i, "askreddit")).unwrap();
    }
    for i in 0..2 {
        store.insert_vote(&vote(&format!("h-b{}", i), "helper_bot", VoteKind::Bad, now - 2_000 - i, "askreddit")).unwrap();
    }
    store.insert_vote(&vote("s-g0", "spam_bot", VoteKind::Good, now - 500, "pics")).unwrap();
    for i in 0..4 {
        store.insert_vote(&vote(&format!("s-b{}", i), "spam_bot", VoteKind::Bad, now - 600 - i, "pics")).unwrap();
    }
    store.insert_vote(&vote("t-g0", "tiny_bot", VoteKind::Good, now - 300, "askreddit")).unwrap();
    for i in 0..5 {
        store.insert_vote(&vote(&format!("gh-g{}", i), "ghost_bot", VoteKind::Good, now - 400 - i, "pics")).unwrap();
    }
    store.upsert_actor_karma("helper_bot", 10, 1_000).unwrap();
    store.upsert_actor_karma("spam_bot", 3, 40).unwrap();
    store.upsert_actor_karma("tiny_bot", 1, 2).unwrap();
}

fn seeded_service(dir: &TempDir) -> Service {
    let mut store = open_store(dir);
    seed(&mut store);
    Service::new(store, &Config::from_env())
}

// ---------------------------------------------------------------------------
// S01: Ranking table is dense, ordered, and filtered
// ---------------------------------------------------------------------------
#[test]
fn s01_ranks_dense_ordered_filtered() {
    let dir = TempDir::new().unwrap();
    let svc = seeded_service(&dir);
    let ranks = svc.ranks("1y", "top", None).unwrap();

    // tiny_bot is below the vote floor, ghost_bot has no karma row.
    let names: Vec<&str> = ranks.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["helper_bot", "spam_bot"]);

    let rank_nums: Vec<u32> = ranks.iter().map(|r| r.rank).collect();
    assert_eq!(rank_nums, vec![1, 2]);
    for pair in ranks.windows(2) {
        assert!(pair[0].score >= pair[1].score, "ranking not ordered by score");
    }
    assert_eq!(ranks[0].votes.good, 8);
    assert_eq!(ranks[0].votes.bad, 2);
    assert_eq!(ranks[0].karma.link, 10);
}

// ---------------------------------------------------------------------------
// S02: Single-actor lookup keeps global standing; absent actor is NotFound
// ---------------------------------------------------------------------------
#[test]
fn s02_single_actor_rank_is_global() {
    let dir = TempDir::new().unwrap();
    let svc = seeded_service(&dir);
    let entry = svc.rank_of("spam_bot").unwrap();
    assert_eq!(entry.rank, 2, "filtered lookup must report unfiltered rank");
    assert!(matches!(svc.rank_of("nobody"), Err(Error::NotFound(_))));
    assert!(matches!(svc.rank_of("tiny_bot"), Err(Error::NotFound(_))));
}

// ---------------------------------------------------------------------------
// S03: Duplicate event ids are absorbed, first writer wins
// ---------------------------------------------------------------------------
#[test]
fn s03_duplicate_insert_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    let now = now_ts();
    let first = vote("dup-1", "helper_bot", VoteKind::Good, now, "askreddit");
    let mut second = first.clone();
    second.voter = "someone_else".to_string();
    assert!(store.insert_vote(&first).unwrap());
    assert!(!store.insert_vote(&second).unwrap());
    let votes = store.scan_votes(0).unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].voter, "voter_dup-1");
}

// ---------------------------------------------------------------------------
// S04: Calendar buckets cover the full domain for every window unit
// ---------------------------------------------------------------------------
#[test]
fn s04_graph_domains_complete() {
    let dir = TempDir::new().unwrap();
    let svc = seeded_service(&dir);
    for (window, expected) in [("1d", 24), ("1h", 24), ("1w", 7), ("1M", 31), ("1y", 12)] {
        let graph = svc.graph(window).unwrap();
        assert_eq!(graph.labels.len(), expected, "window {}", window);
        assert_eq!(graph.votes.len(), expected, "window {}", window);
    }
    let hourly = svc.graph("1d").unwrap();
    assert_eq!(hourly.labels.first().map(String::as_str), Some("0"));
    assert_eq!(hourly.labels.last().map(String::as_str), Some("23"));
}

// ---------------------------------------------------------------------------
// S05: Subreddit and mover leaderboards
// ---------------------------------------------------------------------------
#[test]
fn s05_leaderboards() {
    let dir = TempDir::new().unwrap();
    let svc = seeded_service(&dir);

    let subs = svc.subs("1y", None).unwrap();
    // askreddit: 8+2+1 = 11 votes; pics: 1+4+5 = 10 votes.
    assert_eq!(subs[0].name, "askreddit");
    assert_eq!(subs[0].votes.good + subs[0].votes.bad, 11);
    assert_eq!(subs[1].name, "pics");

    let movers = svc.top_actors("1y", Some(2)).unwrap();
    assert_eq!(movers.len(), 2);
    // ghost_bot: (5+1)/(0+1) = 6.0 — no karma row needed for this widget.
    assert_eq!(movers[0].name, "ghost_bot");
    assert_eq!(movers[0].ratio, 6.0);
}

// ---------------------------------------------------------------------------
// S06: Scalar stats line up with the seeded population
// ---------------------------------------------------------------------------
#[test]
fn s06_stats_consistent() {
    let dir = TempDir::new().unwrap();
    let svc = seeded_service(&dir);
    let all = svc.stats("1y", None).unwrap();
    assert_eq!(all.votes.count, 21);
    // helper_bot and spam_bot clear the floor with karma rows.
    assert_eq!(all.actors.count, 2);
    assert!(all.votes.latest.is_some());
    let good = svc.stats("1y", Some("G")).unwrap();
    let bad = svc.stats("1y", Some("B")).unwrap();
    assert_eq!(good.votes.count + bad.votes.count, all.votes.count);
}

// ---------------------------------------------------------------------------
// S07: Badge payload for a ranked actor
// ---------------------------------------------------------------------------
#[test]
fn s07_badge() {
    let dir = TempDir::new().unwrap();
    let svc = seeded_service(&dir);
    let badge = svc.badge("helper_bot").unwrap();
    assert_eq!(badge.label, "helper_bot");
    assert_eq!(badge.message, "1");
    assert_eq!(badge.color, "orange");
}

// ---------------------------------------------------------------------------
// S08: Full ingest path — raw comments in, rankings out
// ---------------------------------------------------------------------------
struct ScriptedSource {
    parents: HashMap<String, ParentInfo>,
}

#[async_trait]
impl CommentSource for ScriptedSource {
    async fn fetch_recent(&self, _since: i64, _limit: u32) -> anyhow::Result<Vec<CommentEvent>> {
        Ok(Vec::new())
    }

    async fn resolve_parent(&self, parent_id: &str) -> anyhow::Result<Option<ParentInfo>> {
        Ok(self.parents.get(parent_id).cloned())
    }
}

#[tokio::test]
async fn s08_ingest_to_rankings() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    let now = now_ts();

    let mut parents = HashMap::new();
    parents.insert(
        "t1_helper".to_string(),
        ParentInfo { author: "helper_bot".to_string(), link_karma: 7, comment_karma: 77 },
    );
    let source = ScriptedSource { parents };

    let mut events = Vec::new();
    for i in 0..4 {
        events.push(CommentEvent {
            id: format!("c{}", i),
            body: "Good bot".to_string(),
            parent_id: "t1_helper".to_string(),
            subreddit: Some("askreddit".to_string()),
            author: format!("fan{}", i),
            created_utc: now - 100 - i,
        });
    }
    events.push(CommentEvent {
        id: "c-noise".to_string(),
        body: "interesting take".to_string(),
        parent_id: "t1_helper".to_string(),
        subreddit: Some("askreddit".to_string()),
        author: "passerby".to_string(),
        created_utc: now - 50,
    });
    // Replayed delivery of an already-seen event.
    events.push(events[0].clone());

    let summary = ingest_batch(&mut store, &source, &events).await.unwrap();
    assert_eq!(summary.inserted, 4);
    assert_eq!(summary.duplicates, 1);

    let svc = Service::new(store, &Config::from_env());
    let ranks = svc.ranks("1y", "top", None).unwrap();
    assert_eq!(ranks.len(), 1);
    assert_eq!(ranks[0].name, "helper_bot");
    assert_eq!(ranks[0].votes.good, 4);
    assert_eq!(ranks[0].karma.comment, 77);
}

// ---------------------------------------------------------------------------
// S09: Sort modes stay within the same population but reorder it
// ---------------------------------------------------------------------------
#[test]
fn s09_sort_modes() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    let now = now_ts();
    // divisive: perfectly split votes; beloved: lopsided and larger.
    for i in 0..10 {
        store.insert_vote(&vote(&format!("d-g{}", i), "divisive", VoteKind::Good, now - 1_000 - i, "pics")).unwrap();
        store.insert_vote(&vote(&format!("d-b{}", i), "divisive", VoteKind::Bad, now - 1_000 - i, "pics")).unwrap();
    }
    for i in 0..30 {
        store.insert_vote(&vote(&format!("b-g{}", i), "beloved", VoteKind::Good, now - 1_000 - i, "pics")).unwrap();
    }
    store.insert_vote(&vote("b-b0", "beloved", VoteKind::Bad, now - 1_000, "pics")).unwrap();
    store.upsert_actor_karma("divisive", 1, 1).unwrap();
    store.upsert_actor_karma("beloved", 1, 1).unwrap();
    let svc = Service::new(store, &Config::from_env());

    let top = svc.ranks("1y", "top", None).unwrap();
    assert_eq!(top[0].name, "beloved");
    let contro = svc.ranks("1y", "controversial", None).unwrap();
    assert_eq!(contro[0].name, "divisive");
    // Same population either way, and the reported score is the Wilson
    // score in both orderings.
    assert_eq!(top.len(), contro.len());
    let beloved_contro = contro.iter().find(|r| r.name == "beloved").unwrap();
    assert_eq!(beloved_contro.score, top[0].score);
}
