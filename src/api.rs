//! Presentation adapter: shapes aggregation output into the response
//! payloads consumed by callers, behind short-TTL caches.
//!
//! The HTTP layer itself lives outside this crate; everything here is
//! transport-agnostic and serializes with serde.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{QueryKey, TtlCache};
use crate::classify::VoteKind;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{json_log_at, obj, v_str, Level};
use crate::rank::{GraphBucket, RankedActor, Ranker, SortMode};
use crate::store::VoteStore;
use crate::window::{Window, WindowUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTotals {
    pub good: u64,
    pub bad: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaTotals {
    pub link: i64,
    pub comment: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub rank: u32,
    pub name: String,
    pub score: f64,
    pub votes: VoteTotals,
    pub karma: KarmaTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubEntry {
    pub name: String,
    pub votes: VoteTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopActorEntry {
    pub name: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub labels: Vec<String>,
    pub votes: Vec<VoteTotals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteStats {
    pub count: u64,
    pub latest: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStats {
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub votes: VoteStats,
    pub actors: ActorStats,
}

/// shields.io endpoint payload for an actor's rank badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    pub label: String,
    pub message: String,
    pub color: String,
}

fn rank_entry(r: RankedActor) -> RankEntry {
    RankEntry {
        rank: r.rank,
        name: r.actor,
        score: r.score,
        votes: VoteTotals { good: r.good, bad: r.bad },
        karma: KarmaTotals { link: r.link_karma, comment: r.comment_karma },
    }
}

fn graph_shape(buckets: Vec<GraphBucket>) -> Graph {
    let mut graph = Graph { labels: Vec::with_capacity(buckets.len()), votes: Vec::with_capacity(buckets.len()) };
    for b in buckets {
        graph.labels.push(b.label);
        graph.votes.push(VoteTotals { good: b.good, bad: b.bad });
    }
    graph
}

/// Read-side facade over the store: aggregation behind per-operation TTL
/// caches. Each query runs against an independent snapshot; results may
/// trail the newest committed write by up to the TTL.
pub struct Service {
    store: VoteStore,
    ranker: Ranker,
    ranks_cache: TtlCache<QueryKey, Vec<RankEntry>>,
    subs_cache: TtlCache<QueryKey, Vec<SubEntry>>,
    top_cache: TtlCache<QueryKey, Vec<TopActorEntry>>,
    graph_cache: TtlCache<QueryKey, Graph>,
    stats_cache: TtlCache<QueryKey, Stats>,
}

fn cached<V: Clone>(
    cache: &TtlCache<QueryKey, V>,
    key: QueryKey,
    compute: impl FnOnce() -> Result<V>,
) -> Result<V> {
    if let Some(hit) = cache.get(&key) {
        return Ok(hit);
    }
    json_log_at(
        Level::Debug,
        "cache",
        obj(&[("op", v_str(key.op)), ("status", v_str("miss"))]),
    );
    let value = compute()?;
    cache.put(key, value.clone());
    Ok(value)
}

impl Service {
    pub fn new(store: VoteStore, cfg: &Config) -> Self {
        let ttl = Duration::from_secs(cfg.cache_ttl_secs);
        let default_window = Window::parse(&cfg.default_window)
            .unwrap_or(Window { length: 1, unit: WindowUnit::Years });
        Self {
            store,
            ranker: Ranker::new(default_window, cfg.minvotes),
            ranks_cache: TtlCache::new(ttl),
            subs_cache: TtlCache::new(ttl),
            top_cache: TtlCache::new(ttl),
            graph_cache: TtlCache::new(ttl),
            stats_cache: TtlCache::new(ttl),
        }
    }

    /// Full ranking table. Unrecognized sort strings fall back to "top".
    pub fn ranks(&self, window: &str, sort: &str, limit: Option<usize>) -> Result<Vec<RankEntry>> {
        let mode = SortMode::parse(sort);
        let key = QueryKey::new("ranks", window).sort(mode.as_str()).limit(limit);
        cached(&self.ranks_cache, key, || {
            let ranked = self.ranker.ranks(&self.store, window, mode, limit, None)?;
            Ok(ranked.into_iter().map(rank_entry).collect())
        })
    }

    /// Single-actor lookup over the full year; the rank reflects global
    /// standing. Absent actors are an explicit NotFound, never an empty
    /// success.
    pub fn rank_of(&self, actor: &str) -> Result<RankEntry> {
        let key = QueryKey::new("rank_of", "1y").actor(Some(actor));
        let rows = cached(&self.ranks_cache, key, || {
            let ranked = self.ranker.ranks(&self.store, "1y", SortMode::Top, None, Some(actor))?;
            Ok(ranked.into_iter().map(rank_entry).collect::<Vec<_>>())
        })?;
        rows.into_iter().next().ok_or_else(|| Error::NotFound(actor.to_string()))
    }

    pub fn badge(&self, actor: &str) -> Result<Badge> {
        let entry = self.rank_of(actor)?;
        Ok(Badge {
            schema_version: 1,
            label: entry.name,
            message: entry.rank.to_string(),
            color: "orange".to_string(),
        })
    }

    pub fn subs(&self, window: &str, limit: Option<usize>) -> Result<Vec<SubEntry>> {
        let key = QueryKey::new("subs", window).limit(limit);
        cached(&self.subs_cache, key, || {
            let subs = self.ranker.top_subreddits(&self.store, window, limit)?;
            Ok(subs
                .into_iter()
                .map(|s| SubEntry { name: s.name, votes: VoteTotals { good: s.good, bad: s.bad } })
                .collect())
        })
    }

    pub fn top_actors(&self, window: &str, limit: Option<usize>) -> Result<Vec<TopActorEntry>> {
        let key = QueryKey::new("top_actors", window).limit(limit);
        cached(&self.top_cache, key, || {
            let top = self.ranker.top_actors(&self.store, window, limit)?;
            Ok(top
                .into_iter()
                .map(|t| TopActorEntry { name: t.actor, ratio: t.ratio })
                .collect())
        })
    }

    pub fn graph(&self, window: &str) -> Result<Graph> {
        let key = QueryKey::new("graph", window);
        cached(&self.graph_cache, key, || {
            Ok(graph_shape(self.ranker.graph(&self.store, window)?))
        })
    }

    /// `kind` takes the wire codes "G"/"B"; anything else means both kinds.
    pub fn stats(&self, window: &str, kind: Option<&str>) -> Result<Stats> {
        let kind = kind.and_then(VoteKind::from_code);
        let key = QueryKey::new("stats", window).sort(match kind {
            Some(VoteKind::Good) => "G",
            Some(VoteKind::Bad) => "B",
            None => "all",
        });
        cached(&self.stats_cache, key, || {
            let s = self.ranker.stats(&self.store, window, kind)?;
            Ok(Stats {
                votes: VoteStats { count: s.votes, latest: s.latest },
                actors: ActorStats { count: s.actors },
            })
        })
    }
}
