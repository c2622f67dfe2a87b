//! Aggregation engine: turns the raw vote log into windowed, tie-broken
//! rankings, leaderboards, calendar time-series, and scalar stats.
//!
//! Everything here is a pure computation over a snapshot of votes plus a
//! karma map; grouping, scoring, sorting, and rank assignment all happen in
//! application code so the storage engine stays interchangeable.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, Timelike};
use serde::{Deserialize, Serialize};

use crate::classify::VoteKind;
use crate::error::Result;
use crate::score;
use crate::store::{ActorKarma, Vote, VoteStore};
use crate::window::{now_ts, Window, WindowUnit};

pub const DEFAULT_MINVOTES: u64 = 3;

const WEEKDAYS: [&str; 7] =
    ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Top,
    Hot,
    Controversial,
}

impl SortMode {
    /// Unrecognized values silently map to Top.
    pub fn parse(s: &str) -> Self {
        match s {
            "hot" => SortMode::Hot,
            "controversial" => SortMode::Controversial,
            _ => SortMode::Top,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Top => "top",
            SortMode::Hot => "hot",
            SortMode::Controversial => "controversial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedActor {
    pub rank: u32,
    pub actor: String,
    /// Always the rounded Wilson score, whatever the sort mode orders by.
    pub score: f64,
    pub good: u64,
    pub bad: u64,
    pub link_karma: i64,
    pub comment_karma: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubredditVotes {
    pub name: String,
    pub good: u64,
    pub bad: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorRatio {
    pub actor: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphBucket {
    pub label: String,
    pub good: u64,
    pub bad: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Most recent vote timestamp across the whole log, not the window.
    pub latest: Option<i64>,
    pub votes: u64,
    pub actors: u64,
}

#[derive(Default)]
struct Tally {
    good: u64,
    bad: u64,
    good_w: f64,
    bad_w: f64,
}

fn tally_by_actor(votes: &[Vote], now: i64) -> HashMap<String, Tally> {
    let mut groups: HashMap<String, Tally> = HashMap::new();
    for vote in votes {
        let t = groups.entry(vote.actor.clone()).or_default();
        let w = score::hot_weight(now, vote.timestamp);
        match vote.kind {
            VoteKind::Good => {
                t.good += 1;
                t.good_w += w;
            }
            VoteKind::Bad => {
                t.bad += 1;
                t.bad_w += w;
            }
        }
    }
    groups
}

pub fn karma_map(karma: Vec<ActorKarma>) -> HashMap<String, ActorKarma> {
    karma.into_iter().map(|k| (k.actor.clone(), k)).collect()
}

/// Rank actors over an already-windowed vote set.
///
/// Actors without a karma row are excluded (inner join), as are actors below
/// `minvotes`. Rows are ordered by the selected mode's score descending,
/// then good votes descending, then bad votes ascending — among equal
/// scores, more endorsements win, and among those, fewer complaints win.
/// Ranks are dense and 1-based in that order.
pub fn rank_actors(
    votes: &[Vote],
    karma: &HashMap<String, ActorKarma>,
    sort: SortMode,
    minvotes: u64,
    now: i64,
) -> Vec<RankedActor> {
    struct Row {
        entry: RankedActor,
        key: f64,
    }

    let mut rows: Vec<Row> = Vec::new();
    for (actor, tally) in tally_by_actor(votes, now) {
        let karma = match karma.get(&actor) {
            Some(k) => k,
            None => continue,
        };
        if tally.good + tally.bad < minvotes {
            continue;
        }
        // minvotes >= 1 guarantees a nonzero sample for every variant.
        let top = match score::wilson_lower_bound(tally.good, tally.bad) {
            Ok(s) => s,
            Err(_) => continue,
        };
        let key = match sort {
            SortMode::Top => top,
            SortMode::Hot => {
                score::wilson_lower_bound_weighted(tally.good_w, tally.bad_w).unwrap_or(0.0)
            }
            SortMode::Controversial => score::controversial(tally.good, tally.bad),
        };
        rows.push(Row {
            entry: RankedActor {
                rank: 0,
                actor,
                score: top,
                good: tally.good,
                bad: tally.bad,
                link_karma: karma.link_karma,
                comment_karma: karma.comment_karma,
            },
            key,
        });
    }

    rows.sort_by(|a, b| {
        b.key
            .partial_cmp(&a.key)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.entry.good.cmp(&a.entry.good))
            .then_with(|| a.entry.bad.cmp(&b.entry.bad))
            .then_with(|| a.entry.actor.cmp(&b.entry.actor))
    });

    rows.into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            row.entry.rank = i as u32 + 1;
            row.entry
        })
        .collect()
}

/// Group votes by origin community, busiest first. Votes with no known
/// subreddit are excluded.
pub fn top_subreddits(votes: &[Vote], limit: Option<usize>) -> Vec<SubredditVotes> {
    let mut groups: HashMap<&str, (u64, u64)> = HashMap::new();
    for vote in votes {
        let name = match vote.subreddit.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };
        let counts = groups.entry(name).or_default();
        match vote.kind {
            VoteKind::Good => counts.0 += 1,
            VoteKind::Bad => counts.1 += 1,
        }
    }
    let mut subs: Vec<SubredditVotes> = groups
        .into_iter()
        .map(|(name, (good, bad))| SubredditVotes { name: name.to_string(), good, bad })
        .collect();
    subs.sort_by(|a, b| {
        (b.good + b.bad).cmp(&(a.good + a.bad)).then_with(|| a.name.cmp(&b.name))
    });
    if let Some(limit) = limit {
        subs.truncate(limit);
    }
    subs
}

/// Laplace-smoothed good/bad ratio per actor, best first. A compact
/// top-movers widget, deliberately simpler than the official ranking: no
/// karma join and no minimum-vote floor.
pub fn top_actors(votes: &[Vote], limit: Option<usize>) -> Vec<ActorRatio> {
    let mut groups: HashMap<&str, (u64, u64)> = HashMap::new();
    for vote in votes {
        let counts = groups.entry(vote.actor.as_str()).or_default();
        match vote.kind {
            VoteKind::Good => counts.0 += 1,
            VoteKind::Bad => counts.1 += 1,
        }
    }
    let mut out: Vec<ActorRatio> = groups
        .into_iter()
        .map(|(actor, (good, bad))| ActorRatio {
            actor: actor.to_string(),
            ratio: score::laplace_ratio(good, bad),
        })
        .collect();
    out.sort_by(|a, b| {
        b.ratio
            .partial_cmp(&a.ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.actor.cmp(&b.actor))
    });
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}

fn bucket_domain(unit: WindowUnit) -> Vec<String> {
    match unit {
        WindowUnit::Hours | WindowUnit::Days => (0..24).map(|h| h.to_string()).collect(),
        WindowUnit::Weeks => WEEKDAYS.iter().map(|d| d.to_string()).collect(),
        WindowUnit::Months => (1..=31).map(|d| d.to_string()).collect(),
        WindowUnit::Years => MONTHS.iter().map(|m| m.to_string()).collect(),
    }
}

fn bucket_index(unit: WindowUnit, ts: i64) -> Option<usize> {
    let dt = DateTime::from_timestamp(ts, 0)?;
    let idx = match unit {
        WindowUnit::Hours | WindowUnit::Days => dt.hour() as usize,
        WindowUnit::Weeks => dt.weekday().num_days_from_sunday() as usize,
        WindowUnit::Months => dt.day() as usize - 1,
        WindowUnit::Years => dt.month0() as usize,
    };
    Some(idx)
}

/// Partition votes into calendar buckets chosen by the window's unit: hour
/// of day for day-scale windows, weekday for week-scale, day of month for
/// month-scale, month of year otherwise. Every bucket of the full domain is
/// present in natural order, zeroed when empty, so consumers never handle
/// missing keys. Timestamps are interpreted as UTC.
pub fn graph_buckets(votes: &[Vote], unit: WindowUnit) -> Vec<GraphBucket> {
    let labels = bucket_domain(unit);
    let mut buckets: Vec<GraphBucket> = labels
        .into_iter()
        .map(|label| GraphBucket { label, good: 0, bad: 0 })
        .collect();
    for vote in votes {
        let idx = match bucket_index(unit, vote.timestamp) {
            Some(i) if i < buckets.len() => i,
            _ => continue,
        };
        match vote.kind {
            VoteKind::Good => buckets[idx].good += 1,
            VoteKind::Bad => buckets[idx].bad += 1,
        }
    }
    buckets
}

/// Windowed vote count (optionally one kind) and the count of distinct
/// actors that clear `minvotes`, counting votes of both kinds and requiring
/// a karma row, as the ranking does.
pub fn window_stats(
    votes: &[Vote],
    karma: &HashMap<String, ActorKarma>,
    kind: Option<VoteKind>,
    minvotes: u64,
) -> (u64, u64) {
    let vote_count = votes
        .iter()
        .filter(|v| kind.map_or(true, |k| v.kind == k))
        .count() as u64;
    let mut per_actor: HashMap<&str, u64> = HashMap::new();
    for vote in votes {
        *per_actor.entry(vote.actor.as_str()).or_default() += 1;
    }
    let actor_count = per_actor
        .iter()
        .filter(|(actor, &count)| karma.contains_key(**actor) && count >= minvotes)
        .count() as u64;
    (vote_count, actor_count)
}

/// Store-backed entry points. Each call operates on an independent snapshot
/// fetched at query time; malformed window expressions fall back to the
/// configured default window so the dashboard always renders.
pub struct Ranker {
    pub default_window: Window,
    pub minvotes: u64,
}

impl Ranker {
    pub fn new(default_window: Window, minvotes: u64) -> Self {
        Self { default_window, minvotes }
    }

    fn resolve(&self, expr: &str) -> Window {
        Window::parse(expr).unwrap_or(self.default_window)
    }

    pub fn ranks(
        &self,
        store: &VoteStore,
        window_expr: &str,
        sort: SortMode,
        limit: Option<usize>,
        actor: Option<&str>,
    ) -> Result<Vec<RankedActor>> {
        // Recency weighting already decays old votes, so hot widens the
        // candidate pool to the full year rather than honoring the caller's
        // window; long-lived but recently-active actors stay visible.
        let window = match sort {
            SortMode::Hot => Window { length: 1, unit: WindowUnit::Years },
            _ => self.resolve(window_expr),
        };
        let now = now_ts();
        let votes = store.scan_votes(window.epoch_at(now))?;
        let karma = karma_map(store.scan_actor_karma()?);
        let mut ranked = rank_actors(&votes, &karma, sort, self.minvotes, now);
        if let Some(actor) = actor {
            ranked.retain(|r| r.actor == actor);
        }
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        Ok(ranked)
    }

    pub fn top_subreddits(
        &self,
        store: &VoteStore,
        window_expr: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SubredditVotes>> {
        let votes = store.scan_votes(self.resolve(window_expr).epoch())?;
        Ok(top_subreddits(&votes, limit))
    }

    pub fn top_actors(
        &self,
        store: &VoteStore,
        window_expr: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ActorRatio>> {
        let votes = store.scan_votes(self.resolve(window_expr).epoch())?;
        Ok(top_actors(&votes, limit))
    }

    pub fn graph(&self, store: &VoteStore, window_expr: &str) -> Result<Vec<GraphBucket>> {
        let window = self.resolve(window_expr);
        let votes = store.scan_votes(window.epoch())?;
        Ok(graph_buckets(&votes, window.unit))
    }

    pub fn stats(
        &self,
        store: &VoteStore,
        window_expr: &str,
        kind: Option<VoteKind>,
    ) -> Result<WindowStats> {
        let votes = store.scan_votes(self.resolve(window_expr).epoch())?;
        let karma = karma_map(store.scan_actor_karma()?);
        let (votes_n, actors_n) = window_stats(&votes, &karma, kind, self.minvotes);
        Ok(WindowStats {
            latest: store.latest_vote_timestamp(kind)?,
            votes: votes_n,
            actors: actors_n,
        })
    }
}
