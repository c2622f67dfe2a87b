//! Write path: classify raw comment events, resolve the judged actor, and
//! persist votes plus karma snapshots.

use std::collections::HashMap;

use anyhow::Result;

use crate::classify;
use crate::feed::{CommentEvent, CommentSource};
use crate::logging::{json_log, obj, v_num};
use crate::store::{Vote, VoteStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub seen: u64,
    /// Events whose body classified as a vote.
    pub classified: u64,
    pub inserted: u64,
    /// Replays absorbed by the unique event id.
    pub duplicates: u64,
    /// Classified votes whose parent could not be resolved to an author.
    pub unresolved: u64,
}

/// Ingest one fetched batch. Non-vote comments are dropped before storage;
/// duplicate event ids are silent no-ops. Karma is resolved alongside each
/// inserted vote and upserted once per actor after the batch, latest
/// observation winning, so karma rows exist only for actors with votes.
pub async fn ingest_batch(
    store: &mut VoteStore,
    source: &(dyn CommentSource + Send + Sync),
    events: &[CommentEvent],
) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();
    let mut karma: HashMap<String, (i64, i64)> = HashMap::new();

    for event in events {
        summary.seen += 1;
        let kind = match classify::classify(&event.body) {
            Some(kind) => kind,
            None => continue,
        };
        summary.classified += 1;

        let parent = match source.resolve_parent(&event.parent_id).await? {
            Some(parent) => parent,
            None => {
                summary.unresolved += 1;
                continue;
            }
        };

        let vote = Vote {
            actor: parent.author.clone(),
            event_id: event.id.clone(),
            subreddit: event.subreddit.clone(),
            timestamp: event.created_utc,
            kind,
            voter: event.author.clone(),
        };
        if store.insert_vote(&vote)? {
            summary.inserted += 1;
            karma.insert(parent.author, (parent.link_karma, parent.comment_karma));
        } else {
            summary.duplicates += 1;
        }
    }

    for (actor, (link_karma, comment_karma)) in &karma {
        store.upsert_actor_karma(actor, *link_karma, *comment_karma)?;
    }

    json_log(
        "ingest",
        obj(&[
            ("seen", v_num(summary.seen as f64)),
            ("classified", v_num(summary.classified as f64)),
            ("inserted", v_num(summary.inserted as f64)),
            ("duplicates", v_num(summary.duplicates as f64)),
            ("unresolved", v_num(summary.unresolved as f64)),
            ("actors_refreshed", v_num(karma.len() as f64)),
        ]),
    );
    Ok(summary)
}
