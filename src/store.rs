//! Durable vote store backed by SQLite.
//!
//! Rows are built into typed records at this boundary and never passed
//! onward as positional tuples. Ranking math lives in `rank`, not in SQL:
//! the store only persists, scans, and answers trivial scalar queries.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::classify::VoteKind;
use crate::error::Result;

/// A single classified vote. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Account being judged (the parent comment's author).
    pub actor: String,
    /// Id of the triggering comment; unique, enforces idempotent insert.
    pub event_id: String,
    /// Origin community; None when unknown.
    pub subreddit: Option<String>,
    /// Event creation time, epoch seconds. Arrival order may differ.
    pub timestamp: i64,
    pub kind: VoteKind,
    /// Account that cast the vote. Not part of the dedup key.
    pub voter: String,
}

/// Latest known reputation snapshot for an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorKarma {
    pub actor: String,
    pub link_karma: i64,
    pub comment_karma: i64,
}

pub struct VoteStore {
    conn: Connection,
}

impl VoteStore {
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS votes (
                actor TEXT NOT NULL,
                id TEXT NOT NULL,
                subreddit TEXT,
                timestamp INTEGER NOT NULL,
                vote TEXT NOT NULL,
                voter TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_id ON votes (id);
            CREATE INDEX IF NOT EXISTS idx_votes_timestamp ON votes (timestamp);
            CREATE TABLE IF NOT EXISTS actors (
                actor TEXT NOT NULL,
                link_karma INTEGER NOT NULL,
                comment_karma INTEGER NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_actors_actor ON actors (actor);
            COMMIT;",
        )?;
        Ok(())
    }

    /// Insert a vote. Returns false when the event id already exists; the
    /// first writer's row (including its voter) is retained and the losing
    /// insert is a successful no-op.
    pub fn insert_vote(&mut self, vote: &Vote) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO votes (actor, id, subreddit, timestamp, vote, voter)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                vote.actor,
                vote.event_id,
                vote.subreddit,
                vote.timestamp,
                vote.kind.code(),
                vote.voter
            ],
        )?;
        Ok(changed == 1)
    }

    /// Refresh an actor's karma snapshot: insert if absent, otherwise
    /// overwrite with the latest observed values.
    pub fn upsert_actor_karma(&mut self, actor: &str, link_karma: i64, comment_karma: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO actors (actor, link_karma, comment_karma) VALUES (?1, ?2, ?3)
             ON CONFLICT(actor) DO UPDATE SET
                 link_karma = excluded.link_karma,
                 comment_karma = excluded.comment_karma",
            params![actor, link_karma, comment_karma],
        )?;
        Ok(())
    }

    /// All votes with `timestamp >= since_epoch`, oldest first.
    pub fn scan_votes(&self, since_epoch: i64) -> Result<Vec<Vote>> {
        let mut stmt = self.conn.prepare(
            "SELECT actor, id, subreddit, timestamp, vote, voter
             FROM votes WHERE timestamp >= ?1 ORDER BY timestamp",
        )?;
        let rows = stmt.query_map(params![since_epoch], |row| {
            let code: String = row.get(4)?;
            let kind = VoteKind::from_code(&code).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    format!("unknown vote code {:?}", code).into(),
                )
            })?;
            Ok(Vote {
                actor: row.get(0)?,
                event_id: row.get(1)?,
                subreddit: row.get(2)?,
                timestamp: row.get(3)?,
                kind,
                voter: row.get(5)?,
            })
        })?;
        let mut votes = Vec::new();
        for vote in rows {
            votes.push(vote?);
        }
        Ok(votes)
    }

    /// All karma snapshots. The engine joins these against vote groups in
    /// application code.
    pub fn scan_actor_karma(&self) -> Result<Vec<ActorKarma>> {
        let mut stmt =
            self.conn.prepare("SELECT actor, link_karma, comment_karma FROM actors")?;
        let rows = stmt.query_map([], |row| {
            Ok(ActorKarma {
                actor: row.get(0)?,
                link_karma: row.get(1)?,
                comment_karma: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for karma in rows {
            out.push(karma?);
        }
        Ok(out)
    }

    /// Timestamp of the most recent vote, optionally restricted to one kind.
    pub fn latest_vote_timestamp(&self, kind: Option<VoteKind>) -> Result<Option<i64>> {
        let latest = match kind {
            Some(kind) => self
                .conn
                .query_row(
                    "SELECT MAX(timestamp) FROM votes WHERE vote = ?1",
                    params![kind.code()],
                    |row| row.get::<_, Option<i64>>(0),
                )
                .optional()?
                .flatten(),
            None => self
                .conn
                .query_row("SELECT MAX(timestamp) FROM votes", [], |row| {
                    row.get::<_, Option<i64>>(0)
                })
                .optional()?
                .flatten(),
        };
        Ok(latest)
    }
}
