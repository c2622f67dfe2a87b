//! Upstream comment feed: the ingestion boundary.
//!
//! The feed delivers raw comment events at-least-once, possibly out of
//! order and with duplicates; the store's idempotent insert absorbs both.
//! Identity resolution (who authored the parent comment, and their current
//! karma) also lives behind this seam because it is the same rate-limited
//! external API.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;

mod reddit;
pub mod retry;

/// A raw comment event as delivered by the platform, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEvent {
    /// Platform-unique comment id; becomes the vote's event id.
    pub id: String,
    pub body: String,
    /// Fullname of the thing this comment replies to.
    pub parent_id: String,
    pub subreddit: Option<String>,
    /// The commenting account — the voter.
    pub author: String,
    pub created_utc: i64,
}

/// Resolved parent-comment identity plus a karma snapshot taken at
/// resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentInfo {
    pub author: String,
    pub link_karma: i64,
    pub comment_karma: i64,
}

#[async_trait]
pub trait CommentSource {
    /// Recent comments with `created_utc >= since`, newest batch the
    /// platform will give us, capped at `limit`.
    async fn fetch_recent(&self, since: i64, limit: u32) -> Result<Vec<CommentEvent>>;

    /// Author and karma of the parent thing, or None when it is deleted or
    /// otherwise unresolvable.
    async fn resolve_parent(&self, parent_id: &str) -> Result<Option<ParentInfo>>;
}

#[derive(Clone, Copy, Debug)]
pub enum SourceKind {
    Reddit,
    Null,
}

impl SourceKind {
    pub fn from_env() -> Self {
        match std::env::var("FEED").unwrap_or_else(|_| "reddit".to_string()).as_str() {
            "null" => SourceKind::Null,
            _ => SourceKind::Reddit,
        }
    }

    pub fn build(self, cfg: Config) -> Result<Box<dyn CommentSource + Send + Sync>> {
        match self {
            SourceKind::Reddit => Ok(Box::new(reddit::RedditSource::new(cfg)?)),
            SourceKind::Null => Ok(Box::new(NullSource)),
        }
    }
}

// Stub source to make integration explicit; used for dry runs.
pub struct NullSource;

#[async_trait]
impl CommentSource for NullSource {
    async fn fetch_recent(&self, _since: i64, _limit: u32) -> Result<Vec<CommentEvent>> {
        Ok(Vec::new())
    }

    async fn resolve_parent(&self, _parent_id: &str) -> Result<Option<ParentInfo>> {
        Ok(None)
    }
}
