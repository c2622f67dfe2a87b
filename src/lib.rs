//! botranks: ranks bot accounts by "good bot" / "bad bot" replies.
//!
//! Comment events flow in from the platform feed, get classified and
//! persisted as votes, and are served back as confidence-scored rankings,
//! leaderboards, and calendar time-series over relative windows.

pub mod api;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod logging;
pub mod rank;
pub mod score;
pub mod store;
pub mod window;
