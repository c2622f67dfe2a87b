use anyhow::Result;
use tokio::time::{sleep, Duration};

use botranks::config::Config;
use botranks::feed::retry::{retry_async, RetryConfig};
use botranks::feed::SourceKind;
use botranks::ingest::ingest_batch;
use botranks::logging::{json_log, obj, v_num, v_str};
use botranks::store::VoteStore;
use botranks::window::now_ts;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    json_log(
        "system",
        obj(&[
            ("status", v_str("startup")),
            ("config_hash", v_str(&cfg.config_hash())),
            ("db", v_str(&cfg.sqlite_path)),
            ("poll_secs", v_num(cfg.poll_secs as f64)),
        ]),
    );

    let mut store = VoteStore::open(&cfg.sqlite_path)?;
    store.init()?;
    let source = SourceKind::from_env().build(cfg.clone())?;
    let retry_cfg = RetryConfig::default();

    // Resume just behind the newest stored vote; a fresh database starts
    // one poll interval back. Overlap is fine, the unique event id absorbs
    // replays.
    let mut since = store
        .latest_vote_timestamp(None)?
        .unwrap_or_else(|| now_ts() - cfg.poll_secs as i64);

    loop {
        let cycle_start = now_ts();

        let events = retry_async(&retry_cfg, "fetch_recent", || {
            source.fetch_recent(since, cfg.fetch_limit)
        })
        .await?;

        let summary = ingest_batch(&mut store, source.as_ref(), &events).await?;
        json_log(
            "cycle",
            obj(&[
                ("fetched", v_num(events.len() as f64)),
                ("inserted", v_num(summary.inserted as f64)),
                ("since", v_num(since as f64)),
                ("elapsed_secs", v_num((now_ts() - cycle_start) as f64)),
            ]),
        );

        if summary.inserted > 0 {
            since = store.latest_vote_timestamp(None)?.unwrap_or(since);
        }

        let elapsed = (now_ts() - cycle_start).max(0) as u64;
        sleep(Duration::from_secs(cfg.poll_secs.saturating_sub(elapsed).max(1))).await;
    }
}
