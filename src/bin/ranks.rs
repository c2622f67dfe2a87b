//! Query tool: run aggregations against the vote database and print JSON.
//!
//! Usage:
//!   ranks table [window] [sort] [limit]   - Ranking table (default 1y top)
//!   ranks bot <name>                      - Single actor with global rank
//!   ranks badge <name>                    - shields.io badge payload
//!   ranks subs [window] [limit]           - Busiest subreddits
//!   ranks movers [window] [limit]         - Top actors by smoothed ratio
//!   ranks graph [window]                  - Calendar time-series
//!   ranks stats [window] [G|B]            - Scalar stats
//!
//! The database path comes from SQLITE_PATH, as for the ingest daemon.

use anyhow::{anyhow, Result};

use botranks::api::Service;
use botranks::config::Config;
use botranks::error::Error;
use botranks::store::VoteStore;

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("table");
    let arg = |i: usize| args.get(i).map(String::as_str);

    let cfg = Config::from_env();
    let mut store = VoteStore::open(&cfg.sqlite_path)?;
    store.init()?;
    let service = Service::new(store, &cfg);

    let window = |i: usize| arg(i).unwrap_or(cfg.default_window.as_str()).to_string();
    let limit = |i: usize| arg(i).and_then(|v| v.parse::<usize>().ok());

    match command {
        "table" => {
            let ranks = service.ranks(&window(1), arg(2).unwrap_or("top"), limit(3))?;
            print_json(&ranks)
        }
        "bot" => {
            let name = arg(1).ok_or_else(|| anyhow!("usage: ranks bot <name>"))?;
            match service.rank_of(name) {
                Ok(entry) => print_json(&entry),
                Err(Error::NotFound(name)) => {
                    eprintln!("not found: {}", name);
                    std::process::exit(1);
                }
                Err(e) => Err(e.into()),
            }
        }
        "badge" => {
            let name = arg(1).ok_or_else(|| anyhow!("usage: ranks badge <name>"))?;
            match service.badge(name) {
                Ok(badge) => print_json(&badge),
                Err(Error::NotFound(name)) => {
                    eprintln!("not found: {}", name);
                    std::process::exit(1);
                }
                Err(e) => Err(e.into()),
            }
        }
        "subs" => print_json(&service.subs(&window(1), limit(2))?),
        "movers" => print_json(&service.top_actors(&window(1), limit(2))?),
        "graph" => print_json(&service.graph(&window(1))?),
        "stats" => print_json(&service.stats(&window(1), arg(2))?),
        other => Err(anyhow!("unknown command: {}", other)),
    }
}
