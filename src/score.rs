//! Ranking scores over good/bad vote counts.
//!
//! The official score is the lower bound of the Wilson binomial confidence
//! interval rather than the naive good/(good+bad) ratio: it penalizes small
//! samples, so one lucky vote cannot outrank a thousand consistent ones.

use crate::error::{Error, Result};

const Z: f64 = 1.96;

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn wilson(good: f64, bad: f64) -> Result<f64> {
    let n = good + bad;
    if n <= 0.0 {
        return Err(Error::InsufficientVotes);
    }
    let p = good / n;
    let z2 = Z * Z;
    let center = p + z2 / (2.0 * n);
    let spread = Z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    Ok((center - spread) / (1.0 + z2 / n))
}

/// Lower bound of the Wilson interval over raw counts, rounded to 4 decimal
/// places. Errors if `good + bad == 0` — callers filter by minvotes first.
pub fn wilson_lower_bound(good: u64, bad: u64) -> Result<f64> {
    wilson(good as f64, bad as f64).map(round4)
}

/// Wilson lower bound over time-decayed weighted sums (the "hot" score).
/// Left unrounded: weighted sums are tiny and rounding would flatten them.
pub fn wilson_lower_bound_weighted(good_w: f64, bad_w: f64) -> Result<f64> {
    wilson(good_w, bad_w)
}

/// Recency weight of a single vote: `now / (now - ts)^2`. A vote cast a
/// moment ago dominates; one from months back contributes almost nothing.
/// Age is clamped to one second so same-second votes stay finite.
pub fn hot_weight(now: i64, ts: i64) -> f64 {
    let age = (now - ts).max(1) as f64;
    now as f64 / (age * age)
}

/// Balance-of-disagreement score: `(good + bad) / (|good - bad| + 1)`.
/// Maximized by high, nearly-even vote counts.
pub fn controversial(good: u64, bad: u64) -> f64 {
    let total = (good + bad) as f64;
    let gap = (good as i64 - bad as i64).unsigned_abs() as f64;
    total / (gap + 1.0)
}

/// Laplace-smoothed ratio `(good+1)/(bad+1)`, rounded to 2 decimals. Used
/// for the compact top-movers widget, not the official ranking.
pub fn laplace_ratio(good: u64, bad: u64) -> f64 {
    round2((good as f64 + 1.0) / (bad as f64 + 1.0))
}
