use serde::{Deserialize, Serialize};

use crate::stats;

/// Assign each value an equal-count bucket index in `0..buckets` by rank.
/// Ties keep their original relative order, so bucket sizes differ by at
/// most one and the index never decreases along the sorted key.
pub fn quantile_buckets(values: &[f64], buckets: usize) -> Vec<usize> {
    let buckets = buckets.max(1);
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    // `sort_by` is stable: equal keys stay in input order.
    order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));

    let mut out = vec![0usize; n];
    for (rank, idx) in order.into_iter().enumerate() {
        out[idx] = rank * buckets / n;
    }
    out
}

/// Mid-rank percentile (0–100) of every value within the series. Equal
/// values share a percentile; a single value sits at 50.
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![50.0];
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    values
        .iter()
        .map(|v| {
            let below = sorted.partition_point(|s| s.total_cmp(v).is_lt());
            let at_or_below = sorted.partition_point(|s| s.total_cmp(v).is_le());
            let mid_rank = below as f64 + (at_or_below - below - 1) as f64 / 2.0;
            100.0 * mid_rank / (n - 1) as f64
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Low,
    Med,
    High,
}

impl Level {
    /// Tertile cut of a 0–100 percentile.
    pub fn from_percentile(pct: f64) -> Self {
        if pct < 100.0 / 3.0 {
            Level::Low
        } else if pct < 200.0 / 3.0 {
            Level::Med
        } else {
            Level::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "Low",
            Level::Med => "Med",
            Level::High => "High",
        }
    }

    pub const ALL: [Level; 3] = [Level::Low, Level::Med, Level::High];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub bucket: usize,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub wins: usize,
    pub win_rate: f64,
}

/// Equal-count buckets of `values` with the win rate of each bucket.
/// Buckets that end up empty (fewer values than buckets) are omitted.
pub fn summarize_buckets(values: &[f64], wins: &[bool], buckets: usize) -> Vec<BucketSummary> {
    let n = values.len().min(wins.len());
    let values = &values[..n];
    let assignment = quantile_buckets(values, buckets);
    let buckets = buckets.max(1);

    let mut grouped: Vec<Vec<usize>> = vec![Vec::new(); buckets];
    for (idx, bucket) in assignment.iter().enumerate() {
        grouped[*bucket].push(idx);
    }

    grouped
        .into_iter()
        .enumerate()
        .filter(|(_, members)| !members.is_empty())
        .map(|(bucket, members)| {
            let vals: Vec<f64> = members.iter().map(|i| values[*i]).collect();
            let win_count = members.iter().filter(|i| wins[**i]).count();
            BucketSummary {
                bucket,
                count: members.len(),
                min: vals.iter().copied().fold(f64::INFINITY, f64::min),
                max: vals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                mean: stats::mean(&vals),
                wins: win_count,
                win_rate: stats::rate(win_count, members.len()),
            }
        })
        .collect()
}
