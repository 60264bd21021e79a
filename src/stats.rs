//! Stats aggregator: descriptive statistics over a rolling-window snapshot.
//!
//! Everything here is a pure function of the samples passed in. The report is
//! recomputed from scratch on every call; there is no incremental state, so
//! aggregation is trivially safe to run concurrently with window appends.

use serde::{Deserialize, Serialize};

use crate::storage::StatSample;

/// Minimum window size before a trend is reported.
const TREND_MIN_GAMES: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracySummary {
    pub avg: f64,
    pub median: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Percentiles {
    pub p10: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

/// Accuracy histogram over five fixed bins. The first bin is closed at both
/// ends; the rest are right-open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(rename = "97-100")]
    pub from_97: u32,
    #[serde(rename = "95-97")]
    pub from_95: u32,
    #[serde(rename = "90-95")]
    pub from_90: u32,
    #[serde(rename = "80-90")]
    pub from_80: u32,
    #[serde(rename = "<80")]
    pub below_80: u32,
}

impl Distribution {
    pub fn total(&self) -> u32 {
        self.from_97 + self.from_95 + self.from_90 + self.from_80 + self.below_80
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub avg: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveSummary {
    pub avg: f64,
    pub max: i64,
}

/// Full report over one difficulty's window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub games: usize,
    pub accuracy: AccuracySummary,
    pub percentiles: Percentiles,
    pub distribution: Distribution,
    pub score: ScoreSummary,
    pub wave: WaveSummary,
    /// Recent-form delta: mean accuracy of the newest 10 games minus the 10
    /// before them. Positive means improving. Only present with 20+ games.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
}

/// Interpolated percentile over ascending-sorted data.
///
/// Rank `k = (n-1) * p/100`; the result interpolates linearly between the
/// order statistics at `floor(k)` and the next index (clamped to the end).
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    debug_assert!(n > 0, "percentile of empty data");
    let k = (n - 1) as f64 * p / 100.0;
    let f = k.floor() as usize;
    let c = (f + 1).min(n - 1);
    sorted[f] + (sorted[c] - sorted[f]) * (k - f as f64)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator), 0 for a single value.
fn stdev(values: &[f64], avg: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute a report over a window snapshot (newest first, as `snapshot`
/// returns it). Returns `None` when there is nothing to aggregate.
pub fn aggregate(samples: &[StatSample]) -> Option<StatsReport> {
    // Every stored sample carries an accuracy, so filtering to defined
    // accuracies reduces to the empty check.
    if samples.is_empty() {
        return None;
    }
    let n = samples.len();

    // Newest-first, as inserted; the trend depends on this ordering.
    let accuracies: Vec<f64> = samples.iter().map(|s| s.accuracy).collect();

    let mut sorted = accuracies.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let avg = mean(&accuracies);

    let mut distribution = Distribution {
        from_97: 0,
        from_95: 0,
        from_90: 0,
        from_80: 0,
        below_80: 0,
    };
    for &acc in &accuracies {
        if acc >= 97.0 {
            distribution.from_97 += 1;
        } else if acc >= 95.0 {
            distribution.from_95 += 1;
        } else if acc >= 90.0 {
            distribution.from_90 += 1;
        } else if acc >= 80.0 {
            distribution.from_80 += 1;
        } else {
            distribution.below_80 += 1;
        }
    }

    let score_sum: i64 = samples.iter().map(|s| s.score).sum();
    let score_max = samples.iter().map(|s| s.score).max().unwrap_or(0);
    let wave_max = samples.iter().map(|s| s.wave).max().unwrap_or(0);
    let wave_avg = samples.iter().map(|s| s.wave as f64).sum::<f64>() / n as f64;

    let trend = if n >= TREND_MIN_GAMES {
        let recent = mean(&accuracies[0..10]);
        let previous = mean(&accuracies[10..20]);
        Some(round1(recent - previous))
    } else {
        None
    };

    Some(StatsReport {
        games: n,
        accuracy: AccuracySummary {
            avg: round1(avg),
            median: round1(percentile(&sorted, 50.0)),
            stdev: round1(stdev(&accuracies, avg)),
            min: round1(sorted[0]),
            max: round1(sorted[n - 1]),
        },
        percentiles: Percentiles {
            p10: round1(percentile(&sorted, 10.0)),
            p25: round1(percentile(&sorted, 25.0)),
            p75: round1(percentile(&sorted, 75.0)),
            p90: round1(percentile(&sorted, 90.0)),
            p95: round1(percentile(&sorted, 95.0)),
        },
        distribution,
        score: ScoreSummary {
            avg: (score_sum as f64 / n as f64).round() as i64,
            max: score_max,
        },
        wave: WaveSummary {
            avg: round1(wave_avg),
            max: wave_max,
        },
        trend,
    })
}

/// Human-readable report for the operational log. Observability hook only;
/// nothing parses this.
pub fn format_report(difficulty: &str, report: &StatsReport) -> String {
    let trend = match report.trend {
        Some(t) if t > 0.0 => format!("{:+.1} (improving)", t),
        Some(t) if t < 0.0 => format!("{:+.1} (declining)", t),
        Some(_) => "+0.0 (flat)".to_string(),
        None => "n/a".to_string(),
    };
    format!(
        "[{}] {} games | accuracy avg {:.1} median {:.1} stdev {:.1} | \
         p10 {:.1} p90 {:.1} | score avg {} max {} | wave avg {:.1} max {} | trend {}",
        difficulty,
        report.games,
        report.accuracy.avg,
        report.accuracy.median,
        report.accuracy.stdev,
        report.percentiles.p10,
        report.percentiles.p90,
        report.score.avg,
        report.score.max,
        report.wave.avg,
        report.wave.max,
        trend,
    )
}
