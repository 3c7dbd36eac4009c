// src/statistics.rs - Distribution summaries over per-region populations

use serde::{Deserialize, Serialize};

/// Names of the seven summary statistics, in output order
pub const STATISTIC_NAMES: [&str; 7] = [
    "Mean", "Std", "Median", "IQR", "Skewness", "Kurtosis", "Disorder",
];

/// How the seventh ("disorder") statistic is computed
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisorderMeasure {
    /// 1 - 1 / (1 + stdev / mean)
    StdToMean,
    /// Shannon entropy of a histogram over [min, max], normalized by log2(bins)
    HistogramEntropy { bins: usize },
}

impl Default for DisorderMeasure {
    fn default() -> Self {
        DisorderMeasure::StdToMean
    }
}

/// Seven-number summary of a population.
///
/// A statistic that is undefined for the population (empty input, zero
/// variance for the moment ratios, zero mean for disorder) is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub stdev: f64,
    pub median: f64,
    pub iqr: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub disorder: f64,
}

impl DistributionSummary {
    /// Summary of an empty population
    pub fn undefined() -> Self {
        Self {
            mean: f64::NAN,
            stdev: f64::NAN,
            median: f64::NAN,
            iqr: f64::NAN,
            skewness: f64::NAN,
            kurtosis: f64::NAN,
            disorder: f64::NAN,
        }
    }

    /// Values in the order of `STATISTIC_NAMES`
    pub fn to_array(&self) -> [f64; 7] {
        [
            self.mean,
            self.stdev,
            self.median,
            self.iqr,
            self.skewness,
            self.kurtosis,
            self.disorder,
        ]
    }
}

/// Reduce a population to its seven summary statistics.
///
/// Absent (`None`) and non-finite entries are dropped before any statistic is
/// computed, so every statistic sees the same defined sub-population.
pub fn distribution_parameters<I>(values: I, disorder: DisorderMeasure) -> DistributionSummary
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut defined: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();

    if defined.is_empty() {
        return DistributionSummary::undefined();
    }

    defined.sort_by(|a, b| a.total_cmp(b));

    let mean = mean(&defined);
    let stdev = sample_stdev(&defined);
    let median = percentile_sorted(&defined, 50.0);
    let iqr = percentile_sorted(&defined, 75.0) - percentile_sorted(&defined, 25.0);

    // Biased central moments
    let n = defined.len() as f64;
    let (m2, m3, m4) = defined.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), &v| {
        let d = v - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    });
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);

    let (skewness, kurtosis) = if m2 > 0.0 {
        (m3 / m2.powf(1.5), m4 / (m2 * m2))
    } else {
        (f64::NAN, f64::NAN)
    };

    let disorder = match disorder {
        DisorderMeasure::StdToMean => std_to_mean_disorder(mean, stdev),
        DisorderMeasure::HistogramEntropy { bins } => histogram_entropy(&defined, bins),
    };

    DistributionSummary {
        mean,
        stdev,
        median,
        iqr,
        skewness,
        kurtosis,
        disorder,
    }
}

/// Arithmetic mean with Kahan-compensated summation; NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    stable_sum(values) / values.len() as f64
}

/// Sample standard deviation (n - 1 normalizer). A single value has stdev 0.
pub fn sample_stdev(values: &[f64]) -> f64 {
    match values.len() {
        0 => f64::NAN,
        1 => 0.0,
        n => {
            let m = mean(values);
            let squares: Vec<f64> = values.iter().map(|&v| (v - m) * (v - m)).collect();
            (stable_sum(&squares) / (n - 1) as f64).sqrt()
        }
    }
}

/// Percentile of unsorted data, see `percentile_sorted`
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(&sorted, p)
}

/// Percentile of sorted data.
///
/// The i-th of n sorted values sits at percent 100 * (i - 0.5) / n; values in
/// between are linearly interpolated and anything outside the first/last
/// position clamps to the extreme value.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }

    // 1-based fractional position
    let position = n as f64 * p / 100.0 + 0.5;
    if position <= 1.0 {
        return sorted[0];
    }
    if position >= n as f64 {
        return sorted[n - 1];
    }

    let lower = position.floor();
    let fraction = position - lower;
    let lower_idx = lower as usize - 1;
    sorted[lower_idx] + fraction * (sorted[lower_idx + 1] - sorted[lower_idx])
}

fn std_to_mean_disorder(mean: f64, stdev: f64) -> f64 {
    if mean == 0.0 {
        return f64::NAN;
    }
    1.0 - 1.0 / (1.0 + stdev / mean)
}

fn histogram_entropy(sorted: &[f64], bins: usize) -> f64 {
    if bins < 2 {
        return f64::NAN;
    }

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let range = max - min;
    if range <= 0.0 {
        // Single populated bin
        return 0.0;
    }

    let mut counts = vec![0usize; bins];
    for &v in sorted {
        let bin = (((v - min) / range) * bins as f64).floor() as usize;
        counts[bin.min(bins - 1)] += 1;
    }

    let total = sorted.len() as f64;
    let entropy = -counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            p * p.log2()
        })
        .sum::<f64>();

    entropy / (bins as f64).log2()
}

fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for &v in values {
        let y = v - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    sum
}
