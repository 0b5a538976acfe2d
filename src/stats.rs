//! Posterior summaries and density estimation over the sampled rates.
//!
//! Everything here is derived from a finished [`RateTrace`]; the sampler never
//! depends on it. The histogram is the density estimate the presentation layer
//! plots against the prior.

use itertools::{Itertools, MinMaxResult};

use crate::trace::RateTrace;

/// Equal-width histogram over sampled rate values.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    low: f64,
    bin_width: f64,
    counts: Vec<u64>,
    total: u64,
}

impl Histogram {
    /// Bin `values` into `num_bins` equal-width bins.
    ///
    /// Returns `None` for an empty input or a zero bin count. A constant
    /// input (a degenerate chain) gets a unit-width interval centered on the
    /// value so the histogram stays drawable.
    pub fn from_values(values: &[f64], num_bins: usize) -> Option<Histogram> {
        if values.is_empty() || num_bins == 0 {
            return None;
        }
        let (low, high) = match values.iter().copied().minmax() {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(v) => (v - 0.5, v + 0.5),
            MinMaxResult::MinMax(low, high) if low == high => (low - 0.5, high + 0.5),
            MinMaxResult::MinMax(low, high) => (low, high),
        };
        let bin_width = (high - low) / num_bins as f64;
        let mut counts = vec![0u64; num_bins];
        for &value in values {
            let bin = (((value - low) / bin_width) as usize).min(num_bins - 1);
            counts[bin] += 1;
        }
        Some(Histogram {
            low,
            bin_width,
            counts,
            total: values.len() as u64,
        })
    }

    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Bin boundaries, `num_bins + 1` values.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.counts.len())
            .map(|i| self.low + i as f64 * self.bin_width)
            .collect()
    }

    /// Normalized bar heights: the histogram integrates to one.
    pub fn densities(&self) -> Vec<f64> {
        let norm = self.total as f64 * self.bin_width;
        self.counts.iter().map(|&c| c as f64 / norm).collect()
    }
}

/// Point summaries of the posterior sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosteriorSummary {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub q025: f64,
    pub median: f64,
    pub q975: f64,
    pub acceptance_rate: f64,
}

/// Summarize a finished trace.
pub fn summarize(trace: &RateTrace) -> Option<PosteriorSummary> {
    if trace.is_empty() {
        return None;
    }
    let n = trace.len();
    let mean = trace.rates().sum::<f64>() / n as f64;
    let variance = trace.rates().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n as f64;

    let mut sorted = trace.rates().collect_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    Some(PosteriorSummary {
        n,
        mean,
        std_dev: variance.sqrt(),
        q025: quantile(&sorted, 0.025),
        median: quantile(&sorted, 0.5),
        q975: quantile(&sorted, 0.975),
        acceptance_rate: trace.acceptance_rate(),
    })
}

/// Linear-interpolation quantile of an ascending-sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    if below == above {
        sorted[below]
    } else {
        let weight = position - below as f64;
        sorted[below] * (1. - weight) + sorted[above] * weight
    }
}
