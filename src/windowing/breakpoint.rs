//! Breakpoint thresholds over chunk similarity scores.
//!
//! A breakpoint is a similarity cutoff derived from the score distribution
//! itself. Only chunks scoring strictly above it are kept as context.
//!
//! | kind                 | threshold              | default amount |
//! |----------------------|------------------------|----------------|
//! | `percentile`         | p-th percentile        | 95             |
//! | `standard_deviation` | mean + k * std         | 3              |
//! | `interquartile`      | p75 + k * (p75 - p25)  | 1.5            |
//!
//! Percentiles interpolate linearly between closest ranks and the standard
//! deviation is the population one.

use serde::{Deserialize, Serialize};

/// Statistic used to derive the breakpoint threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakpointKind {
    /// p-th percentile of the scores
    #[default]
    Percentile,
    /// Mean plus k standard deviations
    StandardDeviation,
    /// Third quartile plus k interquartile ranges
    Interquartile,
}

impl BreakpointKind {
    /// Amount used when none is configured.
    pub fn default_amount(self) -> f64 {
        match self {
            BreakpointKind::Percentile => 95.0,
            BreakpointKind::StandardDeviation => 3.0,
            BreakpointKind::Interquartile => 1.5,
        }
    }
}

impl std::str::FromStr for BreakpointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "percentile" => Ok(Self::Percentile),
            "standard_deviation" | "std" => Ok(Self::StandardDeviation),
            "interquartile" | "iqr" => Ok(Self::Interquartile),
            _ => Err(format!(
                "unknown breakpoint kind '{s}'. Valid options: percentile, standard_deviation, interquartile"
            )),
        }
    }
}

/// Breakpoint configuration: a statistic and its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BreakpointThreshold {
    /// Statistic
    #[serde(default)]
    pub kind: BreakpointKind,
    /// Percentile or multiplier; the kind's default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl BreakpointThreshold {
    /// Breakpoint of the given kind with its default amount.
    pub fn new(kind: BreakpointKind) -> Self {
        Self { kind, amount: None }
    }

    /// Set the percentile or multiplier.
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Effective amount.
    pub fn amount(&self) -> f64 {
        self.amount.unwrap_or_else(|| self.kind.default_amount())
    }

    /// Compute the threshold over a set of scores.
    ///
    /// Returns `None` for an empty score set.
    ///
    /// # Examples
    ///
    /// ```
    /// use table_context::windowing::{BreakpointKind, BreakpointThreshold};
    ///
    /// let scores = [0.1, 0.2, 0.3, 0.4, 0.5];
    /// let p50 = BreakpointThreshold::new(BreakpointKind::Percentile).with_amount(50.0);
    /// assert!((p50.threshold(&scores).unwrap() - 0.3).abs() < 1e-6);
    /// ```
    pub fn threshold(&self, scores: &[f32]) -> Option<f64> {
        if scores.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = scores.iter().map(|&s| f64::from(s)).collect();
        sorted.sort_by(f64::total_cmp);

        let amount = self.amount();
        let value = match self.kind {
            BreakpointKind::Percentile => percentile(&sorted, amount),
            BreakpointKind::StandardDeviation => {
                let (mean, std) = mean_and_std(&sorted);
                mean + amount * std
            },
            BreakpointKind::Interquartile => {
                let q1 = percentile(&sorted, 25.0);
                let q3 = percentile(&sorted, 75.0);
                q3 + amount * (q3 - q1)
            },
        };
        Some(value)
    }
}

/// Percentile of sorted values with linear interpolation between ranks.
///
/// `p` is clamped to `[0, 100]`; `sorted` must be non-empty and ascending.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let last = sorted.len() - 1;
    let rank = p.clamp(0.0, 100.0) / 100.0 * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil().min(last as f64) as usize;
    let (a, b) = (sorted[lo], sorted[hi]);
    (a + (b - a) * (rank - lo as f64)).clamp(a, b)
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Keep the chunks scoring strictly above `threshold`.
///
/// Kept chunks are concatenated in their original order, each followed by a
/// newline. Chunks and scores are paired positionally.
///
/// # Examples
///
/// ```
/// use table_context::windowing::filter_chunks;
///
/// let context = filter_chunks(&["Alpha", "Beta", "Gamma"], &[0.9, 0.1, 0.95], 0.6);
/// assert_eq!(context, "Alpha\nGamma\n");
/// ```
pub fn filter_chunks<S: AsRef<str>>(chunks: &[S], scores: &[f32], threshold: f64) -> String {
    let mut context = String::new();
    for (chunk, &score) in chunks.iter().zip(scores) {
        if f64::from(score) > threshold {
            context.push_str(chunk.as_ref());
            context.push('\n');
        }
    }
    context
}
