use crate::model::{DimensionScore, Opinion, Verdict};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionVariance {
    pub dimension: String,
    /// Population variance of the scaled values.
    pub variance: f64,
    pub std_dev: f64,
    pub scores: Vec<f64>,
    pub verdicts: Vec<Verdict>,
    pub high_variance: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarianceReport {
    pub details: Vec<DimensionVariance>,
    pub high_variance_dimensions: Vec<String>,
    pub trigger_re_evaluation: bool,
}

/// Per-run allowance of re-evaluation rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReEvaluationBudget {
    remaining: u32,
    used: u32,
}

impl ReEvaluationBudget {
    pub fn new(max: u32) -> Self {
        Self {
            remaining: max,
            used: 0,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Spend one round. Returns false, spending nothing, once exhausted.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.used += 1;
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VarianceDetector {
    threshold: f64,
}

impl VarianceDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Spread of scaled values per dimension. Dimensions with fewer than two
    /// opinions are skipped. Does not consult any budget.
    pub fn analyze(&self, opinions: &[Opinion]) -> VarianceReport {
        let mut groups: Vec<(&str, Vec<&Opinion>)> = Vec::new();
        for op in opinions {
            match groups.iter_mut().find(|(dim, _)| *dim == op.dimension) {
                Some((_, group)) => group.push(op),
                None => groups.push((op.dimension.as_str(), vec![op])),
            }
        }

        let mut details = Vec::new();
        let mut high_variance_dimensions = Vec::new();
        for (dimension, group) in groups {
            if group.len() < 2 {
                continue;
            }
            let scores: Vec<f64> = group.iter().map(|o| o.scaled_value()).collect();
            let variance = population_variance(&scores);
            let high_variance = variance > self.threshold;
            debug!(dimension, variance, high_variance, "dimension variance");

            if high_variance {
                high_variance_dimensions.push(dimension.to_string());
            }
            details.push(DimensionVariance {
                dimension: dimension.to_string(),
                variance,
                std_dev: variance.sqrt(),
                scores,
                verdicts: group.iter().map(|o| o.verdict).collect(),
                high_variance,
            });
        }

        VarianceReport {
            trigger_re_evaluation: !high_variance_dimensions.is_empty(),
            details,
            high_variance_dimensions,
        }
    }

    /// `analyze`, with the trigger gated on (and paid from) the run's budget.
    pub fn assess(&self, opinions: &[Opinion], budget: &mut ReEvaluationBudget) -> VarianceReport {
        let mut report = self.analyze(opinions);
        if report.trigger_re_evaluation {
            report.trigger_re_evaluation = budget.try_consume();
            info!(
                dimensions = ?report.high_variance_dimensions,
                triggered = report.trigger_re_evaluation,
                remaining = budget.remaining(),
                "high variance detected"
            );
        }
        report
    }

    /// Mark every high-variance dimension. Applied whether or not a re-evaluation ran.
    pub fn flag(&self, scores: &mut [DimensionScore], report: &VarianceReport) {
        for score in scores.iter_mut() {
            if report.high_variance_dimensions.contains(&score.dimension) {
                score.variance_detected = true;
                score.annotate("[HIGH VARIANCE: Needs re-evaluation]");
            }
        }
    }
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
