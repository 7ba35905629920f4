use crate::model::{DimensionScore, Priority, RemediationAction};
use crate::rules::{FactReport, SecurityReport};

const FACT_REMEDIATIONS: usize = 3;
const LOW_SCORE: f64 = 2.0;

/// Security fixes first, then up to three factual discrepancies, then every weak dimension.
pub fn remediation_plan(
    security: &SecurityReport,
    facts: &FactReport,
    scores: &[DimensionScore],
) -> Vec<RemediationAction> {
    let mut plan = security.remediations.clone();

    plan.extend(facts.discrepancies.iter().take(FACT_REMEDIATIONS).map(|d| {
        RemediationAction::new(
            Priority::Medium,
            format!("Address factual discrepancy in {}", d.dimension),
            d.resolution.clone(),
        )
    }));

    plan.extend(scores.iter().filter(|s| s.score <= LOW_SCORE).map(|s| {
        let reasoning = if s.reasoning.is_empty() {
            "Low score requires attention".to_string()
        } else {
            s.reasoning.clone()
        };
        RemediationAction::new(
            Priority::High,
            format!("Improve {} - current score {:.1}/5", s.dimension, s.score),
            reasoning,
        )
    }));

    plan
}
