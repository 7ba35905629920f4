use crate::model::{clamp_score, DimensionScore, Opinion};
use crate::rubric::Rubric;
use std::collections::HashMap;

const DISSENT_GAP: f64 = 2.0;
const DISSENT_LISTED: usize = 3;
const DISSENT_PREVIEW_CHARS: usize = 100;

/// Nearest half point; ties go to the even half-step.
pub fn round_to_half(x: f64) -> f64 {
    (x * 2.0).round_ties_even() / 2.0
}

fn round_to_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// One score per rubric dimension, in rubric order.
///
/// The score is the mean scaled value rounded to the nearest half point. A
/// dimension nobody ruled on gets `neutral` with zero confidence.
pub fn initial_scores(rubric: &Rubric, opinions: &[Opinion], neutral: f64) -> Vec<DimensionScore> {
    rubric
        .dimensions
        .iter()
        .map(|dim| {
            let group: Vec<&Opinion> = opinions.iter().filter(|o| o.dimension == dim.name).collect();
            match mean(group.iter().map(|o| o.scaled_value())) {
                Some(avg) => DimensionScore::new(
                    dim.name.clone(),
                    clamp_score(round_to_half(avg)),
                    mean(group.iter().map(|o| o.confidence)).unwrap_or(0.0),
                    format!("Average of {} opinions", group.len()),
                ),
                None => DimensionScore::new(dim.name.clone(), neutral, 0.0, "No surviving opinions".into()),
            }
        })
        .collect()
}

/// Weighted mean by rubric weight, to two decimals.
pub fn overall_score(scores: &[DimensionScore], rubric: &Rubric, neutral: f64) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for s in scores {
        let w = rubric.weight_of(&s.dimension);
        weighted += s.score * w;
        total_weight += w;
    }
    if total_weight <= 0.0 {
        return neutral;
    }
    clamp_score(round_to_cents(weighted / total_weight))
}

pub fn dissent_summary(opinions: &[Opinion], scores: &[DimensionScore], neutral: f64) -> String {
    let finals: HashMap<&str, f64> = scores.iter().map(|s| (s.dimension.as_str(), s.score)).collect();
    let dissents: Vec<String> = opinions
        .iter()
        .filter(|o| {
            let final_score = finals.get(o.dimension.as_str()).copied().unwrap_or(neutral);
            (o.scaled_value() - final_score).abs() > DISSENT_GAP
        })
        .take(DISSENT_LISTED)
        .map(|o| {
            let preview: String = o.reasoning.chars().take(DISSENT_PREVIEW_CHARS).collect();
            format!("{}: {}...", o.dimension, preview)
        })
        .collect();

    if dissents.is_empty() {
        "No significant dissenting opinions".to_string()
    } else {
        format!("Significant dissenting opinions:\n{}", dissents.join("\n"))
    }
}
