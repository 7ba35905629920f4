use crate::model::{DimensionScore, Evidence, FactualDiscrepancy, Opinion, MIN_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// First keyword found in an evidence item's forensic notes decides its dimension.
const DIMENSION_KEYWORDS: &[&str] = &[
    "orchestration",
    "state",
    "documentation",
    "security",
    "parallel",
    "graph",
    "model",
    "tool",
    "test",
];

const FACT_KEYWORDS: &[&str] = &[
    "found", "detected", "observed", "measured", "line", "file", "commit", "hash", "timestamp",
    "ast", "parser", "graph", "edge", "node",
];

const OPINION_KEYWORDS: &[&str] = &[
    "think", "believe", "feel", "seems", "appears", "probably", "maybe", "perhaps", "might",
    "could",
];

const CLAIM_PREVIEW_CHARS: usize = 100;

/// Diagnostic counts of fact-like vs opinion-like reasoning. Informs, never scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactAnalysis {
    pub factual_statements: usize,
    pub opinion_statements: usize,
    pub fact_to_opinion_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactReport {
    pub discrepancies: Vec<FactualDiscrepancy>,
    /// In order of first discrepancy.
    pub dimensions_affected: Vec<String>,
    pub analysis: FactAnalysis,
    pub apply: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FactSupremacy;

impl FactSupremacy {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, opinions: &[Opinion], evidence: &[Evidence]) -> FactReport {
        let mut by_dimension: HashMap<&str, Vec<&Evidence>> = HashMap::new();
        for ev in evidence {
            if let Some(dim) = evidence_dimension(&ev.forensic_notes) {
                by_dimension.entry(dim).or_default().push(ev);
            }
        }

        let mut discrepancies = Vec::new();
        let mut dimensions_affected: Vec<String> = Vec::new();

        for opinion in opinions {
            let Some(known) = by_dimension.get(opinion.dimension.as_str()) else {
                continue;
            };
            let sample: Vec<&str> = known.iter().take(3).map(|e| e.id.as_str()).collect();

            let discrepancy = if opinion.evidence_ids.is_empty() {
                Some(FactualDiscrepancy {
                    dimension: opinion.dimension.clone(),
                    evidence_fact: format!("Evidence exists but not referenced: {:?}", sample),
                    opinion_claim: opinion.reasoning.chars().take(CLAIM_PREVIEW_CHARS).collect(),
                    opinion_source: opinion.persona.clone(),
                    resolution: "Opinion lacks factual basis".to_string(),
                })
            } else {
                let invalid: Vec<&str> = opinion
                    .evidence_ids
                    .iter()
                    .map(String::as_str)
                    .filter(|id| !known.iter().any(|e| e.id == *id))
                    .collect();
                (!invalid.is_empty()).then(|| FactualDiscrepancy {
                    dimension: opinion.dimension.clone(),
                    evidence_fact: format!("Evidence IDs exist: {:?}", sample),
                    opinion_claim: format!("References invalid IDs: {:?}", invalid),
                    opinion_source: opinion.persona.clone(),
                    resolution: "Opinion references non-existent evidence".to_string(),
                })
            };

            if let Some(d) = discrepancy {
                if !dimensions_affected.contains(&d.dimension) {
                    dimensions_affected.push(d.dimension.clone());
                }
                discrepancies.push(d);
            }
        }

        let analysis = count_statements(opinions);
        let apply = !discrepancies.is_empty();

        info!(
            discrepancies = discrepancies.len(),
            affected = ?dimensions_affected,
            factual = analysis.factual_statements,
            opinion = analysis.opinion_statements,
            "fact supremacy analysis complete"
        );

        FactReport {
            discrepancies,
            dimensions_affected,
            analysis,
            apply,
        }
    }

    /// Drop each affected dimension by one point, never below the floor.
    pub fn apply(&self, scores: &mut [DimensionScore], report: &FactReport) {
        if !report.apply {
            return;
        }
        for score in scores.iter_mut() {
            if !report.dimensions_affected.contains(&score.dimension) {
                continue;
            }
            let original = score.score;
            score.score = (original - 1.0).max(MIN_SCORE);
            score.fact_supremacy_applied = true;
            score.annotate(&format!(
                "[FACT SUPREMACY: Score reduced from {:.1} to {:.1} due to unsupported opinions]",
                original, score.score
            ));
            warn!(dimension = %score.dimension, from = original, to = score.score, "fact overruled opinion");
        }
    }
}

fn evidence_dimension(notes: &str) -> Option<&'static str> {
    let notes = notes.to_lowercase();
    DIMENSION_KEYWORDS.iter().copied().find(|kw| notes.contains(kw))
}

fn count_statements(opinions: &[Opinion]) -> FactAnalysis {
    let mut factual = 0;
    let mut opinion = 0;
    for op in opinions {
        let reasoning = op.reasoning.to_lowercase();
        if FACT_KEYWORDS.iter().any(|kw| reasoning.contains(kw)) {
            factual += 1;
        }
        if OPINION_KEYWORDS.iter().any(|kw| reasoning.contains(kw)) {
            opinion += 1;
        }
    }
    FactAnalysis {
        factual_statements: factual,
        opinion_statements: opinion,
        fact_to_opinion_ratio: factual as f64 / opinion.max(1) as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EvidenceSource, Verdict};

    fn opinion(dimension: &str, persona: &str, ids: &[&str], reasoning: &str) -> Opinion {
        Opinion {
            dimension: dimension.into(),
            persona: persona.into(),
            verdict: Verdict::Warn,
            confidence: 0.7,
            reasoning: reasoning.into(),
            evidence_ids: ids.iter().map(|s| s.to_string()).collect(),
            minority_opinion: None,
            round: 0,
        }
    }

    fn ev(id: &str, notes: &str) -> Evidence {
        Evidence::text(id, EvidenceSource::Repo, "", notes, 0.9)
    }

    #[test]
    fn uncited_and_invalid_citations_are_discrepancies() {
        let evidence = vec![ev("g1", "Graph wiring in builder"), ev("s1", "Security scan")];
        let opinions = vec![
            opinion("graph", "Prosecutor", &[], "[Prosecutor] I think it is wired"),
            opinion("graph", "Defense", &["g1"], "[Defense] found fan-out edge"),
            opinion("security", "TechLead", &["nope"], "[TechLead] seems fine"),
            opinion("docs", "Defense", &[], "[Defense] no evidence mapped here"),
        ];

        let report = FactSupremacy::new().analyze(&opinions, &evidence);
        assert!(report.apply);
        assert_eq!(report.discrepancies.len(), 2);
        assert_eq!(report.discrepancies[0].resolution, "Opinion lacks factual basis");
        assert_eq!(report.discrepancies[0].opinion_source, "Prosecutor");
        assert_eq!(
            report.discrepancies[1].resolution,
            "Opinion references non-existent evidence"
        );
        assert_eq!(report.dimensions_affected, vec!["graph", "security"]);
    }

    #[test]
    fn first_dimension_keyword_wins() {
        assert_eq!(evidence_dimension("State graph reducers"), Some("state"));
        assert_eq!(evidence_dimension("GRAPH topology"), Some("graph"));
        assert_eq!(evidence_dimension(""), None);
    }

    #[test]
    fn statement_counts_and_ratio() {
        let ops = vec![
            opinion("x", "A", &[], "Found a commit hash"),
            opinion("x", "B", &[], "I believe it might work"),
            opinion("x", "C", &[], "detected node but it seems off"),
        ];
        let a = count_statements(&ops);
        assert_eq!(a.factual_statements, 2);
        assert_eq!(a.opinion_statements, 2);
        assert_eq!(a.fact_to_opinion_ratio, 1.0);
        assert_eq!(count_statements(&[]).fact_to_opinion_ratio, 0.0);
    }

    #[test]
    fn apply_reduces_by_one_with_floor() {
        let report = FactReport {
            discrepancies: vec![],
            dimensions_affected: vec!["graph".into(), "security".into()],
            analysis: FactAnalysis::default(),
            apply: true,
        };
        let mut scores = vec![
            DimensionScore::new("graph", 3.5, 0.8, "base".into()),
            DimensionScore::new("security", 1.0, 0.8, "base".into()),
            DimensionScore::new("docs", 4.0, 0.8, "base".into()),
        ];
        FactSupremacy::new().apply(&mut scores, &report);

        assert_eq!(scores[0].score, 2.5);
        assert!(scores[0]
            .reasoning
            .ends_with("[FACT SUPREMACY: Score reduced from 3.5 to 2.5 due to unsupported opinions]"));
        assert_eq!(scores[1].score, 1.0);
        assert!(scores[1].fact_supremacy_applied);
        assert_eq!(scores[2].score, 4.0);
        assert!(!scores[2].fact_supremacy_applied);
    }

    #[test]
    fn whole_scores_keep_one_decimal_in_annotation() {
        let report = FactReport {
            discrepancies: vec![],
            dimensions_affected: vec!["graph".into()],
            analysis: FactAnalysis::default(),
            apply: true,
        };
        let mut scores = vec![DimensionScore::new("graph", 3.0, 0.8, String::new())];
        FactSupremacy::new().apply(&mut scores, &report);
        assert!(scores[0]
            .reasoning
            .ends_with("[FACT SUPREMACY: Score reduced from 3.0 to 2.0 due to unsupported opinions]"));
    }

    #[test]
    fn no_discrepancies_leaves_scores_alone() {
        let report = FactSupremacy::new().analyze(&[], &[ev("g1", "graph")]);
        assert!(!report.apply);
        let mut scores = vec![DimensionScore::new("graph", 4.0, 0.8, String::new())];
        FactSupremacy::new().apply(&mut scores, &report);
        assert_eq!(scores[0].score, 4.0);
    }
}
