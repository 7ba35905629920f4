use crate::model::{Opinion, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollusionPair {
    pub judge1: String,
    pub judge2: String,
    pub similarity: f64,
    pub verdicts: [Verdict; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollusionReport {
    pub dimension: String,
    pub collusion_detected: bool,
    pub pairs: Vec<CollusionPair>,
    pub threshold: f64,
}

/// Token-set overlap `|A ∩ B| / |A ∪ B|` over lower-cased whitespace tokens.
/// Two empty texts have similarity 0.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    intersection as f64 / union as f64
}

#[derive(Debug, Clone, Copy)]
pub struct CollusionDetector {
    threshold: f64,
}

impl CollusionDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Reports every pair above the threshold. Opinions are never dropped here.
    pub fn check(&self, dimension: &str, opinions: &[Opinion]) -> CollusionReport {
        let mut pairs = Vec::new();
        for i in 0..opinions.len() {
            for j in (i + 1)..opinions.len() {
                let similarity = jaccard_similarity(&opinions[i].reasoning, &opinions[j].reasoning);
                if similarity > self.threshold {
                    pairs.push(CollusionPair {
                        judge1: opinions[i].persona.clone(),
                        judge2: opinions[j].persona.clone(),
                        similarity,
                        verdicts: [opinions[i].verdict, opinions[j].verdict],
                    });
                }
            }
        }

        CollusionReport {
            dimension: dimension.to_string(),
            collusion_detected: !pairs.is_empty(),
            pairs,
            threshold: self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opinion(persona: &str, reasoning: &str) -> Opinion {
        Opinion {
            dimension: "docs".into(),
            persona: persona.into(),
            verdict: Verdict::Pass,
            confidence: 0.8,
            reasoning: reasoning.into(),
            evidence_ids: vec![],
            minority_opinion: None,
            round: 0,
        }
    }

    #[test]
    fn jaccard_basics() {
        assert_eq!(jaccard_similarity("", ""), 0.0);
        assert_eq!(jaccard_similarity("a b c", "A B C"), 1.0);
        assert_eq!(jaccard_similarity("a b", "b c"), 1.0 / 3.0);
    }

    #[test]
    fn identical_reasoning_is_reported_not_removed() {
        let ops = vec![
            opinion("Prosecutor", "the readme covers setup and usage in depth"),
            opinion("Defense", "the readme covers setup and usage in depth"),
            opinion("TechLead", "architecture section is missing entirely"),
        ];
        let report = CollusionDetector::new(0.9).check("docs", &ops);
        assert!(report.collusion_detected);
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].judge1, "Prosecutor");
        assert_eq!(report.pairs[0].judge2, "Defense");
        assert_eq!(report.pairs[0].similarity, 1.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        let ops = vec![opinion("A", "x y"), opinion("B", "y z")];
        let report = CollusionDetector::new(1.0 / 3.0).check("docs", &ops);
        assert!(!report.collusion_detected);
        assert!(CollusionDetector::new(0.9).check("docs", &ops[..1]).pairs.is_empty());
    }
}
