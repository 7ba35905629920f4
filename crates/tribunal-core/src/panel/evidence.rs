use crate::model::{Dimension, Evidence};

/// Evidence relevant to `dimension`, most confident first, at most `top_k` items.
///
/// An item is relevant when its forensic notes mention the dimension name
/// (case-insensitive) or its id contains one of the dimension's evidence patterns.
pub fn select_evidence(dimension: &Dimension, evidence: &[Evidence], top_k: usize) -> Vec<Evidence> {
    let name = dimension.name.to_lowercase();
    let mut relevant: Vec<&Evidence> = evidence
        .iter()
        .filter(|e| {
            e.forensic_notes.to_lowercase().contains(&name)
                || dimension
                    .evidence_patterns
                    .iter()
                    .any(|p| !p.is_empty() && e.id.contains(p.as_str()))
        })
        .collect();

    // stable: equal confidence keeps input order
    relevant.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    relevant.into_iter().take(top_k).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EvidenceSource;

    fn ev(id: &str, notes: &str, confidence: f64) -> Evidence {
        Evidence::text(id, EvidenceSource::Repo, "content", notes, confidence)
    }

    #[test]
    fn matches_by_notes_or_pattern_and_orders_by_confidence() {
        let mut dim = Dimension::new("security", "d", 1.0, "github_repo");
        dim.evidence_patterns = vec!["sec-".to_string()];
        let pool = vec![
            ev("a", "Security scan of tools/", 0.4),
            ev("sec-1", "unrelated", 0.9),
            ev("b", "docs only", 1.0),
            ev("c", "security: subprocess", 0.4),
        ];
        let picked = select_evidence(&dim, &pool, 5);
        let ids: Vec<_> = picked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["sec-1", "a", "c"]);
    }

    #[test]
    fn truncates_to_top_k() {
        let dim = Dimension::new("graph", "d", 1.0, "github_repo");
        let pool: Vec<_> = (0..8).map(|i| ev(&format!("e{i}"), "graph", i as f64 / 10.0)).collect();
        let picked = select_evidence(&dim, &pool, 3);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0].id, "e7");
    }

    #[test]
    fn no_match_yields_empty_slice() {
        let dim = Dimension::new("docs", "d", 1.0, "pdf_report");
        assert!(select_evidence(&dim, &[ev("x", "security", 1.0)], 5).is_empty());
    }
}
