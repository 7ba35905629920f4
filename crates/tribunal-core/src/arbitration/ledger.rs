use crate::model::Opinion;

/// Append-only record of every opinion rendered during a run, grouped by round.
///
/// Round 0 is the initial panel; each re-evaluation appends a new round holding
/// only the re-judged dimensions. Nothing recorded is ever rewritten.
#[derive(Debug, Clone, Default)]
pub struct OpinionLedger {
    rounds: Vec<Vec<Opinion>>,
}

impl OpinionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a round, stamping each opinion with its round number.
    pub fn record_round(&mut self, opinions: Vec<Opinion>) -> u32 {
        let round = self.rounds.len() as u32;
        let stamped = opinions
            .into_iter()
            .map(|op| Opinion { round, ..op })
            .collect();
        self.rounds.push(stamped);
        round
    }

    pub fn rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn round(&self, n: u32) -> Option<&[Opinion]> {
        self.rounds.get(n as usize).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.iter().all(Vec::is_empty)
    }

    /// Every opinion ever recorded, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Opinion> {
        self.rounds.iter().flatten()
    }

    /// Opinions in force: for each dimension, those of the latest round that
    /// produced any opinion for it. Dimensions keep first-seen order.
    pub fn current(&self) -> Vec<Opinion> {
        let mut dimensions: Vec<&str> = Vec::new();
        for op in self.history() {
            if !dimensions.contains(&op.dimension.as_str()) {
                dimensions.push(op.dimension.as_str());
            }
        }

        let mut current = Vec::new();
        for dim in dimensions {
            let latest = self
                .rounds
                .iter()
                .rev()
                .find(|round| round.iter().any(|op| op.dimension == dim));
            if let Some(round) = latest {
                current.extend(round.iter().filter(|op| op.dimension == dim).cloned());
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Verdict;

    fn op(dimension: &str, persona: &str, verdict: Verdict) -> Opinion {
        Opinion {
            dimension: dimension.into(),
            persona: persona.into(),
            verdict,
            confidence: 0.8,
            reasoning: String::new(),
            evidence_ids: vec![],
            minority_opinion: None,
            round: 99,
        }
    }

    #[test]
    fn later_rounds_supersede_per_dimension() {
        let mut ledger = OpinionLedger::new();
        assert!(ledger.is_empty());
        ledger.record_round(vec![
            op("docs", "A", Verdict::Pass),
            op("docs", "B", Verdict::Fail),
            op("graph", "A", Verdict::Warn),
        ]);
        let round = ledger.record_round(vec![op("docs", "A", Verdict::Warn)]);
        assert_eq!(round, 1);

        let current = ledger.current();
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].dimension, "docs");
        assert_eq!(current[0].verdict, Verdict::Warn);
        assert_eq!(current[0].round, 1);
        assert_eq!(current[1].dimension, "graph");
        assert_eq!(current[1].round, 0);
        assert_eq!(ledger.history().count(), 4);
    }

    #[test]
    fn empty_round_does_not_erase_previous_opinions() {
        let mut ledger = OpinionLedger::new();
        ledger.record_round(vec![op("docs", "A", Verdict::Pass)]);
        ledger.record_round(vec![]);
        assert_eq!(ledger.rounds(), 2);
        assert_eq!(ledger.current().len(), 1);
        assert_eq!(ledger.round(1).map(<[Opinion]>::len), Some(0));
    }
}
