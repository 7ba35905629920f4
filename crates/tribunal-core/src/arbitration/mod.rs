pub mod ledger;
pub mod remediation;
pub mod scoring;

use crate::config::EngineConfig;
use crate::errors::{ConfigError, PanelError};
use crate::model::{grade_for, Evidence, FinalVerdict, Opinion};
use crate::panel::collusion::CollusionReport;
use crate::panel::{JudgingPanel, PanelOutcome};
use crate::rubric::Rubric;
use crate::rules::{FactSupremacy, ReEvaluationBudget, SecurityOverride, VarianceDetector, VarianceReport};
pub use ledger::OpinionLedger;
use tracing::{info, info_span, warn, Instrument};

/// State owned by a single arbitration: inputs, every opinion rendered so far,
/// the re-evaluation budget and accumulated non-fatal errors.
#[derive(Debug, Clone)]
pub struct ArbitrationRun {
    pub case_id: String,
    pub rubric: Rubric,
    pub evidence: Vec<Evidence>,
    pub ledger: OpinionLedger,
    pub budget: ReEvaluationBudget,
    pub errors: Vec<PanelError>,
    pub collusion_reports: Vec<CollusionReport>,
}

impl ArbitrationRun {
    pub fn new(rubric: Rubric, evidence: Vec<Evidence>, config: &EngineConfig) -> Self {
        Self {
            case_id: new_case_id(),
            rubric,
            evidence,
            ledger: OpinionLedger::new(),
            budget: ReEvaluationBudget::new(config.variance.max_re_evaluations),
            errors: Vec::new(),
            collusion_reports: Vec::new(),
        }
    }

    /// Record one round of opinions. Opinions for dimensions outside the rubric
    /// are dropped and logged as run errors.
    pub fn record_opinions(&mut self, opinions: impl IntoIterator<Item = Opinion>) -> u32 {
        let mut known = Vec::new();
        for op in opinions {
            if self.rubric.dimension(&op.dimension).is_some() {
                known.push(op);
            } else {
                warn!(dimension = %op.dimension, persona = %op.persona, "opinion for unknown dimension ignored");
                self.errors
                    .push(PanelError::unknown_dimension(&op.dimension, &op.persona));
            }
        }
        self.ledger.record_round(known)
    }

    /// Record a panel pass as one round, keeping its errors and collusion reports.
    pub fn record_outcomes(&mut self, outcomes: Vec<PanelOutcome>) -> u32 {
        let mut opinions = Vec::new();
        for outcome in outcomes {
            opinions.extend(outcome.opinions);
            self.errors.extend(outcome.errors);
            self.collusion_reports.push(outcome.collusion);
        }
        self.record_opinions(opinions)
    }
}

/// `CASE_<utc timestamp>_<8 hex chars>`.
pub fn new_case_id() -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("CASE_{}_{}", stamp, &suffix[..8])
}

/// Deterministic synthesis of opinions into a final verdict.
///
/// Rules run in fixed order on the initial scores: security override, fact
/// supremacy, variance. Later rules never raise a score an earlier one lowered.
#[derive(Debug, Clone)]
pub struct ChiefJustice {
    config: EngineConfig,
    security: SecurityOverride,
    facts: FactSupremacy,
    variance: VarianceDetector,
}

impl ChiefJustice {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            variance: VarianceDetector::new(config.variance.threshold),
            security: SecurityOverride::new(),
            facts: FactSupremacy::new(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Judge every rubric dimension with `panel` (when given), re-judge contested
    /// dimensions while the budget allows, then arbitrate.
    pub async fn convene(&self, run: &mut ArbitrationRun, panel: Option<&JudgingPanel>) -> FinalVerdict {
        let span = info_span!("arbitration", case_id = %run.case_id);
        self.convene_inner(run, panel).instrument(span).await
    }

    async fn convene_inner(&self, run: &mut ArbitrationRun, panel: Option<&JudgingPanel>) -> FinalVerdict {
        if let Some(panel) = panel {
            info!(
                dimensions = run.rubric.dimensions.len(),
                judges = panel.personas().len(),
                "convening panel"
            );
            let outcomes = panel.judge_dimensions(&run.rubric.dimensions, &run.evidence).await;
            run.record_outcomes(outcomes);
        }

        let mut report = self.variance.assess(&run.ledger.current(), &mut run.budget);
        while report.trigger_re_evaluation {
            let Some(panel) = panel else {
                break;
            };
            let contested: Vec<_> = run
                .rubric
                .dimensions
                .iter()
                .filter(|d| report.high_variance_dimensions.contains(&d.name))
                .cloned()
                .collect();
            info!(
                round = run.ledger.rounds(),
                dimensions = ?report.high_variance_dimensions,
                "re-evaluating contested dimensions"
            );
            let outcomes = panel.judge_dimensions(&contested, &run.evidence).await;
            run.record_outcomes(outcomes);
            report = self.variance.assess(&run.ledger.current(), &mut run.budget);
        }

        self.synthesize(run, report)
    }

    /// Arbitrate the opinions already on the ledger. No judge is consulted.
    pub fn arbitrate(&self, run: &mut ArbitrationRun) -> FinalVerdict {
        let report = self.variance.assess(&run.ledger.current(), &mut run.budget);
        self.synthesize(run, report)
    }

    fn synthesize(&self, run: &ArbitrationRun, variance: VarianceReport) -> FinalVerdict {
        let neutral = self.config.neutral_score;
        let opinions = run.ledger.current();
        info!(
            opinions = opinions.len(),
            evidence = run.evidence.len(),
            dimensions = run.rubric.dimensions.len(),
            "arbitrating"
        );

        let mut scores = scoring::initial_scores(&run.rubric, &opinions, neutral);

        let security = self.security.analyze(&run.evidence);
        self.security.apply(&mut scores, &security);

        let facts = self.facts.analyze(&opinions, &run.evidence);
        self.facts.apply(&mut scores, &facts);

        self.variance.flag(&mut scores, &variance);

        let overall_score = scoring::overall_score(&scores, &run.rubric, neutral);
        let dissent_summary = scoring::dissent_summary(&opinions, &scores, neutral);
        let remediation_plan = remediation::remediation_plan(&security, &facts, &scores);
        let grade = grade_for(overall_score).to_string();

        info!(
            overall_score,
            grade = %grade,
            security_cap = security.apply_cap,
            fact_supremacy = facts.dimensions_affected.len(),
            high_variance = variance.high_variance_dimensions.len(),
            re_evaluations = run.budget.used(),
            errors = run.errors.len(),
            "verdict rendered"
        );

        FinalVerdict {
            case_id: run.case_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            overall_score,
            grade,
            dimension_scores: scores,
            security_override_triggered: security.apply_cap,
            security_cap_applied: security.cap_score,
            highest_risk: security.highest_risk,
            security_findings: security.findings,
            factual_discrepancies: facts.discrepancies,
            fact_supremacy_applied: facts.dimensions_affected,
            fact_analysis: facts.analysis,
            high_variance_dimensions: variance.high_variance_dimensions,
            variance_details: variance.details,
            re_evaluations_triggered: run.budget.used(),
            collusion_reports: run.collusion_reports.clone(),
            dissent_summary,
            remediation_plan,
            synthesis_rules_applied: run.rubric.synthesis_rules(),
            errors: run.errors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimension, Verdict};

    fn rubric() -> Rubric {
        Rubric::new(vec![
            Dimension::new("graph", "Parallel graph wiring", 1.0, "github_repo"),
            Dimension::new("docs", "Report depth", 1.0, "pdf_report"),
        ])
        .unwrap()
    }

    fn op(dimension: &str, persona: &str, verdict: Verdict, confidence: f64) -> Opinion {
        Opinion {
            dimension: dimension.into(),
            persona: persona.into(),
            verdict,
            confidence,
            reasoning: format!("[{persona}] reviewed {dimension}"),
            evidence_ids: vec![],
            minority_opinion: None,
            round: 0,
        }
    }

    #[test]
    fn case_id_shape() {
        let id = new_case_id();
        assert!(id.starts_with("CASE_"));
        // CASE_ + yyyymmdd_hhmmss + _ + 8
        assert_eq!(id.len(), 5 + 15 + 1 + 8);
    }

    #[test]
    fn unknown_dimensions_are_recorded_not_scored() {
        let config = EngineConfig::default();
        let mut run = ArbitrationRun::new(rubric(), vec![], &config);
        run.record_opinions(vec![
            op("graph", "Defense", Verdict::Pass, 0.9),
            op("vibes", "Defense", Verdict::Pass, 1.0),
        ]);
        let verdict = ChiefJustice::new(config).unwrap().arbitrate(&mut run);

        assert_eq!(verdict.dimension_scores.len(), 2);
        assert_eq!(verdict.errors.len(), 1);
        assert_eq!(verdict.errors[0].dimension, "vibes");
        assert_eq!(verdict.score_for("graph").map(|s| s.score), Some(4.5));
        assert_eq!(verdict.score_for("docs").map(|s| s.score), Some(3.0));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = EngineConfig::default();
        config.neutral_score = 9.0;
        assert!(matches!(ChiefJustice::new(config), Err(ConfigError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn convene_without_panel_matches_arbitrate() {
        let config = EngineConfig::default();
        let justice = ChiefJustice::new(config.clone()).unwrap();
        let opinions = vec![
            op("docs", "Prosecutor", Verdict::Fail, 1.0),
            op("docs", "Defense", Verdict::Pass, 1.0),
        ];

        let mut a = ArbitrationRun::new(rubric(), vec![], &config);
        a.record_opinions(opinions.clone());
        let mut b = ArbitrationRun::new(rubric(), vec![], &config);
        b.record_opinions(opinions);

        let via_convene = justice.convene(&mut a, None).await;
        let via_arbitrate = justice.arbitrate(&mut b);
        assert_eq!(via_convene.dimension_scores, via_arbitrate.dimension_scores);
        assert_eq!(via_convene.re_evaluations_triggered, 1);
        assert_eq!(a.budget.remaining(), 2);
    }
}
