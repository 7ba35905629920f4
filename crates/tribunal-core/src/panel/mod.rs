pub mod collusion;
pub mod evidence;

use crate::config::{EngineConfig, PanelConfig};
use crate::errors::{JudgeError, PanelError};
use crate::judge::{Judge, PersonaJudge};
use crate::model::{Dimension, Evidence, Opinion};
use crate::providers::llm::tracing::TracingLlmClient;
use crate::providers::llm::LlmClient;
use collusion::{CollusionDetector, CollusionReport};
use evidence::select_evidence;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};

/// Everything one dimension's panel produced.
#[derive(Debug, Clone)]
pub struct PanelOutcome {
    pub dimension: String,
    /// Surviving opinions, in judge configuration order.
    pub opinions: Vec<Opinion>,
    pub collusion: CollusionReport,
    pub errors: Vec<PanelError>,
}

/// Seats a fixed set of judges and runs them concurrently per dimension.
#[derive(Clone)]
pub struct JudgingPanel {
    judges: Vec<Arc<dyn Judge>>,
    config: PanelConfig,
}

impl JudgingPanel {
    pub fn new(judges: Vec<Arc<dyn Judge>>, config: PanelConfig) -> Self {
        Self { judges, config }
    }

    /// One `PersonaJudge` per configured persona, sharing a traced client.
    pub fn from_config(cfg: &EngineConfig, client: Arc<dyn LlmClient>) -> Self {
        let client: Arc<dyn LlmClient> = Arc::new(TracingLlmClient::new(client));
        let judges = cfg
            .personas
            .iter()
            .map(|p| {
                Arc::new(PersonaJudge::new(p.name.clone(), p.stance, client.clone()))
                    as Arc<dyn Judge>
            })
            .collect();
        Self::new(judges, cfg.panel.clone())
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn personas(&self) -> Vec<String> {
        self.judges.iter().map(|j| j.persona().to_string()).collect()
    }

    /// Fan out every judge for `dimension`, join, then run collusion detection.
    pub async fn judge_dimension(&self, dimension: &Dimension, evidence: &[Evidence]) -> PanelOutcome {
        let span = info_span!("panel.dimension", dimension = %dimension.name);
        self.judge_dimension_inner(dimension, evidence)
            .instrument(span)
            .await
    }

    async fn judge_dimension_inner(&self, dimension: &Dimension, evidence: &[Evidence]) -> PanelOutcome {
        let selected = Arc::new(select_evidence(dimension, evidence, self.config.top_k_evidence));
        if selected.is_empty() {
            debug!("no evidence for dimension; judging with empty set");
        }

        let deadline = self.config.judge_timeout();
        let max_retries = self.config.max_retries;
        let mut join_set = JoinSet::new();
        for (idx, judge) in self.judges.iter().enumerate() {
            let judge = judge.clone();
            let dimension = dimension.clone();
            let selected = selected.clone();
            join_set.spawn(
                async move {
                    let res = run_judge_with_retry(judge.as_ref(), &dimension, &selected, max_retries, deadline)
                        .await;
                    (idx, res)
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<Result<Opinion, PanelError>>> =
            (0..self.judges.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, res)) => slots[idx] = Some(res),
                Err(e) => warn!(error = %e, "judge task aborted"),
            }
        }

        let mut opinions = Vec::new();
        let mut errors = Vec::new();
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(Ok(op)) => {
                    info!(persona = %op.persona, verdict = %op.verdict, confidence = op.confidence, "opinion rendered");
                    opinions.push(op);
                }
                Some(Err(err)) => errors.push(err),
                None => errors.push(PanelError::task_failed(
                    &dimension.name,
                    self.judges[idx].persona(),
                    "task panicked or was cancelled",
                )),
            }
        }
        if opinions.is_empty() {
            warn!("no surviving opinions");
            errors.push(PanelError::no_opinions(&dimension.name));
        }

        let collusion =
            CollusionDetector::new(self.config.collusion_threshold).check(&dimension.name, &opinions);
        for pair in &collusion.pairs {
            warn!(
                judge1 = %pair.judge1,
                judge2 = %pair.judge2,
                similarity = pair.similarity,
                "collusion suspected"
            );
        }

        PanelOutcome {
            dimension: dimension.name.clone(),
            opinions,
            collusion,
            errors,
        }
    }

    /// Judge each dimension in order. Dimensions are sequential; judges within one are not.
    pub async fn judge_dimensions(&self, dimensions: &[Dimension], evidence: &[Evidence]) -> Vec<PanelOutcome> {
        let mut outcomes = Vec::with_capacity(dimensions.len());
        for dimension in dimensions {
            outcomes.push(self.judge_dimension(dimension, evidence).await);
        }
        outcomes
    }
}

/// Opinion contract the panel enforces on every judge, including third-party ones.
fn check_contract(op: &Opinion, dimension: &Dimension) -> Result<(), JudgeError> {
    if op.dimension != dimension.name {
        return Err(JudgeError::Invalid(format!(
            "opinion is for dimension '{}' but '{}' was requested",
            op.dimension, dimension.name
        )));
    }
    if !(0.0..=1.0).contains(&op.confidence) {
        return Err(JudgeError::Invalid(format!(
            "confidence {} outside [0, 1]",
            op.confidence
        )));
    }
    Ok(())
}

async fn run_judge_with_retry(
    judge: &dyn Judge,
    dimension: &Dimension,
    evidence: &[Evidence],
    max_retries: u32,
    deadline: Duration,
) -> Result<Opinion, PanelError> {
    let attempts = max_retries.saturating_add(1);
    let mut last_error = JudgeError::Unparsable;

    for attempt in 1..=attempts {
        let outcome = match timeout(deadline, judge.render(dimension, evidence)).await {
            Ok(res) => res.and_then(|op| check_contract(&op, dimension).map(|_| op)),
            Err(_) => Err(JudgeError::Timeout(deadline)),
        };
        match outcome {
            Ok(op) => return Ok(op),
            Err(e) => {
                debug!(persona = judge.persona(), attempt, error = %e, "judge attempt failed");
                last_error = e;
            }
        }
    }

    warn!(persona = judge.persona(), attempts, error = %last_error, "judge exhausted retries");
    Err(PanelError::judge_exhausted(
        &dimension.name,
        judge.persona(),
        attempts,
        &last_error,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EvidenceSource, Verdict};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CannedJudge {
        name: &'static str,
        verdict: Verdict,
        fail_first: u32,
        calls: AtomicU32,
    }

    impl CannedJudge {
        fn new(name: &'static str, verdict: Verdict, fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                name,
                verdict,
                fail_first,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl Judge for CannedJudge {
        fn persona(&self) -> &str {
            self.name
        }

        async fn render(&self, dimension: &Dimension, _evidence: &[Evidence]) -> Result<Opinion, JudgeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(JudgeError::Unparsable);
            }
            Ok(Opinion {
                dimension: dimension.name.clone(),
                persona: self.name.to_string(),
                verdict: self.verdict,
                confidence: 1.0,
                reasoning: format!("[{}] ruling number {}", self.name, n),
                evidence_ids: vec![],
                minority_opinion: None,
                round: 0,
            })
        }
    }

    struct SlowJudge;

    #[async_trait]
    impl Judge for SlowJudge {
        fn persona(&self) -> &str {
            "Slow"
        }

        async fn render(&self, _dimension: &Dimension, _evidence: &[Evidence]) -> Result<Opinion, JudgeError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(JudgeError::Unparsable)
        }
    }

    struct WrongDimensionJudge;

    #[async_trait]
    impl Judge for WrongDimensionJudge {
        fn persona(&self) -> &str {
            "Confused"
        }

        async fn render(&self, _dimension: &Dimension, _evidence: &[Evidence]) -> Result<Opinion, JudgeError> {
            Ok(Opinion {
                dimension: "elsewhere".into(),
                persona: "Confused".into(),
                verdict: Verdict::Pass,
                confidence: 1.0,
                reasoning: "r".into(),
                evidence_ids: vec![],
                minority_opinion: None,
                round: 0,
            })
        }
    }

    fn docs() -> Dimension {
        Dimension::new("docs", "Documentation depth", 1.0, "pdf_report")
    }

    #[tokio::test]
    async fn retries_recover_transient_failures_and_keep_order() {
        let prosecutor = CannedJudge::new("Prosecutor", Verdict::Fail, 2);
        let defense = CannedJudge::new("Defense", Verdict::Pass, 0);
        let panel = JudgingPanel::new(
            vec![
                prosecutor.clone() as Arc<dyn Judge>,
                defense.clone() as Arc<dyn Judge>,
            ],
            PanelConfig::default(),
        );
        let outcome = panel.judge_dimension(&docs(), &[]).await;

        assert!(outcome.errors.is_empty());
        let personas: Vec<_> = outcome.opinions.iter().map(|o| o.persona.as_str()).collect();
        assert_eq!(personas, vec!["Prosecutor", "Defense"]);
        assert_eq!(prosecutor.calls.load(Ordering::SeqCst), 3);
        assert_eq!(defense.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_judge_is_dropped_and_recorded() {
        let broken = CannedJudge::new("Prosecutor", Verdict::Fail, 10);
        let ok = CannedJudge::new("TechLead", Verdict::Warn, 0);
        let panel = JudgingPanel::new(
            vec![broken.clone() as Arc<dyn Judge>, ok as Arc<dyn Judge>],
            PanelConfig::default(),
        );
        let outcome = panel.judge_dimension(&docs(), &[]).await;

        assert_eq!(outcome.opinions.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].persona.as_deref(), Some("Prosecutor"));
        assert_eq!(outcome.errors[0].attempts, 3);
        assert_eq!(broken.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_consumes_retries() {
        let config = PanelConfig {
            judge_timeout_ms: 50,
            max_retries: 1,
            ..PanelConfig::default()
        };
        let panel = JudgingPanel::new(vec![Arc::new(SlowJudge) as Arc<dyn Judge>], config);
        let outcome = panel.judge_dimension(&docs(), &[]).await;

        assert!(outcome.opinions.is_empty());
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors[0].message.contains("timed out"));
        assert_eq!(outcome.errors[0].attempts, 2);
        assert!(outcome.errors[1].message.contains("no surviving opinions"));
    }

    #[tokio::test]
    async fn huge_retry_budget_still_calls_the_judge() {
        let defense = CannedJudge::new("Defense", Verdict::Pass, 0);
        let config = PanelConfig {
            max_retries: u32::MAX,
            ..PanelConfig::default()
        };
        let panel = JudgingPanel::new(vec![defense.clone() as Arc<dyn Judge>], config);
        let outcome = panel.judge_dimension(&docs(), &[]).await;

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.opinions.len(), 1);
        assert_eq!(defense.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn opinions_for_other_dimensions_are_rejected() {
        let panel = JudgingPanel::new(
            vec![Arc::new(WrongDimensionJudge) as Arc<dyn Judge>],
            PanelConfig::default(),
        );
        let outcome = panel.judge_dimension(&docs(), &[]).await;
        assert!(outcome.opinions.is_empty());
        assert!(outcome.errors[0].message.contains("was requested"));
    }

    #[tokio::test]
    async fn from_config_seats_default_bench() {
        let client = Arc::new(crate::providers::llm::fake::FakeClient::new("m".into()));
        let panel = JudgingPanel::from_config(&EngineConfig::default(), client);
        assert_eq!(panel.personas(), vec!["Prosecutor", "Defense", "TechLead"]);

        // the fake client never returns JSON, so every judge exhausts its retries
        let ev = vec![Evidence::text("e1", EvidenceSource::Doc, "text", "docs", 0.5)];
        let outcome = panel.judge_dimension(&docs(), &ev).await;
        assert!(outcome.opinions.is_empty());
        assert_eq!(outcome.errors.len(), 4);
    }
}
