use crate::errors::PanelError;
use crate::panel::collusion::CollusionReport;
use crate::rules::facts::FactAnalysis;
use crate::rules::variance::DimensionVariance;
use serde::{Deserialize, Serialize};

/// Lowest score a dimension (or the overall verdict) can take.
pub const MIN_SCORE: f64 = 1.0;
/// Highest score a dimension (or the overall verdict) can take.
pub const MAX_SCORE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

impl Verdict {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pass" => Some(Verdict::Pass),
            "warn" => Some(Verdict::Warn),
            "fail" => Some(Verdict::Fail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Warn => "warn",
            Verdict::Fail => "fail",
        }
    }

    /// Unscaled numeric value of the verdict on the 1-5 scale.
    pub fn base_score(&self) -> f64 {
        match self {
            Verdict::Pass => 5.0,
            Verdict::Warn => 3.0,
            Verdict::Fail => 1.0,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `base(verdict) * confidence`, kept on the 1-5 scale.
pub fn scaled_value(verdict: Verdict, confidence: f64) -> f64 {
    (verdict.base_score() * confidence).clamp(MIN_SCORE, MAX_SCORE)
}

/// Clamp a score into [1,5], mapping NaN to the floor.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return MIN_SCORE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return 0.0;
    }
    confidence.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSource {
    Repo,
    #[serde(alias = "document", alias = "pdf")]
    Doc,
    #[serde(alias = "image", alias = "images")]
    Vision,
}

/// Evidence payload: extracted text, or a structured value (e.g. image analysis output).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvidenceContent {
    Text(String),
    Structured(serde_json::Value),
}

impl EvidenceContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            EvidenceContent::Text(s) => Some(s.as_str()),
            EvidenceContent::Structured(_) => None,
        }
    }

    /// First `max_chars` characters of the content, rendered as text.
    pub fn preview(&self, max_chars: usize) -> String {
        let rendered = match self {
            EvidenceContent::Text(s) => s.clone(),
            EvidenceContent::Structured(v) => v.to_string(),
        };
        rendered.chars().take(max_chars).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub source: EvidenceSource,
    pub content: EvidenceContent,
    #[serde(default)]
    pub forensic_notes: String,
    pub confidence: f64,
}

impl Evidence {
    pub fn text(
        id: impl Into<String>,
        source: EvidenceSource,
        content: impl Into<String>,
        forensic_notes: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            content: EvidenceContent::Text(content.into()),
            forensic_notes: forensic_notes.into(),
            confidence: clamp_confidence(confidence),
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// One scored axis of the rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub description: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub target_artifact: String,
    /// Substrings matched against evidence ids when selecting evidence for this dimension.
    #[serde(default)]
    pub evidence_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_rules: Option<String>,
}

impl Dimension {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        weight: f64,
        target_artifact: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            weight,
            target_artifact: target_artifact.into(),
            evidence_patterns: Vec::new(),
            synthesis_rules: None,
        }
    }
}

/// One persona's judgment of one dimension. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub dimension: String,
    pub persona: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub evidence_ids: Vec<String>,
    #[serde(default)]
    pub minority_opinion: Option<String>,
    /// 0 for the initial panel, n for the n-th re-evaluation round.
    #[serde(default)]
    pub round: u32,
}

impl Opinion {
    pub fn scaled_value(&self) -> f64 {
        scaled_value(self.verdict, self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: String,
    pub score: f64,
    pub confidence: f64,
    pub security_override_applied: bool,
    pub fact_supremacy_applied: bool,
    pub variance_detected: bool,
    pub reasoning: String,
}

impl DimensionScore {
    pub fn new(dimension: impl Into<String>, score: f64, confidence: f64, reasoning: String) -> Self {
        Self {
            dimension: dimension.into(),
            score: clamp_score(score),
            confidence: clamp_confidence(confidence),
            security_override_applied: false,
            fact_supremacy_applied: false,
            variance_detected: false,
            reasoning,
        }
    }

    pub(crate) fn annotate(&mut self, note: &str) {
        if !self.reasoning.is_empty() {
            self.reasoning.push(' ');
        }
        self.reasoning.push_str(note);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub finding: String,
    pub risk_level: RiskLevel,
    pub evidence_id: String,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactualDiscrepancy {
    pub dimension: String,
    pub evidence_fact: String,
    pub opinion_claim: String,
    pub opinion_source: String,
    pub resolution: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationAction {
    pub priority: Priority,
    pub action: String,
    pub file_path: Option<String>,
    pub code_example: Option<String>,
    pub reasoning: String,
}

impl RemediationAction {
    pub fn new(priority: Priority, action: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            priority,
            action: action.into(),
            file_path: None,
            code_example: None,
            reasoning: reasoning.into(),
        }
    }
}

/// Letter band for an overall score.
pub fn grade_for(score: f64) -> &'static str {
    if score >= 4.5 {
        "A - EXCELLENT"
    } else if score >= 3.5 {
        "B - GOOD"
    } else if score >= 2.5 {
        "C - SATISFACTORY"
    } else if score >= 1.5 {
        "D - NEEDS IMPROVEMENT"
    } else {
        "F - FAILING"
    }
}

/// Terminal output of one arbitration run. Every collection is always serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalVerdict {
    pub case_id: String,
    pub timestamp: String,
    pub overall_score: f64,
    pub grade: String,
    pub dimension_scores: Vec<DimensionScore>,

    pub security_findings: Vec<SecurityFinding>,
    pub security_override_triggered: bool,
    pub security_cap_applied: Option<f64>,
    pub highest_risk: RiskLevel,

    pub factual_discrepancies: Vec<FactualDiscrepancy>,
    pub fact_supremacy_applied: Vec<String>,
    pub fact_analysis: FactAnalysis,

    pub high_variance_dimensions: Vec<String>,
    pub variance_details: Vec<DimensionVariance>,
    pub re_evaluations_triggered: u32,

    pub collusion_reports: Vec<CollusionReport>,

    pub dissent_summary: String,
    pub remediation_plan: Vec<RemediationAction>,
    pub synthesis_rules_applied: Vec<String>,
    pub errors: Vec<PanelError>,
}

impl FinalVerdict {
    pub fn score_for(&self, dimension: &str) -> Option<&DimensionScore> {
        self.dimension_scores.iter().find(|s| s.dimension == dimension)
    }
}

/// Raw reply from the reasoning service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub meta: serde_json::Value,
}
