use crate::model::{
    DimensionScore, Evidence, EvidenceSource, Priority, RemediationAction, RiskLevel,
    SecurityFinding,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Hard ceiling imposed on every dimension once the override triggers.
pub const SECURITY_CAP: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    ShellExecution,
    DynamicEvaluation,
    UnsafeDeserialization,
    UnvalidatedInput,
    StringBuiltQuery,
}

struct DangerousPattern {
    regex: Regex,
    description: &'static str,
    category: PatternCategory,
    risk: RiskLevel,
}

fn pattern(
    re: &str,
    description: &'static str,
    category: PatternCategory,
    risk: RiskLevel,
) -> DangerousPattern {
    DangerousPattern {
        regex: Regex::new(&format!("(?i){}", re)).expect("static security pattern"),
        description,
        category,
        risk,
    }
}

lazy_static! {
    // Order matters: findings are reported in table order per evidence item.
    static ref DANGEROUS_PATTERNS: Vec<DangerousPattern> = vec![
        pattern(r"os\.system\(.*\)", "Direct system command execution", PatternCategory::ShellExecution, RiskLevel::Critical),
        pattern(r"subprocess\.call\(.*shell=True.*\)", "Shell=True in subprocess", PatternCategory::ShellExecution, RiskLevel::High),
        pattern(r"eval\(.*\)", "Eval execution", PatternCategory::DynamicEvaluation, RiskLevel::Critical),
        pattern(r"exec\(.*\)", "Exec execution", PatternCategory::DynamicEvaluation, RiskLevel::Critical),
        pattern(r"__import__\(.*\)", "Dynamic import", PatternCategory::DynamicEvaluation, RiskLevel::Medium),
        pattern(r"pickle\.loads\(.*\)", "Unsafe deserialization", PatternCategory::UnsafeDeserialization, RiskLevel::High),
        pattern(r"input\(.*\)", "User input without validation", PatternCategory::UnvalidatedInput, RiskLevel::Medium),
        pattern(r"%[^%]*\(.*\)", "String formatting with % (SQL injection risk)", PatternCategory::StringBuiltQuery, RiskLevel::Medium),
        pattern(r#"\+\s*".*"\s*\+\s*".*""#, "String concatenation (SQL injection risk)", PatternCategory::StringBuiltQuery, RiskLevel::Low),
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityReport {
    pub findings: Vec<SecurityFinding>,
    pub highest_risk: RiskLevel,
    pub shell_injection_detected: bool,
    pub apply_cap: bool,
    /// `Some(SECURITY_CAP)` when the override triggers.
    pub cap_score: Option<f64>,
    pub remediations: Vec<RemediationAction>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityOverride;

impl SecurityOverride {
    pub fn new() -> Self {
        Self
    }

    /// Scan text content of repository evidence against the dangerous-pattern table.
    pub fn analyze(&self, evidence: &[Evidence]) -> SecurityReport {
        let mut findings = Vec::new();
        let mut remediations = Vec::new();
        let mut highest_risk = RiskLevel::None;
        let mut shell_injection_detected = false;

        for ev in evidence {
            if ev.source != EvidenceSource::Repo {
                continue;
            }
            let Some(content) = ev.content.as_text() else {
                continue;
            };

            for rule in DANGEROUS_PATTERNS.iter() {
                if !rule.regex.is_match(content) {
                    continue;
                }
                let finding = SecurityFinding {
                    finding: format!("{} detected", rule.description),
                    risk_level: rule.risk,
                    evidence_id: ev.id.clone(),
                    file_path: extract_file_path(content, &rule.regex),
                };
                if let Some(action) = remediation_for(rule.category, &finding) {
                    remediations.push(action);
                }
                findings.push(finding);

                highest_risk = highest_risk.max(rule.risk);
                if rule.category == PatternCategory::ShellExecution {
                    shell_injection_detected = true;
                }
            }
        }

        let apply_cap = shell_injection_detected
            || matches!(highest_risk, RiskLevel::High | RiskLevel::Critical);

        info!(
            findings = findings.len(),
            highest_risk = %highest_risk,
            shell_injection = shell_injection_detected,
            apply_cap,
            "security analysis complete"
        );

        SecurityReport {
            findings,
            highest_risk,
            shell_injection_detected,
            apply_cap,
            cap_score: apply_cap.then_some(SECURITY_CAP),
            remediations,
        }
    }

    /// Clamp every score above the cap down to it. No-op unless the report triggers.
    pub fn apply(&self, scores: &mut [DimensionScore], report: &SecurityReport) {
        if !report.apply_cap {
            return;
        }
        for score in scores.iter_mut() {
            if score.score > SECURITY_CAP {
                let original = score.score;
                score.score = SECURITY_CAP;
                score.security_override_applied = true;
                score.annotate(&format!(
                    "[SECURITY OVERRIDE: Score capped from {:.1} to 3 due to security findings]",
                    original
                ));
                warn!(dimension = %score.dimension, from = original, to = SECURITY_CAP, "score capped");
            }
        }
    }
}

/// Path named in a `# path/to/file.py` style comment within a few lines of the match.
fn extract_file_path(content: &str, regex: &Regex) -> Option<String> {
    let lines: Vec<&str> = content.split('\n').collect();
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| regex.is_match(line))
        .find_map(|(i, _)| {
            let start = i.saturating_sub(3);
            let end = (i + 3).min(lines.len());
            lines[start..end]
                .iter()
                .find(|l| l.contains('#') && (l.contains(".py") || l.contains('/')))
                .and_then(|l| l.rsplit('#').next())
        })
        .map(|path| path.trim().to_string())
}

fn remediation_for(category: PatternCategory, finding: &SecurityFinding) -> Option<RemediationAction> {
    let (priority, action, example, reasoning) = match category {
        PatternCategory::ShellExecution => (
            Priority::High,
            "Replace shell command execution (os.system, shell=True) with safe process invocation: subprocess.run() with an argument list and shell=False",
            "subprocess.run(['command', 'arg1'], check=True)",
            "Prevents shell injection attacks",
        ),
        PatternCategory::DynamicEvaluation if finding.risk_level == RiskLevel::Critical => (
            Priority::High,
            "Remove eval()/exec() - use safer alternatives like ast.literal_eval()",
            "import ast; ast.literal_eval(string)",
            "Code execution from strings is extremely dangerous",
        ),
        PatternCategory::UnsafeDeserialization => (
            Priority::Medium,
            "Use JSON or safer serialization instead of pickle",
            "import json; json.dumps(data)",
            "Pickle can execute arbitrary code during deserialization",
        ),
        _ => return None,
    };
    Some(RemediationAction {
        priority,
        action: action.to_string(),
        file_path: finding.file_path.clone(),
        code_example: Some(example.to_string()),
        reasoning: reasoning.to_string(),
    })
}
