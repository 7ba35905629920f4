use crate::errors::ConfigError;
use crate::judge::Stance;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub panel: PanelConfig,
    pub variance: VarianceConfig,
    /// Score used when a dimension (or the whole run) has nothing to fold.
    pub neutral_score: f64,
    /// Judges seated on the panel, in invocation order.
    pub personas: Vec<PersonaConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            panel: PanelConfig::default(),
            variance: VarianceConfig::default(),
            neutral_score: 3.0,
            personas: PersonaConfig::default_bench(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    /// Retries after the first attempt. Default 2 (3 attempts total).
    pub max_retries: u32,
    /// Evidence items handed to each judge, most confident first.
    pub top_k_evidence: usize,
    /// Per-attempt deadline on the reasoning call.
    pub judge_timeout_ms: u64,
    /// Reasoning pairs with Jaccard similarity above this are reported as collusion.
    pub collusion_threshold: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            top_k_evidence: 5,
            judge_timeout_ms: 60_000,
            collusion_threshold: 0.9,
        }
    }
}

impl PanelConfig {
    pub fn judge_timeout(&self) -> Duration {
        Duration::from_millis(self.judge_timeout_ms)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct VarianceConfig {
    /// Population variance above this marks a dimension as contested. Default 2.0.
    pub threshold: f64,
    /// Re-evaluation rounds allowed per arbitration run. Default 3.
    pub max_re_evaluations: u32,
}

impl Default for VarianceConfig {
    fn default() -> Self {
        Self {
            threshold: 2.0,
            max_re_evaluations: 3,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PersonaConfig {
    pub name: String,
    pub stance: Stance,
}

impl PersonaConfig {
    pub fn default_bench() -> Vec<Self> {
        vec![
            Self {
                name: "Prosecutor".to_string(),
                stance: Stance::Prosecutor,
            },
            Self {
                name: "Defense".to_string(),
                stance: Stance::Defense,
            },
            Self {
                name: "TechLead".to_string(),
                stance: Stance::TechLead,
            },
        ]
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.panel.collusion_threshold;
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::InvalidConfig(format!(
                "panel.collusion_threshold must be within [0, 1] (got {})",
                t
            )));
        }
        if !self.variance.threshold.is_finite() || self.variance.threshold < 0.0 {
            return Err(ConfigError::InvalidConfig(format!(
                "variance.threshold must be a non-negative number (got {})",
                self.variance.threshold
            )));
        }
        if !self.neutral_score.is_finite() || !(1.0..=5.0).contains(&self.neutral_score) {
            return Err(ConfigError::InvalidConfig(format!(
                "neutral_score must be within [1, 5] (got {})",
                self.neutral_score
            )));
        }
        if self.panel.judge_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "panel.judge_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.personas.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "at least one persona must be configured".into(),
            ));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cfg: EngineConfig = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    cfg.validate()?;
    Ok(cfg)
}
