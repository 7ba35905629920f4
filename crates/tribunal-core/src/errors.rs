use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Fatal configuration problem. Raised before any judging starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("invalid rubric: {0}")]
    InvalidRubric(String),

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}

/// Failure of a single judge attempt. Every variant consumes one retry.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("no structured result found in judge output")]
    Unparsable,

    #[error("invalid judge output: {0}")]
    Invalid(String),

    #[error("judge call timed out after {0:?}")]
    Timeout(Duration),

    #[error("reasoning service error: {0}")]
    Provider(#[from] anyhow::Error),
}

/// Non-fatal panel failure, recorded on the run and surfaced in the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelError {
    pub dimension: String,
    /// Persona that failed; `None` for dimension-level errors.
    pub persona: Option<String>,
    pub attempts: u32,
    pub message: String,
}

impl PanelError {
    pub fn judge_exhausted(
        dimension: impl Into<String>,
        persona: impl Into<String>,
        attempts: u32,
        last_error: &JudgeError,
    ) -> Self {
        let persona = persona.into();
        Self {
            dimension: dimension.into(),
            message: format!(
                "{} failed to render opinion after {} attempt(s): {}",
                persona, attempts, last_error
            ),
            persona: Some(persona),
            attempts,
        }
    }

    pub fn no_opinions(dimension: impl Into<String>) -> Self {
        let dimension = dimension.into();
        Self {
            message: format!("no surviving opinions for dimension '{}'", dimension),
            dimension,
            persona: None,
            attempts: 0,
        }
    }

    pub fn unknown_dimension(dimension: impl Into<String>, persona: impl Into<String>) -> Self {
        let dimension = dimension.into();
        let persona = persona.into();
        Self {
            message: format!(
                "opinion from {} names dimension '{}' which is not in the rubric; ignored",
                persona, dimension
            ),
            dimension,
            persona: Some(persona),
            attempts: 0,
        }
    }

    pub fn task_failed(
        dimension: impl Into<String>,
        persona: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        let persona = persona.into();
        Self {
            dimension: dimension.into(),
            message: format!("judge task for {} aborted: {}", persona, detail.into()),
            persona: Some(persona),
            attempts: 0,
        }
    }
}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.dimension, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_message_names_persona_and_cause() {
        let err = PanelError::judge_exhausted("security", "Prosecutor", 3, &JudgeError::Unparsable);
        assert_eq!(err.persona.as_deref(), Some("Prosecutor"));
        assert_eq!(err.attempts, 3);
        assert!(err.message.contains("Prosecutor failed to render opinion after 3 attempt(s)"));
        assert!(err.to_string().starts_with("[security]"));
    }

    #[test]
    fn timeout_is_reported_as_judge_error() {
        let err = JudgeError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("timed out"));
    }
}
