//! Rubric boundary: the ordered set of dimensions an audit is scored against.
//!
//! Validation failures here are the only fatal errors of a run; they surface before
//! any judge is invoked.

use crate::errors::ConfigError;
use crate::model::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub dimensions: Vec<Dimension>,
}

impl Rubric {
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self, ConfigError> {
        let rubric = Self {
            name: None,
            version: None,
            dimensions,
        };
        rubric.validate()?;
        Ok(rubric)
    }

    /// Load from `.yaml`/`.yml` or JSON (any other extension).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let rubric = if is_yaml {
            Self::from_yaml_str(&raw)
        } else {
            Self::from_json_str(&raw)
        };
        rubric.map_err(|e| match e {
            ConfigError::Parse { detail, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                detail,
            },
            other => other,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let rubric: Rubric = serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: "<yaml>".into(),
            detail: e.to_string(),
        })?;
        rubric.validate()?;
        Ok(rubric)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let rubric: Rubric = serde_json::from_str(raw).map_err(|e| ConfigError::Parse {
            path: "<json>".into(),
            detail: e.to_string(),
        })?;
        rubric.validate()?;
        Ok(rubric)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dimensions.is_empty() {
            return Err(ConfigError::InvalidRubric("rubric has no dimensions".into()));
        }
        let mut seen = HashSet::new();
        for (idx, dim) in self.dimensions.iter().enumerate() {
            if dim.name.trim().is_empty() {
                return Err(ConfigError::InvalidRubric(format!(
                    "dimension #{} has an empty name",
                    idx
                )));
            }
            if !seen.insert(dim.name.as_str()) {
                return Err(ConfigError::InvalidRubric(format!(
                    "duplicate dimension '{}'",
                    dim.name
                )));
            }
            if dim.description.trim().is_empty() {
                return Err(ConfigError::InvalidRubric(format!(
                    "dimension '{}' is missing a description",
                    dim.name
                )));
            }
            if dim.target_artifact.trim().is_empty() {
                return Err(ConfigError::InvalidRubric(format!(
                    "dimension '{}' is missing target_artifact",
                    dim.name
                )));
            }
            if !dim.weight.is_finite() || dim.weight < 0.0 {
                return Err(ConfigError::InvalidRubric(format!(
                    "dimension '{}' has invalid weight {}",
                    dim.name, dim.weight
                )));
            }
        }
        Ok(())
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Rubric weight for `name`; dimensions outside the rubric weigh 1.0.
    pub fn weight_of(&self, name: &str) -> f64 {
        self.dimension(name).map(|d| d.weight).unwrap_or(1.0)
    }

    /// `"<dimension>: <rules>"` for every dimension that declares synthesis rules.
    pub fn synthesis_rules(&self) -> Vec<String> {
        self.dimensions
            .iter()
            .filter_map(|d| {
                d.synthesis_rules
                    .as_ref()
                    .map(|rules| format!("{}: {}", d.name, rules))
            })
            .collect()
    }
}
