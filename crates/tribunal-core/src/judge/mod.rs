//! Judge capability: turn one dimension plus a bounded evidence slice into an opinion.
//!
//! Boundaries:
//! - prompt.rs: stance instructions and the shared verdict prompt
//! - parse.rs: reply parsing and structural validation
//! - persona.rs: the reasoning-service backed judge

pub mod parse;
pub mod persona;
pub mod prompt;

pub use persona::PersonaJudge;

use crate::errors::JudgeError;
use crate::model::{Dimension, Evidence, Opinion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default leaning of a persona when the evidence is inconclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// Default to fail.
    Prosecutor,
    /// Default to pass.
    Defense,
    /// Default to warn.
    TechLead,
}

#[async_trait]
pub trait Judge: Send + Sync {
    /// Persona name; tags the opinion's reasoning.
    fn persona(&self) -> &str;

    /// One attempt. Retries and timeouts are the panel's concern.
    async fn render(
        &self,
        dimension: &Dimension,
        evidence: &[Evidence],
    ) -> Result<Opinion, JudgeError>;
}
