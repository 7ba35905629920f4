use super::{parse, prompt, Judge, Stance};
use crate::errors::JudgeError;
use crate::model::{Dimension, Evidence, Opinion};
use crate::providers::llm::LlmClient;
use async_trait::async_trait;
use std::sync::Arc;

/// A judge backed by the reasoning service. Personas differ only in name and stance.
#[derive(Clone)]
pub struct PersonaJudge {
    name: String,
    stance: Stance,
    client: Arc<dyn LlmClient>,
}

impl PersonaJudge {
    pub fn new(name: impl Into<String>, stance: Stance, client: Arc<dyn LlmClient>) -> Self {
        Self {
            name: name.into(),
            stance,
            client,
        }
    }

    pub fn prosecutor(client: Arc<dyn LlmClient>) -> Self {
        Self::new("Prosecutor", Stance::Prosecutor, client)
    }

    pub fn defense(client: Arc<dyn LlmClient>) -> Self {
        Self::new("Defense", Stance::Defense, client)
    }

    pub fn tech_lead(client: Arc<dyn LlmClient>) -> Self {
        Self::new("TechLead", Stance::TechLead, client)
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }
}

#[async_trait]
impl Judge for PersonaJudge {
    fn persona(&self) -> &str {
        &self.name
    }

    async fn render(
        &self,
        dimension: &Dimension,
        evidence: &[Evidence],
    ) -> Result<Opinion, JudgeError> {
        let system = prompt::build_system_prompt(&self.name, self.stance, dimension, evidence);
        let resp = self
            .client
            .complete(prompt::USER_PROMPT, Some(std::slice::from_ref(&system)))
            .await?;
        parse::parse_judge_output(&resp.text, &dimension.name, &self.name)
    }
}
