use super::LlmClient;
use crate::model::LlmResponse;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Always answers with the same text.
#[derive(Debug)]
pub struct FakeClient {
    model: String,
    fixed_response: Option<String>,
}

impl FakeClient {
    pub fn new(model: String) -> Self {
        Self {
            model,
            fixed_response: None,
        }
    }

    pub fn with_response(mut self, response: String) -> Self {
        self.fixed_response = Some(response);
        self
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(
        &self,
        _prompt: &str,
        _system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        let text = self
            .fixed_response
            .clone()
            .unwrap_or_else(|| "no verdict".to_string());

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: self.model.clone(),
            cached: false,
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// One scripted reply: text to return, or an error to raise.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Error(String),
}

/// Replays a queue of replies in order, then errors once the queue is empty.
#[derive(Debug)]
pub struct ScriptedClient {
    replies: Mutex<Vec<ScriptedReply>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            texts
                .into_iter()
                .map(|t| ScriptedReply::Text(t.into()))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(
        &self,
        _prompt: &str,
        _system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut replies = self
                .replies
                .lock()
                .map_err(|_| anyhow::anyhow!("scripted client lock poisoned"))?;
            if replies.is_empty() {
                None
            } else {
                Some(replies.remove(0))
            }
        };
        match next {
            Some(ScriptedReply::Text(text)) => Ok(LlmResponse {
                text,
                provider: "scripted".to_string(),
                model: "scripted".to_string(),
                cached: false,
                meta: serde_json::Value::Null,
            }),
            Some(ScriptedReply::Error(msg)) => anyhow::bail!(msg),
            None => anyhow::bail!("No more scripted responses"),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_replies_in_order_then_errors() {
        let client = ScriptedClient::new(vec![
            ScriptedReply::Text("one".into()),
            ScriptedReply::Error("boom".into()),
        ]);
        assert_eq!(client.complete("p", None).await.unwrap().text, "one");
        assert!(client.complete("p", None).await.unwrap_err().to_string().contains("boom"));
        assert!(client.complete("p", None).await.is_err());
        assert_eq!(client.calls(), 3);
    }
}
