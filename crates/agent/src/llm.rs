use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use proposal_core::config::ContentConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

const SYSTEM_PROMPT: &str = "You write sections of IT project proposals. \
Answer with a single JSON object and nothing else.";

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client for completions")?;
        Ok(Self { http, api_key, base_url: base_url.into(), model: model.into(), temperature })
    }

    pub fn from_config(config: &ContentConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("content.api_key is required for the openai backend"))?;
        Self::new(
            api_key,
            config.base_url.clone(),
            config.model.clone(),
            config.temperature,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(prompt))
            .send()
            .await
            .context("completion request failed")?;

        let status = response.status();
        let body = response.text().await.context("failed to read completion response")?;
        if !status.is_success() {
            bail!("completion endpoint returned {status}: {}", truncate(&body, 300));
        }

        debug!(
            event_name = "agent.llm.completed",
            model = %self.model,
            bytes = body.len(),
            "completion received"
        );
        parse_completion(&body)
    }
}

/// Text of the first choice in a chat-completions response body.
pub fn parse_completion(body: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(body).context("completion response is not valid json")?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();
    if content.trim().is_empty() {
        bail!("completion response contained no content");
    }
    Ok(content)
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::{parse_completion, OpenAiClient};

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(
            SecretString::from("sk-test".to_string()),
            base_url,
            "gpt-4o-mini",
            0.3,
            Duration::from_secs(5),
        )
        .expect("client should build")
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        assert_eq!(
            client("https://api.openai.com/v1/").endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_carries_model_and_both_messages() {
        let client = client("https://api.openai.com/v1");
        let body = serde_json::to_value(client.request_body("Draft the scope"))
            .expect("request serializes");

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Draft the scope");
    }

    #[test]
    fn parses_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"risks\":[]}"}}]}"#;
        assert_eq!(parse_completion(body).expect("content"), r#"{"risks":[]}"#);
    }

    #[test]
    fn empty_choices_are_an_error() {
        assert!(parse_completion(r#"{"choices":[]}"#).is_err());
        assert!(parse_completion("not json").is_err());
    }
}
