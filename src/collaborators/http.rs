//! OpenAI-compatible chat-completion client implementing all three
//! collaborator traits.

use async_trait::async_trait;
use serde_json::Value;

use super::{Generator, Rewriter, SignalRefiner};
use crate::errors::CollaboratorFailure;
use crate::quality::CorrectionRequest;
use crate::signals::EqSignal;
use crate::tone::StyleDirectives;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Connection settings for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl ChatCompletionConfig {
    /// Load from `EQCOACH_LLM_BASE_URL`, `EQCOACH_LLM_API_KEY` and
    /// `EQCOACH_LLM_MODEL`.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("EQCOACH_LLM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            api_key: std::env::var("EQCOACH_LLM_API_KEY").unwrap_or_default(),
            model: std::env::var("EQCOACH_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        }
    }

    /// An API key is the only mandatory setting.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: reqwest::Client,
    config: ChatCompletionConfig,
}

impl ChatCompletionClient {
    pub fn new(config: ChatCompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Client from the environment, or `None` when no API key is set.
    pub fn from_env() -> Option<Self> {
        let config = ChatCompletionConfig::from_env();
        config.is_configured().then(|| Self::new(config))
    }

    async fn complete(
        &self,
        collaborator: &'static str,
        system: &str,
        user: &str,
    ) -> Result<String, CollaboratorFailure> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CollaboratorFailure::failed(collaborator, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CollaboratorFailure::failed(
                collaborator,
                format!("HTTP {status}"),
            ));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| CollaboratorFailure::failed(collaborator, e.to_string()))?;
        extract_content(&json).ok_or(CollaboratorFailure::Empty { collaborator })
    }
}

/// `choices[0].message.content`, trimmed, if non-empty.
pub fn extract_content(json: &Value) -> Option<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse category names out of a model answer: a JSON array of strings, or
/// failing that a comma/newline separated list. Unknown names are dropped.
pub fn parse_categories(answer: &str) -> Vec<EqSignal> {
    let names: Vec<String> = match serde_json::from_str::<Vec<String>>(answer.trim()) {
        Ok(list) => list,
        Err(_) => answer
            .split(|c: char| c == ',' || c == '\n')
            .map(|s| s.trim_matches(|c: char| !c.is_ascii_alphabetic() && c != '_').to_string())
            .collect(),
    };
    let mut signals: Vec<EqSignal> = names.iter().filter_map(|n| EqSignal::parse(n)).collect();
    signals.sort();
    signals.dedup();
    signals
}

#[async_trait]
impl Generator for ChatCompletionClient {
    async fn generate(
        &self,
        prompt: &str,
        directives: &StyleDirectives,
    ) -> Result<String, CollaboratorFailure> {
        let system = format!(
            "You are a warm, direct admissions coach talking with a high-school student.\n\n{}",
            directives.summary()
        );
        self.complete("generator", &system, prompt).await
    }
}

#[async_trait]
impl SignalRefiner for ChatCompletionClient {
    async fn refine(
        &self,
        utterance: &str,
        preliminary: &[EqSignal],
    ) -> Result<Vec<EqSignal>, CollaboratorFailure> {
        let names: Vec<&str> = EqSignal::ALL.iter().map(|s| s.as_str()).collect();
        let system = format!(
            "Classify the student's message into emotional categories. \
             Answer with a JSON array using only these names: {}.",
            names.join(", ")
        );
        let hints: Vec<&str> = preliminary.iter().map(|s| s.as_str()).collect();
        let user = format!(
            "Message: {utterance}\nKeyword hints: [{}]",
            hints.join(", ")
        );
        let answer = self.complete("signal refiner", &system, &user).await?;
        Ok(parse_categories(&answer))
    }
}

#[async_trait]
impl Rewriter for ChatCompletionClient {
    async fn rewrite(
        &self,
        request: &CorrectionRequest,
    ) -> Result<Option<String>, CollaboratorFailure> {
        let (system, user) = request.to_prompt();
        match self.complete("rewriter", &system, &user).await {
            Ok(text) => Ok(Some(text)),
            Err(CollaboratorFailure::Empty { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }
}
