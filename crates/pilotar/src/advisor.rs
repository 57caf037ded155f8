//! AI advisory collaborator.
//!
//! Before a case executes, the runner asks an OpenAI-compatible chat endpoint
//! for an execution plan. The reply is advisory only: it is logged verbatim
//! and never parsed, and the deterministic step interpreter decides what
//! actually runs. The call still sits on the case's critical path — a failed
//! advisory request fails the case before any step executes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::result::{PilotarError, PilotarResult};
use crate::testcase::TestCase;

/// Chat message role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message author.
    pub role: Role,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// System-role message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User-role message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Parameters for a chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// The messages for the chat completion.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0.0 = deterministic).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Whether to stream the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// A single completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseChoice {
    /// The generated message.
    pub message: ChatMessage,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Response from a chat completion endpoint.
///
/// Only the choices matter here; metadata fields vary across providers and
/// are tolerated when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Unique identifier for this completion.
    #[serde(default)]
    pub id: String,
    /// Model used.
    #[serde(default)]
    pub model: String,
    /// Generated choices.
    pub choices: Vec<ChatResponseChoice>,
}

/// Seam between the case runner and the chat-completion backend.
///
/// Production uses [`LlmClient`]; tests substitute stubs.
#[async_trait]
pub trait AdvisoryClient: Send + Sync {
    /// Send a chat completion request and return the first choice's content.
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f64>,
    ) -> PilotarResult<String>;
}

/// OpenAI-compatible HTTP chat-completion client.
#[derive(Debug, Clone)]
pub struct LlmClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl LlmClient {
    /// Build a client from a resolved [`AiConfig`].
    #[must_use]
    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(&config.base_url, &config.api_key, &config.model)
    }

    /// Create a new client.
    ///
    /// `base_url` includes the API version segment
    /// (e.g. `https://api.deepseek.com/v1`).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AdvisoryClient for LlmClient {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f64>,
    ) -> PilotarResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature,
            stream: Some(false),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PilotarError::advisory(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PilotarError::advisory(format!(
                "API error {}: {body}",
                status.as_u16()
            )));
        }

        let response: ChatResponse = resp
            .json()
            .await
            .map_err(|e| PilotarError::advisory(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PilotarError::advisory("response contained no choices"))
    }
}

/// System message sent ahead of every advisory prompt.
pub const ADVISORY_SYSTEM_PROMPT: &str =
    "You are a professional UI automation testing assistant operating a browser \
     over the Chrome DevTools Protocol.";

/// Sampling temperature for advisory requests.
pub const ADVISORY_TEMPERATURE: f64 = 0.3;

/// Build the message pair for a case's advisory request.
#[must_use]
pub fn advisory_messages(case: &TestCase) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ADVISORY_SYSTEM_PROMPT),
        ChatMessage::user(advisory_prompt(case)),
    ]
}

/// Build the advisory prompt for a test case.
///
/// Lists the case description, the numbered steps, and the fixed action
/// vocabulary the runner can actually perform.
#[must_use]
pub fn advisory_prompt(case: &TestCase) -> String {
    let steps = case
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {step}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a UI automation testing expert driving a browser over the \
         Chrome DevTools Protocol.\n\n\
         Test case description: {description}\n\n\
         Test steps:\n{steps}\n\n\
         Proceed as follows:\n\
         1. Analyze the test case and determine the sequence of browser operations\n\
         2. Execute each operation and verify its result\n\
         3. On step failure, capture the error and a screenshot\n\n\
         Available operations:\n\
         - navigate(url): load the given URL\n\
         - click(selector): click an element by CSS selector\n\
         - fill(selector, text): replace an input's value\n\
         - type_text(selector, text): type text key by key\n\
         - wait_for_selector(selector, timeout=30000): wait for an element\n\
         - wait_fixed(timeout): pause for the given milliseconds\n\
         - screenshot(path): capture the page\n\
         - get_title(): read the page title\n\
         - get_text(selector): read element text\n\n\
         Walk through the test and tell me what to do at each step; I will \
         perform the operations.",
        description = case.description,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = LlmClient::new("http://localhost:8081/v1/", "sk-test", "deepseek-chat");
        assert_eq!(client.base_url(), "http://localhost:8081/v1");
        assert_eq!(client.model(), "deepseek-chat");
    }

    #[test]
    fn test_chat_request_serialization() {
        let req = ChatRequest {
            model: "deepseek-chat".to_string(),
            messages: vec![ChatMessage::user("Hi")],
            temperature: Some(0.7),
            stream: Some(false),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"temperature\":0.7"));
        assert!(json.contains("\"stream\":false"));
    }

    #[test]
    fn test_chat_request_omits_none_temperature() {
        let req = ChatRequest {
            model: "m".to_string(),
            messages: vec![],
            temperature: None,
            stream: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("stream"));
    }

    #[test]
    fn test_chat_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "deepseek-chat",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Step 1: navigate"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.choices[0].message.content, "Step 1: navigate");
    }

    #[test]
    fn test_chat_response_tolerates_sparse_metadata() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices[0].message.content, "ok");
        assert!(resp.id.is_empty());
    }

    #[test]
    fn test_advisory_messages_lead_with_system_role() {
        let case = TestCase {
            id: "TC001".to_string(),
            name: "n".to_string(),
            description: "d".to_string(),
            steps: vec!["等待".to_string()],
        };
        let messages = advisory_messages(&case);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, ADVISORY_SYSTEM_PROMPT);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("1. 等待"));
    }

    #[test]
    fn test_advisory_prompt_lists_numbered_steps() {
        let case = TestCase {
            id: "TC001".to_string(),
            name: "search".to_string(),
            description: "Baidu search flow".to_string(),
            steps: vec![
                "导航到 https://www.baidu.com".to_string(),
                "验证页面标题".to_string(),
            ],
        };
        let prompt = advisory_prompt(&case);
        assert!(prompt.contains("Baidu search flow"));
        assert!(prompt.contains("1. 导航到 https://www.baidu.com"));
        assert!(prompt.contains("2. 验证页面标题"));
        assert!(prompt.contains("get_title()"));
    }
}
