//! OpenAI-compatible chat completions client used for article summaries.
//!
//! Defaults target the Groq endpoint but any compatible provider works via
//! [`ChatClient::with_api_base`]. Requests go through the same retry
//! decorator as page fetches, so transient provider errors back off and
//! client errors (bad key, bad model) fail immediately.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::errors::{FetchError, FetchReason};
use crate::fetcher::{classify_reqwest, FetchAsync, RetryFetch, FETCH_ATTEMPTS, FETCH_BASE_DELAY};
use crate::prompts::PromptBook;
use crate::utils::truncate_for_log;

pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Character cap on article text placed into a prompt.
pub const PROMPT_INPUT_LIMIT: usize = 15_000;

const MAX_COMPLETION_TOKENS: u32 = 1024;
const TEMPERATURE: f64 = 0.5;

/// Model calls get a longer deadline than page fetches.
const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for one OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ChatClient {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        ChatClient {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: CHAT_TIMEOUT,
        }
    }

    /// Point the client at a different OpenAI-compatible provider.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// One completion round-trip. The reply text is trimmed; an empty reply
    /// counts as a malformed payload.
    #[instrument(level = "info", skip_all)]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, FetchError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
        };

        let t0 = Instant::now();
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| FetchError::once(classify_reqwest(&e, self.timeout)))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(FetchError::once(FetchReason::ServerStatus(status.as_u16())));
        }
        if status.is_client_error() {
            return Err(FetchError::once(FetchReason::ClientStatus(status.as_u16())));
        }

        let payload: ChatResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::once(classify_reqwest(&e, self.timeout)))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(FetchError::once(FetchReason::Malformed(
                "empty completion".to_string(),
            )));
        }

        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            reply = %truncate_for_log(content, 120),
            "chat completion received"
        );
        Ok(content.to_string())
    }
}

/// One system prompt bound to a client, in the shape the retry wrapper
/// expects: the target string is the user prompt.
#[derive(Debug, Clone)]
struct ChatAsk {
    chat: ChatClient,
    system: String,
}

impl FetchAsync for ChatAsk {
    type Response = String;

    async fn fetch(&self, target: &str) -> Result<String, FetchError> {
        self.chat.complete(&self.system, target).await
    }
}

/// Produces article summaries through the chat model.
#[derive(Debug, Clone)]
pub struct Summarizer {
    chat: ChatClient,
    prompts: PromptBook,
}

impl Summarizer {
    pub fn new(chat: ChatClient, prompts: PromptBook) -> Self {
        Summarizer { chat, prompts }
    }

    /// Ask the model for a short summary of `text`.
    ///
    /// Returns `None` when the provider cannot be reached or replies with
    /// nothing usable; the caller decides how to mark the gap.
    #[instrument(level = "info", skip_all)]
    pub async fn summarize(&self, text: &str) -> Option<String> {
        let prompt = self.prompts.render_summarize(&capped_input(text));
        let ask = RetryFetch::new(
            ChatAsk {
                chat: self.chat.clone(),
                system: self.prompts.system.clone(),
            },
            FETCH_ATTEMPTS,
            FETCH_BASE_DELAY,
        );
        match ask.fetch(&prompt).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(error = %e, "summary request failed");
                None
            }
        }
    }
}

fn capped_input(text: &str) -> String {
    text.chars().take(PROMPT_INPUT_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_the_wire_shape() {
        let request = ChatRequest {
            model: "test-model",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "be terse",
                },
                ChatMessage {
                    role: "user",
                    content: "summarize this",
                },
            ],
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "summarize this");
        assert_eq!(value["max_tokens"], 1024);
        assert_eq!(value["temperature"], 0.5);
    }

    #[test]
    fn response_parses_first_choice() {
        let json = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "A short summary."},
                 "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "A short summary.");
    }

    #[test]
    fn prompt_input_is_capped_by_characters() {
        let long = "a".repeat(PROMPT_INPUT_LIMIT + 500);
        assert_eq!(capped_input(&long).len(), PROMPT_INPUT_LIMIT);

        let multibyte = "é".repeat(PROMPT_INPUT_LIMIT + 500);
        assert_eq!(capped_input(&multibyte).chars().count(), PROMPT_INPUT_LIMIT);

        assert_eq!(capped_input("short"), "short");
    }

    #[test]
    fn debug_output_redacts_the_api_key() {
        let chat = ChatClient::new(reqwest::Client::new(), "gsk_secret_key", DEFAULT_MODEL);
        let repr = format!("{chat:?}");
        assert!(!repr.contains("gsk_secret_key"));
        assert!(repr.contains(DEFAULT_MODEL));
    }

    #[test]
    fn api_base_override_is_applied() {
        let chat = ChatClient::new(reqwest::Client::new(), "k", "m")
            .with_api_base("https://api.openai.com/v1");
        assert_eq!(chat.api_base, "https://api.openai.com/v1");
    }
}
