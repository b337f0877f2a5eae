//! Generation Service backed by an OpenAI-compatible `chat/completions` endpoint.

use async_trait::async_trait;
use foundry_core::capability::{CallOptions, CapabilityError, CompletionRequest, GenerationService};
use foundry_core::config::FoundryConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Sends each completion as a single user message.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CapabilityError::Misconfiguration(format!("HTTP client: {e}")))?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Build from `[provider]`, reading the key from its environment variable.
    pub fn from_config(config: &FoundryConfig) -> Result<Self, CapabilityError> {
        let api_key = config
            .api_key()
            .map_err(|e| CapabilityError::Misconfiguration(e.to_string()))?;
        Self::new(api_key, Some(config.provider.base_url.clone()))
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl GenerationService for OpenAiBackend {
    async fn complete(
        &self,
        request: &CompletionRequest,
        options: &CallOptions,
    ) -> Result<String, CapabilityError> {
        debug!(
            model = %request.model,
            temperature = request.temperature,
            prompt_chars = request.prompt.len(),
            "Requesting completion"
        );

        let body = ChatRequest {
            model: &request.model,
            temperature: request.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let mut http = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(timeout) = options.timeout {
            http = http.timeout(timeout);
        }

        let response = http.send().await.map_err(|e| map_transport_error(&e, options))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(&e, options))?;

        if !status.is_success() {
            return Err(map_http_error(status.as_u16(), &text));
        }

        let content = extract_content(&text)?;
        debug!(model = %request.model, reply_chars = content.len(), "Completion received");
        Ok(content)
    }
}

fn map_transport_error(err: &reqwest::Error, options: &CallOptions) -> CapabilityError {
    match options.timeout {
        Some(limit) if err.is_timeout() => CapabilityError::Timeout(limit),
        _ => CapabilityError::Transport(err.to_string()),
    }
}

/// Non-2xx reply. The provider's `{"error": {"message"}}` is used when present.
fn map_http_error(status: u16, body: &str) -> CapabilityError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.chars().take(500).collect()
            }
        });
    CapabilityError::Provider { status, message }
}

/// Text of the first choice.
fn extract_content(body: &str) -> Result<String, CapabilityError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CapabilityError::MalformedResponse(format!("invalid JSON: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CapabilityError::MalformedResponse("response has no choices".into()))?
        .message
        .content
        .ok_or_else(|| CapabilityError::MalformedResponse("first choice has no content".into()))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"yes"}},{"index":1,"message":{"role":"assistant","content":"no"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "yes");
    }

    #[test]
    fn test_extract_rejects_empty_choices() {
        assert!(matches!(
            extract_content(r#"{"choices":[]}"#),
            Err(CapabilityError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_content(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#),
            Err(CapabilityError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_content("<html>gateway</html>"),
            Err(CapabilityError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_http_error_unwraps_provider_message() {
        let err = map_http_error(
            401,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        assert_eq!(
            err,
            CapabilityError::Provider {
                status: 401,
                message: "Incorrect API key provided".into()
            }
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn test_http_error_falls_back_to_body() {
        let err = map_http_error(503, "  upstream overloaded \n");
        assert_eq!(
            err,
            CapabilityError::Provider {
                status: 503,
                message: "upstream overloaded".into()
            }
        );
        assert!(err.is_transient());
        assert!(matches!(
            map_http_error(429, ""),
            CapabilityError::Provider { status: 429, ref message } if message == "no response body"
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = OpenAiBackend::new("key", Some("http://localhost:8080/v1/".into())).unwrap();
        assert_eq!(backend.endpoint(), "http://localhost:8080/v1/chat/completions");
        let default = OpenAiBackend::new("key", None).unwrap();
        assert_eq!(default.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4",
            temperature: 0.2,
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on loopback is not listening in test environments
        let backend = OpenAiBackend::new("key", Some("http://127.0.0.1:9/v1".into())).unwrap();
        let request = CompletionRequest::new("hello", 0.2, "gpt-4");
        let err = backend
            .complete(&request, &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Transport(_)), "got {err:?}");
    }
}
