//! OpenAI-compatible completion provider.
//!
//! Posts a `CompletionRequest` as JSON to a chat-completions endpoint with
//! bearer authentication and extracts the first choice's reply. Works with
//! OpenAI itself and any server speaking the same wire format.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

pub mod types;

use secrecy::{ExposeSecret, SecretString};

use nhoru_core::llm::CompletionProvider;
use nhoru_types::config::AssistantConfig;
use nhoru_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use self::types::{ChatCompletionResponse, ErrorEnvelope};

/// Longest upstream error body kept in [`LlmError::Upstream`].
const MAX_ERROR_CHARS: usize = 200;

/// Provider for any OpenAI-compatible chat-completions endpoint.
///
/// # API Key Security
///
/// The key is only exposed when building the `Authorization` header.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
}

impl OpenAiCompatibleProvider {
    /// Create a provider from the `[assistant]` config.
    ///
    /// The HTTP client timeout is the configured per-attempt timeout.
    pub fn new(api_key: SecretString, config: &AssistantConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Override the endpoint URL (useful for testing or proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse_endpoint(&self) -> Result<reqwest::Url, LlmError> {
        let url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| LlmError::InvalidEndpoint(format!("{}: {e}", self.endpoint)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(LlmError::InvalidEndpoint(format!(
                "{}: unsupported scheme '{other}'",
                self.endpoint
            ))),
        }
    }
}

// OpenAiCompatibleProvider does NOT derive Debug, so no client state
// reaches logs.

impl CompletionProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai_compat"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = self.parse_endpoint()?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::Malformed(format!("invalid JSON body: {e}")))?;

        if parsed.choices.is_empty() {
            return Err(LlmError::Malformed("response has no choices".to_string()));
        }

        let content = parsed
            .first_reply()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyReply)?
            .to_string();

        tracing::debug!(
            model = parsed.model.as_deref().unwrap_or("unknown"),
            chars = content.chars().count(),
            "completion received"
        );

        Ok(CompletionResponse {
            content,
            model: parsed.model,
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Transport(err.to_string())
    }
}

/// Prefer the structured `error.message`; otherwise keep a bounded prefix
/// of the raw body.
fn upstream_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    body.chars().take(MAX_ERROR_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::post;
    use axum::{Json, Router};
    use nhoru_types::llm::Message;

    #[derive(Clone)]
    struct Mock {
        status: StatusCode,
        body: String,
        delay: Duration,
        seen: Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>,
    }

    async fn handler(
        State(mock): State<Mock>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, String) {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        mock.seen.lock().unwrap().push((auth, body));
        if !mock.delay.is_zero() {
            tokio::time::sleep(mock.delay).await;
        }
        (mock.status, mock.body.clone())
    }

    async fn serve(status: StatusCode, body: &str, delay: Duration) -> (String, Mock) {
        let mock = Mock {
            status,
            body: body.to_string(),
            delay,
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(handler))
            .with_state(mock.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1/chat/completions"), mock)
    }

    fn provider(endpoint: &str, timeout_secs: u64) -> OpenAiCompatibleProvider {
        let config = AssistantConfig {
            timeout_secs,
            ..AssistantConfig::default()
        };
        OpenAiCompatibleProvider::new(SecretString::from("sk-test".to_string()), &config)
            .unwrap()
            .with_endpoint(endpoint)
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::system("be calm"), Message::user("hello")],
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn complete_posts_bearer_json_and_reads_reply() {
        let (endpoint, mock) = serve(
            StatusCode::OK,
            r#"{"model":"gpt-4o-mini","choices":[{"message":{"role":"assistant","content":" You're here. "}}]}"#,
            Duration::ZERO,
        )
        .await;

        let response = provider(&endpoint, 5).complete(&request()).await.unwrap();
        assert_eq!(response.content, "You're here.");
        assert_eq!(response.model.as_deref(), Some("gpt-4o-mini"));

        let seen = mock.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[tokio::test]
    async fn legacy_text_choice_is_accepted() {
        let (endpoint, _mock) = serve(
            StatusCode::OK,
            r#"{"choices":[{"text":"We can slow this down."}]}"#,
            Duration::ZERO,
        )
        .await;
        let response = provider(&endpoint, 5).complete(&request()).await.unwrap();
        assert_eq!(response.content, "We can slow this down.");
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let (endpoint, _mock) = serve(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided"}}"#,
            Duration::ZERO,
        )
        .await;
        let err = provider(&endpoint, 5).complete(&request()).await.unwrap_err();
        assert_eq!(
            err,
            LlmError::Upstream {
                status: 401,
                message: "Incorrect API key provided".to_string()
            }
        );
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let (endpoint, _mock) = serve(StatusCode::OK, "<html>proxy</html>", Duration::ZERO).await;
        let err = provider(&endpoint, 5).complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Malformed(_)));
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let (endpoint, _mock) = serve(StatusCode::OK, r#"{"choices":[]}"#, Duration::ZERO).await;
        let err = provider(&endpoint, 5).complete(&request()).await.unwrap_err();
        assert_eq!(err, LlmError::Malformed("response has no choices".to_string()));
    }

    #[tokio::test]
    async fn blank_content_is_empty_reply() {
        let (endpoint, _mock) = serve(
            StatusCode::OK,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
            Duration::ZERO,
        )
        .await;
        let err = provider(&endpoint, 5).complete(&request()).await.unwrap_err();
        assert_eq!(err, LlmError::EmptyReply);
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let (endpoint, _mock) = serve(
            StatusCode::OK,
            r#"{"choices":[{"text":"late"}]}"#,
            Duration::from_secs(5),
        )
        .await;
        let err = provider(&endpoint, 1).complete(&request()).await.unwrap_err();
        assert_eq!(err, LlmError::Timeout);
    }

    #[tokio::test]
    async fn invalid_endpoint_is_rejected_before_sending() {
        let err = provider("not a url", 5).complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidEndpoint(_)));

        let err = provider("ftp://example.com/v1", 5)
            .complete(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidEndpoint(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = format!("http://127.0.0.1:{port}/v1/chat/completions");
        let err = provider(&endpoint, 5).complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
    }

    #[test]
    fn upstream_message_truncates_raw_bodies() {
        let body = "x".repeat(500);
        assert_eq!(upstream_message(&body).len(), MAX_ERROR_CHARS);
    }
}
