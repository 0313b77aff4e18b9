//! OpenAI-compatible HTTP client (chat completions and audio transcription).

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use recap_shared::{RecapError, Result};

use crate::{ChatRequest, ChatResponse, GenerationBackend};

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("Recap/", env!("CARGO_PKG_VERSION"));

/// How much of an error body is echoed into the error message.
const ERROR_BODY_PREVIEW: usize = 300;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings for [`OpenAiClient`].
#[derive(Debug, Clone)]
pub struct OpenAiOptions {
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: Url,
    /// Bearer token.
    pub api_key: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    text: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl OpenAiClient {
    /// Build a client with the given options.
    pub fn new(opts: OpenAiOptions) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RecapError::backend(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: opts.base_url,
            api_key: opts.api_key,
        })
    }

    /// `<base_url>/<path>`, keeping any path prefix of the base (e.g. `/v1`).
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Transcribe an audio file, biasing recognition with `prompt`.
    #[instrument(skip(self, prompt), fields(path = %audio_path.display()))]
    pub async fn transcribe(&self, audio_path: &Path, prompt: &str, model: &str) -> Result<String> {
        let url = self.endpoint("audio/transcriptions");
        let bytes = tokio::fs::read(audio_path)
            .await
            .map_err(|e| RecapError::io(audio_path, e))?;

        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.webm".to_string());

        info!(model, bytes = bytes.len(), "transcribing audio");
        let start = Instant::now();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/webm")
            .map_err(|e| RecapError::backend(format!("invalid mime type: {e}")))?;
        let form = Form::new()
            .text("model", model.to_string())
            .text("prompt", prompt.to_string())
            .part("file", part);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecapError::backend(format!("{url}: {e}")))?;

        let body = read_success_body(response, &url).await?;
        let parsed: TranscriptionBody = serde_json::from_str(&body)
            .map_err(|e| RecapError::backend(format!("{url}: invalid transcription body: {e}")))?;

        info!(
            chars = parsed.text.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "transcription complete"
        );
        Ok(parsed.text)
    }
}

impl GenerationBackend for OpenAiClient {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.endpoint("chat/completions");
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| RecapError::backend(format!("{url}: {e}")))?;

        let body = read_success_body(response, &url).await?;
        let parsed: CompletionBody = serde_json::from_str(&body)
            .map_err(|e| RecapError::backend(format!("{url}: invalid completion body: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let tokens_used = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);

        debug!(
            chars = text.len(),
            tokens_used,
            latency_ms = start.elapsed().as_millis(),
            "completion received"
        );

        Ok(ChatResponse {
            text,
            tokens_used,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
        })
    }
}

/// Return the body of a 2xx response, or a backend error carrying a preview of it.
async fn read_success_body(response: reqwest::Response, url: &str) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RecapError::backend(format!("{url}: failed to read body: {e}")))?;

    if !status.is_success() {
        let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
        return Err(RecapError::backend(format!("{url}: HTTP {status}: {preview}")));
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiClient {
        let base_url = Url::parse(&format!("{}/v1", server.uri())).unwrap();
        OpenAiClient::new(OpenAiOptions {
            base_url,
            api_key: "test-key".into(),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "o3-2025-04-16".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("transcripts")],
            max_completion_tokens: 5000,
            reasoning_effort: None,
            temperature: Some(1.0),
        }
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = OpenAiClient::new(OpenAiOptions {
            base_url: Url::parse("https://api.openai.com/v1/").unwrap(),
            api_key: "k".into(),
            timeout: None,
        })
        .unwrap();
        assert_eq!(
            client.endpoint("chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn complete_extracts_text_and_usage() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "o3-2025-04-16",
                "max_completion_tokens": 5000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "o3-2025-04-16",
                "choices": [{
                    "message": { "role": "assistant", "content": "## Summary:\nDone." }
                }],
                "usage": { "prompt_tokens": 90, "completion_tokens": 30, "total_tokens": 120 }
            })))
            .mount(&server)
            .await;

        let response = client_for(&server).complete(&request()).await.unwrap();
        assert_eq!(response.text, "## Summary:\nDone.");
        assert_eq!(response.tokens_used, 120);
        assert_eq!(response.model, "o3-2025-04-16");
    }

    #[tokio::test]
    async fn complete_with_null_content_is_empty_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": null } }]
            })))
            .mount(&server)
            .await;

        let response = client_for(&server).complete(&request()).await.unwrap();
        assert!(response.text.is_empty());
        assert_eq!(response.tokens_used, 0);
        assert_eq!(response.model, "o3-2025-04-16");
    }

    #[tokio::test]
    async fn complete_http_error_is_backend_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, RecapError::Backend(_)));
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("rate limited"));
    }

    #[tokio::test]
    async fn complete_malformed_body_is_backend_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("invalid completion body"));
    }

    #[tokio::test]
    async fn transcribe_uploads_file() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "text": "we shipped the webhook retries" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("2025_07_02_10_00_00-abc.webm");
        std::fs::write(&audio, b"fake-opus-bytes").unwrap();

        let text = client_for(&server)
            .transcribe(&audio, "People: Jason, Laura", "whisper-1")
            .await
            .unwrap();
        assert_eq!(text, "we shipped the webhook retries");
    }

    #[tokio::test]
    async fn transcribe_missing_file_is_io_error() {
        let server = MockServer::start().await;
        let err = client_for(&server)
            .transcribe(Path::new("/nonexistent/recording.webm"), "", "whisper-1")
            .await
            .unwrap_err();
        assert!(matches!(err, RecapError::Io { .. }));
    }
}
