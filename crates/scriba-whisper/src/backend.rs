//! Remote transcription backends.
//!
//! [`TranscriptionBackend`] is the seam between the retrying client and the
//! network: production binds it to [`OpenAiBackend`], tests bind it to a stub
//! returning canned responses or scripted failures.

use crate::error::{WhisperError, WhisperResult};
use crate::transcript::ApiTranscription;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Base URL without trailing slash for OpenAI-compatible endpoints.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable consulted when no explicit API key is configured.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

// Uploads can be 25 MiB, so the request timeout is sized for slow links
// rather than relying on transport defaults.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Source of process-wide credentials. Consulted exactly once when a client is
/// constructed, never ad hoc during a call.
pub trait CredentialSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads credentials from the process environment.
pub struct OsEnv;

impl CredentialSource for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// One transcription request: file content plus optional hints.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub audio: Vec<u8>,
    /// Original file name; the service uses its extension to pick a decoder.
    pub file_name: String,
    /// Optional language hint code (e.g. "en").
    pub language: Option<String>,
    /// Optional free-text context to bias transcription.
    pub prompt: Option<String>,
}

/// Failure of a single backend attempt.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Connect, timeout, or body transfer error.
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success HTTP status with the service's error message.
    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Success status but an undecodable body.
    #[error("failed to parse response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether retrying the identical request can succeed. Network faults,
    /// rate limits (429) and server-side errors (5xx) are transient; auth
    /// failures and other 4xx rejections are not.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Transport(_) => true,
            BackendError::Status { status, .. } => *status == 429 || *status >= 500,
            BackendError::Decode(_) => false,
        }
    }
}

/// Backend for turning an audio payload into a raw service response.
#[async_trait::async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Performs exactly one attempt; the caller owns retries.
    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<ApiTranscription, BackendError>;
}

/// Resolves the API key: explicit configuration wins, otherwise the
/// credential source is consulted for [`API_KEY_VAR`].
pub(crate) fn resolve_api_key(
    explicit: Option<String>,
    env: &dyn CredentialSource,
) -> WhisperResult<String> {
    explicit
        .filter(|k| !k.is_empty())
        .or_else(|| env.var(API_KEY_VAR))
        .ok_or_else(|| {
            WhisperError::Config(format!(
                "no API key: pass api_key in config or set {API_KEY_VAR}"
            ))
        })
}

/// Production backend: multipart upload to an OpenAI-compatible
/// `/audio/transcriptions` endpoint, `verbose_json` response format.
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// Error body shape returned by OpenAI-compatible endpoints.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> WhisperResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WhisperError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait::async_trait]
impl TranscriptionBackend for OpenAiBackend {
    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<ApiTranscription, BackendError> {
        let url = format!(
            "{}/audio/transcriptions",
            self.base_url.trim_end_matches('/')
        );
        let part = reqwest::multipart::Part::bytes(request.audio.clone())
            .file_name(request.file_name.clone())
            .mime_str(guess_mime(&request.file_name))
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");
        if let Some(language) = &request.language {
            form = form.text("language", language.clone());
        }
        if let Some(prompt) = &request.prompt {
            form = form.text("prompt", prompt.clone());
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ApiTranscription>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Content type by file extension; the service tolerates a generic fallback.
fn guess_mime(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    match lower.rsplit('.').next().unwrap_or("") {
        "mp3" | "mpga" | "mpeg" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" | "mp4" => "audio/mp4",
        "webm" => "audio/webm",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Canned backend: returns a fixed response and counts calls. Use for
/// exercising the tool pipeline without network access.
#[derive(Debug, Default)]
pub struct PlaceholderBackend {
    response: ApiTranscription,
    calls: AtomicUsize,
}

impl PlaceholderBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(response: ApiTranscription) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of attempts made against this backend.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TranscriptionBackend for PlaceholderBackend {
    async fn transcribe(
        &self,
        _request: &TranscriptionRequest,
    ) -> Result<ApiTranscription, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapEnv(Option<String>);

    impl CredentialSource for MapEnv {
        fn var(&self, key: &str) -> Option<String> {
            assert_eq!(key, API_KEY_VAR);
            self.0.clone()
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(BackendError::Transport("connection reset".into()).is_transient());
        assert!(BackendError::Status { status: 429, message: "rate limit".into() }.is_transient());
        assert!(BackendError::Status { status: 500, message: "oops".into() }.is_transient());
        assert!(BackendError::Status { status: 503, message: "busy".into() }.is_transient());
        assert!(!BackendError::Status { status: 401, message: "bad key".into() }.is_transient());
        assert!(!BackendError::Status { status: 400, message: "malformed".into() }.is_transient());
        assert!(!BackendError::Status { status: 413, message: "too large".into() }.is_transient());
        assert!(!BackendError::Decode("not json".into()).is_transient());
    }

    #[test]
    fn test_resolve_api_key_prefers_explicit() {
        let key = resolve_api_key(Some("sk-explicit".into()), &MapEnv(Some("sk-env".into())));
        assert_eq!(key.unwrap(), "sk-explicit");
    }

    #[test]
    fn test_resolve_api_key_falls_back_to_env() {
        let key = resolve_api_key(None, &MapEnv(Some("sk-env".into())));
        assert_eq!(key.unwrap(), "sk-env");
        // Empty explicit key is treated as absent.
        let key = resolve_api_key(Some(String::new()), &MapEnv(Some("sk-env".into())));
        assert_eq!(key.unwrap(), "sk-env");
    }

    #[test]
    fn test_resolve_api_key_missing_everywhere() {
        let err = resolve_api_key(None, &MapEnv(None)).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("clip.MP3"), "audio/mpeg");
        assert_eq!(guess_mime("meeting.wav"), "audio/wav");
        assert_eq!(guess_mime("memo.m4a"), "audio/mp4");
        assert_eq!(guess_mime("noext"), "application/octet-stream");
    }
}
