//! Retrying transcription client.
//!
//! Validates the audio file before any network call, performs a bounded
//! sequence of attempts against a [`TranscriptionBackend`] with capped
//! exponential backoff, and normalizes the raw response into a [`Transcript`].
//! The client holds read-only configuration only and is safe to share across
//! concurrent invocations.

use crate::backend::{
    resolve_api_key, OpenAiBackend, OsEnv, TranscriptionBackend, TranscriptionRequest,
    CredentialSource, DEFAULT_BASE_URL,
};
use crate::error::{WhisperError, WhisperResult};
use crate::transcript::Transcript;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Hard upload limit enforced by the remote service, checked client-side to
/// avoid a wasted round trip.
pub const MAX_FILE_SIZE_BYTES: u64 = 25 * 1024 * 1024;

/// Default bound on retry attempts after the first try.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default transcription model.
pub const DEFAULT_MODEL: &str = "whisper-1";

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Published per-minute rates in USD, by model.
const MODEL_RATES: &[(&str, f64)] = &[("whisper-1", 0.006)];
const FALLBACK_RATE_PER_MINUTE: f64 = 0.006;

/// Recognized client configuration.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Explicit API key; falls back to `OPENAI_API_KEY` when absent.
    pub api_key: Option<String>,
    /// Service model identifier.
    pub model: String,
    /// Endpoint base URL, overridable for OpenAI-compatible providers.
    pub base_url: String,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Turns a local audio file into a [`Transcript`], tolerating transient
/// service failures.
pub struct WhisperTranscriber {
    backend: Arc<dyn TranscriptionBackend>,
    model: String,
}

impl WhisperTranscriber {
    /// Bind to the real OpenAI backend, resolving the credential once from
    /// the process environment if the config carries none.
    pub fn new(config: WhisperConfig) -> WhisperResult<Self> {
        Self::with_credentials(config, &OsEnv)
    }

    /// As [`new`](Self::new), with an injectable credential source.
    pub fn with_credentials(
        config: WhisperConfig,
        env: &dyn CredentialSource,
    ) -> WhisperResult<Self> {
        let api_key = resolve_api_key(config.api_key, env)?;
        let backend = OpenAiBackend::new(config.base_url, api_key, config.model.clone())?;
        Ok(Self {
            backend: Arc::new(backend),
            model: config.model,
        })
    }

    /// Inject a backend directly (tests, alternative providers).
    pub fn with_backend(model: impl Into<String>, backend: Arc<dyn TranscriptionBackend>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Transcribe a local audio file.
    ///
    /// Validation runs before any network call: the path must resolve to an
    /// existing, non-empty file no larger than [`MAX_FILE_SIZE_BYTES`].
    /// Transient remote failures are retried up to `max_retries` additional
    /// times with capped exponential backoff; non-transient failures fail
    /// immediately. Attempts are strictly sequential.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
        prompt: Option<&str>,
        max_retries: u32,
    ) -> WhisperResult<Transcript> {
        if !audio_path.is_file() {
            return Err(WhisperError::FileNotFound(audio_path.to_path_buf()));
        }
        let size = std::fs::metadata(audio_path)?.len();
        if size == 0 {
            return Err(WhisperError::Validation(format!(
                "audio file is empty: {}",
                audio_path.display()
            )));
        }
        if size > MAX_FILE_SIZE_BYTES {
            return Err(WhisperError::Validation(format!(
                "file too large: {size} bytes exceeds the {MAX_FILE_SIZE_BYTES} byte service limit"
            )));
        }

        let audio = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let request = TranscriptionRequest {
            audio,
            file_name,
            language: language.map(str::to_string),
            prompt: prompt.map(str::to_string),
        };

        info!(
            path = %audio_path.display(),
            size_bytes = size,
            model = %self.model,
            "starting transcription"
        );

        let mut attempt: u32 = 0;
        loop {
            match self.backend.transcribe(&request).await {
                Ok(raw) => {
                    let transcript = Transcript::from(raw);
                    info!(
                        chars = transcript.text.len(),
                        segments = transcript.segments.len(),
                        "transcription successful"
                    );
                    return Ok(transcript);
                }
                Err(err) if err.is_transient() && attempt < max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient transcription failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    return Err(WhisperError::Transcription(format!(
                        "gave up after {} attempts: {err}",
                        attempt + 1
                    )));
                }
                Err(err) => return Err(WhisperError::Transcription(err.to_string())),
            }
        }
    }

    /// Estimated cost in USD for the given audio duration, using the
    /// published per-minute rate of the configured model. Pure; rejects
    /// negative input.
    pub fn estimate_cost(&self, duration_seconds: f64) -> WhisperResult<f64> {
        if duration_seconds < 0.0 {
            return Err(WhisperError::Validation(format!(
                "negative duration: {duration_seconds}"
            )));
        }
        Ok(duration_seconds / 60.0 * rate_per_minute(&self.model))
    }
}

fn rate_per_minute(model: &str) -> f64 {
    MODEL_RATES
        .iter()
        .find(|(m, _)| *m == model)
        .map(|(_, rate)| *rate)
        .unwrap_or(FALLBACK_RATE_PER_MINUTE)
}

/// Base delay doubling per attempt, capped.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u32 << attempt.min(5);
    BACKOFF_BASE.saturating_mul(factor).min(BACKOFF_CAP)
}
