//! The `whisper` tool adapter: exposes [`WhisperTranscriber`] through the
//! host tool-invocation contract.
//!
//! Thin glue only - it validates the presence of `audio_path`, expands `~`,
//! delegates to the client, and maps every client failure kind into the
//! `{message, type}` error shape. Nothing escapes this layer unmapped.

use crate::client::{WhisperConfig, WhisperTranscriber, DEFAULT_MAX_RETRIES, DEFAULT_MODEL};
use crate::error::WhisperResult;
use crate::transcript::Transcript;
use scriba_core::{Tool, ToolResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const TOOL_NAME: &str = "whisper";
const TOOL_DESCRIPTION: &str = "Transcribe audio using the OpenAI Whisper API";

const DEFAULT_OUTPUT_DIR: &str = "~/transcripts";

/// Tool configuration as passed by the host framework.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhisperToolConfig {
    /// Directory where transcript copies are saved after a successful call.
    pub output_dir: String,
    pub model: String,
    /// Falls back to the process environment when absent.
    pub api_key: Option<String>,
}

impl Default for WhisperToolConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

/// Input mapping accepted by `execute`.
#[derive(Debug, Deserialize)]
struct WhisperArgs {
    audio_path: Option<String>,
    language: Option<String>,
    prompt: Option<String>,
    max_retries: Option<u32>,
}

/// OpenAI Whisper transcription tool.
pub struct WhisperTool {
    transcriber: WhisperTranscriber,
    output_dir: Option<PathBuf>,
}

impl WhisperTool {
    /// Build the tool with the real OpenAI backend. The output directory is
    /// created up front so a misconfigured path surfaces at registration
    /// time, not mid-invocation.
    pub fn new(config: WhisperToolConfig) -> WhisperResult<Self> {
        let output_dir = expand_tilde(&config.output_dir);
        std::fs::create_dir_all(&output_dir)?;
        let transcriber = WhisperTranscriber::new(WhisperConfig {
            api_key: config.api_key,
            model: config.model,
            ..WhisperConfig::default()
        })?;
        Ok(Self {
            transcriber,
            output_dir: Some(output_dir),
        })
    }

    /// Wrap an existing transcriber (tests, custom backends). No transcript
    /// copies are saved unless `output_dir` is given.
    pub fn with_transcriber(
        transcriber: WhisperTranscriber,
        output_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            transcriber,
            output_dir,
        }
    }

    fn build_output(&self, transcript: &Transcript, cost: f64) -> serde_json::Value {
        let mut output = serde_json::Map::new();
        output.insert("text".to_string(), transcript.text.clone().into());
        output.insert(
            "segments".to_string(),
            serde_json::to_value(&transcript.segments).unwrap_or_default(),
        );
        if let Some(duration) = transcript.duration {
            output.insert("duration".to_string(), duration.into());
        }
        if let Some(language) = &transcript.language {
            output.insert("language".to_string(), language.clone().into());
        }
        output.insert("cost".to_string(), cost.into());
        serde_json::Value::Object(output)
    }

    /// Best-effort transcript copy; failures are logged, never surfaced.
    fn save_copy(&self, audio_path: &Path, transcript: &Transcript) {
        let Some(dir) = &self.output_dir else {
            return;
        };
        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transcript".to_string());
        let target = dir.join(stem).with_extension("txt");
        match std::fs::write(&target, &transcript.text) {
            Ok(()) => debug!(path = %target.display(), "saved transcript copy"),
            Err(e) => warn!(path = %target.display(), error = %e, "failed to save transcript copy"),
        }
    }
}

#[async_trait::async_trait]
impl Tool for WhisperTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        TOOL_DESCRIPTION
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let args: WhisperArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolResult::fail(format!("invalid input: {e}"), "ValueError"),
        };
        let Some(audio_path) = args.audio_path.filter(|p| !p.is_empty()) else {
            return ToolResult::fail("audio_path is required", "ValueError");
        };
        let audio_path = expand_tilde(&audio_path);
        let max_retries = args.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);

        info!(path = %audio_path.display(), "starting transcription");

        match self
            .transcriber
            .transcribe(
                &audio_path,
                args.language.as_deref(),
                args.prompt.as_deref(),
                max_retries,
            )
            .await
        {
            Ok(transcript) => {
                let cost = match transcript.duration {
                    Some(duration) => self.transcriber.estimate_cost(duration).unwrap_or(0.0),
                    None => 0.0,
                };
                self.save_copy(&audio_path, &transcript);
                info!(
                    chars = transcript.text.len(),
                    cost, "transcription successful"
                );
                ToolResult::ok(self.build_output(&transcript, cost))
            }
            Err(err) => {
                error!(error = %err, kind = err.kind(), "transcription failed");
                ToolResult::fail(err.to_string(), err.kind())
            }
        }
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PlaceholderBackend;
    use crate::transcript::{ApiSegment, ApiTranscription};
    use std::io::Write;
    use std::sync::Arc;

    fn sample_response() -> ApiTranscription {
        ApiTranscription {
            text: "Test transcript".to_string(),
            language: Some("en".to_string()),
            duration: Some(10.5),
            segments: vec![ApiSegment {
                id: 0,
                start: 0.0,
                end: 10.5,
                text: "Test transcript".to_string(),
            }],
        }
    }

    fn tool_with(backend: Arc<PlaceholderBackend>, output_dir: Option<PathBuf>) -> WhisperTool {
        let transcriber = WhisperTranscriber::with_backend(DEFAULT_MODEL, backend);
        WhisperTool::with_transcriber(transcriber, output_dir)
    }

    fn audio_fixture() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".mp3")
            .tempfile()
            .unwrap();
        file.write_all(b"fake audio data").unwrap();
        file
    }

    #[test]
    fn test_identity() {
        let tool = tool_with(Arc::new(PlaceholderBackend::new()), None);
        assert_eq!(tool.name(), "whisper");
        assert_eq!(
            tool.description(),
            "Transcribe audio using the OpenAI Whisper API"
        );
    }

    #[tokio::test]
    async fn test_missing_audio_path_makes_no_client_call() {
        let backend = Arc::new(PlaceholderBackend::new());
        let tool = tool_with(backend.clone(), None);
        let result = tool.execute(serde_json::json!({})).await;
        assert!(!result.success);
        let failure = result.error.unwrap();
        assert_eq!(failure.kind, "ValueError");
        assert!(failure.message.contains("audio_path is required"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_audio_path_rejected() {
        let backend = Arc::new(PlaceholderBackend::new());
        let tool = tool_with(backend.clone(), None);
        let result = tool
            .execute(serde_json::json!({ "audio_path": "" }))
            .await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, "ValueError");
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_transcription_envelope() {
        let backend = Arc::new(PlaceholderBackend::with_response(sample_response()));
        let tool = tool_with(backend.clone(), None);
        let file = audio_fixture();
        let result = tool
            .execute(serde_json::json!({
                "audio_path": file.path().to_string_lossy(),
                "language": "en",
                "prompt": "Meeting notes",
            }))
            .await;
        assert!(result.success, "{:?}", result.error);
        let output = result.output.unwrap();
        assert_eq!(output["text"], "Test transcript");
        assert_eq!(output["language"], "en");
        assert_eq!(output["duration"], 10.5);
        assert_eq!(output["segments"].as_array().unwrap().len(), 1);
        assert_eq!(output["segments"][0]["text"], "Test transcript");
        let expected_cost = 10.5 / 60.0 * 0.006;
        assert!((output["cost"].as_f64().unwrap() - expected_cost).abs() < 1e-12);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_duration_and_language_absent_when_unknown() {
        let backend = Arc::new(PlaceholderBackend::with_response(ApiTranscription {
            text: "bare".to_string(),
            ..ApiTranscription::default()
        }));
        let tool = tool_with(backend, None);
        let file = audio_fixture();
        let result = tool
            .execute(serde_json::json!({ "audio_path": file.path().to_string_lossy() }))
            .await;
        assert!(result.success);
        let output = result.output.unwrap();
        assert!(output.get("duration").is_none());
        assert!(output.get("language").is_none());
        assert_eq!(output["cost"], 0.0);
    }

    #[tokio::test]
    async fn test_nonexistent_file_maps_to_file_not_found() {
        let backend = Arc::new(PlaceholderBackend::new());
        let tool = tool_with(backend.clone(), None);
        let result = tool
            .execute(serde_json::json!({ "audio_path": "/nonexistent/file.mp3" }))
            .await;
        assert!(!result.success);
        let failure = result.error.unwrap();
        assert_eq!(failure.kind, "FileNotFoundError");
        assert!(failure.message.contains("not found"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_saves_transcript_copy_to_output_dir() {
        let backend = Arc::new(PlaceholderBackend::with_response(sample_response()));
        let out = tempfile::tempdir().unwrap();
        let tool = tool_with(backend, Some(out.path().to_path_buf()));
        let file = audio_fixture();
        let result = tool
            .execute(serde_json::json!({ "audio_path": file.path().to_string_lossy() }))
            .await;
        assert!(result.success);
        let stem = file.path().file_stem().unwrap().to_string_lossy().into_owned();
        let saved = out.path().join(stem).with_extension("txt");
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "Test transcript");
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("~/audio/clip.mp3"), home.join("audio/clip.mp3"));
        assert_eq!(
            expand_tilde("/var/audio/clip.mp3"),
            PathBuf::from("/var/audio/clip.mp3")
        );
        // No expansion mid-path.
        assert_eq!(expand_tilde("/a/~b"), PathBuf::from("/a/~b"));
    }

    #[test]
    fn test_config_defaults() {
        let config: WhisperToolConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(config.output_dir, "~/transcripts");
        assert_eq!(config.model, "whisper-1");
        assert!(config.api_key.is_none());
    }
}
