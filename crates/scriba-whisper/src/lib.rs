//! # Scriba Whisper - Remote Speech-to-Text Tool
//!
//! Wraps the OpenAI Whisper transcription API behind the `scriba-core` tool
//! contract so the host orchestrator can invoke it like any other capability.
//!
//! ## Architecture
//!
//! ```text
//! host orchestrator
//!        │  execute({ audio_path, language?, prompt?, max_retries? })
//!        ▼
//! ┌──────────────┐     ┌────────────────────┐     ┌──────────────────────┐
//! │  WhisperTool │ ──▶ │ WhisperTranscriber │ ──▶ │ TranscriptionBackend │
//! │  (envelope)  │     │ (validate + retry) │     │  (multipart upload)  │
//! └──────────────┘     └────────────────────┘     └──────────────────────┘
//! ```
//!
//! The transcriber validates the audio file before any network call (exists,
//! non-empty, within the service's 25 MiB limit), retries transient remote
//! failures with capped exponential backoff, and normalizes the `verbose_json`
//! response into a [`Transcript`]. The backend is a trait so tests and
//! alternative OpenAI-compatible providers can be swapped in.

pub mod backend;
pub mod client;
pub mod error;
pub mod tool;
pub mod transcript;

pub use backend::{
    BackendError, CredentialSource, OpenAiBackend, OsEnv, PlaceholderBackend,
    TranscriptionBackend, TranscriptionRequest, DEFAULT_BASE_URL,
};
pub use client::{
    WhisperConfig, WhisperTranscriber, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, MAX_FILE_SIZE_BYTES,
};
pub use error::{WhisperError, WhisperResult};
pub use tool::{WhisperTool, WhisperToolConfig, TOOL_NAME};
pub use transcript::{ApiSegment, ApiTranscription, Transcript, TranscriptSegment};
