//! Normalized transcript model and the `verbose_json` wire types it is built
//! from.
//!
//! Both [`Transcript`] and [`TranscriptSegment`] are plain data: constructed
//! once from a single service response, never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Normalized result of one transcription call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full transcribed text. May be empty, never absent.
    pub text: String,
    /// Language reported by the service, absent if undetected.
    pub language: Option<String>,
    /// Audio duration in seconds as reported by the service.
    pub duration: Option<f64>,
    /// Timestamped fragments in chronological order. May be empty.
    pub segments: Vec<TranscriptSegment>,
}

/// One timestamped fragment of a transcript. `0 <= start <= end`, seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Sequence index assigned by the service, unique within a transcript.
    pub id: u32,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Raw `verbose_json` response body from the transcription endpoint.
///
/// The service omits `language`/`duration`/`segments` for plain responses, so
/// everything beyond `text` is defaulted. Unknown fields (`task`, per-segment
/// token stats) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiTranscription {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub segments: Vec<ApiSegment>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiSegment {
    pub id: u32,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub text: String,
}

impl From<ApiTranscription> for Transcript {
    fn from(raw: ApiTranscription) -> Self {
        Transcript {
            text: raw.text,
            language: raw.language,
            duration: raw.duration,
            segments: raw
                .segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    id: s.id,
                    start: s.start,
                    end: s.end,
                    text: s.text,
                })
                .collect(),
        }
    }
}
