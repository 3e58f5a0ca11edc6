// kakusu-core/src/recognizer.rs
//! Named-entity recognizer adapters.
//!
//! The masking pipeline never talks to a model directly. It asks an
//! [`EntityRecognizer`] for labelled character ranges and validates them before
//! they enter fusion. Two adapters ship with the crate: [`StaticRecognizer`] for
//! precomputed spans (and the explicit rules-only mode), and [`HttpRecognizer`]
//! for a recognizer service reachable over HTTP.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::errors::{KakusuError, KakusuResult};

/// Default time allowed for one recognizer request.
pub const DEFAULT_RECOGNIZER_TIMEOUT: Duration = Duration::from_secs(30);

/// A labelled range reported by a recognizer, in character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NerSpan {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl NerSpan {
    pub fn new(label: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }
}

/// Source of recognizer spans for the masking engine.
pub trait EntityRecognizer: Send + Sync {
    /// Returns every entity found in `text`.
    ///
    /// An unreachable or failing recognizer must surface as
    /// [`KakusuError::DetectionUnavailable`], never as an empty result.
    fn detect_entities(&self, text: &str) -> KakusuResult<Vec<NerSpan>>;
}

/// Rejects spans that are empty or fall outside `text`.
pub fn validate_spans(text: &str, spans: &[NerSpan]) -> KakusuResult<()> {
    let len = text.chars().count();
    match spans.iter().find(|s| s.start >= s.end || s.end > len) {
        Some(bad) => Err(KakusuError::InvalidSpan {
            label: bad.label.clone(),
            start: bad.start,
            end: bad.end,
            len,
        }),
        None => Ok(()),
    }
}

/// Returns the same spans for every call.
#[derive(Debug, Clone, Default)]
pub struct StaticRecognizer {
    spans: Vec<NerSpan>,
}

impl StaticRecognizer {
    pub fn new(spans: Vec<NerSpan>) -> Self {
        Self { spans }
    }

    /// Rules-only masking: the recognizer contributes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads spans from a JSON file holding either a list of spans or an
    /// `{"entities": [...]}` object.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> KakusuResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let response: RecognizerResponse = serde_json::from_str(&text).map_err(|e| {
            KakusuError::DetectionUnavailable(format!(
                "could not parse recognizer spans from {}: {}",
                path.display(),
                e
            ))
        })?;
        let spans = response.into_spans();
        info!("Loaded {} precomputed recognizer span(s) from {}", spans.len(), path.display());
        Ok(Self::new(spans))
    }
}

impl EntityRecognizer for StaticRecognizer {
    fn detect_entities(&self, _text: &str) -> KakusuResult<Vec<NerSpan>> {
        Ok(self.spans.clone())
    }
}

/// Body accepted from a recognizer: wrapped or bare list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecognizerResponse {
    Wrapped { entities: Vec<NerSpan> },
    Bare(Vec<NerSpan>),
}

impl RecognizerResponse {
    fn into_spans(self) -> Vec<NerSpan> {
        match self {
            RecognizerResponse::Wrapped { entities } => entities,
            RecognizerResponse::Bare(spans) => spans,
        }
    }
}

#[derive(Serialize)]
struct RecognizerRequest<'a> {
    text: &'a str,
}

/// Calls a recognizer service: `POST {"text": ...}` to `endpoint`.
#[derive(Debug, Clone)]
pub struct HttpRecognizer {
    client: Client,
    endpoint: String,
}

impl HttpRecognizer {
    pub fn new(endpoint: impl Into<String>) -> KakusuResult<Self> {
        Self::with_timeout(endpoint, DEFAULT_RECOGNIZER_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> KakusuResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KakusuError::DetectionUnavailable(format!("could not build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EntityRecognizer for HttpRecognizer {
    fn detect_entities(&self, text: &str) -> KakusuResult<Vec<NerSpan>> {
        let unavailable = |e: reqwest::Error| {
            KakusuError::DetectionUnavailable(format!("{}: {}", self.endpoint, e))
        };

        debug!("Requesting entities from {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RecognizerRequest { text })
            .send()
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        let body: RecognizerResponse = response.json().map_err(unavailable)?;

        let spans = body.into_spans();
        debug!("Recognizer returned {} span(s).", spans.len());
        Ok(spans)
    }
}
