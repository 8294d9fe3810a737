//! Where reference texts come from.
//!
//! Every source hands back raw prose; `load_reference` turns the outcome
//! into a `ContentState` the session can use. A failed fetch never stops
//! the app: the placeholder is shown and starting is disabled until the
//! user asks for another text.

pub mod bundled;
pub mod remote;

use thiserror::Error;
use tracing::{info, warn};

use crate::session::ReferenceText;

pub use bundled::BundledSource;
pub use remote::{Institution, PracticeTest, RemoteSource};

pub const PLACEHOLDER: &str =
    "No practice text is available right now. Press (n) to try loading another one.";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered with status {0}")]
    Status(u16),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no text available")]
    Empty,
    #[error("no practice test with id {0}")]
    NoSuchTest(u64),
}

/// Supplies the passage for a session
pub trait ContentSource {
    fn fetch_reference_text(&self, test_id: Option<u64>) -> Result<String, ContentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum_macros::Display)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    Remote,
    #[default]
    Bundled,
}

/// A prompt given up front, e.g. on the command line
#[derive(Debug, Clone)]
pub struct FixedSource {
    text: String,
}

impl FixedSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ContentSource for FixedSource {
    fn fetch_reference_text(&self, _test_id: Option<u64>) -> Result<String, ContentError> {
        Ok(self.text.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentState {
    Ready(ReferenceText),
    Unavailable { placeholder: String },
}

impl ContentState {
    pub fn unavailable() -> Self {
        ContentState::Unavailable {
            placeholder: PLACEHOLDER.to_string(),
        }
    }

    pub fn reference(&self) -> Option<&ReferenceText> {
        match self {
            ContentState::Ready(text) => Some(text),
            ContentState::Unavailable { .. } => None,
        }
    }

    /// Text to put on screen, whether usable or not
    pub fn display_text(&self) -> &str {
        match self {
            ContentState::Ready(text) => text.text(),
            ContentState::Unavailable { placeholder } => placeholder,
        }
    }
}

pub fn load_reference(source: &dyn ContentSource, test_id: Option<u64>) -> ContentState {
    let outcome = source
        .fetch_reference_text(test_id)
        .and_then(|text| ReferenceText::parse(&text).ok_or(ContentError::Empty));

    match outcome {
        Ok(reference) => {
            info!(words = reference.words().len(), ?test_id, "reference text loaded");
            ContentState::Ready(reference)
        }
        Err(err) => {
            warn!(error = %err, ?test_id, "reference text unavailable, using placeholder");
            ContentState::unavailable()
        }
    }
}
