//! Mapping between `ProgressState` and the JSON document kept in storage.
//!
//! The document is `{ "version", "answers", "completions", "collections" }`.
//! Missing lists default to empty and unknown fields are ignored so older and
//! newer writers can share one key.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tutor_core::model::{CollectionProgress, ExerciseCompletion, ProgressState, UserAnswer};

/// Storage key the web app has always used.
pub const DEFAULT_STORAGE_KEY: &str = "jp-tutoring-progress";

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("stored progress is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("stored progress has unsupported schema version {0}")]
    UnsupportedVersion(u32),
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    answers: &'a [UserAnswer],
    completions: &'a [ExerciseCompletion],
    collections: &'a [CollectionProgress],
}

#[derive(Deserialize)]
struct Document {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(flatten)]
    state: ProgressState,
}

/// # Errors
///
/// Returns `serde_json::Error` if a record cannot be serialized.
pub fn encode(state: &ProgressState) -> Result<String, serde_json::Error> {
    serde_json::to_string(&DocumentRef {
        version: SCHEMA_VERSION,
        answers: &state.answers,
        completions: &state.completions,
        collections: &state.collections,
    })
}

/// # Errors
///
/// Returns `DecodeError` for anything that is not a progress document this
/// build understands. Version 0 is never written and is rejected.
pub fn decode(raw: &str) -> Result<ProgressState, DecodeError> {
    let document: Document = serde_json::from_str(raw)?;
    if document.version == 0 {
        return Err(DecodeError::UnsupportedVersion(document.version));
    }
    if document.version > SCHEMA_VERSION {
        tracing::warn!(
            version = document.version,
            supported = SCHEMA_VERSION,
            "reading progress written by a newer schema"
        );
    }
    Ok(dedup(document.state))
}

/// Replays each decoded list through the upserts, so a document holding two
/// records for one key keeps only the last.
fn dedup(decoded: ProgressState) -> ProgressState {
    let mut state = ProgressState::empty();
    for answer in decoded.answers {
        state.upsert_answer(answer);
    }
    for completion in decoded.completions {
        state.upsert_completion(completion);
    }
    for progress in decoded.collections {
        state.upsert_collection(progress);
    }
    state
}
