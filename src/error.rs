//! Error types shared by the pipeline stages.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::ModelError;

pub type Result<T> = std::result::Result<T, StoryError>;

#[derive(Debug, Error)]
pub enum StoryError {
    /// The dataset a stage reads has not been produced yet.
    #[error("{} is missing; run '{stage}' first", path.display())]
    MissingInput { stage: &'static str, path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot (de)serialize {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read PDF {}: {reason}", path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    /// Generated text did not contain the three phase paragraphs in order.
    #[error("model output for {subject} is not a three-paragraph Past/Present/Future story")]
    MalformedNarrative { subject: String },

    /// Generated text cites a page that was not among the prompt snippets.
    #[error("model output for {subject} cites {citation}, which is not a snippet source")]
    UnknownCitation { subject: String, citation: String },

    #[error("story generation failed for: {}", topics.join(", "))]
    StoriesFailed { topics: Vec<String> },
}

impl StoryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
