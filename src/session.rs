//! Working file for one editing session.
//!
//! The CLI runs one command per process, so the document being edited and
//! the video summaries fetched so far are kept in a JSON file the user names.

use crate::document::SummaryDocument;
use crate::media::VideoSummaries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to access session file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("session file is not valid: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A document plus the per-session caches that belong with it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// When the session file was last written
    pub saved_at: DateTime<Utc>,
    /// The document being edited
    pub document: SummaryDocument,
    /// Video summaries fetched so far, by video id
    #[serde(default)]
    pub video_summaries: VideoSummaries,
}

impl Session {
    /// Start a session around a fresh document
    pub fn new(document: SummaryDocument) -> Self {
        Self {
            saved_at: Utc::now(),
            document,
            video_summaries: VideoSummaries::new(),
        }
    }

    /// Read a session file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let data = std::fs::read(path.as_ref())?;
        let session: Session = serde_json::from_slice(&data)?;
        tracing::debug!(path = %path.as_ref().display(), "opened session");
        Ok(session)
    }

    /// Write the session file, replacing any previous content
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SessionError> {
        self.saved_at = Utc::now();
        let value = serde_json::to_vec_pretty(self)?;
        std::fs::write(path.as_ref(), value)?;
        tracing::debug!(path = %path.as_ref().display(), "saved session");
        Ok(())
    }
}
