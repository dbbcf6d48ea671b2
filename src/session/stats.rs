use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::config::Mode;

/// Lifecycle of a codec session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, engine not started
    Uninitialized,
    /// Engine running, accepting chunks
    Active,
    /// Final chunk processed, waiting for `end`
    Drained,
    /// A chunk failed; the stream is corrupt but the engine still needs releasing
    Failed,
    /// Engine released
    Ended,
}

impl SessionState {
    /// Whether the session still holds an engine instance
    pub fn holds_engine(&self) -> bool {
        matches!(self, Self::Active | Self::Drained | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Drained => "drained",
            Self::Failed => "failed",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics about a codec session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,

    /// Encode or decode
    pub mode: Mode,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Current lifecycle state
    pub state: SessionState,

    /// When the engine was started
    pub started_at: Option<DateTime<Utc>>,

    /// When the engine was released
    pub ended_at: Option<DateTime<Utc>>,

    /// Number of chunks handed to the engine successfully
    pub chunks_processed: usize,

    /// Total input bytes accepted
    pub bytes_in: u64,

    /// Total output bytes produced
    pub bytes_out: u64,
}
