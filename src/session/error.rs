use thiserror::Error;

use super::config::Mode;
use super::stats::SessionState;
use crate::codec::EngineError;

/// Failures of a codec session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The engine could not be created; nothing to clean up
    #[error("failed to start {library} engine at {sample_rate}Hz")]
    EngineInit {
        library: String,
        sample_rate: u32,
        #[source]
        source: EngineError,
    },

    /// The engine rejected a chunk; the stream is corrupt
    #[error("{mode} failed on chunk {chunk_index}")]
    Process {
        mode: Mode,
        chunk_index: usize,
        #[source]
        source: EngineError,
    },

    /// Releasing the engine failed; output already produced stands
    #[error("failed to release engine")]
    Teardown(#[source] EngineError),

    /// An operation was called in a state that does not allow it
    #[error("{operation} called on {state} session")]
    Misuse {
        operation: &'static str,
        state: SessionState,
    },
}

impl SessionError {
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::Misuse { .. })
    }
}
