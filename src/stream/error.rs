use std::io;
use thiserror::Error;

use crate::session::SessionError;

/// Failures of a streaming run, tagged by the stage that failed
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid window size {size} (must be 1..={max})")]
    InvalidWindow { size: usize, max: usize },

    #[error("failed to start codec session")]
    Start(#[source] SessionError),

    #[error("failed to read input stream")]
    Source(#[source] io::Error),

    #[error("failed to process input stream")]
    Process(#[source] SessionError),

    #[error("failed to write output stream")]
    Sink(#[source] io::Error),

    #[error("failed to end codec session")]
    Teardown(#[source] SessionError),
}

impl DriverError {
    /// Short name of the failed stage for logs and exit reporting
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidWindow { .. } => "config",
            Self::Start(_) => "engine-init",
            Self::Source(_) => "source",
            Self::Process(_) => "process",
            Self::Sink(_) => "sink",
            Self::Teardown(_) => "teardown",
        }
    }
}
