use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use super::error::DriverError;
use super::window::{AsyncWindowReader, WindowReader, DEFAULT_WINDOW_SIZE, MAX_WINDOW_SIZE};
use crate::codec::EngineLibrary;
use crate::session::{CodecSession, SessionConfig, SessionError, SessionStats};

/// Runs whole streams through codec sessions
///
/// Each run opens a fresh session, feeds it the source window by window,
/// ends the session and writes the concatenated fragments to the sink.
/// The session is ended on every path once it has started. Each run's
/// session id is the configured id with the run number appended.
pub struct StreamDriver {
    library: Arc<dyn EngineLibrary>,
    config: SessionConfig,
    window_size: usize,
    runs: AtomicUsize,
}

impl StreamDriver {
    pub fn new(library: Arc<dyn EngineLibrary>, config: SessionConfig) -> Self {
        Self {
            library,
            config,
            window_size: DEFAULT_WINDOW_SIZE,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Transcode `source` into `sink`
    pub fn run<R: Read, W: Write>(&self, source: R, mut sink: W) -> Result<SessionStats, DriverError> {
        let mut session = self.open_session()?;

        let mut output = Vec::new();
        let pumped = pump(&mut session, WindowReader::new(source, self.window_size), &mut output);
        let teardown = close(&mut session, pumped)?;

        sink.write_all(&output).map_err(DriverError::Sink)?;
        sink.flush().map_err(DriverError::Sink)?;

        self.finish(&session, teardown, output.len())
    }

    /// Transcode an async `source` into an async `sink`
    pub async fn run_async<R, W>(&self, source: R, mut sink: W) -> Result<SessionStats, DriverError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut session = self.open_session()?;

        let mut output = Vec::new();
        let mut reader = AsyncWindowReader::new(source, self.window_size);
        let pumped = async {
            while let Some(chunk) = reader.next_chunk().await.map_err(DriverError::Source)? {
                let fragment = session
                    .process(&chunk.data, chunk.is_last)
                    .map_err(DriverError::Process)?;
                output.extend_from_slice(&fragment);
            }
            Ok::<(), DriverError>(())
        }
        .await;
        let teardown = close(&mut session, pumped)?;

        sink.write_all(&output).await.map_err(DriverError::Sink)?;
        sink.flush().await.map_err(DriverError::Sink)?;

        self.finish(&session, teardown, output.len())
    }

    fn open_session(&self) -> Result<CodecSession, DriverError> {
        if self.window_size == 0 || self.window_size > MAX_WINDOW_SIZE {
            return Err(DriverError::InvalidWindow {
                size: self.window_size,
                max: MAX_WINDOW_SIZE,
            });
        }

        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        let config = SessionConfig {
            session_id: format!("{}-{}", self.config.session_id, run),
            ..self.config.clone()
        };

        info!(
            "Starting {} run {} ({} byte windows)",
            config.mode, config.session_id, self.window_size
        );

        CodecSession::open(Arc::clone(&self.library), config)
            .map_err(DriverError::Start)
    }

    fn finish(
        &self,
        session: &CodecSession,
        teardown: Result<(), SessionError>,
        written: usize,
    ) -> Result<SessionStats, DriverError> {
        teardown.map_err(DriverError::Teardown)?;

        let stats = session.stats();
        info!(
            "Run complete: {} chunks, {} bytes written",
            stats.chunks_processed, written
        );
        Ok(stats)
    }
}

/// Transcode `source` into `sink` with a one-off driver
pub fn run<R: Read, W: Write>(
    source: R,
    sink: W,
    library: Arc<dyn EngineLibrary>,
    config: SessionConfig,
    window_size: usize,
) -> Result<SessionStats, DriverError> {
    StreamDriver::new(library, config)
        .with_window_size(window_size)
        .run(source, sink)
}

fn pump<R: Read>(
    session: &mut CodecSession,
    reader: WindowReader<R>,
    output: &mut Vec<u8>,
) -> Result<(), DriverError> {
    for chunk in reader {
        let chunk = chunk.map_err(DriverError::Source)?;
        let fragment = session
            .process(&chunk.data, chunk.is_last)
            .map_err(DriverError::Process)?;
        output.extend_from_slice(&fragment);
    }
    Ok(())
}

/// End the session whatever happened while pumping
///
/// A pumping error wins over a teardown error; the teardown error is only
/// logged in that case. Otherwise the teardown result is handed back so the
/// caller can write output before reporting it.
fn close(
    session: &mut CodecSession,
    pumped: Result<(), DriverError>,
) -> Result<Result<(), SessionError>, DriverError> {
    let ended = session.end();

    match pumped {
        Ok(()) => Ok(ended),
        Err(e) => {
            if let Err(teardown) = ended {
                warn!("Failed to end session after {} error: {}", e.stage(), teardown);
            }
            Err(e)
        }
    }
}
