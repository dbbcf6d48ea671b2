use super::config::{Mode, SessionConfig};
use super::error::SessionError;
use super::stats::{SessionState, SessionStats};
use crate::codec::{CodecEngine, EngineLibrary};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A codec session that owns one engine instance for the length of a stream
///
/// Lifecycle: `Uninitialized --start--> Active --end--> Ended`. A chunk
/// flagged `is_last` moves the session to `Drained`, an engine failure to
/// `Failed`; both still require `end`. If the session is dropped while it
/// holds an engine, the engine is released on drop.
pub struct CodecSession {
    /// Session configuration
    config: SessionConfig,

    /// Library the engine is created from
    library: Arc<dyn EngineLibrary>,

    /// The engine instance, present between `start` and `end`
    engine: Option<Box<dyn CodecEngine>>,

    state: SessionState,

    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,

    chunks_processed: usize,
    bytes_in: u64,
    bytes_out: u64,
}

impl CodecSession {
    /// Create a session without starting the engine
    pub fn new(library: Arc<dyn EngineLibrary>, config: SessionConfig) -> Self {
        Self {
            config,
            library,
            engine: None,
            state: SessionState::Uninitialized,
            started_at: None,
            ended_at: None,
            chunks_processed: 0,
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    /// Create a session and start its engine
    pub fn open(
        library: Arc<dyn EngineLibrary>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(library, config);
        session.start()?;
        Ok(session)
    }

    /// Start the engine
    ///
    /// On failure the session stays `Uninitialized`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Uninitialized {
            return Err(self.misuse("start"));
        }

        let engine_config = self.config.engine;
        let engine = self
            .library
            .start(&engine_config)
            .map_err(|source| SessionError::EngineInit {
                library: self.library.name().to_string(),
                sample_rate: engine_config.sample_rate,
                source,
            })?;

        self.engine = Some(engine);
        self.state = SessionState::Active;
        self.started_at = Some(Utc::now());

        info!(
            "Session {} started: {} with {} engine at {}Hz",
            self.config.session_id,
            self.config.mode,
            self.library.name(),
            engine_config.sample_rate
        );

        Ok(())
    }

    /// Feed one chunk to the engine and take ownership of its output
    pub fn process(&mut self, chunk: &[u8], is_last: bool) -> Result<Vec<u8>, SessionError> {
        if self.state != SessionState::Active {
            return Err(self.misuse("process"));
        }

        let Some(engine) = self.engine.as_mut() else {
            return Err(self.misuse("process"));
        };

        let chunk_index = self.chunks_processed;
        let result = match self.config.mode {
            Mode::Encode => engine.encode(chunk, is_last),
            Mode::Decode => engine.decode(chunk, is_last),
        };

        match result {
            Ok(fragment) => {
                self.chunks_processed += 1;
                self.bytes_in += chunk.len() as u64;
                self.bytes_out += fragment.len() as u64;

                if is_last {
                    self.state = SessionState::Drained;
                }

                debug!(
                    "Chunk {}: {} bytes in, {} bytes out (last={})",
                    chunk_index,
                    chunk.len(),
                    fragment.len(),
                    is_last
                );

                Ok(fragment)
            }
            Err(source) => {
                self.state = SessionState::Failed;
                warn!(
                    "Session {} failed on chunk {}: {}",
                    self.config.session_id, chunk_index, source
                );

                Err(SessionError::Process {
                    mode: self.config.mode,
                    chunk_index,
                    source,
                })
            }
        }
    }

    /// Release the engine
    ///
    /// Valid in `Active`, `Drained` and `Failed`. The engine is released and
    /// the session is `Ended` even when the engine reports a teardown error.
    pub fn end(&mut self) -> Result<(), SessionError> {
        if !self.state.holds_engine() {
            return Err(self.misuse("end"));
        }

        let engine = self.engine.take();
        self.state = SessionState::Ended;
        self.ended_at = Some(Utc::now());

        if let Some(engine) = engine {
            engine.end().map_err(SessionError::Teardown)?;
        }

        info!(
            "Session {} ended: {} chunks, {} bytes in, {} bytes out",
            self.config.session_id, self.chunks_processed, self.bytes_in, self.bytes_out
        );

        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.config.session_id.clone(),
            mode: self.config.mode,
            sample_rate: self.config.engine.sample_rate,
            state: self.state,
            started_at: self.started_at,
            ended_at: self.ended_at,
            chunks_processed: self.chunks_processed,
            bytes_in: self.bytes_in,
            bytes_out: self.bytes_out,
        }
    }

    fn misuse(&self, operation: &'static str) -> SessionError {
        SessionError::Misuse {
            operation,
            state: self.state,
        }
    }
}

impl Drop for CodecSession {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            warn!(
                "Session {} dropped in state {}, releasing engine",
                self.config.session_id, self.state
            );
            if let Err(e) = engine.end() {
                warn!("Failed to release engine on drop: {}", e);
            }
        }
    }
}
