use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default sample rate for codec sessions
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

/// Default samples per channel in one codec frame (20ms at 24kHz)
pub const DEFAULT_FRAME_SIZE: usize = 480;

/// Parameters fixed for the lifetime of an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Samples per channel in one codec frame
    pub frame_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            frame_size: DEFAULT_FRAME_SIZE,
        }
    }
}

impl EngineConfig {
    /// Size in bytes of one frame of 16-bit PCM
    pub fn pcm_frame_bytes(&self) -> usize {
        self.frame_size * self.channels as usize * 2
    }
}

/// Failures reported by a codec engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine init failed: {0}")]
    Init(String),

    #[error("engine process failed: {0}")]
    Process(String),

    #[error("engine teardown failed: {0}")]
    Teardown(String),
}

/// One live engine instance
///
/// Calls are stateful: output for a chunk may depend on every earlier chunk
/// submitted to the same instance. `is_last` asks the engine to flush
/// anything it is still buffering into the returned bytes.
pub trait CodecEngine: Send {
    /// Compress PCM bytes
    fn encode(&mut self, input: &[u8], is_last: bool) -> Result<Vec<u8>, EngineError>;

    /// Decompress packet bytes back to PCM
    fn decode(&mut self, input: &[u8], is_last: bool) -> Result<Vec<u8>, EngineError>;

    /// Release the instance
    fn end(self: Box<Self>) -> Result<(), EngineError>;
}

/// Handle to a codec library
///
/// Holds whatever process-wide state the engine needs and hands out engine
/// instances. Shared between sessions as `Arc<dyn EngineLibrary>`.
pub trait EngineLibrary: Send + Sync {
    /// Library name for logging
    fn name(&self) -> &str;

    /// Create a new engine instance
    fn start(&self, config: &EngineConfig) -> Result<Box<dyn CodecEngine>, EngineError>;
}
