use anyhow::Result;
use serde::Deserialize;

use crate::codec::EngineConfig;
use crate::stream::DEFAULT_WINDOW_SIZE;

/// Prefix for environment overrides, e.g. `PCM_TRANSCODE__CODEC__SAMPLE_RATE=16000`
pub const ENV_PREFIX: &str = "PCM_TRANSCODE";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub codec: EngineConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Bytes read from the source per chunk
    pub window_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus environment overrides
    ///
    /// Missing files and missing keys fall back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
