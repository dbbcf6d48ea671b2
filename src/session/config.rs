use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::codec::EngineConfig;

/// Direction of a transcoding session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// PCM in, compressed packets out
    Encode,
    /// Compressed packets in, PCM out
    Decode,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Encode => "encode",
            Mode::Decode => "decode",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown mode '{0}' (expected 'encode' or 'decode')")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encode" => Ok(Mode::Encode),
            "decode" => Ok(Mode::Decode),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Configuration for a codec session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier used in logs and stats
    pub session_id: String,

    /// Encode or decode
    pub mode: Mode,

    /// Engine parameters, fixed for the session's lifetime
    pub engine: EngineConfig,
}

impl SessionConfig {
    pub fn new(mode: Mode, sample_rate: u32) -> Self {
        Self {
            mode,
            engine: EngineConfig {
                sample_rate,
                ..EngineConfig::default()
            },
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("transcode-{}", uuid::Uuid::new_v4()),
            mode: Mode::Encode,
            engine: EngineConfig::default(),
        }
    }
}
