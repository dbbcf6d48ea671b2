//! Codec session management
//!
//! This module provides the `CodecSession` abstraction that manages:
//! - Engine start and release, exactly once per session
//! - Dispatch of chunks to the engine's encode or decode path
//! - Lifecycle state and misuse detection
//! - Session statistics

mod config;
mod error;
mod session;
mod stats;

pub use config::{Mode, SessionConfig, UnknownMode};
pub use error::SessionError;
pub use session::CodecSession;
pub use stats::{SessionState, SessionStats};
