pub mod engine;
pub mod mulaw;

pub use engine::{
    CodecEngine, EngineConfig, EngineError, EngineLibrary, DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE,
};
pub use mulaw::MulawLibrary;
