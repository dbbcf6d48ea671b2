pub mod audio;
pub mod codec;
pub mod config;
pub mod session;
pub mod stream;
pub mod transcode;

pub use audio::{write_wav, AudioFile};
pub use codec::{CodecEngine, EngineConfig, EngineError, EngineLibrary, MulawLibrary};
pub use config::Config;
pub use session::{CodecSession, Mode, SessionConfig, SessionError, SessionState, SessionStats};
pub use stream::{run, AsyncWindowReader, Chunk, DriverError, StreamDriver, WindowReader};
pub use transcode::transcode_file;
