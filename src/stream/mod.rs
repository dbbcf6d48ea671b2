pub mod driver;
pub mod error;
pub mod window;

pub use driver::{run, StreamDriver};
pub use error::DriverError;
pub use window::{AsyncWindowReader, Chunk, WindowReader, DEFAULT_WINDOW_SIZE, MAX_WINDOW_SIZE};
