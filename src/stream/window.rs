use std::io::{self, ErrorKind, Read};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default read window in bytes
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// Largest accepted read window in bytes
pub const MAX_WINDOW_SIZE: usize = 16 * 1024 * 1024;

/// One window of input plus its end-of-stream flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in the stream (0-indexed)
    pub index: usize,
    /// Input bytes, at most one window
    pub data: Vec<u8>,
    /// Whether this is the final chunk of the stream
    pub is_last: bool,
}

/// Splits a byte source into fixed-size chunks
///
/// Each window is filled completely unless the source is exhausted, so a
/// short read from the source never ends the stream. A full window is only
/// flagged `is_last` once the following read returns nothing. An empty
/// source yields a single empty chunk flagged `is_last`.
pub struct WindowReader<R> {
    inner: R,
    window_size: usize,
    lookahead: Option<Vec<u8>>,
    next_index: usize,
    finished: bool,
}

impl<R: Read> WindowReader<R> {
    pub fn new(inner: R, window_size: usize) -> Self {
        Self {
            inner,
            window_size,
            lookahead: None,
            next_index: 0,
            finished: false,
        }
    }

    /// Read the next chunk, or `None` once the last chunk was returned
    pub fn next_chunk(&mut self) -> io::Result<Option<Chunk>> {
        if self.finished {
            return Ok(None);
        }

        let current = match self.lookahead.take() {
            Some(window) => window,
            None => self.fill_window()?,
        };

        if current.len() < self.window_size {
            return Ok(Some(self.emit(current, true)));
        }

        let next = self.fill_window()?;
        if next.is_empty() {
            Ok(Some(self.emit(current, true)))
        } else {
            self.lookahead = Some(next);
            Ok(Some(self.emit(current, false)))
        }
    }

    fn fill_window(&mut self) -> io::Result<Vec<u8>> {
        let mut window = vec![0u8; self.window_size];
        let mut filled = 0;

        while filled < window.len() {
            match self.inner.read(&mut window[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }

        window.truncate(filled);
        Ok(window)
    }

    fn emit(&mut self, data: Vec<u8>, is_last: bool) -> Chunk {
        let index = self.next_index;
        self.next_index += 1;
        self.finished = is_last;
        Chunk {
            index,
            data,
            is_last,
        }
    }
}

impl<R: Read> Iterator for WindowReader<R> {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

/// Async counterpart of [`WindowReader`] for tokio sources
pub struct AsyncWindowReader<R> {
    inner: R,
    window_size: usize,
    lookahead: Option<Vec<u8>>,
    next_index: usize,
    finished: bool,
}

impl<R: AsyncRead + Unpin> AsyncWindowReader<R> {
    pub fn new(inner: R, window_size: usize) -> Self {
        Self {
            inner,
            window_size,
            lookahead: None,
            next_index: 0,
            finished: false,
        }
    }

    /// Read the next chunk, or `None` once the last chunk was returned
    pub async fn next_chunk(&mut self) -> io::Result<Option<Chunk>> {
        if self.finished {
            return Ok(None);
        }

        let current = match self.lookahead.take() {
            Some(window) => window,
            None => self.fill_window().await?,
        };

        if current.len() < self.window_size {
            return Ok(Some(self.emit(current, true)));
        }

        let next = self.fill_window().await?;
        if next.is_empty() {
            Ok(Some(self.emit(current, true)))
        } else {
            self.lookahead = Some(next);
            Ok(Some(self.emit(current, false)))
        }
    }

    async fn fill_window(&mut self) -> io::Result<Vec<u8>> {
        let mut window = vec![0u8; self.window_size];
        let mut filled = 0;

        while filled < window.len() {
            match self.inner.read(&mut window[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }

        window.truncate(filled);
        Ok(window)
    }

    fn emit(&mut self, data: Vec<u8>, is_last: bool) -> Chunk {
        let index = self.next_index;
        self.next_index += 1;
        self.finished = is_last;
        Chunk {
            index,
            data,
            is_last,
        }
    }
}
