// Shared test doubles: a scripted engine that records every call it receives
// and fails on demand, plus readers/writers that fail.

#![allow(dead_code)]

use pcm_transcode::{CodecEngine, EngineConfig, EngineError, EngineLibrary};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start { sample_rate: u32 },
    Encode { len: usize, is_last: bool },
    Decode { len: usize, is_last: bool },
    End,
}

#[derive(Default)]
pub struct ScriptedLibrary {
    calls: Arc<Mutex<Vec<Call>>>,
    live: Arc<AtomicUsize>,
    fail_start: bool,
    fail_chunk: Option<usize>,
    fail_end: bool,
}

impl ScriptedLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    /// Engines fail on the chunk with this index (0-based)
    pub fn failing_chunk(index: usize) -> Self {
        Self {
            fail_chunk: Some(index),
            ..Self::default()
        }
    }

    pub fn failing_end() -> Self {
        Self {
            fail_end: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn chunk_calls(&self) -> Vec<(usize, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Encode { len, is_last } | Call::Decode { len, is_last } => {
                    Some((len, is_last))
                }
                _ => None,
            })
            .collect()
    }

    pub fn end_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::End).count()
    }

    pub fn live_instances(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl EngineLibrary for ScriptedLibrary {
    fn name(&self) -> &str {
        "scripted"
    }

    fn start(&self, config: &EngineConfig) -> Result<Box<dyn CodecEngine>, EngineError> {
        self.calls.lock().unwrap().push(Call::Start {
            sample_rate: config.sample_rate,
        });

        if self.fail_start {
            return Err(EngineError::Init("scripted start failure".into()));
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedEngine {
            calls: Arc::clone(&self.calls),
            live: Arc::clone(&self.live),
            fail_chunk: self.fail_chunk,
            fail_end: self.fail_end,
            chunk_index: 0,
        }))
    }
}

struct ScriptedEngine {
    calls: Arc<Mutex<Vec<Call>>>,
    live: Arc<AtomicUsize>,
    fail_chunk: Option<usize>,
    fail_end: bool,
    chunk_index: usize,
}

impl ScriptedEngine {
    /// Fragment naming the chunk it came from, e.g. `<0:4096>`
    fn fragment(&mut self, input: &[u8]) -> Result<Vec<u8>, EngineError> {
        let index = self.chunk_index;
        self.chunk_index += 1;

        if self.fail_chunk == Some(index) {
            return Err(EngineError::Process(format!("scripted failure on chunk {}", index)));
        }

        Ok(format!("<{}:{}>", index, input.len()).into_bytes())
    }
}

impl CodecEngine for ScriptedEngine {
    fn encode(&mut self, input: &[u8], is_last: bool) -> Result<Vec<u8>, EngineError> {
        self.calls.lock().unwrap().push(Call::Encode {
            len: input.len(),
            is_last,
        });
        self.fragment(input)
    }

    fn decode(&mut self, input: &[u8], is_last: bool) -> Result<Vec<u8>, EngineError> {
        self.calls.lock().unwrap().push(Call::Decode {
            len: input.len(),
            is_last,
        });
        self.fragment(input)
    }

    fn end(self: Box<Self>) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(Call::End);
        self.live.fetch_sub(1, Ordering::SeqCst);

        if self.fail_end {
            return Err(EngineError::Teardown("scripted teardown failure".into()));
        }
        Ok(())
    }
}

/// Serves `good` bytes, then fails every read
pub struct FailingReader {
    pub good: usize,
    pub served: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.served >= self.good {
            return Err(io::Error::new(io::ErrorKind::Other, "source went away"));
        }
        let n = buf.len().min(self.good - self.served);
        buf[..n].fill(0);
        self.served += n;
        Ok(n)
    }
}

/// Rejects every write
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Hands out at most `step` bytes per read
pub struct TrickleReader<R> {
    pub inner: R,
    pub step: usize,
}

impl<R: Read> Read for TrickleReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = buf.len().min(self.step);
        self.inner.read(&mut buf[..limit])
    }
}

/// Mono 16-bit PCM sine sweep as little-endian bytes
pub fn sine_pcm(samples: usize, sample_rate: u32) -> Vec<u8> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let value = (t * 440.0 * std::f64::consts::TAU).sin() * 12000.0;
            value as i16
        })
        .flat_map(|s| s.to_le_bytes())
        .collect()
}

pub fn to_samples(pcm: &[u8]) -> Vec<i16> {
    pcm.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
