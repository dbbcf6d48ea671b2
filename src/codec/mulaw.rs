//! Framed G.711 μ-law engine
//!
//! Input PCM is 16-bit little-endian, interleaved. The encoder collects it
//! into frames of `frame_size` samples per channel, holding any remainder
//! until the next call, and zero-pads the final partial frame when the
//! stream ends. Every frame becomes one packet:
//!
//! ```text
//! +----------------+---------------------------+
//! | len: u16 (BE)  | len bytes of μ-law samples |
//! +----------------+---------------------------+
//! ```
//!
//! The decoder accepts packets split at arbitrary byte boundaries.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::engine::{CodecEngine, EngineConfig, EngineError, EngineLibrary};

/// Sample rates the engine accepts
pub const SUPPORTED_SAMPLE_RATES: [u32; 5] = [8000, 12000, 16000, 24000, 48000];

/// Allowed frame durations, in units of 2.5ms
const FRAME_DURATION_UNITS: [usize; 6] = [1, 2, 4, 8, 16, 24];

const PACKET_HEADER_BYTES: usize = 2;
const MULAW_BIAS: i32 = 0x84;
const MULAW_CLIP: i32 = 32635;

/// Library handle for the μ-law engine
///
/// Tracks how many engine instances are alive and optionally refuses to
/// create more than a fixed number.
#[derive(Debug, Default)]
pub struct MulawLibrary {
    live: Arc<AtomicUsize>,
    max_instances: Option<usize>,
}

impl MulawLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library that allows at most `max` live instances at a time
    pub fn with_max_instances(max: usize) -> Self {
        Self {
            live: Arc::new(AtomicUsize::new(0)),
            max_instances: Some(max),
        }
    }

    /// Number of engine instances not yet released
    pub fn live_instances(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn validate(config: &EngineConfig) -> Result<(), EngineError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&config.sample_rate) {
            return Err(EngineError::Init(format!(
                "unsupported sample rate {}Hz (expected one of {:?})",
                config.sample_rate, SUPPORTED_SAMPLE_RATES
            )));
        }

        if config.channels == 0 || config.channels > 2 {
            return Err(EngineError::Init(format!(
                "unsupported channel count {}",
                config.channels
            )));
        }

        // frame_size / sample_rate must be a whole number of 2.5ms units
        let rate = config.sample_rate as usize;
        let valid_frame = match config.frame_size.checked_mul(400) {
            Some(scaled) => {
                config.frame_size > 0
                    && scaled % rate == 0
                    && FRAME_DURATION_UNITS.contains(&(scaled / rate))
            }
            None => false,
        };
        if !valid_frame {
            return Err(EngineError::Init(format!(
                "unsupported frame size {} at {}Hz",
                config.frame_size, config.sample_rate
            )));
        }

        Ok(())
    }
}

impl EngineLibrary for MulawLibrary {
    fn name(&self) -> &str {
        "mulaw"
    }

    fn start(&self, config: &EngineConfig) -> Result<Box<dyn CodecEngine>, EngineError> {
        Self::validate(config)?;

        let reserved = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                match self.max_instances {
                    Some(max) if live >= max => None,
                    _ => Some(live + 1),
                }
            });
        if let Err(live) = reserved {
            return Err(EngineError::Init(format!(
                "instance limit reached ({} live)",
                live
            )));
        }

        debug!(
            "μ-law engine started: {}Hz, {} channels, {} samples/frame",
            config.sample_rate, config.channels, config.frame_size
        );

        Ok(Box::new(MulawEngine {
            config: *config,
            pcm_pending: Vec::with_capacity(config.pcm_frame_bytes() * 2),
            packet_pending: Vec::new(),
            packets_out: 0,
            packets_in: 0,
            live: Arc::clone(&self.live),
        }))
    }
}

/// One μ-law engine instance
pub struct MulawEngine {
    config: EngineConfig,
    /// PCM bytes waiting for a full frame
    pcm_pending: Vec<u8>,
    /// Packet bytes waiting for a complete packet
    packet_pending: Vec<u8>,
    packets_out: usize,
    packets_in: usize,
    live: Arc<AtomicUsize>,
}

impl MulawEngine {
    fn payload_limit(&self) -> usize {
        self.config.frame_size * self.config.channels as usize
    }
}

impl CodecEngine for MulawEngine {
    fn encode(&mut self, input: &[u8], is_last: bool) -> Result<Vec<u8>, EngineError> {
        self.pcm_pending.extend_from_slice(input);

        let frame_bytes = self.config.pcm_frame_bytes();
        let mut output = Vec::new();
        let mut offset = 0;

        while self.pcm_pending.len() - offset >= frame_bytes {
            write_packet(&self.pcm_pending[offset..offset + frame_bytes], &mut output);
            offset += frame_bytes;
            self.packets_out += 1;
        }
        self.pcm_pending.drain(..offset);

        if is_last && !self.pcm_pending.is_empty() {
            // Pad the tail frame with silence
            self.pcm_pending.resize(frame_bytes, 0);
            write_packet(&self.pcm_pending, &mut output);
            self.pcm_pending.clear();
            self.packets_out += 1;
        }

        Ok(output)
    }

    fn decode(&mut self, input: &[u8], is_last: bool) -> Result<Vec<u8>, EngineError> {
        self.packet_pending.extend_from_slice(input);

        let limit = self.payload_limit();
        let channels = self.config.channels as usize;
        let mut output = Vec::new();
        let mut offset = 0;

        while self.packet_pending.len() - offset >= PACKET_HEADER_BYTES {
            let rest = &self.packet_pending[offset..];
            let len = u16::from_be_bytes([rest[0], rest[1]]) as usize;

            if len == 0 || len > limit || len % channels != 0 {
                return Err(EngineError::Process(format!(
                    "malformed packet {}: payload length {} (limit {})",
                    self.packets_in, len, limit
                )));
            }

            if rest.len() < PACKET_HEADER_BYTES + len {
                break;
            }

            output.reserve(len * 2);
            for &code in &rest[PACKET_HEADER_BYTES..PACKET_HEADER_BYTES + len] {
                output.extend_from_slice(&mulaw_to_linear(code).to_le_bytes());
            }

            offset += PACKET_HEADER_BYTES + len;
            self.packets_in += 1;
        }
        self.packet_pending.drain(..offset);

        if is_last && !self.packet_pending.is_empty() {
            return Err(EngineError::Process(format!(
                "truncated packet at end of stream ({} trailing bytes)",
                self.packet_pending.len()
            )));
        }

        Ok(output)
    }

    fn end(self: Box<Self>) -> Result<(), EngineError> {
        info!(
            "μ-law engine finished: {}Hz, {} channels, {} packets encoded, {} packets decoded",
            self.config.sample_rate, self.config.channels, self.packets_out, self.packets_in
        );
        Ok(())
    }
}

impl Drop for MulawEngine {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

fn write_packet(frame: &[u8], output: &mut Vec<u8>) {
    let samples = frame.len() / 2;
    output.extend_from_slice(&(samples as u16).to_be_bytes());
    output.extend(
        frame
            .chunks_exact(2)
            .map(|pair| linear_to_mulaw(i16::from_le_bytes([pair[0], pair[1]]))),
    );
}

/// Compress one 16-bit sample to an 8-bit μ-law code
pub fn linear_to_mulaw(sample: i16) -> u8 {
    let mut magnitude = sample as i32;
    let sign = if magnitude < 0 {
        magnitude = -magnitude;
        0x80
    } else {
        0x00
    };

    magnitude = magnitude.min(MULAW_CLIP) + MULAW_BIAS;

    let exponent = 31 - ((magnitude >> 7) as u32).leading_zeros() as i32;
    let mantissa = (magnitude >> (exponent + 3)) & 0x0F;

    !(sign | (exponent << 4) | mantissa) as u8
}

/// Expand an 8-bit μ-law code back to a 16-bit sample
pub fn mulaw_to_linear(code: u8) -> i16 {
    let code = !code as i32;
    let exponent = (code >> 4) & 0x07;
    let mantissa = code & 0x0F;

    let magnitude = (((mantissa << 3) + MULAW_BIAS) << exponent) - MULAW_BIAS;

    if code & 0x80 != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}
