use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use tracing::warn;

use crate::audio::{write_wav, AudioFile};
use crate::session::{Mode, SessionStats};
use crate::stream::{DriverError, StreamDriver};

/// Transcode one file into another
///
/// A `.wav` input is unwrapped to raw PCM when encoding and a `.wav` output
/// gets a WAV header when decoding; every other file is taken as raw bytes.
/// The output file is only created once the run has produced its output, so
/// a failed run leaves an existing file untouched. A teardown failure still
/// writes the output before it is reported.
pub fn transcode_file(driver: &StreamDriver, input: &Path, output: &Path) -> Result<SessionStats> {
    let source = open_source(driver, input)?;

    let mut produced: Vec<u8> = Vec::new();
    let result = driver.run(source, &mut produced);

    if !matches!(result, Ok(_) | Err(DriverError::Teardown(_))) {
        return result.context("Transcoding failed");
    }
    if result.is_err() {
        warn!("Writing {} despite teardown failure", output.display());
    }

    write_output(driver, output, &produced)?;

    result.context("Transcoding failed")
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

fn open_source(driver: &StreamDriver, input: &Path) -> Result<Box<dyn Read>> {
    let engine = driver.config().engine;

    if driver.config().mode == Mode::Encode && is_wav(input) {
        let audio = AudioFile::open(input)?;
        if audio.sample_rate != engine.sample_rate || audio.channels != engine.channels {
            anyhow::bail!(
                "WAV input is {}Hz {}ch but the session expects {}Hz {}ch",
                audio.sample_rate,
                audio.channels,
                engine.sample_rate,
                engine.channels
            );
        }
        return Ok(Box::new(Cursor::new(audio.pcm_bytes())));
    }

    let file = File::open(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn write_output(driver: &StreamDriver, output: &Path, bytes: &[u8]) -> Result<()> {
    let engine = driver.config().engine;

    if driver.config().mode == Mode::Decode && is_wav(output) {
        return write_wav(output, bytes, engine.sample_rate, engine.channels);
    }

    std::fs::write(output, bytes)
        .with_context(|| format!("Failed to write output file: {}", output.display()))
}
