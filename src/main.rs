use anyhow::Result;
use clap::Parser;
use pcm_transcode::{transcode_file, Config, Mode, MulawLibrary, SessionConfig, StreamDriver};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "pcm-transcode")]
#[command(about = "Stream audio through a codec session")]
struct Args {
    /// encode (PCM to packets) or decode (packets to PCM)
    #[arg(short, long, value_enum)]
    mode: Mode,

    /// Input file; a .wav input is unwrapped to PCM when encoding
    #[arg(short, long)]
    input: PathBuf,

    /// Output file; a .wav output gets a WAV header when decoding
    #[arg(short, long)]
    output: PathBuf,

    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/pcm-transcode")]
    config: String,

    /// Override the configured sample rate
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Override the configured read window in bytes
    #[arg(long)]
    window_size: Option<usize>,

    /// Print session statistics as JSON when done
    #[arg(long)]
    stats: bool,

    /// Log every chunk
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let cfg = Config::load(&args.config)?;

    let mut engine = cfg.codec;
    if let Some(sample_rate) = args.sample_rate {
        engine.sample_rate = sample_rate;
    }
    let window_size = args.window_size.unwrap_or(cfg.stream.window_size);

    info!("pcm-transcode v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "{} {} -> {} ({}Hz, {} channels)",
        args.mode,
        args.input.display(),
        args.output.display(),
        engine.sample_rate,
        engine.channels
    );

    let session_config = SessionConfig {
        mode: args.mode,
        engine,
        ..SessionConfig::default()
    };
    let driver = StreamDriver::new(Arc::new(MulawLibrary::new()), session_config)
        .with_window_size(window_size);

    let stats = transcode_file(&driver, &args.input, &args.output)?;

    info!(
        "Done: {} chunks, {} bytes in, {} bytes out",
        stats.chunks_processed, stats.bytes_in, stats.bytes_out
    );

    if args.stats {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}
