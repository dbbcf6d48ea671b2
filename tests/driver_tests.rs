// Integration tests for the chunked stream driver
//
// These tests verify how input is split into chunks, how the end-of-stream
// flag is assigned, that fragments are concatenated in order, and that the
// session is ended on every exit path.

mod common;

use anyhow::Result;
use common::{Call, FailingReader, FailingWriter, ScriptedLibrary, TrickleReader};
use pcm_transcode::{run, DriverError, Mode, SessionConfig, SessionError, StreamDriver};
use std::io::Cursor;
use std::sync::Arc;

fn encode_config() -> SessionConfig {
    SessionConfig::new(Mode::Encode, 24000)
}

#[test]
fn test_5000_bytes_in_4096_windows() -> Result<()> {
    let library = Arc::new(ScriptedLibrary::new());
    let mut output: Vec<u8> = Vec::new();

    let stats = run(
        Cursor::new(vec![0u8; 5000]),
        &mut output,
        library.clone(),
        encode_config(),
        4096,
    )?;

    assert_eq!(library.chunk_calls(), vec![(4096, false), (904, true)]);
    assert_eq!(output, b"<0:4096><1:904>");
    assert_eq!(stats.chunks_processed, 2);
    assert_eq!(stats.bytes_in, 5000);
    assert_eq!(library.end_calls(), 1);

    Ok(())
}

#[test]
fn test_exact_window_multiple_flags_last_full_window() -> Result<()> {
    let library = Arc::new(ScriptedLibrary::new());
    let mut output: Vec<u8> = Vec::new();

    run(
        Cursor::new(vec![0u8; 4096]),
        &mut output,
        library.clone(),
        encode_config(),
        4096,
    )?;

    // The zero-byte lookahead read marks the full window as last;
    // no empty chunk is submitted
    assert_eq!(library.chunk_calls(), vec![(4096, true)]);
    assert_eq!(output, b"<0:4096>");

    Ok(())
}

#[test]
fn test_empty_input_sends_single_flush() -> Result<()> {
    let library = Arc::new(ScriptedLibrary::new());
    let mut output: Vec<u8> = Vec::new();

    run(Cursor::new(Vec::<u8>::new()), &mut output, library.clone(), encode_config(), 4096)?;

    assert_eq!(library.chunk_calls(), vec![(0, true)]);
    assert_eq!(library.end_calls(), 1);

    Ok(())
}

#[test]
fn test_short_reads_are_not_end_of_stream() -> Result<()> {
    let library = Arc::new(ScriptedLibrary::new());
    let source = TrickleReader {
        inner: Cursor::new(vec![0u8; 9000]),
        step: 1000,
    };

    let stats = StreamDriver::new(library.clone(), encode_config())
        .with_window_size(4096)
        .run(source, Vec::<u8>::new())?;

    assert_eq!(
        library.chunk_calls(),
        vec![(4096, false), (4096, false), (808, true)]
    );
    assert_eq!(stats.chunks_processed, 3);

    Ok(())
}

#[test]
fn test_lifecycle_call_order() -> Result<()> {
    let library = Arc::new(ScriptedLibrary::new());

    run(
        Cursor::new(vec![0u8; 100]),
        Vec::<u8>::new(),
        library.clone(),
        SessionConfig::new(Mode::Decode, 16000),
        64,
    )?;

    assert_eq!(
        library.calls(),
        vec![
            Call::Start { sample_rate: 16000 },
            Call::Decode { len: 64, is_last: false },
            Call::Decode { len: 36, is_last: true },
            Call::End,
        ]
    );

    Ok(())
}

#[test]
fn test_process_failure_ends_session_and_skips_output() {
    let library = Arc::new(ScriptedLibrary::failing_chunk(1));
    let mut output: Vec<u8> = Vec::new();

    let err = run(
        Cursor::new(vec![0u8; 10_000]),
        &mut output,
        library.clone(),
        encode_config(),
        4096,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        DriverError::Process(SessionError::Process { chunk_index: 1, .. })
    ));
    assert_eq!(err.stage(), "process");

    // Loop stops at the failing chunk
    assert_eq!(library.chunk_calls().len(), 2);
    assert_eq!(library.end_calls(), 1);
    assert_eq!(library.live_instances(), 0);
    assert!(output.is_empty(), "Nothing is written after a process failure");
}

#[test]
fn test_source_failure_ends_session() {
    let library = Arc::new(ScriptedLibrary::new());
    let source = FailingReader { good: 5000, served: 0 };
    let mut output: Vec<u8> = Vec::new();

    let err = run(source, &mut output, library.clone(), encode_config(), 4096).unwrap_err();

    assert!(matches!(err, DriverError::Source(_)));
    assert_eq!(library.end_calls(), 1);
    assert!(output.is_empty());
}

#[test]
fn test_sink_failure_is_reported() {
    let library = Arc::new(ScriptedLibrary::new());

    let err = run(
        Cursor::new(vec![0u8; 100]),
        FailingWriter,
        library.clone(),
        encode_config(),
        4096,
    )
    .unwrap_err();

    assert!(matches!(err, DriverError::Sink(_)));
    assert_eq!(err.stage(), "sink");
    assert_eq!(library.end_calls(), 1);
}

#[test]
fn test_start_failure_processes_nothing() {
    let library = Arc::new(ScriptedLibrary::failing_start());

    let err = run(
        Cursor::new(vec![0u8; 100]),
        Vec::<u8>::new(),
        library.clone(),
        encode_config(),
        4096,
    )
    .unwrap_err();

    assert!(matches!(err, DriverError::Start(SessionError::EngineInit { .. })));
    assert!(library.chunk_calls().is_empty());
    assert_eq!(library.end_calls(), 0);
}

#[test]
fn test_teardown_failure_keeps_output() {
    let library = Arc::new(ScriptedLibrary::failing_end());
    let mut output: Vec<u8> = Vec::new();

    let err = run(
        Cursor::new(vec![0u8; 10]),
        &mut output,
        library.clone(),
        encode_config(),
        4096,
    )
    .unwrap_err();

    assert!(matches!(err, DriverError::Teardown(SessionError::Teardown(_))));
    assert_eq!(output, b"<0:10>", "Output produced before teardown is written");
}

#[test]
fn test_invalid_window_size_is_rejected_before_start() {
    let library = Arc::new(ScriptedLibrary::new());

    let err = run(Cursor::new(vec![0u8; 10]), Vec::<u8>::new(), library.clone(), encode_config(), 0)
        .unwrap_err();

    assert!(matches!(err, DriverError::InvalidWindow { size: 0, .. }));
    assert!(library.calls().is_empty());
}

#[test]
fn test_driver_reuse_opens_fresh_sessions() -> Result<()> {
    let library = Arc::new(ScriptedLibrary::new());
    let driver = StreamDriver::new(library.clone(), encode_config()).with_window_size(8);

    let mut first: Vec<u8> = Vec::new();
    let mut second: Vec<u8> = Vec::new();
    let first_stats = driver.run(Cursor::new(vec![1u8; 12]), &mut first)?;
    let second_stats = driver.run(Cursor::new(vec![1u8; 12]), &mut second)?;

    // Chunk numbering restarts because each run has its own engine
    assert_eq!(first, b"<0:8><1:4>");
    assert_eq!(second, first);
    assert_eq!(library.end_calls(), 2);

    // Runs are told apart in logs and stats
    let base = &driver.config().session_id;
    assert_ne!(first_stats.session_id, second_stats.session_id);
    assert!(first_stats.session_id.starts_with(base.as_str()));
    assert!(second_stats.session_id.starts_with(base.as_str()));

    Ok(())
}

#[tokio::test]
async fn test_async_driver_matches_sync_chunking() -> Result<()> {
    let library = Arc::new(ScriptedLibrary::new());
    let input = vec![0u8; 5000];
    let mut output: Vec<u8> = Vec::new();

    StreamDriver::new(library.clone(), encode_config())
        .run_async(&input[..], &mut output)
        .await?;

    assert_eq!(library.chunk_calls(), vec![(4096, false), (904, true)]);
    assert_eq!(output, b"<0:4096><1:904>");
    assert_eq!(library.end_calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_async_driver_process_failure_ends_session() {
    let library = Arc::new(ScriptedLibrary::failing_chunk(0));
    let input = vec![0u8; 100];
    let mut output: Vec<u8> = Vec::new();

    let err = StreamDriver::new(library.clone(), encode_config())
        .run_async(&input[..], &mut output)
        .await
        .unwrap_err();

    assert!(matches!(err, DriverError::Process(_)));
    assert_eq!(library.end_calls(), 1);
    assert!(output.is_empty());
}
