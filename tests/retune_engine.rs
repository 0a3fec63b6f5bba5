//! Integration tests for the retune umbrella crate.
//!
//! Files on disk go through the builder; the host runs against an in-memory sink.

use std::io::Write;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use retune::prelude::*;
use retune::{PitchBend, TuningEntry};

const FIFTHS_SCL: &str = "! fifths.scl
Tonic, fifth and octave
3
1/1
3/2
2/1
";

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn mapped(output_key: u8, bend: u16) -> TuningEntry {
    TuningEntry::Mapped {
        output_key,
        bend: PitchBend::new(bend).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// 1. Building from files
// ---------------------------------------------------------------------------

#[test]
fn test_default_engine_is_twelve_tet() {
    let engine = RetuneEngine::builder().build().unwrap();
    assert_eq!(**engine.table(), TuningTable::identity());
    assert_eq!(engine.scale().len(), 12);
}

#[test]
fn test_build_from_scale_file() {
    let scl = write_temp(FIFTHS_SCL);
    let engine = RetuneEngine::builder()
        .scale_file(scl.path())
        .build()
        .unwrap();

    assert_eq!(engine.scale().label(), "Tonic, fifth and octave");
    let table = engine.table();
    assert_eq!(table.entry(69), mapped(69, 8192));
    assert_eq!(table.entry(71), mapped(76, 8272));
    assert_eq!(table.entry(72), mapped(81, 8192));
}

#[test]
fn test_build_with_mapping_file() {
    let scl = write_temp("12-TET\n12\n100.0\n200.0\n300.0\n400.0\n500.0\n600.0\n700.0\n800.0\n900.0\n1000.0\n1100.0\n2/1\n");
    // Only white keys sound, each one scale step apart
    let kbm = write_temp("12\n0\n127\n60\n60\n261.6255653005986\n7\n0\nx\n1\nx\n2\n3\nx\n4\nx\n5\nx\n6\n");
    let engine = RetuneEngine::builder()
        .scale_file(scl.path())
        .mapping_file(kbm.path())
        .build()
        .unwrap();

    let table = engine.table();
    assert_eq!(table.entry(60), mapped(60, 8192));
    assert_eq!(table.entry(61), TuningEntry::Unmapped);
    // D (62) is mapped key 61, one semitone above C
    assert_eq!(table.entry(62), mapped(61, 8192));
    assert_eq!(table.entry(72), mapped(67, 8192));
}

#[test]
fn test_missing_scale_file_fails() {
    let result = RetuneEngine::builder()
        .scale_file("/nonexistent/scale.scl")
        .build();
    assert!(matches!(result, Err(Error::Core(retune::core::Error::Io(_)))));
}

#[test]
fn test_malformed_scale_fails() {
    let scl = write_temp("broken\n4\n100.0\n2/1\n");
    let result = RetuneEngine::builder().scale_file(scl.path()).build();
    assert!(matches!(
        result,
        Err(Error::Core(retune::core::Error::Parse { .. }))
    ));
}

#[test]
fn test_empty_channel_mask_fails() {
    let result = RetuneEngine::builder().channel_mask(0).build();
    assert!(matches!(
        result,
        Err(Error::Core(retune::core::Error::InvalidConfig(_)))
    ));
}

#[test]
fn test_narrow_bend_range_fails() {
    let scale = Scale::equal_temperament(7, 1200.0).unwrap();
    let result = RetuneEngine::builder().scale(scale).pitch_range(50.0).build();
    assert!(matches!(
        result,
        Err(Error::Core(retune::core::Error::PitchBendOutOfRange { .. }))
    ));
}

#[test]
fn test_config_file() {
    let file = write_temp("pitch_range_cents = 100.0\nchannel_mask = 3\n");
    let config = retune::load_config(file.path()).unwrap();
    let engine = RetuneEngine::builder().config(config).build().unwrap();
    assert_eq!(engine.config().pitch_range_cents, 100.0);
    assert_eq!(engine.retuner().unwrap().channels().free_count(), 2);
}

// ---------------------------------------------------------------------------
// 2. Report
// ---------------------------------------------------------------------------

#[test]
fn test_report_lists_every_key() {
    let scl = write_temp(FIFTHS_SCL);
    let engine = RetuneEngine::builder()
        .scale_file(scl.path())
        .build()
        .unwrap();
    let text = engine.report().to_string();
    assert_eq!(text.lines().count(), 129);
    assert_eq!(engine.report().rows()[71].entry, engine.table().entry(71));
}

// ---------------------------------------------------------------------------
// 3. Running
// ---------------------------------------------------------------------------

#[test]
fn test_engine_runs_in_memory() {
    let scl = write_temp(FIFTHS_SCL);
    let config = RetuneConfig {
        block_size: 64,
        channel_mask: 0x0001,
        ..Default::default()
    };
    let engine = RetuneEngine::builder()
        .config(config)
        .scale_file(scl.path())
        .build()
        .unwrap();

    let (sink, received) = unbounded::<Vec<u8>>();
    let (host, mut producer) = engine.start_with(sink).unwrap();

    // One channel: the second overlapping note and its note-off are dropped
    let now = Instant::now();
    producer.push_bytes(&[0x90, 71, 100], now);
    producer.push_bytes(&[0x90, 72, 100], now);
    producer.push_bytes(&[0x80, 72, 0], now);
    producer.push_bytes(&[0xB0, 1, 10], now);

    let timeout = Duration::from_secs(5);
    assert_eq!(received.recv_timeout(timeout).unwrap(), vec![0xE0, 80, 64]);
    assert_eq!(received.recv_timeout(timeout).unwrap(), vec![0x90, 76, 100]);
    assert_eq!(received.recv_timeout(timeout).unwrap(), vec![0xB0, 1, 10]);

    let stats = host.shutdown();
    assert_eq!(stats.dropped_output, 0);
    // Held note released on shutdown
    assert_eq!(received.try_iter().collect::<Vec<_>>(), vec![vec![0x80, 76, 0]]);
}
