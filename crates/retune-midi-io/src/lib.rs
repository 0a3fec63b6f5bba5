//! # Retune MIDI I/O
//!
//! Host layer for the retuner: a lock-free input queue fed by the MIDI callback, a
//! fixed-period block thread running a [`BlockProcessor`](retune_core::BlockProcessor),
//! and an output thread that sends the results.
//!
//! Feature `midi-io` (default) adds midir ports, virtual or hardware.

pub mod block;
pub mod error;
pub mod host;
pub mod output;
pub mod port;
pub mod stats;

#[cfg(feature = "midi-io")]
pub mod io;

pub use block::BlockDriver;
pub use error::{Error, Result};
pub use host::MidiHost;
pub use output::{spawn_output_thread, OutputSink};
pub use port::{input_queue, InputConsumer, InputProducer};
pub use stats::{HostStats, StatsReporter, StatsSnapshot};

#[cfg(feature = "midi-io")]
pub use io::{list_input_ports, list_output_ports, open_input, open_output, MidiInputPort};
