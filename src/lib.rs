//! # Retune - Real-time MIDI re-tuner
//!
//! Plays microtonal scales on receivers that only know 12-TET: every incoming note is
//! replaced by the nearest 12-TET note below its target pitch, on a channel of its
//! own, preceded by the pitch bend that closes the gap.
//!
//! ## Architecture
//!
//! Retune is an umbrella crate that coordinates:
//! - **retune-midi** - Raw MIDI events, 14-bit pitch bend, 12-TET helpers
//! - **retune-core** - Scala parsing, tuning table builder, channel allocator, translator
//! - **retune-midi-io** - Input queue, block thread, output thread, midir ports
//!
//! ## Quick Start
//!
//! ```ignore
//! use retune::prelude::*;
//!
//! let engine = RetuneEngine::builder()
//!     .scale_file("fifths.scl")
//!     .mapping_file("white_keys.kbm")
//!     .build()?;
//!
//! let host = engine.open()?;
//! // ... play ...
//! let stats = host.shutdown();
//! ```
//!
//! ## Feature Flags
//!
//! - `midi-io` (default) - midir ports; without it only the in-memory host is available

pub use retune_core as core;
pub use retune_midi as midi;
pub use retune_midi_io as midi_io;

pub use retune_core::{
    BlockProcessor, ChannelAllocator, ChannelMask, EventBuffer, KeyboardMapping, RetuneConfig,
    Retuner, Scale, TableReport, TuningEntry, TuningTable,
};
pub use retune_midi::{PitchBend, RawMidiEvent};
pub use retune_midi_io::{InputProducer, MidiHost, OutputSink, StatsSnapshot};

mod builder;
mod config;
mod engine;
mod error;

pub use builder::RetuneEngineBuilder;
pub use config::{load_config, parse_config};
pub use engine::RetuneEngine;
pub use error::{Error, Result};

pub mod prelude {
    pub use crate::{
        KeyboardMapping, MidiHost, RawMidiEvent, RetuneConfig, RetuneEngine, Scale,
        TuningTable,
    };
    pub use crate::{Error, Result};
}
