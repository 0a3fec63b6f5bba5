//! # Retune Core
//!
//! Scale and keyboard mapping models, the tuning table builder, and the real-time
//! translator that turns notes into 12-TET notes plus per-channel pitch bend.
//!
//! ```
//! use std::sync::Arc;
//! use retune_core::{
//!     ChannelAllocator, EventBuffer, KeyboardMapping, RawMidiEvent, Retuner, TuningTable,
//! };
//!
//! let scale = retune_core::parse_scl("fifths\n3\n1/1\n3/2\n2/1\n").unwrap();
//! let mapping = KeyboardMapping::linear(scale.len());
//! let table = TuningTable::build(&scale, &mapping, 200.0).unwrap();
//!
//! let mut retuner = Retuner::new(Arc::new(table), ChannelAllocator::new(0xFFFFu16).unwrap());
//! let mut output = EventBuffer::with_capacity(16);
//! retuner.process_block(&[RawMidiEvent::note_on(0, 0, 71, 100)], &mut output);
//! assert_eq!(output.len(), 2);
//! ```

pub mod allocator;
pub mod buffer;
pub mod config;
pub mod error;
pub mod mapping;
pub mod math;
pub mod scala;
pub mod scale;
pub mod table;
pub mod translator;

pub use allocator::{ChannelAllocator, ChannelMask};
pub use buffer::EventBuffer;
pub use config::RetuneConfig;
pub use error::{Error, Result};
pub use mapping::KeyboardMapping;
pub use math::{cents_to_ratio, floor_div_mod, ratio_to_cents, ReferencePitches};
pub use scala::{parse_kbm, parse_scl, read_kbm_file, read_scl_file};
pub use scale::{Degree, Scale};
pub use table::{KeyReport, TableBuilder, TableReport, TuningEntry, TuningTable};
pub use translator::{BlockProcessor, Retuner};

pub use retune_midi::{PitchBend, RawMidiEvent};
